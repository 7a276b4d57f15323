//! Enemy variants and their template table.
//!
//! Behavior is data: a variant maps to a [`EnemyTemplate`] whose optional
//! trait blocks (gun, kamikaze charge, asteroid impact) switch the matching
//! branches of the single behavior system on or off.

use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Chaser,
    Sprinter,
    Shooter,
    Kamikaze,
    Boss,
    Asteroid,
}

/// Kinds the director draws from, with their relative weights.
pub const SPAWN_TABLE: [(EnemyKind, u32); 5] = [
    (EnemyKind::Chaser, 45),
    (EnemyKind::Sprinter, 25),
    (EnemyKind::Shooter, 12),
    (EnemyKind::Kamikaze, 10),
    (EnemyKind::Asteroid, 8),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GunSpec {
    pub fire_rate_ms: u64,
    pub damage: f32,
    pub bullet_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KamikazeSpec {
    pub trigger_distance: f32,
    pub blast_radius: f32,
    pub damage: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AsteroidSpec {
    pub damage: f32,
    pub knockback: f32,
    /// Radians per second.
    pub spin: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyTemplate {
    pub speed: f32,
    pub hp: f32,
    pub score: f64,
    pub scale: f32,
    pub tint: Color,
    pub gun: Option<GunSpec>,
    pub kamikaze: Option<KamikazeSpec>,
    /// Present on indestructible drifting rocks.
    pub asteroid: Option<AsteroidSpec>,
    pub boss: bool,
}

impl EnemyTemplate {
    const BASE: Self = Self {
        speed: 100.0,
        hp: 3.0,
        score: 100.0,
        scale: 1.0,
        tint: Color::srgb(1.0, 0.3, 0.3),
        gun: None,
        kamikaze: None,
        asteroid: None,
        boss: false,
    };

    #[inline]
    pub fn indestructible(&self) -> bool {
        self.asteroid.is_some()
    }
}

/// Collider radius of a scale-1 enemy.
pub const BASE_RADIUS: f32 = 16.0;

impl EnemyKind {
    pub fn template(self) -> EnemyTemplate {
        let base = EnemyTemplate::BASE;
        match self {
            EnemyKind::Chaser => base,
            EnemyKind::Sprinter => EnemyTemplate {
                speed: 150.0,
                hp: 1.0,
                score: 150.0,
                scale: 0.8,
                tint: Color::srgb(1.0, 0.85, 0.2),
                ..base
            },
            EnemyKind::Shooter => EnemyTemplate {
                speed: 70.0,
                hp: 4.0,
                score: 200.0,
                tint: Color::srgb(0.7, 0.3, 1.0),
                gun: Some(GunSpec {
                    fire_rate_ms: 2000,
                    damage: 10.0,
                    bullet_speed: 300.0,
                }),
                ..base
            },
            EnemyKind::Kamikaze => EnemyTemplate {
                speed: 180.0,
                hp: 2.0,
                score: 120.0,
                scale: 0.9,
                tint: Color::srgb(1.0, 0.5, 0.0),
                kamikaze: Some(KamikazeSpec {
                    trigger_distance: 100.0,
                    blast_radius: 200.0,
                    damage: 25.0,
                }),
                ..base
            },
            EnemyKind::Boss => EnemyTemplate {
                speed: 60.0,
                hp: 150.0,
                score: 2000.0,
                scale: 3.0,
                tint: Color::srgb(1.0, 0.0, 0.35),
                gun: Some(GunSpec {
                    fire_rate_ms: 800,
                    damage: 15.0,
                    bullet_speed: 350.0,
                }),
                boss: true,
                ..base
            },
            EnemyKind::Asteroid => EnemyTemplate {
                speed: 50.0,
                hp: 1.0,
                score: 0.0,
                scale: 2.0,
                tint: Color::srgb(0.55, 0.5, 0.45),
                asteroid: Some(AsteroidSpec {
                    damage: 15.0,
                    knockback: 400.0,
                    spin: 1.5,
                }),
                ..base
            },
        }
    }

    /// Unknown names fall back to the baseline chaser.
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "chaser" => EnemyKind::Chaser,
            "sprinter" => EnemyKind::Sprinter,
            "shooter" => EnemyKind::Shooter,
            "kamikaze" => EnemyKind::Kamikaze,
            "boss" => EnemyKind::Boss,
            "asteroid" => EnemyKind::Asteroid,
            other => {
                warn!("unknown enemy type {other:?}, spawning a chaser");
                EnemyKind::Chaser
            }
        }
    }
}
