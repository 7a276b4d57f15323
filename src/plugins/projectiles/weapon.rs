//! Weapons: cooldown gating and firing patterns.
//!
//! A weapon does not touch the bullet pools. `fire` turns one trigger pull
//! into a [`Volley`] of spawn requests; the allocator later decides which of
//! them actually get a slot. A volley whose shots are all dropped for lack of
//! capacity still counts as fired.

use bevy::prelude::*;
use rand::Rng;

use crate::common::clock::GameTime;
use crate::plugins::player::PlayerStats;

use super::messages::{BulletKind, SpawnBulletRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeaponId {
    Pistol,
    Shotgun,
    Laser,
    Ricochet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FirePattern {
    /// One shot with random jitter inside the spread cone.
    Standard,
    /// `count` shots one `spread` step apart, centred on the aim, with recoil.
    Spread,
    /// One double-speed shot that passes through enemies.
    Piercing,
    /// One shot that bounces off the arena edge.
    Bounce,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponTemplate {
    pub id: WeaponId,
    pub fire_rate_ms: u64,
    pub damage: f32,
    pub speed: f32,
    /// Total cone width in radians.
    pub spread: f32,
    pub count: u32,
    pub recoil: f32,
    pub tint: Color,
    pub pattern: FirePattern,
}

impl WeaponId {
    pub fn template(self) -> WeaponTemplate {
        match self {
            WeaponId::Pistol => WeaponTemplate {
                id: self,
                fire_rate_ms: 200,
                damage: 1.0,
                speed: 600.0,
                spread: 0.1,
                count: 1,
                recoil: 200.0,
                tint: Color::srgb(1.0, 1.0, 0.3),
                pattern: FirePattern::Standard,
            },
            WeaponId::Shotgun => WeaponTemplate {
                id: self,
                fire_rate_ms: 800,
                damage: 1.0,
                speed: 500.0,
                spread: 0.5,
                count: 5,
                recoil: 400.0,
                tint: Color::srgb(1.0, 0.55, 0.1),
                pattern: FirePattern::Spread,
            },
            WeaponId::Laser => WeaponTemplate {
                id: self,
                fire_rate_ms: 1000,
                damage: 5.0,
                speed: 1200.0,
                spread: 0.0,
                count: 1,
                recoil: 100.0,
                tint: Color::srgb(1.0, 0.1, 0.6),
                pattern: FirePattern::Piercing,
            },
            WeaponId::Ricochet => WeaponTemplate {
                id: self,
                fire_rate_ms: 300,
                damage: 1.0,
                speed: 500.0,
                spread: 0.2,
                count: 1,
                recoil: 200.0,
                tint: Color::srgb(0.3, 1.0, 0.4),
                pattern: FirePattern::Bounce,
            },
        }
    }
}

/// Output of one successful trigger pull.
#[derive(Debug, Clone, PartialEq)]
pub struct Volley {
    pub shots: Vec<SpawnBulletRequest>,
    /// Velocity kick for the shooter.
    pub recoil: Vec2,
    /// Camera shake strength for this shot.
    pub shake: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weapon {
    pub id: WeaponId,
    pub last_fired_at: Option<GameTime>,
}

impl Weapon {
    pub fn new(id: WeaponId) -> Self {
        Self {
            id,
            last_fired_at: None,
        }
    }

    #[inline]
    pub fn template(&self) -> WeaponTemplate {
        self.id.template()
    }

    /// Fire interval after the fire-rate multiplier.
    pub fn interval_ms(&self, fire_rate_mult: f32) -> u64 {
        (self.template().fire_rate_ms as f32 * fire_rate_mult).round() as u64
    }

    /// Strictly after `last_fired_at + interval`.
    pub fn can_fire(&self, now: GameTime, fire_rate_mult: f32) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now > last.after(self.interval_ms(fire_rate_mult)),
        }
    }

    pub fn fire(
        &mut self,
        now: GameTime,
        origin: Vec2,
        aim: Vec2,
        stats: &PlayerStats,
        rng: &mut impl Rng,
    ) -> Option<Volley> {
        if !self.can_fire(now, stats.fire_rate_mult) {
            return None;
        }
        self.last_fired_at = Some(now);

        let t = self.template();
        let base = aim.try_normalize().unwrap_or(Vec2::Y).to_angle();
        let damage = t.damage * stats.damage_mult;
        let shot = |angle: f32, speed: f32| SpawnBulletRequest {
            kind: BulletKind::Player,
            pos: origin,
            vel: Vec2::from_angle(angle) * speed,
            damage,
            piercing: false,
            bounces: false,
            scale: Vec2::ONE,
            tint: t.tint,
        };

        let mut shots = Vec::with_capacity(t.count as usize);
        let mut recoil = Vec2::ZERO;

        match t.pattern {
            FirePattern::Standard => {
                let half = t.spread * 0.5;
                let jitter = if half > 0.0 {
                    rng.gen_range(-half..=half)
                } else {
                    0.0
                };
                shots.push(shot(base + jitter, t.speed));
            }
            FirePattern::Spread => {
                // Neighbouring pellets sit one `spread` step apart, centred on the aim.
                let n = t.count.max(1);
                let centre = (n - 1) as f32 / 2.0;
                for i in 0..n {
                    shots.push(shot(base + (i as f32 - centre) * t.spread, t.speed));
                }
                recoil = -Vec2::from_angle(base) * t.recoil;
            }
            FirePattern::Piercing => {
                let mut s = shot(base, t.speed * 2.0);
                s.piercing = true;
                s.scale = Vec2::new(2.0, 0.5);
                shots.push(s);
            }
            FirePattern::Bounce => {
                let mut s = shot(base, t.speed);
                s.bounces = true;
                shots.push(s);
            }
        }

        Some(Volley {
            shots,
            recoil,
            shake: 0.005 * (t.recoil / 200.0),
        })
    }
}
