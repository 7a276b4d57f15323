//! Outbound notifications.
//!
//! The simulation never talks to a HUD, speaker or shader directly. It writes
//! [`GameEvent`]s (state changes a UI would display) and [`FeedbackCue`]s
//! (fire-and-forget juice) and lets whoever is listening decide what to do.

use bevy::prelude::*;

use crate::plugins::abilities::AbilityId;
use crate::plugins::enemies::template::EnemyKind;
use crate::plugins::pickups::PowerupKind;
use crate::plugins::projectiles::weapon::WeaponId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KillReward {
    pub score: f64,
    pub xp: f32,
}

#[derive(Message, Clone, Debug, PartialEq)]
pub enum GameEvent {
    AmmoChanged { ammo: u32, max: u32 },
    ReloadStarted,
    HpChanged { hp: f32, max: f32 },
    XpChanged { level: u32, xp: f32, next: f32 },
    LevelUp { level: u32 },
    DamageTaken { amount: f32 },
    EnemyKilled {
        kind: EnemyKind,
        position: Vec2,
        reward: KillReward,
    },
    ComboChanged { combo: u32, multiplier: u32 },
    DifficultyEscalated {
        spawn_delay_ms: u64,
        speed_multiplier: f32,
    },
    BossWarning { level: u32 },
    AbilityUsed(AbilityId),
    WeaponEquipped(WeaponId),
    DangerZone(bool),
    PowerupCollected(PowerupKind),
    GameOver {
        score: u64,
        level: u32,
        new_high_score: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    Shoot,
    Hit,
    Explosion,
    Powerup,
    LevelUp,
    Dash,
    Reload,
    Ability,
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum FeedbackCue {
    CameraShake { duration_ms: u64, intensity: f32 },
    CameraFlash { duration_ms: u64 },
    HitFlash(Entity),
    Sound(SoundCue),
}
