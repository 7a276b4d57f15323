//! Tunable gameplay constants.
//!
//! Per-type tables (weapons, enemies, abilities) live next to the code that
//! reads them; this resource holds the scalars shared across plugins.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,

    // Player
    pub player_speed: f32,
    pub player_hp: f32,
    pub player_radius: f32,
    pub max_ammo: u32,
    pub reload_ms: u64,
    pub dash_speed: f32,
    pub dash_ms: u64,
    pub dash_cooldown_ms: u64,
    pub invulnerability_ms: u64,
    /// Exponential decay rate (1/s) of recoil and knockback impulses.
    pub impulse_decay: f32,
    pub muzzle_offset: f32,

    // Danger zone
    pub danger_damage_per_sec: f32,
    pub danger_push: f32,

    // Progression
    pub xp_base: f32,
    pub xp_growth: f32,
    pub xp_per_kill: f32,
    pub vampirism_every: u32,
    pub vampirism_heal: f32,

    // Contact
    pub contact_damage: f32,
    pub contact_bounce: f32,
    pub knockback_speed: f32,
    pub knockback_ms: u64,

    // Drops
    pub powerup_chance: f64,
    pub powerup_lifetime_ms: u64,
    pub orb_lifetime_ms: u64,
    pub orb_value: f32,
    pub boss_orbs: u32,
    pub heal_amount: f32,
    pub shield_ms: u64,
    pub magnet_ms: u64,
    pub magnet_radius: f32,
    pub magnet_speed: f32,

    // Director
    pub initial_spawn_delay_ms: u64,
    pub spawn_delay_floor_ms: u64,
    pub spawn_delay_factor: f64,
    pub speed_growth: f32,
    pub escalation_interval_ms: u64,
    pub boss_level_interval: u32,
    pub spawn_padding: f32,
    pub offscreen_margin: f32,

    // Drones
    pub max_drones: usize,
    pub drone_orbit_radius: f32,
    /// Radians per millisecond.
    pub drone_angular_speed: f32,
    pub drone_fire_ms: u64,
    pub drone_damage: f32,
    pub drone_range: f32,
    pub drone_bullet_speed: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,

            player_speed: 300.0,
            player_hp: 100.0,
            player_radius: 14.0,
            max_ammo: 30,
            reload_ms: 1000,
            dash_speed: 600.0,
            dash_ms: 200,
            dash_cooldown_ms: 1000,
            invulnerability_ms: 1000,
            impulse_decay: 6.0,
            muzzle_offset: 20.0,

            danger_damage_per_sec: 5.0,
            danger_push: 50.0,

            xp_base: 100.0,
            xp_growth: 1.2,
            xp_per_kill: 20.0,
            vampirism_every: 5,
            vampirism_heal: 1.0,

            contact_damage: 10.0,
            contact_bounce: 200.0,
            knockback_speed: 150.0,
            knockback_ms: 200,

            powerup_chance: 0.08,
            powerup_lifetime_ms: 10_000,
            orb_lifetime_ms: 15_000,
            orb_value: 20.0,
            boss_orbs: 8,
            heal_amount: 20.0,
            shield_ms: 5_000,
            magnet_ms: 10_000,
            magnet_radius: 250.0,
            magnet_speed: 400.0,

            initial_spawn_delay_ms: 2_000,
            spawn_delay_floor_ms: 500,
            spawn_delay_factor: 0.9,
            speed_growth: 1.05,
            escalation_interval_ms: 30_000,
            boss_level_interval: 5,
            spawn_padding: 100.0,
            offscreen_margin: 400.0,

            max_drones: 4,
            drone_orbit_radius: 60.0,
            drone_angular_speed: 0.002,
            drone_fire_ms: 1_000,
            drone_damage: 2.0,
            drone_range: 400.0,
            drone_bullet_speed: 400.0,
        }
    }
}
