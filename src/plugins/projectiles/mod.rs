//! Projectiles plugin: **message-based producer → consumer** spawning + pooled bullets.
//!
//! # Data flow (one tick)
//! ```text
//! FixedUpdate
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  Behavior   enemy guns, drones ──────────────┐                             │
//!│                                              │  SpawnBulletRequest         │
//!│  Fire       (A) fire_player_weapon ──────────┤                             │
//!│               - reads: PlayerIntent, Player weapon/ammo                    │
//!│               - cooldown + pattern → Volley                                │
//!│                                              v                             │
//!│             (B) allocate_bullets_from_pool                                 │
//!│               - single writer of EntityPool<PlayerShots/EnemyShots>        │
//!│               - exhausted pool → request dropped (debug log)               │
//!│                                                                            │
//!│  Resolve    (C) combat consumers mark spent bullets PendingReturn          │
//!│             (D) confine_bullets: leave arena → PendingReturn,              │
//!│                 bouncing shots reflect and spend a bounce                  │
//!│             (E) return_to_pool_commit: release + park                      │
//!└────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Pool ownership
//! Producers never borrow the pools; they only enqueue requests. The allocator
//! is the single writer that acquires slots, and the commit step is the single
//! writer that releases them.

pub mod allocator;
pub mod commit;
pub mod components;
pub mod messages;
pub mod pool;
pub mod request;
pub mod weapon;

use bevy::prelude::*;

use crate::common::pool::{EnemyShots, PlayerShots};
use crate::plugins::core::SimSet;
use crate::plugins::physics::OverlapConsumers;

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        pool::insert_pools(app);
        app.add_message::<messages::SpawnBulletRequest>();

        app.add_systems(
            FixedUpdate,
            (
                request::fire_player_weapon
                    .after(crate::plugins::player::reload_on_request),
                allocator::allocate_bullets_from_pool.after(request::fire_player_weapon),
            )
                .in_set(SimSet::Fire),
        );

        app.add_systems(
            FixedUpdate,
            (
                commit::confine_bullets,
                commit::return_to_pool_commit::<PlayerShots>,
                commit::return_to_pool_commit::<EnemyShots>,
            )
                .chain()
                .in_set(SimSet::Resolve)
                .after(OverlapConsumers),
        );
    }
}
