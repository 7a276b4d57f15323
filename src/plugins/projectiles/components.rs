use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::pool::{Enemies, PoolHandle};

use super::messages::{BulletKind, SpawnBulletRequest};

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulletState {
    #[default]
    Inactive,
    Active,
    /// Spent this tick; the commit step returns it to its pool.
    PendingReturn,
}

#[derive(Component, Debug, Clone)]
pub struct Bullet {
    pub owner: BulletKind,
    pub damage: f32,
    pub piercing: bool,
    /// Enemies already damaged by this firing (piercing only).
    hit: HashSet<PoolHandle<Enemies>>,
    pub bounces_left: u8,
    pub collide_bounds: bool,
}

impl Bullet {
    pub const DEFAULT_BOUNCES: u8 = 3;

    pub fn from_request(req: &SpawnBulletRequest) -> Self {
        Self {
            owner: req.kind,
            damage: req.damage,
            piercing: req.piercing,
            hit: HashSet::default(),
            bounces_left: if req.bounces { Self::DEFAULT_BOUNCES } else { 0 },
            collide_bounds: req.bounces,
        }
    }

    /// Remember `enemy` as hit. False if it was already hit by this firing.
    #[inline]
    pub fn record_hit(&mut self, enemy: PoolHandle<Enemies>) -> bool {
        self.hit.insert(enemy)
    }

    #[inline]
    pub fn hit_count(&self) -> usize {
        self.hit.len()
    }

    /// Consume one bounce; the last one turns edge collision off.
    pub fn spend_bounce(&mut self) {
        self.bounces_left = self.bounces_left.saturating_sub(1);
        if self.bounces_left == 0 {
            self.collide_bounds = false;
        }
    }
}
