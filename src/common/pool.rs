//! Fixed-capacity entity pools.
//!
//! A pool is an append-only arena of slots. Each slot owns one ECS entity for
//! the whole run: `acquire` reuses a released slot before growing, and never
//! grows past `capacity`. Released entities stay in the world, hidden and
//! collision-free, until the slot is handed out again.
//!
//! # Handles
//! A [`PoolHandle`] is a slot index plus the slot generation. Releasing a slot
//! bumps its generation, so any handle kept across the release (a pending
//! timer, a piercing bullet's hit list, a boss reference) is rejected with
//! [`PoolError::StaleHandle`] instead of touching whatever entity now lives
//! in that slot.
//!
//! ```text
//!  acquire ──► [slot 0 gen 0 active] ──release──► [slot 0 gen 1 free]
//!                                                     │
//!  acquire ◄──────────────────────────────────────────┘ (gen 1 handle)
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use avian2d::prelude::*;
use bevy::prelude::*;
use thiserror::Error;

use super::layers::{Layer, dormant_layers};

/// Where released entities are parked.
pub const OFF_STAGE: Vec3 = Vec3::new(-100_000.0, -100_000.0, 0.0);

/// Compile-time tag distinguishing one pool (and its handles) from another.
pub trait PoolKind: Send + Sync + 'static {
    const NAME: &'static str;
}

#[derive(Debug)]
pub struct Enemies;
#[derive(Debug)]
pub struct PlayerShots;
#[derive(Debug)]
pub struct EnemyShots;
#[derive(Debug)]
pub struct Pickups;
#[derive(Debug)]
pub struct Drones;

impl PoolKind for Enemies {
    const NAME: &'static str = "enemies";
}
impl PoolKind for PlayerShots {
    const NAME: &'static str = "player_shots";
}
impl PoolKind for EnemyShots {
    const NAME: &'static str = "enemy_shots";
}
impl PoolKind for Pickups {
    const NAME: &'static str = "pickups";
}
impl PoolKind for Drones {
    const NAME: &'static str = "drones";
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("{kind} pool exhausted (capacity {capacity})")]
    PoolExhausted { kind: &'static str, capacity: usize },
    #[error("stale {kind} handle: slot {index}, generation {generation}")]
    StaleHandle {
        kind: &'static str,
        index: u32,
        generation: u32,
    },
}

/// Generation-checked reference to a pool slot.
pub struct PoolHandle<K> {
    index: u32,
    generation: u32,
    _kind: PhantomData<fn() -> K>,
}

impl<K> PoolHandle<K> {
    fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

// Manual impls: derives would require `K: Clone + Eq + ...` on the tag type.
impl<K> Clone for PoolHandle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for PoolHandle<K> {}

impl<K> PartialEq for PoolHandle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<K> Eq for PoolHandle<K> {}

impl<K> Hash for PoolHandle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<K: PoolKind> fmt::Debug for PoolHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}v{}", K::NAME, self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    entity: Entity,
    generation: u32,
    active: bool,
}

#[derive(Resource, Debug)]
pub struct EntityPool<K: PoolKind> {
    slots: Vec<Slot>,
    free: Vec<u32>,
    capacity: usize,
    _kind: PhantomData<fn() -> K>,
}

impl<K: PoolKind> EntityPool<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently handed out.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Hand out a slot: reuse a released one, else grow by calling `spawn`
    /// (only invoked when a new slot is created), else fail.
    pub fn acquire(
        &mut self,
        spawn: impl FnOnce() -> Entity,
    ) -> Result<(PoolHandle<K>, Entity), PoolError> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.active = true;
            return Ok((PoolHandle::new(index, slot.generation), slot.entity));
        }

        if self.slots.len() >= self.capacity {
            return Err(PoolError::PoolExhausted {
                kind: K::NAME,
                capacity: self.capacity,
            });
        }

        let index = self.slots.len() as u32;
        let entity = spawn();
        self.slots.push(Slot {
            entity,
            generation: 0,
            active: true,
        });
        Ok((PoolHandle::new(index, 0), entity))
    }

    /// Return a slot to the free list. The handle (and every copy of it) is stale afterwards.
    pub fn release(&mut self, handle: PoolHandle<K>) -> Result<Entity, PoolError> {
        let slot = self.live_slot_mut(handle)?;
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        let entity = slot.entity;
        self.free.push(handle.index);
        Ok(entity)
    }

    pub fn resolve(&self, handle: PoolHandle<K>) -> Result<Entity, PoolError> {
        match self.slots.get(handle.index as usize) {
            Some(slot) if slot.active && slot.generation == handle.generation => Ok(slot.entity),
            _ => Err(Self::stale(handle)),
        }
    }

    #[inline]
    pub fn is_live(&self, handle: PoolHandle<K>) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Live handles in slot order.
    pub fn live(&self) -> impl Iterator<Item = (PoolHandle<K>, Entity)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(i, slot)| (PoolHandle::new(i as u32, slot.generation), slot.entity))
    }

    /// Forget every slot. Used when the run (and its entities) is torn down.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    fn live_slot_mut(&mut self, handle: PoolHandle<K>) -> Result<&mut Slot, PoolError> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.active && slot.generation == handle.generation => Ok(slot),
            _ => Err(Self::stale(handle)),
        }
    }

    fn stale(handle: PoolHandle<K>) -> PoolError {
        PoolError::StaleHandle {
            kind: K::NAME,
            index: handle.index,
            generation: handle.generation,
        }
    }
}

/// Back-reference from a pooled entity to its slot.
///
/// The handle is rewritten on every acquire, so `pool.is_live(pooled.handle)`
/// is false for a parked entity.
#[derive(Component, Debug)]
pub struct Pooled<K: PoolKind> {
    pub handle: PoolHandle<K>,
}

impl<K: PoolKind> Pooled<K> {
    pub fn new(handle: PoolHandle<K>) -> Self {
        Self { handle }
    }
}

/// Release a slot and write the neutral parked state onto its entity.
///
/// Template values are not restored here; the next acquirer writes them.
pub fn release_and_park<K: PoolKind>(
    commands: &mut Commands,
    pool: &mut EntityPool<K>,
    handle: PoolHandle<K>,
    membership: Layer,
) -> Result<Entity, PoolError> {
    let entity = pool.release(handle)?;
    commands.entity(entity).insert((
        Visibility::Hidden,
        LinearVelocity::ZERO,
        Transform::from_translation(OFF_STAGE),
        dormant_layers(membership),
    ));
    Ok(entity)
}
