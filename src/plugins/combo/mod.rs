//! Kill streaks.
//!
//! A kill within the decay window of the previous one extends the streak;
//! longer streaks multiply score and XP. The window is also checked every tick
//! so an idle streak drops back to (0, x1) without waiting for the next kill.

use bevy::prelude::*;

use crate::common::clock::{GameClock, GameTime};
use crate::common::config::RunConfig;
use crate::common::events::GameEvent;
use crate::plugins::core::SimSet;

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct ComboState {
    pub combo: u32,
    pub multiplier: u32,
    pub last_kill: Option<GameTime>,
    pub decay_ms: u64,
}

impl ComboState {
    pub fn new(decay_ms: u64) -> Self {
        Self {
            combo: 0,
            multiplier: 1,
            last_kill: None,
            decay_ms,
        }
    }

    pub fn multiplier_for(combo: u32) -> u32 {
        match combo {
            30.. => 4,
            15.. => 3,
            5.. => 2,
            _ => 1,
        }
    }

    pub fn register_kill(&mut self, now: GameTime) {
        if let Some(last) = self.last_kill
            && now.since(last) > self.decay_ms
        {
            self.combo = 0;
        }
        self.combo += 1;
        self.last_kill = Some(now);
        self.multiplier = Self::multiplier_for(self.combo);
    }

    /// Per-tick decay. Returns true if the streak was dropped.
    pub fn tick(&mut self, now: GameTime) -> bool {
        match self.last_kill {
            Some(last) if self.combo > 0 && now.since(last) >= self.decay_ms => self.reset(),
            _ => false,
        }
    }

    /// Drop the streak. Returns true if there was one.
    pub fn reset(&mut self) -> bool {
        let had_streak = self.combo > 0;
        self.combo = 0;
        self.multiplier = 1;
        had_streak
    }

    pub fn event(&self) -> GameEvent {
        GameEvent::ComboChanged {
            combo: self.combo,
            multiplier: self.multiplier,
        }
    }
}

pub fn plugin(app: &mut App) {
    let decay = app.world().resource::<RunConfig>().combo_decay_ms;
    app.insert_resource(ComboState::new(decay))
        .add_systems(FixedUpdate, decay_combo.in_set(SimSet::Director));
}

pub(crate) fn decay_combo(
    clock: Res<GameClock>,
    mut combo: ResMut<ComboState>,
    mut events: MessageWriter<GameEvent>,
) {
    if combo.tick(clock.now()) {
        events.write(combo.event());
    }
}
