//! Core plugin: shared resources, the tick pipeline and the game clock.
//!
//! One simulation tick is one run of `FixedUpdate`. Gameplay systems slot into
//! an ordered chain of [`SimSet`]s:
//!
//! ```text
//! Clock ─► Timers ─► Director ─► Behavior ─► Fire ─► Resolve ─► Abilities ─► Cleanup
//!   │        │          │           │          │        │           │           │
//!   │        │          │           │          │        │           │           └ settle deaths, drops, level-up, game over
//!   │        │          │           │          │        │           └ ability intent + effects
//!   │        │          │           │          │        └ overlaps → damage, contacts, pickups
//!   │        │          │           │          └ weapons → bullet requests → pool
//!   │        │          │           └ player / enemy / drone movement and attacks
//!   │        │          └ escalation, regular spawns, boss milestones, combo decay
//!   │        └ due timers → TimerElapsed
//!   └ GameClock += fixed timestep
//! ```
//!
//! The whole chain only runs in `GameState::Playing`; leaving that state
//! freezes the clock and with it every pending timer.

use bevy::prelude::*;

use crate::common::clock::{GameClock, TimerElapsed, TimerQueue};
use crate::common::config::RunConfig;
use crate::common::events::{FeedbackCue, GameEvent};
use crate::common::rng::SimRng;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    Clock,
    Timers,
    Director,
    Behavior,
    Fire,
    Resolve,
    Abilities,
    Cleanup,
}

/// Request to flip between `Playing` and `Paused`.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct TogglePause;

pub fn plugin(app: &mut App) {
    app.init_resource::<RunConfig>();
    let seed = app.world().resource::<RunConfig>().seed;

    app.insert_resource(Tunables::default())
        .insert_resource(SimRng::seeded(seed))
        .init_resource::<GameClock>()
        .init_resource::<TimerQueue>();

    app.add_message::<GameEvent>()
        .add_message::<FeedbackCue>()
        .add_message::<TimerElapsed>()
        .add_message::<TogglePause>();

    app.configure_sets(
        FixedUpdate,
        (
            SimSet::Clock,
            SimSet::Timers,
            SimSet::Director,
            SimSet::Behavior,
            SimSet::Fire,
            SimSet::Resolve,
            SimSet::Abilities,
            SimSet::Cleanup,
        )
            .chain()
            .run_if(in_state(GameState::Playing)),
    );

    app.add_systems(FixedUpdate, advance_clock.in_set(SimSet::Clock))
        .add_systems(FixedUpdate, fire_due_timers.in_set(SimSet::Timers))
        .add_systems(Update, (pause_from_keyboard, apply_pause_toggle).chain());
}

pub(crate) fn advance_clock(time: Res<Time<Fixed>>, mut clock: ResMut<GameClock>) {
    clock.advance(time.timestep());
}

/// Drain every timer whose deadline has been reached.
///
/// Consumers order themselves `.after(fire_due_timers)` inside `SimSet::Timers`.
pub fn fire_due_timers(
    clock: Res<GameClock>,
    mut queue: ResMut<TimerQueue>,
    mut out: MessageWriter<TimerElapsed>,
) {
    for action in queue.drain_due(clock.now()) {
        out.write(TimerElapsed(action));
    }
}

fn pause_from_keyboard(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut out: MessageWriter<TogglePause>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(KeyCode::Escape) {
        out.write(TogglePause);
    }
}

fn apply_pause_toggle(
    mut requests: MessageReader<TogglePause>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
) {
    // Several toggles in one frame collapse into their parity.
    let flips = requests.read().count();
    if flips % 2 == 0 {
        return;
    }
    match state.get() {
        GameState::Playing => {
            info!("run paused");
            next.set(GameState::Paused);
        }
        GameState::Paused => {
            info!("run resumed");
            next.set(GameState::Playing);
        }
        GameState::LevelUp | GameState::GameOver => {}
    }
}
