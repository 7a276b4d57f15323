//! Active abilities.
//!
//! The player holds at most one. Using it checks the cooldown, stamps the next
//! ready time and applies one effect:
//! - Time Slow scales every enemy's speed through [`TimeDilation`]. Enemy speed
//!   is recomputed each tick from the current difficulty multiplier, so
//!   escalations during the slow are kept when it ends.
//! - Nova Blast damages everything in a radius; kills go through the normal
//!   death settlement, survivors are flung outward.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::clock::{GameClock, GameTime, TimerAction, TimerElapsed, TimerHandle, TimerQueue};
use crate::common::events::{FeedbackCue, GameEvent, SoundCue};
use crate::common::pool::{Enemies, EntityPool, Pooled};
use crate::common::tunables::Tunables;
use crate::plugins::core::{SimSet, fire_due_timers};
use crate::plugins::enemies::{DamageOutcome, Enemy, EnemyDown};
use crate::plugins::player::Player;
use crate::plugins::player::intent::PlayerIntent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbilityId {
    TimeSlow,
    NovaBlast,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbilityEffect {
    TimeDilation { duration_ms: u64, factor: f32 },
    AreaBlast { radius: f32, damage: f32, force: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilityTemplate {
    pub cooldown_ms: u64,
    pub effect: AbilityEffect,
}

impl AbilityId {
    pub fn template(self) -> AbilityTemplate {
        match self {
            AbilityId::TimeSlow => AbilityTemplate {
                cooldown_ms: 15_000,
                effect: AbilityEffect::TimeDilation {
                    duration_ms: 5_000,
                    factor: 0.3,
                },
            },
            AbilityId::NovaBlast => AbilityTemplate {
                cooldown_ms: 10_000,
                effect: AbilityEffect::AreaBlast {
                    radius: 300.0,
                    damage: 10.0,
                    force: 500.0,
                },
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ability {
    pub id: AbilityId,
    pub cooldown_ready_at: GameTime,
}

impl Ability {
    /// A freshly granted ability is ready at once.
    pub fn new(id: AbilityId) -> Self {
        Self {
            id,
            cooldown_ready_at: GameTime::ZERO,
        }
    }

    #[inline]
    pub fn is_ready(&self, now: GameTime) -> bool {
        now >= self.cooldown_ready_at
    }

    /// Start the cooldown and hand back the effect, or `None` while cooling down.
    pub fn activate(&mut self, now: GameTime) -> Option<AbilityEffect> {
        if !self.is_ready(now) {
            return None;
        }
        let template = self.id.template();
        self.cooldown_ready_at = now.after(template.cooldown_ms);
        Some(template.effect)
    }
}

/// Global factor on enemy speed. 1.0 when no slow is running.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct TimeDilation {
    pub factor: f32,
    timer: Option<TimerHandle>,
}

impl Default for TimeDilation {
    fn default() -> Self {
        Self {
            factor: 1.0,
            timer: None,
        }
    }
}

impl TimeDilation {
    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    pub fn begin(&mut self, factor: f32, now: GameTime, duration_ms: u64, queue: &mut TimerQueue) {
        if let Some(old) = self.timer.take() {
            queue.cancel(old);
        }
        self.factor = factor;
        self.timer = Some(queue.schedule(now.after(duration_ms), TimerAction::TimeDilationEnd));
    }

    pub fn end(&mut self) {
        self.factor = 1.0;
        self.timer = None;
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<TimeDilation>()
        .add_systems(
            FixedUpdate,
            end_time_dilation.in_set(SimSet::Timers).after(fire_due_timers),
        )
        .add_systems(FixedUpdate, use_ability.in_set(SimSet::Abilities));
}

pub(crate) fn end_time_dilation(
    mut fired: MessageReader<TimerElapsed>,
    mut dilation: ResMut<TimeDilation>,
) {
    if fired
        .read()
        .any(|TimerElapsed(action)| *action == TimerAction::TimeDilationEnd)
    {
        dilation.end();
        debug!("time dilation over");
    }
}

pub(crate) fn use_ability(
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    intent: Res<PlayerIntent>,
    pool: Res<EntityPool<Enemies>>,
    mut queue: ResMut<TimerQueue>,
    mut dilation: ResMut<TimeDilation>,
    mut events: MessageWriter<GameEvent>,
    mut cues: MessageWriter<FeedbackCue>,
    mut downs: MessageWriter<EnemyDown>,
    player: Single<(&mut Player, &Transform)>,
    mut q_enemies: Query<
        (Entity, &mut Enemy, &Pooled<Enemies>, &Transform, &mut LinearVelocity),
        Without<Player>,
    >,
) {
    if !intent.ability {
        return;
    }
    let (mut player, player_tf) = player.into_inner();
    if !player.is_alive() {
        return;
    }
    let now = clock.now();
    let Some(ability) = player.ability.as_mut() else {
        return;
    };
    let id = ability.id;
    let Some(effect) = ability.activate(now) else {
        return;
    };

    info!(?id, "ability used");
    events.write(GameEvent::AbilityUsed(id));
    cues.write(FeedbackCue::Sound(SoundCue::Ability));

    match effect {
        AbilityEffect::TimeDilation { duration_ms, factor } => {
            dilation.begin(factor, now, duration_ms, &mut queue);
        }
        AbilityEffect::AreaBlast { radius, damage, force } => {
            cues.write(FeedbackCue::CameraFlash { duration_ms: 200 });
            cues.write(FeedbackCue::CameraShake {
                duration_ms: 300,
                intensity: 0.03,
            });

            let center = player_tf.translation.truncate();
            for (e, mut enemy, pooled, tf, mut vel) in &mut q_enemies {
                if enemy.is_dead || !pool.is_live(pooled.handle) {
                    continue;
                }
                let pos = tf.translation.truncate();
                if pos.distance(center) > radius {
                    continue;
                }

                cues.write(FeedbackCue::HitFlash(e));
                match enemy.take_damage(damage) {
                    DamageOutcome::Died => {
                        downs.write(EnemyDown {
                            handle: pooled.handle,
                            entity: e,
                            kind: enemy.kind,
                            position: pos,
                            score_value: enemy.score_value,
                            rewarded: true,
                        });
                    }
                    // Asteroids absorb the blast without being pushed.
                    DamageOutcome::Alive if !enemy.indestructible() => {
                        vel.0 += (pos - center).normalize_or(Vec2::X) * force;
                        enemy.begin_knockback(pooled.handle, now, tunables.knockback_ms, &mut queue);
                    }
                    DamageOutcome::Alive | DamageOutcome::Ignored => {}
                }
            }
        }
    }
}
