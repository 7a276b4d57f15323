//! Damage and death resolution.
//!
//! # Flow (one tick)
//! ```text
//! Resolve / OverlapConsumers
//!   resolve_bullet_hits      Overlap(player shot, enemy)  ─► take_damage ─► EnemyDown | knockback
//!   resolve_player_contacts  Overlap(player, enemy)       ─► PlayerHit (+ enemy bounce)
//!                            Overlap(player, enemy shot)  ─► PlayerHit, shot spent
//! Abilities
//!   nova blast                                            ─► EnemyDown
//! Cleanup
//!   settle_enemy_deaths      EnemyDown ─► release slot, score, combo, XP, drops
//! ```
//!
//! Every kill, whatever caused it, is settled in one place. Releasing the slot
//! is the idempotence guard: a second `EnemyDown` for the same handle fails the
//! pool's generation check and is dropped before anything is awarded.

use avian2d::prelude::*;
use bevy::prelude::*;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::common::clock::{GameClock, TimerQueue};
use crate::common::config::RunConfig;
use crate::common::events::{FeedbackCue, GameEvent, KillReward, SoundCue};
use crate::common::layers::Layer;
use crate::common::pool::{Enemies, EnemyShots, EntityPool, PlayerShots, Pooled, release_and_park};
use crate::common::rng::SimRng;
use crate::common::tunables::Tunables;
use crate::plugins::combo::ComboState;
use crate::plugins::director::DifficultyState;
use crate::plugins::enemies::{DamageOutcome, Enemy, EnemyDown};
use crate::plugins::physics::{Overlap, OverlapConsumers};
use crate::plugins::pickups::{PickupKind, PowerupKind, SpawnPickup};
use crate::plugins::player::{Player, PlayerHit, award_xp};
use crate::plugins::projectiles::components::{Bullet, BulletState};
use crate::plugins::core::SimSet;

/// Orbs land within this distance of a dead boss.
const ORB_SCATTER: f32 = 60.0;

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct Scoreboard {
    pub score: f64,
    /// Set once the game-over report has been made.
    pub finished: bool,
}

impl Scoreboard {
    /// The score as reported to the outside.
    #[inline]
    pub fn floored(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<Scoreboard>()
        .add_systems(
            FixedUpdate,
            (resolve_bullet_hits, resolve_player_contacts).in_set(OverlapConsumers),
        )
        .add_systems(FixedUpdate, settle_enemy_deaths.in_set(SimSet::Cleanup));
}

pub(crate) fn resolve_bullet_hits(
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    pool: Res<EntityPool<Enemies>>,
    mut queue: ResMut<TimerQueue>,
    mut overlaps: MessageReader<Overlap>,
    mut q_bullets: Query<(&mut Bullet, &mut BulletState, &Transform), With<Pooled<PlayerShots>>>,
    mut q_enemies: Query<(&mut Enemy, &Pooled<Enemies>, &Transform, &mut LinearVelocity)>,
    mut downs: MessageWriter<EnemyDown>,
    mut cues: MessageWriter<FeedbackCue>,
) {
    let now = clock.now();

    for overlap in overlaps.read() {
        let Ok((mut bullet, mut state, bullet_tf)) = q_bullets.get_mut(overlap.a) else {
            continue;
        };
        if *state != BulletState::Active {
            continue;
        }
        let Ok((mut enemy, pooled, enemy_tf, mut vel)) = q_enemies.get_mut(overlap.b) else {
            continue;
        };
        let handle = pooled.handle;
        if enemy.is_dead || !pool.is_live(handle) {
            continue;
        }

        if bullet.piercing {
            if !bullet.record_hit(handle) {
                continue;
            }
        } else {
            *state = BulletState::PendingReturn;
        }

        cues.write(FeedbackCue::HitFlash(overlap.b));
        cues.write(FeedbackCue::Sound(SoundCue::Hit));

        let position = enemy_tf.translation.truncate();
        match enemy.take_damage(bullet.damage) {
            DamageOutcome::Died => {
                downs.write(EnemyDown {
                    handle,
                    entity: overlap.b,
                    kind: enemy.kind,
                    position,
                    score_value: enemy.score_value,
                    rewarded: true,
                });
            }
            DamageOutcome::Alive if !enemy.indestructible() => {
                let away = (position - bullet_tf.translation.truncate()).normalize_or(Vec2::X);
                vel.0 = away * tunables.knockback_speed;
                enemy.begin_knockback(handle, now, tunables.knockback_ms, &mut queue);
            }
            DamageOutcome::Alive | DamageOutcome::Ignored => {}
        }
    }
}

pub(crate) fn resolve_player_contacts(
    clock: Res<GameClock>,
    config: Res<RunConfig>,
    tunables: Res<Tunables>,
    pool: Res<EntityPool<Enemies>>,
    mut queue: ResMut<TimerQueue>,
    mut overlaps: MessageReader<Overlap>,
    player: Single<(Entity, &Transform), With<Player>>,
    mut q_enemies: Query<
        (&mut Enemy, &Pooled<Enemies>, &Transform, &mut LinearVelocity),
        Without<Player>,
    >,
    mut q_shots: Query<(&Bullet, &mut BulletState), With<Pooled<EnemyShots>>>,
    mut hits: MessageWriter<PlayerHit>,
) {
    let (player_e, player_tf) = player.into_inner();
    let player_pos = player_tf.translation.truncate();
    let damage_mult = config.profile().damage_mult;
    let now = clock.now();

    for overlap in overlaps.read() {
        if overlap.a != player_e {
            continue;
        }

        if let Ok((mut enemy, pooled, tf, mut vel)) = q_enemies.get_mut(overlap.b) {
            if enemy.is_dead || !pool.is_live(pooled.handle) {
                continue;
            }
            let enemy_pos = tf.translation.truncate();

            if let Some(rock) = enemy.template.asteroid {
                let push = (player_pos - enemy_pos).normalize_or(Vec2::X) * rock.knockback;
                hits.write(PlayerHit::regular(rock.damage).with_impulse(push));
                continue;
            }

            hits.write(PlayerHit::regular(tunables.contact_damage * damage_mult));
            let away = (enemy_pos - player_pos).normalize_or(Vec2::X);
            vel.0 = away * tunables.contact_bounce;
            enemy.begin_knockback(pooled.handle, now, tunables.knockback_ms, &mut queue);
            continue;
        }

        if let Ok((bullet, mut state)) = q_shots.get_mut(overlap.b)
            && *state == BulletState::Active
        {
            hits.write(PlayerHit::regular(bullet.damage));
            *state = BulletState::PendingReturn;
        }
    }
}

/// Release every enemy reported down this tick and hand out its reward.
pub fn settle_enemy_deaths(
    mut commands: Commands,
    clock: Res<GameClock>,
    config: Res<RunConfig>,
    tunables: Res<Tunables>,
    mut rng: ResMut<SimRng>,
    mut pool: ResMut<EntityPool<Enemies>>,
    mut scoreboard: ResMut<Scoreboard>,
    mut combo: ResMut<ComboState>,
    mut difficulty: ResMut<DifficultyState>,
    mut downs: MessageReader<EnemyDown>,
    mut events: MessageWriter<GameEvent>,
    mut cues: MessageWriter<FeedbackCue>,
    mut drops: MessageWriter<SpawnPickup>,
    mut player: Option<Single<&mut Player>>,
) {
    let now = clock.now();
    let score_mult = config.profile().score_mult;

    for down in downs.read() {
        if let Err(e) = release_and_park(&mut commands, &mut pool, down.handle, Layer::Enemy) {
            debug!("duplicate death ignored: {e}");
            continue;
        }
        cues.write(FeedbackCue::Sound(SoundCue::Explosion));

        let was_boss = difficulty.boss_down(down.handle);
        if was_boss {
            info!("boss defeated");
            cues.write(FeedbackCue::CameraShake {
                duration_ms: 500,
                intensity: 0.03,
            });
        }
        if !down.rewarded {
            continue;
        }

        let points = down.score_value * f64::from(score_mult) * f64::from(combo.multiplier);
        scoreboard.score += points;

        combo.register_kill(now);
        events.write(combo.event());

        let xp = tunables.xp_per_kill * combo.multiplier as f32;
        if let Some(player) = player.as_deref_mut() {
            award_xp(player, xp, tunables.xp_growth, &mut events);
            if player.register_kill(tunables.vampirism_every, tunables.vampirism_heal) {
                events.write(player.hp_event());
            }
        }

        events.write(GameEvent::EnemyKilled {
            kind: down.kind,
            position: down.position,
            reward: KillReward { score: points, xp },
        });

        if rng.0.gen_bool(tunables.powerup_chance.clamp(0.0, 1.0))
            && let Some(&kind) = PowerupKind::ALL.choose(&mut rng.0)
        {
            drops.write(SpawnPickup {
                kind: PickupKind::Powerup(kind),
                position: down.position,
            });
        }

        if was_boss {
            for _ in 0..tunables.boss_orbs {
                let offset = Vec2::new(
                    rng.0.gen_range(-ORB_SCATTER..=ORB_SCATTER),
                    rng.0.gen_range(-ORB_SCATTER..=ORB_SCATTER),
                );
                drops.write(SpawnPickup {
                    kind: PickupKind::XpOrb {
                        value: tunables.orb_value,
                    },
                    position: down.position + offset,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests;
