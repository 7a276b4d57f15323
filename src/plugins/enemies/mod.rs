//! Enemies plugin: pooled enemies and their per-tick behavior.
//!
//! ---------------------------
//! HOW THIS IS DESIGNED (ECS)
//! ---------------------------
//! 1) FACTS live in the [`Enemy`] component: variant, template, hp, speed,
//!    the `is_dead` guard, knockback and gun cooldown state.
//!
//! 2) RULES mutate facts in predictable places:
//!    - `steer_enemies` (Behavior) moves, aims, shoots and detonates.
//!    - combat resolution calls [`Enemy::take_damage`] and reports deaths as
//!      [`EnemyDown`] messages.
//!    - death settlement (combat plugin, Cleanup) releases the slot.
//!
//! 3) LIFECYCLE never despawns:
//! ```text
//!   pool.acquire ──► spawn_enemy writes template values ──► alive
//!        ▲                                                   │ hp <= 0 (is_dead = true, once)
//!        │                                                   ▼
//!   release_and_park ◄── settle_enemy_deaths ◄──────── EnemyDown
//!        ▲
//!        └──────────── cull_far_enemies (no reward)
//! ```
//!
//! A parked enemy keeps its stale `Pooled` handle, so `pool.is_live` is the
//! "is this enemy in play" test everywhere.

pub mod template;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::clock::{GameClock, GameTime, TimerAction, TimerElapsed, TimerHandle, TimerQueue};
use crate::common::config::RunConfig;
use crate::common::events::{FeedbackCue, SoundCue};
use crate::common::layers::{Layer, dormant_layers, enemy_layers};
use crate::common::pool::{Enemies, EntityPool, PoolError, PoolHandle, Pooled, release_and_park};
use crate::common::state::RunScoped;
use crate::common::tunables::Tunables;
use crate::plugins::abilities::TimeDilation;
use crate::plugins::core::{SimSet, fire_due_timers};
use crate::plugins::director::DifficultyState;
use crate::plugins::physics::sensor_body;
use crate::plugins::player::{Player, PlayerHit};
use crate::plugins::projectiles::messages::SpawnBulletRequest;
use crate::plugins::world::ArenaBounds;

use template::{BASE_RADIUS, EnemyKind, EnemyTemplate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Already dead: nothing happened.
    Ignored,
    Alive,
    Died,
}

#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub template: EnemyTemplate,
    pub hp: f32,
    pub base_speed: f32,
    /// `base_speed` times the global multiplier, refreshed every tick.
    pub current_speed: f32,
    pub score_value: f64,
    pub is_dead: bool,
    pub shoot_ready_at: GameTime,
    pub knocked_back: bool,
    knockback_timer: Option<TimerHandle>,
    /// Drift direction for variants that ignore the target.
    pub heading: Vec2,
    /// Weak reference; never owned.
    pub target: Option<Entity>,
}

impl Enemy {
    pub fn spawned(
        kind: EnemyKind,
        target: Option<Entity>,
        heading: Vec2,
        speed_multiplier: f32,
        now: GameTime,
    ) -> Self {
        let template = kind.template();
        let first_shot = template.gun.map_or(0, |g| g.fire_rate_ms);
        Self {
            kind,
            template,
            hp: template.hp,
            base_speed: template.speed,
            current_speed: template.speed * speed_multiplier,
            score_value: template.score,
            is_dead: false,
            shoot_ready_at: now.after(first_shot),
            knocked_back: false,
            knockback_timer: None,
            heading: heading.normalize_or(Vec2::X),
            target,
        }
    }

    #[inline]
    pub fn indestructible(&self) -> bool {
        self.template.indestructible()
    }

    /// The single damage entry point.
    ///
    /// Exactly one call per enemy lifetime returns `Died`; every later call is
    /// `Ignored`. Indestructible enemies absorb everything.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead {
            return DamageOutcome::Ignored;
        }
        if self.indestructible() {
            return DamageOutcome::Alive;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.is_dead = true;
            DamageOutcome::Died
        } else {
            DamageOutcome::Alive
        }
    }

    /// Enter the knockback sub-state until `now + ms`, replacing any running one.
    pub fn begin_knockback(
        &mut self,
        handle: PoolHandle<Enemies>,
        now: GameTime,
        ms: u64,
        queue: &mut TimerQueue,
    ) {
        if let Some(old) = self.knockback_timer.take() {
            queue.cancel(old);
        }
        self.knocked_back = true;
        self.knockback_timer = Some(queue.schedule(now.after(ms), TimerAction::KnockbackEnd(handle)));
    }

    fn end_knockback(&mut self) {
        self.knocked_back = false;
        self.knockback_timer = None;
    }
}

/// An enemy reached zero hp (or detonated) this tick.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct EnemyDown {
    pub handle: PoolHandle<Enemies>,
    pub entity: Entity,
    pub kind: EnemyKind,
    pub position: Vec2,
    pub score_value: f64,
    /// False for self-destructs: the slot is freed but nothing is awarded.
    pub rewarded: bool,
}

/// Where and what to put into a freshly acquired enemy slot.
#[derive(Clone, Copy, Debug)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub position: Vec2,
    pub heading: Vec2,
    pub target: Option<Entity>,
    pub speed_multiplier: f32,
}

pub fn plugin(app: &mut App) {
    let cap = app.world().resource::<RunConfig>().capacities.enemies;
    app.insert_resource(EntityPool::<Enemies>::new(cap))
        .add_message::<EnemyDown>();

    app.add_systems(
        FixedUpdate,
        end_knockback.in_set(SimSet::Timers).after(fire_due_timers),
    )
    .add_systems(FixedUpdate, steer_enemies.in_set(SimSet::Behavior))
    .add_systems(
        FixedUpdate,
        cull_far_enemies
            .in_set(SimSet::Cleanup)
            .after(crate::plugins::combat::settle_enemy_deaths),
    );
}

fn enemy_shell() -> impl Bundle {
    (
        Name::new("Enemy(Pooled)"),
        Sprite {
            color: Color::WHITE,
            custom_size: Some(Vec2::splat(BASE_RADIUS * 2.0)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 1.0),
        Visibility::Hidden,
        sensor_body(BASE_RADIUS, dormant_layers(Layer::Enemy)),
        AngularVelocity::ZERO,
        RunScoped,
    )
}

/// Acquire a slot and write the variant's template onto it.
pub fn spawn_enemy(
    commands: &mut Commands,
    pool: &mut EntityPool<Enemies>,
    spawn: EnemySpawn,
    now: GameTime,
) -> Result<(PoolHandle<Enemies>, Entity), PoolError> {
    let (handle, e) = pool.acquire(|| commands.spawn(enemy_shell()).id())?;
    let enemy = Enemy::spawned(
        spawn.kind,
        spawn.target,
        spawn.heading,
        spawn.speed_multiplier,
        now,
    );
    let spin = enemy.template.asteroid.map_or(0.0, |a| a.spin);

    commands.entity(e).insert((
        Pooled::new(handle),
        Sprite {
            color: enemy.template.tint,
            custom_size: Some(Vec2::splat(BASE_RADIUS * 2.0)),
            ..default()
        },
        Transform::from_translation(spawn.position.extend(1.0))
            .with_scale(Vec3::splat(enemy.template.scale)),
        Visibility::Visible,
        enemy_layers(),
        LinearVelocity::ZERO,
        AngularVelocity(spin),
        enemy,
    ));
    debug!(kind = ?spawn.kind, ?handle, "enemy spawned");
    Ok((handle, e))
}

pub(crate) fn end_knockback(
    mut fired: MessageReader<TimerElapsed>,
    pool: Res<EntityPool<Enemies>>,
    mut q: Query<&mut Enemy>,
) {
    for TimerElapsed(action) in fired.read() {
        let TimerAction::KnockbackEnd(handle) = *action else {
            continue;
        };
        match pool.resolve(handle) {
            Ok(e) => {
                if let Ok(mut enemy) = q.get_mut(e) {
                    enemy.end_knockback();
                }
            }
            Err(err) => debug!("knockback timer outlived its enemy: {err}"),
        }
    }
}

/// Movement, guns and kamikaze triggers for every enemy in play.
pub(crate) fn steer_enemies(
    clock: Res<GameClock>,
    config: Res<RunConfig>,
    difficulty: Res<DifficultyState>,
    dilation: Res<TimeDilation>,
    pool: Res<EntityPool<Enemies>>,
    mut q: Query<
        (
            Entity,
            &mut Enemy,
            &Pooled<Enemies>,
            &mut Transform,
            &mut LinearVelocity,
        ),
        Without<Player>,
    >,
    q_targets: Query<&Transform, (With<Player>, Without<Enemy>)>,
    mut shots: MessageWriter<SpawnBulletRequest>,
    mut hits: MessageWriter<PlayerHit>,
    mut downs: MessageWriter<EnemyDown>,
    mut cues: MessageWriter<FeedbackCue>,
) {
    let now = clock.now();
    let speed_mult = difficulty.speed_multiplier * dilation.factor();
    let damage_mult = config.profile().damage_mult;

    for (e, mut enemy, pooled, mut tf, mut vel) in &mut q {
        if enemy.is_dead || !pool.is_live(pooled.handle) {
            continue;
        }
        enemy.current_speed = enemy.base_speed * speed_mult;

        if enemy.template.asteroid.is_some() {
            vel.0 = enemy.heading * enemy.current_speed;
            continue;
        }
        if enemy.knocked_back {
            continue;
        }

        let Some(target_tf) = enemy.target.and_then(|t| q_targets.get(t).ok()) else {
            vel.0 = Vec2::ZERO;
            continue;
        };
        let pos = tf.translation.truncate();
        let to_target = target_tf.translation.truncate() - pos;
        let dist = to_target.length();
        let dir = to_target.normalize_or_zero();

        vel.0 = dir * enemy.current_speed;
        if dir != Vec2::ZERO {
            tf.rotation = Quat::from_rotation_z(dir.to_angle());
        }

        if let Some(gun) = enemy.template.gun
            && now > enemy.shoot_ready_at
        {
            shots.write(SpawnBulletRequest::enemy(
                pos,
                dir * gun.bullet_speed,
                gun.damage * damage_mult,
            ));
            enemy.shoot_ready_at = now.after(gun.fire_rate_ms);
        }

        if let Some(charge) = enemy.template.kamikaze
            && dist < charge.trigger_distance
        {
            if dist <= charge.blast_radius {
                hits.write(PlayerHit::regular(charge.damage * damage_mult));
            }
            let lethal = enemy.hp;
            if enemy.take_damage(lethal) == DamageOutcome::Died {
                downs.write(EnemyDown {
                    handle: pooled.handle,
                    entity: e,
                    kind: enemy.kind,
                    position: pos,
                    score_value: enemy.score_value,
                    rewarded: false,
                });
                cues.write(FeedbackCue::Sound(SoundCue::Explosion));
                cues.write(FeedbackCue::CameraShake {
                    duration_ms: 200,
                    intensity: 0.02,
                });
            }
        }
    }
}

/// Release enemies that wandered far outside the arena. No reward.
pub(crate) fn cull_far_enemies(
    mut commands: Commands,
    bounds: Res<ArenaBounds>,
    tunables: Res<Tunables>,
    mut pool: ResMut<EntityPool<Enemies>>,
    q: Query<(&Enemy, &Pooled<Enemies>, &Transform)>,
) {
    for (enemy, pooled, tf) in &q {
        if enemy.is_dead || enemy.template.boss || !pool.is_live(pooled.handle) {
            continue;
        }
        if !bounds.is_far_outside(tf.translation.truncate(), tunables.offscreen_margin) {
            continue;
        }
        if let Err(e) = release_and_park(&mut commands, &mut pool, pooled.handle, Layer::Enemy) {
            debug!("cull skipped: {e}");
        }
    }
}
