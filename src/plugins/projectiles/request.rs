use bevy::prelude::*;

use crate::common::clock::{GameClock, TimerQueue};
use crate::common::events::{FeedbackCue, GameEvent, SoundCue};
use crate::common::rng::SimRng;
use crate::common::tunables::Tunables;
use crate::plugins::player::Player;
use crate::plugins::player::intent::PlayerIntent;

use super::messages::SpawnBulletRequest;

/// Producer: turn a held trigger into bullet requests.
///
/// One volley costs one round. An empty magazine (or the last round) starts a reload.
pub fn fire_player_weapon(
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    intent: Res<PlayerIntent>,
    mut rng: ResMut<SimRng>,
    mut queue: ResMut<TimerQueue>,
    mut requests: MessageWriter<SpawnBulletRequest>,
    mut events: MessageWriter<GameEvent>,
    mut cues: MessageWriter<FeedbackCue>,
    player: Single<(&mut Player, &Transform)>,
) {
    if !intent.fire {
        return;
    }
    let (mut player, tf) = player.into_inner();
    let player = &mut *player;
    if !player.is_alive() || player.reloading {
        return;
    }

    let now = clock.now();
    if player.ammo == 0 {
        if player.begin_reload(now, tunables.reload_ms, &mut queue) {
            events.write(GameEvent::ReloadStarted);
        }
        return;
    }

    let origin = tf.translation.truncate() + player.aim * tunables.muzzle_offset;
    let Some(volley) = player
        .weapon
        .fire(now, origin, player.aim, &player.stats, &mut rng.0)
    else {
        return;
    };

    player.ammo -= 1;
    player.impulse += volley.recoil;
    events.write(player.ammo_event());
    requests.write_batch(volley.shots);
    cues.write(FeedbackCue::CameraShake {
        duration_ms: 50,
        intensity: volley.shake,
    });
    cues.write(FeedbackCue::Sound(SoundCue::Shoot));

    if player.ammo == 0 && player.begin_reload(now, tunables.reload_ms, &mut queue) {
        events.write(GameEvent::ReloadStarted);
    }
}
