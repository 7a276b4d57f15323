//! Stand-in player for headless runs.
//!
//! Writes [`PlayerIntent`] the way the keyboard and mouse would: aim at the
//! nearest enemy and shoot, back away from anything close, stay inside the
//! arena, and always take the first upgrade on offer.

use bevy::prelude::*;

use crate::common::pool::{Enemies, EntityPool};
use crate::common::state::GameState;
use crate::plugins::enemies::Enemy;
use crate::plugins::player::Player;
use crate::plugins::player::intent::PlayerIntent;
use crate::plugins::player::upgrades::{ChooseUpgrade, apply_chosen_upgrade};
use crate::plugins::world::ArenaBounds;

const PERSONAL_SPACE: f32 = 220.0;
const NOVA_RANGE: f32 = 150.0;

pub fn plugin(app: &mut App) {
    app.add_systems(Update, steer.run_if(in_state(GameState::Playing)))
        .add_systems(
            Update,
            take_first_upgrade
                .before(apply_chosen_upgrade)
                .run_if(in_state(GameState::LevelUp)),
        );
}

pub(crate) fn steer(
    bounds: Res<ArenaBounds>,
    pool: Res<EntityPool<Enemies>>,
    q_enemies: Query<(&Enemy, &Transform), Without<Player>>,
    player: Single<(&Player, &Transform)>,
    mut intent: ResMut<PlayerIntent>,
) {
    let (player, tf) = player.into_inner();
    let pos = tf.translation.truncate();

    let nearest = pool
        .live()
        .filter_map(|(_, e)| q_enemies.get(e).ok())
        .filter(|(enemy, _)| !enemy.is_dead)
        .map(|(_, etf)| etf.translation.truncate() - pos)
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()));

    let mut move_axis = Vec2::ZERO;
    intent.fire = false;
    intent.ability = false;

    if let Some(offset) = nearest {
        intent.aim = offset.normalize_or_zero();
        intent.fire = true;
        let dist = offset.length();
        if dist < PERSONAL_SPACE {
            move_axis -= intent.aim;
        }
        intent.ability = dist < NOVA_RANGE;
    }

    // Drift home before the danger zone does it for us.
    if !bounds.contains(pos * 1.25) {
        move_axis -= pos.normalize_or_zero();
    }
    intent.move_axis = move_axis.normalize_or_zero();
    intent.reload = player.ammo == 0 && !player.reloading;
}

fn take_first_upgrade(mut picks: MessageWriter<ChooseUpgrade>) {
    picks.write(ChooseUpgrade { index: 0 });
}
