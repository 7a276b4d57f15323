//! Lighting plugin (Firefly) (render-only).
//!
//! One point light rides on the player and turns red inside the danger zone.

use bevy::prelude::*;
use bevy_firefly::prelude::*;

use crate::plugins::player::Player;

const SAFE: Color = Color::srgb(0.55, 0.9, 1.0);
const DANGER: Color = Color::srgb(1.0, 0.2, 0.15);

#[derive(Component)]
pub struct PlayerLight;

pub fn plugin(app: &mut App) {
    if !app.is_plugin_added::<FireflyPlugin>() {
        app.add_plugins(FireflyPlugin);
    }

    app.add_systems(Startup, setup)
        .add_systems(Update, follow_player_light);
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Name::new("PlayerLight"),
        PlayerLight,
        PointLight2d {
            color: SAFE,
            radius: 450.0,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 10.0),
    ));
}

fn follow_player_light(
    q_player: Query<(&Player, &Transform), Without<PlayerLight>>,
    mut q_light: Query<(&mut Transform, &mut PointLight2d), (With<PlayerLight>, Without<Player>)>,
) {
    let Ok((player, tf_player)) = q_player.single() else {
        return;
    };
    let Ok((mut tf_light, mut light)) = q_light.single_mut() else {
        return;
    };

    tf_light.translation.x = tf_player.translation.x;
    tf_light.translation.y = tf_player.translation.y;
    light.color = if player.in_danger_zone { DANGER } else { SAFE };
}
