//! Abstract per-tick player intent.
//!
//! The simulation only ever reads [`PlayerIntent`]. In the windowed app it is
//! filled from keyboard and mouse every frame; headless drivers and tests write
//! it directly.
//!
//! `reload` is latched: a press survives until a fixed tick consumes it, so a
//! frame without a tick cannot swallow it.

use bevy::prelude::*;

use crate::plugins::camera::MainCamera;
use crate::plugins::player::Player;

#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct PlayerIntent {
    pub move_axis: Vec2,
    /// Direction from the player toward the aim point. Zero keeps the previous aim.
    pub aim: Vec2,
    pub fire: bool,
    pub ability: bool,
    pub reload: bool,
    pub dash: bool,
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<PlayerIntent>()
        .add_systems(Update, gather_input);
}

fn gather_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    windows: Query<&Window>,
    q_camera: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    q_player: Query<&Transform, With<Player>>,
    mut intent: ResMut<PlayerIntent>,
) {
    let Some(keys) = keys else {
        return;
    };

    let mut axis = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }
    intent.move_axis = axis.normalize_or_zero();

    intent.dash = keys.pressed(KeyCode::Space);
    intent.ability = keys.pressed(KeyCode::KeyQ);
    intent.reload |= keys.just_pressed(KeyCode::KeyR);
    intent.fire = buttons.is_some_and(|b| b.pressed(MouseButton::Left));

    if let Some(aim) = cursor_aim(&windows, &q_camera, &q_player) {
        intent.aim = aim;
    }
}

fn cursor_aim(
    windows: &Query<&Window>,
    q_camera: &Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    q_player: &Query<&Transform, With<Player>>,
) -> Option<Vec2> {
    let cursor = windows.single().ok()?.cursor_position()?;
    let (camera, camera_tf) = q_camera.single().ok()?;
    let world_cursor = camera.viewport_to_world_2d(camera_tf, cursor).ok()?;
    let origin = q_player.single().ok()?.translation.truncate();
    (world_cursor - origin).try_normalize()
}
