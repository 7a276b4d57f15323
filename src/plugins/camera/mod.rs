//! Camera plugin (render-only).
//!
//! The camera eases toward the player and plays back the simulation's
//! [`FeedbackCue`] camera effects: shake jitters around the followed anchor,
//! flash briefly brightens the clear colour.
//!
//! Queries use `Without<...>` filters so the player's `&Transform` and the
//! camera's `&mut Transform` are provably disjoint.

use bevy::prelude::*;
use bevy_firefly::prelude::*;
use rand::Rng;

use crate::common::events::FeedbackCue;
use crate::plugins::player::Player;

const BACKGROUND: Color = Color::srgb(0.02, 0.02, 0.05);
const FLASH: Color = Color::srgb(0.45, 0.45, 0.6);
/// Shake intensity is a fraction of this many pixels.
const SHAKE_SCALE: f32 = 1000.0;

#[derive(Component, Debug)]
pub struct MainCamera {
    pub responsiveness: f32,
    /// Followed position without shake.
    anchor: Vec2,
    shake_left: f32,
    shake_intensity: f32,
    flash_left: f32,
}

impl MainCamera {
    fn new(responsiveness: f32) -> Self {
        Self {
            responsiveness,
            anchor: Vec2::ZERO,
            shake_left: 0.0,
            shake_intensity: 0.0,
            flash_left: 0.0,
        }
    }
}

pub fn plugin(app: &mut App) {
    app.insert_resource(ClearColor(BACKGROUND))
        .add_systems(Startup, spawn_camera)
        .add_systems(Update, collect_camera_cues)
        .add_systems(
            PostUpdate,
            follow_player.before(TransformSystems::Propagate),
        );
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera::new(5.0),
        FireflyConfig::default(),
        Transform::from_xyz(0.0, 0.0, 999.0),
    ));
}

fn collect_camera_cues(mut cues: MessageReader<FeedbackCue>, camera: Single<&mut MainCamera>) {
    let mut camera = camera.into_inner();
    for cue in cues.read() {
        match *cue {
            FeedbackCue::CameraShake {
                duration_ms,
                intensity,
            } => {
                camera.shake_left = camera.shake_left.max(duration_ms as f32 / 1000.0);
                camera.shake_intensity = camera.shake_intensity.max(intensity);
            }
            FeedbackCue::CameraFlash { duration_ms } => {
                camera.flash_left = camera.flash_left.max(duration_ms as f32 / 1000.0);
            }
            FeedbackCue::HitFlash(_) | FeedbackCue::Sound(_) => {}
        }
    }
}

fn follow_player(
    time: Res<Time>,
    mut clear: ResMut<ClearColor>,
    player: Single<&Transform, (With<Player>, Without<MainCamera>)>,
    camera: Single<(&mut Transform, &mut MainCamera), Without<Player>>,
) {
    let (mut tf, mut cam) = camera.into_inner();
    let dt = time.delta_secs();
    let alpha = 1.0 - (-cam.responsiveness * dt).exp();

    let target = player.translation.truncate();
    cam.anchor = cam.anchor + (target - cam.anchor) * alpha;

    let mut offset = Vec2::ZERO;
    if cam.shake_left > 0.0 {
        let reach = cam.shake_intensity * SHAKE_SCALE;
        let mut rng = rand::thread_rng();
        offset = Vec2::new(rng.gen_range(-reach..=reach), rng.gen_range(-reach..=reach));
        cam.shake_left -= dt;
        if cam.shake_left <= 0.0 {
            cam.shake_intensity = 0.0;
        }
    }
    tf.translation.x = cam.anchor.x + offset.x;
    tf.translation.y = cam.anchor.y + offset.y;

    if cam.flash_left > 0.0 {
        cam.flash_left -= dt;
        clear.0 = FLASH;
    } else {
        clear.0 = BACKGROUND;
    }
}
