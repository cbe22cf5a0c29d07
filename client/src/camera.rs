use crate::actor::LocalMover;
use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(PostUpdate, follow_local_body);
}

const CAMERA_OFFSET_GLOBAL: Vec3 = Vec3::new(0.0, 9.0, 14.0);
const CAMERA_DECAY_RATE: f32 = 6.0;

fn add_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(CAMERA_OFFSET_GLOBAL).looking_at(Vec3::ZERO, Vec3::Y),
        DistanceFog {
            color: Color::srgba(0.35, 0.48, 0.66, 1.0),
            falloff: FogFalloff::Linear {
                start: 40.0,
                end: 120.0,
            },
            ..default()
        },
    ));
}

/// Trail the local body at a fixed world offset, always looking at it.
fn follow_local_body(
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
    local: Single<&Transform, (With<LocalMover>, Without<Camera3d>)>,
    time: Res<Time>,
) {
    let Ok(mut cam_tf) = camera_query.single_mut() else {
        return;
    };

    let target = local.translation + CAMERA_OFFSET_GLOBAL;
    cam_tf
        .translation
        .smooth_nudge(&target, CAMERA_DECAY_RATE, time.delta_secs());
    cam_tf.look_at(local.translation, Vec3::Y);
}
