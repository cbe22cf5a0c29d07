use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, setup);
}

/// Static scenery so motion is visible. Bodies fly through it; there is no collision.
fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("Ground"),
        Transform::from_xyz(0., -0.5, 0.),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(80., 80.).build())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::linear_rgb(0.2, 0.3, 0.25),
            perceptual_roughness: 1.0,
            metallic: 0.0,
            ..default()
        })),
    ));

    // Markers on a grid.
    let marker_mesh = meshes.add(Cuboid::new(0.5, 0.5, 0.5));
    let marker_mat = materials.add(Color::srgb_u8(124, 144, 255));
    for x in (-30..=30).step_by(10) {
        for z in (-30..=30).step_by(10) {
            commands.spawn((
                Mesh3d(marker_mesh.clone()),
                MeshMaterial3d(marker_mat.clone()),
                Transform::from_xyz(x as f32, -0.25, z as f32),
            ));
        }
    }

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
