mod local;
mod remote;
mod replication;

use crate::AppSystems;
use bevy::prelude::*;
use movesync_shared::{
    FixedStep, MoveAbility, Mover, PredictionEngine, RemoteSmoother, SyncSettings, SyncStats,
    rapier::{KinematicBodies, rapier3d::prelude::RigidBodyHandle},
    wire::MoveRequestEncoder,
};

use replication::Replication;

pub(super) fn plugin(app: &mut App) {
    let settings = SyncSettings::default();
    app.insert_resource(SimClock::new(&settings));
    app.insert_resource(ClientSyncSettings(settings));
    app.init_resource::<PhysicsBodies>();
    app.init_resource::<Replication>();
    app.init_resource::<NetStats>();

    app.add_systems(
        Update,
        replication::receive_snapshots.in_set(AppSystems::Receive),
    );
    app.add_systems(
        Update,
        local::step_local_mover.in_set(AppSystems::Simulate),
    );
    app.add_systems(
        Update,
        (local::present_local, remote::smooth_remotes).in_set(AppSystems::Present),
    );
}

/// Tunables this client runs with. Mirrors the authority's `sync_settings` row.
#[derive(Resource, Debug, Clone, Deref)]
pub struct ClientSyncSettings(pub SyncSettings);

/// Fixed-step clocks for integration and request sampling.
#[derive(Resource, Debug)]
pub struct SimClock {
    pub integrate: FixedStep,
    pub sample: FixedStep,
    pub steps: u64,
}

impl SimClock {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            integrate: FixedStep::new(movesync_shared::constants::INTEGRATION_INTERVAL),
            sample: FixedStep::new(settings.sample_interval),
            steps: 0,
        }
    }

    /// Simulation time of the latest step, in seconds. Stamped on requests.
    pub fn now(&self) -> f32 {
        self.steps as f32 * self.integrate.dt()
    }
}

/// Physics bodies this client simulates (only its own).
#[derive(Resource, Default, Deref, DerefMut)]
pub struct PhysicsBodies(pub KinematicBodies);

/// Receive-path counters kept outside any single entity.
#[derive(Resource, Default, Debug, Deref, DerefMut)]
pub struct NetStats(pub SyncStats);

/// Links a Bevy entity to the authority's body id.
#[derive(Component, Debug, Clone, Copy)]
pub struct NetworkEntity(pub u64);

/// The body this client controls and predicts.
#[derive(Component)]
pub struct LocalMover {
    pub mover: Mover,
    pub engine: PredictionEngine,
    pub encoder: MoveRequestEncoder,
    pub handle: RigidBodyHandle,
}

impl LocalMover {
    pub fn new(handle: RigidBodyHandle, ability: MoveAbility, settings: &SyncSettings) -> Self {
        Self {
            mover: Mover {
                ability,
                ..Default::default()
            },
            engine: PredictionEngine::new(*settings),
            encoder: MoveRequestEncoder::default(),
            handle,
        }
    }
}

/// A body controlled elsewhere, displayed through smoothing.
#[derive(Component)]
pub struct RemoteBody {
    pub smoother: RemoteSmoother,
}

const BODY_RADIUS: f32 = 0.35;
const BODY_HALF_LENGTH: f32 = 0.5;

/// Capsule with two eyes on its -Z (forward) face.
fn body_visual(
    commands: &mut Commands,
    entity: Entity,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    is_local: bool,
) {
    let base_color = if is_local {
        Color::linear_rgb(0.2, 0.9, 0.8)
    } else {
        Color::linear_rgb(0.9, 0.2, 0.2)
    };

    let eye_mesh = meshes.add(Mesh::from(Sphere { radius: 0.1 }));
    let eye_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 1.0, 1.0),
        ..default()
    });
    let x = 0.15;
    let y = BODY_HALF_LENGTH * 0.5;
    let z = -BODY_RADIUS;

    commands
        .entity(entity)
        .insert((
            Mesh3d(meshes.add(Mesh::from(Capsule3d {
                radius: BODY_RADIUS,
                half_length: BODY_HALF_LENGTH,
            }))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color,
                ..default()
            })),
        ))
        .with_children(|parent| {
            parent.spawn((
                Name::new("LeftEye"),
                Mesh3d(eye_mesh.clone()),
                MeshMaterial3d(eye_mat.clone()),
                Transform::from_translation(Vec3::new(-x, y, z)),
            ));
            parent.spawn((
                Name::new("RightEye"),
                Mesh3d(eye_mesh),
                MeshMaterial3d(eye_mat),
                Transform::from_translation(Vec3::new(x, y, z)),
            ));
        });
}
