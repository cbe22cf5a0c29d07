//! Routes authoritative snapshots to the entities they describe.
//!
//! The local body goes through prediction reconciliation; every other body goes to its smoother.
//! A snapshot for a body this client hasn't seen yet spawns it and is retried on the next frame,
//! once the spawn has been applied.

use super::{
    ClientSyncSettings, LocalMover, NetStats, NetworkEntity, PhysicsBodies, RemoteBody, SimClock,
    body_visual,
};
use crate::{
    convert::pose_to_transform,
    net::{Downlink, LocalEntityId},
};
use bevy::{platform::collections::HashMap, prelude::*};
use movesync_shared::{
    AuthoritativeSnapshot, MoveAbility, RemoteSmoother, SyncError, SyncResult,
    wire::{SnapshotDecoder, WireBody, decode_envelope},
};

/// Give up on a snapshot whose entity still can't be resolved after this many frames.
const MAX_PENDING_ATTEMPTS: u32 = 8;

struct PendingSnapshot {
    snapshot: AuthoritativeSnapshot,
    attempts: u32,
}

#[derive(Resource, Default)]
pub struct Replication {
    entities: HashMap<u64, Entity>,
    decoders: HashMap<u64, SnapshotDecoder>,
    pending: Vec<PendingSnapshot>,
}

impl Replication {
    pub fn entity(&self, id: u64) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    fn decode(&mut self, bytes: &[u8]) -> SyncResult<AuthoritativeSnapshot> {
        let envelope = decode_envelope(bytes)?;
        let WireBody::Snapshot(msg) = envelope.body else {
            return Err(SyncError::UnexpectedMessage);
        };
        let decoder = self.decoders.entry(envelope.entity_id).or_default();
        Ok(decoder.decode(envelope.entity_id, &msg))
    }
}

pub(super) fn receive_snapshots(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut replication: ResMut<Replication>,
    mut bodies: ResMut<PhysicsBodies>,
    mut stats: ResMut<NetStats>,
    downlink: Res<Downlink>,
    local_id: Res<LocalEntityId>,
    settings: Res<ClientSyncSettings>,
    clock: Res<SimClock>,
    mut local_q: Query<&mut LocalMover>,
    mut remote_q: Query<&mut RemoteBody>,
) {
    let now = clock.now();

    // Retry older snapshots before newer ones.
    let mut queue = std::mem::take(&mut replication.pending);
    for bytes in downlink.inbox.drain() {
        match replication.decode(&bytes) {
            Ok(snapshot) => queue.push(PendingSnapshot {
                snapshot,
                attempts: 0,
            }),
            Err(e) => {
                stats.messages_dropped += 1;
                warn!("dropping snapshot: {e}");
            }
        }
    }

    for mut pending in queue {
        let id = pending.snapshot.entity_id;
        let routed = route(
            replication.entity(id),
            &pending.snapshot,
            now,
            &mut bodies,
            &mut local_q,
            &mut remote_q,
        );
        match routed {
            Ok(()) => {}
            Err(SyncError::UnknownEntity(_)) => {
                if replication.entity(id).is_none() {
                    let entity = spawn_body(
                        &mut commands,
                        &mut meshes,
                        &mut materials,
                        &mut bodies,
                        &pending.snapshot,
                        id == local_id.0,
                        &settings,
                    );
                    replication.entities.insert(id, entity);
                }
                pending.attempts += 1;
                if pending.attempts > MAX_PENDING_ATTEMPTS {
                    stats.messages_dropped += 1;
                    warn!("dropping snapshot for unresolved entity {id}");
                } else {
                    replication.pending.push(pending);
                }
            }
            Err(e) => {
                stats.messages_dropped += 1;
                warn!("dropping snapshot for entity {id}: {e}");
            }
        }
    }
}

fn route(
    entity: Option<Entity>,
    snapshot: &AuthoritativeSnapshot,
    now: f32,
    bodies: &mut PhysicsBodies,
    local_q: &mut Query<&mut LocalMover>,
    remote_q: &mut Query<&mut RemoteBody>,
) -> SyncResult<()> {
    let unknown = SyncError::UnknownEntity(snapshot.entity_id);
    let entity = entity.ok_or_else(|| unknown.clone())?;

    if let Ok(mut local) = local_q.get_mut(entity) {
        let handle = local.handle;
        let body = bodies.get_mut(handle).ok_or(unknown)?;
        local.engine.on_snapshot(snapshot, now, body);
        return Ok(());
    }
    if let Ok(mut remote) = remote_q.get_mut(entity) {
        remote.smoother.on_snapshot(snapshot);
        return Ok(());
    }
    Err(unknown)
}

fn spawn_body(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    bodies: &mut PhysicsBodies,
    snapshot: &AuthoritativeSnapshot,
    is_local: bool,
    settings: &ClientSyncSettings,
) -> Entity {
    let pose = snapshot.pose();
    let mut entity_commands = commands.spawn((
        Name::new(format!("Body {}", snapshot.entity_id)),
        NetworkEntity(snapshot.entity_id),
        pose_to_transform(&pose),
    ));
    if is_local {
        let handle = bodies.spawn(pose);
        entity_commands.insert(LocalMover::new(handle, MoveAbility::default(), settings));
        info!("spawned local body {}", snapshot.entity_id);
    } else {
        entity_commands.insert(RemoteBody {
            smoother: RemoteSmoother::new(settings),
        });
        info!("spawned remote body {}", snapshot.entity_id);
    }
    let entity = entity_commands.id();
    body_visual(commands, entity, meshes, materials, is_local);
    entity
}
