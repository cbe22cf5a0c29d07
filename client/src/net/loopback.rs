//! In-process authority standing in for the server module.
//!
//! Runs the same `ServerAuthority` rules as the SpacetimeDB module: requests are validated and
//! applied as they arrive, and a fixed-rate tick integrates bodies and publishes snapshots.
//! Also drives a few server-owned bots so there are remote bodies to observe.

use super::link::SimulatedLink;
use bevy::prelude::*;
use movesync_shared::{
    FixedStep, KinematicBody, MoveAbility, MoveRequest, PhysicsBody, Pose, ServerAuthority,
    SyncError, SyncResult, SyncStats, Vec3, Velocity,
    constants::{SERVER_TICK_HZ, local_forward, yaw_right_axis},
    inbox::{Inbox, InboxSender},
    validation::RequestOutcome,
    wire::{
        Envelope, MoveRequestDecoder, SnapshotEncoder, SnapshotMsg, WireBody, decode_envelope,
        encode_envelope,
    },
};
use std::{collections::BTreeMap, time::Duration};

/// Server-driven body that circles at a constant speed.
#[derive(Clone, Copy, Debug)]
pub struct BotMotion {
    pub speed: f32,
    /// Yaw rate (rad/s, positive turns right).
    pub turn_rate: f32,
}

struct ServerEntity {
    authority: ServerAuthority,
    body: KinematicBody,
    requests: MoveRequestDecoder,
    snapshots: SnapshotEncoder,
    bot: Option<(BotMotion, u32)>,
}

#[derive(Resource)]
pub struct LoopbackServer {
    entities: BTreeMap<u64, ServerEntity>,
    clock: FixedStep,
    tick: u64,
    inbox: Inbox<Vec<u8>>,
    pub stats: SyncStats,
    pub stale_requests: u64,
}

impl Default for LoopbackServer {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
            clock: FixedStep::new(Duration::from_micros(1_000_000 / SERVER_TICK_HZ as u64)),
            tick: 0,
            inbox: Inbox::default(),
            stats: SyncStats::default(),
            stale_requests: 0,
        }
    }
}

impl LoopbackServer {
    /// Where the client's uplink delivers.
    pub fn sender(&self) -> InboxSender<Vec<u8>> {
        self.inbox.sender()
    }

    pub fn spawn(&mut self, entity_id: u64, pose: Pose, ability: MoveAbility) {
        self.entities.insert(
            entity_id,
            ServerEntity {
                authority: ServerAuthority {
                    dirty: true,
                    ..ServerAuthority::new(entity_id, ability)
                },
                body: KinematicBody::new(pose),
                requests: MoveRequestDecoder::default(),
                snapshots: SnapshotEncoder::default(),
                bot: None,
            },
        );
        info!("loopback: spawned entity {entity_id}");
    }

    pub fn spawn_bot(&mut self, entity_id: u64, pose: Pose, motion: BotMotion) {
        self.spawn(entity_id, pose, MoveAbility::default());
        if let Some(entity) = self.entities.get_mut(&entity_id) {
            entity.bot = Some((motion, 0));
        }
    }

    pub fn body(&self, entity_id: u64) -> Option<&KinematicBody> {
        self.entities.get(&entity_id).map(|e| &e.body)
    }

    /// Apply every request delivered so far.
    pub fn receive(&mut self) {
        for bytes in self.inbox.drain() {
            if let Err(e) = self.receive_one(&bytes) {
                self.stats.messages_dropped += 1;
                warn!("loopback: dropping request: {e}");
            }
        }
    }

    fn receive_one(&mut self, bytes: &[u8]) -> SyncResult<()> {
        let envelope = decode_envelope(bytes)?;
        let WireBody::MoveRequest(msg) = envelope.body else {
            return Err(SyncError::UnexpectedMessage);
        };
        let entity = self
            .entities
            .get_mut(&envelope.entity_id)
            .ok_or(SyncError::UnknownEntity(envelope.entity_id))?;

        let request = entity.requests.decode(&msg);
        match entity.authority.apply_request(&request, &mut entity.body) {
            RequestOutcome::Applied { violation } => {
                if violation.is_some() {
                    self.stats.validation_violations += 1;
                }
            }
            RequestOutcome::Stale { .. } => self.stale_requests += 1,
        }
        Ok(())
    }

    /// Advance the server clock by `delta` and publish snapshots on `downlink` when a tick fires.
    pub fn update(&mut self, delta: Duration, now: Duration, downlink: &mut SimulatedLink) {
        if !self.clock.advance(delta) {
            return;
        }
        let dt = self.clock.dt();
        self.tick += 1;
        let now_secs = self.tick as f32 * dt;
        let full_messages = downlink.conditions().reorders();

        for (id, entity) in self.entities.iter_mut() {
            if let Some((motion, sequence)) = &mut entity.bot {
                *sequence += 1;
                let request = bot_request(*sequence, now_secs, motion, &entity.body);
                entity.authority.apply_request(&request, &mut entity.body);
            }

            let Some(snapshot) = entity.authority.tick(&mut entity.body, dt) else {
                continue;
            };
            let msg = if full_messages {
                SnapshotMsg::from(snapshot)
            } else {
                entity.snapshots.encode(&snapshot)
            };
            downlink.send(
                now,
                encode_envelope(&Envelope {
                    entity_id: *id,
                    body: WireBody::Snapshot(msg),
                }),
            );
        }
    }
}

fn bot_request(sequence: u32, now: f32, motion: &BotMotion, body: &KinematicBody) -> MoveRequest {
    let forward = body.pose().orientation * local_forward();
    let velocity = Velocity::new(forward * motion.speed, yaw_right_axis() * motion.turn_rate);
    MoveRequest::from_velocity(sequence, now, &velocity)
}

pub fn circle_start(radius: f32, angle: f32) -> Pose {
    Pose::new(
        Vec3::new(radius * angle.cos(), 0.5, radius * angle.sin()),
        Default::default(),
    )
}
