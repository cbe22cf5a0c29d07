//! Client and server wired through the byte codec over a simulated link.

use std::collections::VecDeque;

use movesync_shared::{
    AuthoritativeSnapshot, KinematicBody, MoveAbility, Mover, PhysicsBody, PredictionEngine,
    ServerAuthority, UnitAction, Vec3, apply_actions,
    constants::POSITION_DIVERGENCE_SQ,
    integrate_mover,
    protocol::MoveRequest,
    wire::{
        Envelope, MoveRequestDecoder, MoveRequestEncoder, MoveRequestMsg, SnapshotDecoder,
        SnapshotEncoder, SnapshotMsg, WireBody, decode_envelope, encode_envelope,
    },
};

const DT: f32 = 1.0 / 15.0;
const ENTITY: u64 = 1;

/// One direction of the network. `latency` maps a send counter to a delay in ticks.
struct Link {
    in_flight: VecDeque<(u32, Vec<u8>)>,
    sent: u32,
    latency: fn(u32) -> u32,
    duplicate: bool,
}

impl Link {
    fn new(latency: fn(u32) -> u32, duplicate: bool) -> Self {
        Self {
            in_flight: VecDeque::new(),
            sent: 0,
            latency,
            duplicate,
        }
    }

    fn send(&mut self, tick: u32, bytes: Vec<u8>) {
        let due = tick + (self.latency)(self.sent);
        self.sent += 1;
        if self.duplicate {
            self.in_flight.push_back((due, bytes.clone()));
        }
        self.in_flight.push_back((due, bytes));
    }

    fn deliver(&mut self, tick: u32) -> Vec<Vec<u8>> {
        let (due, pending): (VecDeque<_>, VecDeque<_>) =
            self.in_flight.drain(..).partition(|(at, _)| *at <= tick);
        self.in_flight = pending;
        due.into_iter().map(|(_, bytes)| bytes).collect()
    }
}

struct Client {
    mover: Mover,
    body: KinematicBody,
    engine: PredictionEngine,
    encoder: MoveRequestEncoder,
    snapshots: SnapshotDecoder,
}

struct Server {
    authority: ServerAuthority,
    body: KinematicBody,
    requests: MoveRequestDecoder,
    encoder: SnapshotEncoder,
    stale_requests: u32,
}

struct Scenario {
    tick: u32,
    client: Client,
    server: Server,
    up: Link,
    down: Link,
    /// Suppress unchanged fields. Only valid on in-order links.
    delta: bool,
}

impl Scenario {
    fn new(up: Link, down: Link, delta: bool) -> Self {
        let ability = MoveAbility::default();
        Self {
            tick: 0,
            client: Client {
                mover: Mover {
                    ability,
                    ..Default::default()
                },
                body: KinematicBody::default(),
                engine: PredictionEngine::default(),
                encoder: MoveRequestEncoder::default(),
                snapshots: SnapshotDecoder::default(),
            },
            server: Server {
                authority: ServerAuthority::new(ENTITY, ability),
                body: KinematicBody::default(),
                requests: MoveRequestDecoder::default(),
                encoder: SnapshotEncoder::default(),
                stale_requests: 0,
            },
            up,
            down,
            delta,
        }
    }

    fn step(&mut self, actions: &[UnitAction]) {
        self.tick += 1;
        let now = self.tick as f32 * DT;

        // Client: actions -> velocity -> pose -> request.
        let client = &mut self.client;
        apply_actions(&mut client.mover.state, &client.mover.ability, actions);
        client.mover.velocity = client.body.velocity();
        client.mover.orientation = client.body.pose().orientation;
        integrate_mover(&mut client.mover, DT);
        client.body.set_velocity(client.mover.velocity);
        client.body.step(DT);

        let request = client.engine.sample(now, &client.body);
        let msg = if self.delta {
            client.encoder.encode(&request)
        } else {
            MoveRequestMsg::from(request)
        };
        self.up.send(
            self.tick,
            encode_envelope(&Envelope {
                entity_id: ENTITY,
                body: WireBody::MoveRequest(msg),
            }),
        );

        // Server: apply whatever arrived, then tick and publish.
        for bytes in self.up.deliver(self.tick) {
            let Ok(Envelope {
                body: WireBody::MoveRequest(msg),
                ..
            }) = decode_envelope(&bytes)
            else {
                panic!("server received a malformed request");
            };
            let request: MoveRequest = self.server.requests.decode(&msg);
            let outcome = self
                .server
                .authority
                .apply_request(&request, &mut self.server.body);
            if matches!(outcome, movesync_shared::validation::RequestOutcome::Stale { .. }) {
                self.server.stale_requests += 1;
            }
        }
        if let Some(snapshot) = self.server.authority.tick(&mut self.server.body, DT) {
            let msg = if self.delta {
                self.server.encoder.encode(&snapshot)
            } else {
                SnapshotMsg::from(snapshot)
            };
            self.down.send(
                self.tick,
                encode_envelope(&Envelope {
                    entity_id: ENTITY,
                    body: WireBody::Snapshot(msg),
                }),
            );
        }

        // Client: reconcile against everything that arrived this tick.
        for bytes in self.down.deliver(self.tick) {
            let Ok(Envelope {
                entity_id,
                body: WireBody::Snapshot(msg),
            }) = decode_envelope(&bytes)
            else {
                panic!("client received a malformed snapshot");
            };
            let snapshot: AuthoritativeSnapshot = self.client.snapshots.decode(entity_id, &msg);
            self.client
                .engine
                .on_snapshot(&snapshot, now, &mut self.client.body);
        }
        self.client.mover.velocity = self.client.body.velocity();
    }

    fn speed(&self) -> f32 {
        self.client.mover.velocity.linear.norm()
    }
}

/// Drive forward for three seconds, release, and let the body coast to a stop.
///
/// Braking from 3 m/s takes 45 ticks (3 s at 15 Hz) plus possibly one tick that snaps the float
/// residue to zero. Corrections may write a requantized velocity back, which can cost one more.
fn drive_then_stop(scenario: &mut Scenario, max_stop_ticks: u32) {
    let cap = scenario.client.mover.ability.max_linear_speed;

    scenario.step(&[UnitAction::MoveForward(1.0)]);
    for _ in 1..45 {
        scenario.step(&[]);
        assert!(scenario.speed() <= cap + 1.0e-4, "speed {}", scenario.speed());
    }
    assert!(scenario.speed() > 2.95, "speed after 3 s: {}", scenario.speed());
    assert!(scenario.client.mover.velocity.linear.z < 0.0, "drives along -Z");

    scenario.step(&[UnitAction::StopMoveForward(1.0), UnitAction::AutoStopMove]);
    let mut stop_ticks = 1;
    while !scenario.client.mover.state.is_idle() {
        scenario.step(&[]);
        stop_ticks += 1;
        assert!(stop_ticks <= max_stop_ticks, "still braking after {stop_ticks} ticks");
    }
    assert_eq!(scenario.client.mover.velocity.linear, Vec3::zeros());
    assert_eq!(scenario.client.mover.state.linear_intent, None);
    assert!(!scenario.client.mover.state.stop_movement);

    // Let the server and the last echoes catch up.
    for _ in 0..10 {
        scenario.step(&[]);
    }
    assert_eq!(scenario.server.body.velocity().linear, Vec3::zeros());
}

#[test]
fn forward_drive_then_auto_stop_on_clean_link() {
    let mut scenario = Scenario::new(Link::new(|_| 2, false), Link::new(|_| 2, false), true);

    drive_then_stop(&mut scenario, 46);

    let client = scenario.client.body.pose().position;
    let server = scenario.server.body.pose().position;
    assert!((client - server).norm() < 1.0e-2, "client {client:?} server {server:?}");
    // 45 ticks accelerating plus 45 braking at an average of 1.5 m/s.
    assert!((client.z + 9.0).abs() < 0.3, "travelled {}", client.z);

    let stats = scenario.client.engine.stats();
    assert_eq!(stats.position_corrections, 0);
    assert_eq!(stats.rotation_corrections, 0);
    assert!(stats.snapshots_applied > 80);
}

#[test]
fn duplicated_and_reordered_delivery_still_converges() {
    // Every second message overtakes its predecessor; everything arrives twice.
    let jitter = |n: u32| if n % 2 == 0 { 3 } else { 1 };
    let mut scenario = Scenario::new(Link::new(jitter, true), Link::new(jitter, true), false);

    drive_then_stop(&mut scenario, 47);

    assert!(scenario.server.stale_requests > 0);
    let stats = *scenario.client.engine.stats();
    assert!(stats.snapshots_ignored > 0);
    assert!(stats.snapshots_applied > 0);

    let client = scenario.client.body.pose().position;
    let server = scenario.server.body.pose().position;
    assert!(
        (client - server).norm_squared() <= POSITION_DIVERGENCE_SQ + 1.0e-4,
        "client {client:?} server {server:?}"
    );
}

#[test]
fn over_limit_client_is_clamped_and_corrected() {
    let mut scenario = Scenario::new(Link::new(|_| 1, false), Link::new(|_| 1, false), true);
    // A tampered client that ignores its own speed cap.
    scenario.client.mover.ability.max_linear_speed = 6.0;
    scenario.client.mover.ability.linear_acceleration = 6.0;

    scenario.step(&[UnitAction::MoveForward(1.0)]);
    for _ in 0..30 {
        scenario.step(&[]);
    }

    assert!(scenario.server.authority.violations > 0);
    assert!(scenario.server.body.velocity().linear.norm() <= 3.0 + 1.0e-4);
    assert!(scenario.client.engine.stats().position_corrections > 0);
}
