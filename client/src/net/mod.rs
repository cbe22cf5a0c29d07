//! Transport between the client and the movement authority.
//!
//! The authority runs in-process (`loopback`), connected by two simulated links. Only encoded
//! envelopes cross the links, so the client exercises the same byte path a remote server would.

pub mod link;
pub mod loopback;

use crate::AppSystems;
use bevy::prelude::*;
use link::{LinkConditions, SimulatedLink};
use loopback::{BotMotion, LoopbackServer, circle_start};
use movesync_shared::{MoveAbility, Pose, inbox::Inbox};
use std::time::Duration;

/// Body id the authority assigned to this client.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalEntityId(pub u64);

/// Client → authority.
#[derive(Resource)]
pub struct Uplink(pub SimulatedLink);

/// Authority → client. The link delivers into `inbox`, which replication drains once per frame.
#[derive(Resource)]
pub struct Downlink {
    pub link: SimulatedLink,
    pub inbox: Inbox<Vec<u8>>,
}

pub(super) fn plugin(app: &mut App) {
    let conditions = read_link_conditions_from_cli_env();
    info!("Simulated link: {conditions:?}");

    let server = LoopbackServer::default();
    let inbox = Inbox::default();
    app.insert_resource(Uplink(SimulatedLink::new(conditions, server.sender())));
    app.insert_resource(Downlink {
        link: SimulatedLink::new(conditions, inbox.sender()),
        inbox,
    });
    app.insert_resource(server);
    app.insert_resource(LocalEntityId(1));

    app.add_systems(Startup, populate_world);
    app.add_systems(Update, run_loopback.in_set(AppSystems::Transport));
}

fn populate_world(mut server: ResMut<LoopbackServer>, local: Res<LocalEntityId>) {
    server.spawn(local.0, Pose::default(), MoveAbility::default());
    server.spawn_bot(
        local.0 + 1,
        circle_start(6.0, 0.0),
        BotMotion {
            speed: 2.0,
            turn_rate: 0.35,
        },
    );
    server.spawn_bot(
        local.0 + 2,
        circle_start(10.0, std::f32::consts::PI),
        BotMotion {
            speed: 1.0,
            turn_rate: -0.2,
        },
    );
}

fn run_loopback(
    time: Res<Time>,
    mut uplink: ResMut<Uplink>,
    mut downlink: ResMut<Downlink>,
    mut server: ResMut<LoopbackServer>,
) {
    let now = time.elapsed();
    uplink.0.pump(now);
    server.receive();
    server.update(time.delta(), now, &mut downlink.link);
    downlink.link.pump(now);
}

/// Link conditions from CLI args or environment.
///
/// Supported:
///   --latency-ms <n>, --jitter-ms <n>, --duplicate-every <n> (also as `--key=<n>`)
///   MOVESYNC_LATENCY_MS, MOVESYNC_JITTER_MS, MOVESYNC_DUPLICATE_EVERY environment variables
fn read_link_conditions_from_cli_env() -> LinkConditions {
    let mut conditions = LinkConditions::default();

    let mut apply = |key: &str, value: &str| {
        let Ok(n) = value.trim().parse::<u64>() else {
            warn!("ignoring non-numeric {key}={value}");
            return;
        };
        match key {
            "latency-ms" => conditions.latency = Duration::from_millis(n),
            "jitter-ms" => conditions.jitter = Duration::from_millis(n),
            "duplicate-every" => conditions.duplicate_every = n as u32,
            _ => {}
        }
    };

    for (key, var) in [
        ("latency-ms", "MOVESYNC_LATENCY_MS"),
        ("jitter-ms", "MOVESYNC_JITTER_MS"),
        ("duplicate-every", "MOVESYNC_DUPLICATE_EVERY"),
    ] {
        if let Ok(value) = std::env::var(var) {
            apply(key, &value);
        }
    }

    // CLI overrides ENV.
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            continue;
        };
        if let Some((key, value)) = flag.split_once('=') {
            apply(key, value);
        } else if let Some(value) = args.next() {
            apply(flag, &value);
        }
    }

    conditions
}
