//! Debug tooling for native dev builds.
//!
//! Gated behind `dev_native` in `main.rs`.

use crate::{
    actor::{LocalMover, NetStats},
    net::loopback::LoopbackServer,
};
use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin,
};
use bevy::prelude::*;
use std::time::Duration;

const STATS_LOG_INTERVAL: Duration = Duration::from_secs(5);

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        LogDiagnosticsPlugin {
            wait_duration: STATS_LOG_INTERVAL,
            ..default()
        },
    ));

    app.insert_resource(StatsTimer(Timer::new(
        STATS_LOG_INTERVAL,
        TimerMode::Repeating,
    )));
    app.add_systems(Update, log_sync_stats);
}

#[derive(Resource)]
struct StatsTimer(Timer);

fn log_sync_stats(
    time: Res<Time>,
    mut timer: ResMut<StatsTimer>,
    net: Res<NetStats>,
    server: Res<LoopbackServer>,
    local_q: Query<&LocalMover>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }

    let mut client = net.0;
    for local in &local_q {
        client.merge(local.engine.stats());
        info!(
            "prediction: {:?}, {} pending, last ack {:?}",
            local.engine.state(),
            local.engine.queue().len(),
            local.engine.last_acked()
        );
    }
    info!("client sync stats: {client:?}");
    info!(
        "authority sync stats: {:?}, stale requests {}",
        server.stats, server.stale_requests
    );
}
