//! Server movement tick.
//!
//! Each tick integrates every moving body by its verified velocity over a fixed step and upserts a
//! `move_snapshot` row for every body that moved or applied a request since the last tick.

use crate::{
    reducers::movement_tick::constants,
    schema::*,
    utils::{get_fixed_delta_time, get_variable_delta_time, TickProfiler},
};
use spacetimedb::{ReducerContext, ScheduleAt, Table, TimeDuration, Timestamp};

/// Scheduled timer for the movement tick.
///
/// Scheduled tables must include a `scheduled_id: u64` primary key with `#[auto_inc]`.
#[spacetimedb::table(name = movement_tick_timer, scheduled(movement_tick_reducer))]
pub struct MovementTickTimer {
    #[primary_key]
    #[auto_inc]
    pub scheduled_id: u64,

    pub scheduled_at: ScheduleAt,

    /// Timestamp of the previous invocation, for stall reporting.
    pub last_tick: Timestamp,

    /// Monotonic tick counter stamped on published snapshots.
    pub tick: u64,
}

pub fn init(ctx: &ReducerContext) {
    let interval = TimeDuration::from_micros(1_000_000i64 / constants::SERVER_TICK_HZ);

    // Single-row scheduled job.
    ctx.db.movement_tick_timer().scheduled_id().delete(1);
    ctx.db.movement_tick_timer().insert(MovementTickTimer {
        scheduled_id: 1,
        scheduled_at: ScheduleAt::Interval(interval),
        last_tick: ctx.timestamp,
        tick: 0,
    });
}

#[spacetimedb::reducer]
pub fn movement_tick_reducer(
    ctx: &ReducerContext,
    mut timer: MovementTickTimer,
) -> Result<(), String> {
    // Only the server (module identity) may invoke scheduled reducers.
    if ctx.sender != ctx.identity() {
        return Err("`movement_tick_reducer` may not be invoked by clients.".into());
    }

    let dt = get_fixed_delta_time(timer.scheduled_at.clone());
    if let Some(real_dt) = get_variable_delta_time(ctx.timestamp, timer.last_tick) {
        if real_dt > constants::STALL_WARN_DT_S {
            log::warn!("movement tick stalled for {real_dt:.3}s; integrating a single {dt:.4}s step");
        }
    }

    let mut profiler =
        TickProfiler::sample(ctx, "movement_tick", constants::TICK_LOG_SAMPLE_RATE);
    profiler.phase("integrate_and_publish");

    let tick = timer.tick + 1;
    let mut published = 0usize;
    let bodies: Vec<MoveBody> = ctx.db.move_body().iter().collect();
    for mut body in bodies {
        let mut authority = body.authority();
        let Some(snapshot) = authority.tick(&mut body, dt) else {
            continue;
        };
        body.store_authority(&authority);

        let row = MoveSnapshot::from_snapshot(&snapshot, body.owner, tick);
        if ctx.db.move_snapshot().body_id().find(row.body_id).is_some() {
            ctx.db.move_snapshot().body_id().update(row);
        } else {
            ctx.db.move_snapshot().insert(row);
        }
        ctx.db.move_body().id().update(body);
        published += 1;
    }

    if profiler.is_sampled() {
        log::info!("tick {tick}: published {published} snapshots");
    }

    timer.last_tick = ctx.timestamp;
    timer.tick = tick;
    ctx.db.movement_tick_timer().scheduled_id().update(timer);
    Ok(())
}
