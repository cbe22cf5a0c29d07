use spacetimedb::{log_stopwatch::LogStopwatch, ReducerContext, ScheduleAt, Timestamp};

pub fn get_variable_delta_time(now: Timestamp, last: Timestamp) -> Option<f32> {
    now.time_duration_since(last)
        .map(|dur| dur.to_micros() as f32 / 1_000_000.0)
}

/// Interval of a repeating schedule, in seconds.
///
/// A one-shot `Time` schedule falls back to the server tick rate.
pub fn get_fixed_delta_time(scheduled_at: ScheduleAt) -> f32 {
    match scheduled_at {
        ScheduleAt::Interval(dt) => dt.to_micros() as f32 / 1_000_000.0,
        ScheduleAt::Time(_) => 1.0 / movesync_shared::constants::SERVER_TICK_HZ as f32,
    }
}

/// Timing for a fraction of reducer invocations, split into named phases.
///
/// Built on SpacetimeDB's `log_stopwatch`, which needs no monotonic clock inside WASM.
/// Unsampled invocations cost one `ctx.random` draw and nothing else.
pub struct TickProfiler {
    sampled: Option<Sampled>,
}

struct Sampled {
    name: &'static str,
    total: LogStopwatch,
    phase: Option<LogStopwatch>,
}

impl TickProfiler {
    /// Sample with probability `rate`. Drawing from `ctx.random` keeps the module deterministic.
    pub fn sample(ctx: &ReducerContext, name: &'static str, rate: f32) -> Self {
        let sampled = (rate > 0.0 && ctx.random::<f32>() <= rate).then(|| {
            log::info!("--------- {name} begin ---------");
            Sampled {
                name,
                total: LogStopwatch::new(name),
                phase: None,
            }
        });
        Self { sampled }
    }

    /// End the running phase, if any, and start timing `name`.
    pub fn phase(&mut self, name: &str) {
        if let Some(s) = &mut self.sampled {
            if let Some(sw) = s.phase.take() {
                sw.end();
            }
            s.phase = Some(LogStopwatch::new(name));
        }
    }

    pub fn is_sampled(&self) -> bool {
        self.sampled.is_some()
    }
}

impl Drop for TickProfiler {
    fn drop(&mut self) {
        let Some(s) = self.sampled.take() else {
            return;
        };
        if let Some(sw) = s.phase {
            sw.end();
        }
        s.total.end();
        log::info!("---------- {} end ----------", s.name);
    }
}
