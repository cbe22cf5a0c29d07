//! Movement tick constants.

pub use movesync_shared::constants::SERVER_TICK_HZ;

/// Largest dt (seconds) logged as a normal tick. Longer gaps are reported as stalls.
///
/// Integration always uses the fixed interval so the server replays exactly what clients predict.
pub const STALL_WARN_DT_S: f32 = 0.25;

/// Fraction of ticks that log a timing breakdown.
pub const TICK_LOG_SAMPLE_RATE: f32 = 0.01;
