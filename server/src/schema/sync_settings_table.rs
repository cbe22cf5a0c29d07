use movesync_shared::{CorrectionPolicy, SyncSettings};
use spacetimedb::*;

/// Synchronization tunables shared by server and clients.
///
/// Single-row table (`id = 1`) seeded in `init`. Clients subscribe to it and build their
/// `SyncSettings` from it so both sides agree on rates and thresholds.
#[table(name = sync_settings, public)]
pub struct SyncSettingsRow {
    #[primary_key]
    pub id: u32,

    pub sample_interval_micros: u64,

    /// Squared position error (m^2) that triggers a correction.
    pub position_divergence_sq: f32,
    /// Rotation error (radians) that triggers a correction.
    pub rotation_divergence_rad: f32,

    pub max_pending_requests: u32,

    /// `None` snaps; `Some(f)` blends a fraction `f` toward the prediction.
    pub correction_blend: Option<f32>,

    pub remote_position_rate: f32,
    pub remote_rotation_rate: f32,
    pub remote_seed_velocity: bool,
    pub max_extrapolation_secs: f32,
}

impl From<&SyncSettings> for SyncSettingsRow {
    fn from(s: &SyncSettings) -> Self {
        Self {
            id: 1,
            sample_interval_micros: s.sample_interval.as_micros() as u64,
            position_divergence_sq: s.position_divergence_sq,
            rotation_divergence_rad: s.rotation_divergence_rad,
            max_pending_requests: s.max_pending_requests as u32,
            correction_blend: match s.correction {
                CorrectionPolicy::Snap => None,
                CorrectionPolicy::Blend { factor } => Some(factor),
            },
            remote_position_rate: s.remote_position_rate,
            remote_rotation_rate: s.remote_rotation_rate,
            remote_seed_velocity: s.remote_seed_velocity,
            max_extrapolation_secs: s.max_extrapolation_secs,
        }
    }
}

impl From<&SyncSettingsRow> for SyncSettings {
    fn from(row: &SyncSettingsRow) -> Self {
        Self {
            sample_interval: std::time::Duration::from_micros(row.sample_interval_micros),
            position_divergence_sq: row.position_divergence_sq,
            rotation_divergence_rad: row.rotation_divergence_rad,
            max_pending_requests: row.max_pending_requests as usize,
            correction: row
                .correction_blend
                .map_or(CorrectionPolicy::Snap, |factor| CorrectionPolicy::Blend { factor }),
            remote_position_rate: row.remote_position_rate,
            remote_rotation_rate: row.remote_rotation_rate,
            remote_seed_velocity: row.remote_seed_velocity,
            max_extrapolation_secs: row.max_extrapolation_secs,
        }
    }
}
