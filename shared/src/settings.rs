use std::time::Duration;

use crate::constants::{
    MAX_PENDING_REQUESTS, MAX_REMOTE_EXTRAPOLATE_SECS, POSITION_DIVERGENCE_SQ,
    REMOTE_POSITION_RATE, REMOTE_ROTATION_RATE, ROTATION_DIVERGENCE_RAD, SAMPLE_INTERVAL,
};

/// How reconciliation writes a divergent prediction back to the live body.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CorrectionPolicy {
    /// Replace pose and velocity with the prediction.
    #[default]
    Snap,
    /// Move `factor` (0..=1) of the way toward the prediction; velocity is still replaced.
    Blend { factor: f32 },
}

/// Runtime tunables shared by client and server.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyncSettings {
    pub sample_interval: Duration,
    pub position_divergence_sq: f32,
    pub rotation_divergence_rad: f32,
    pub max_pending_requests: usize,
    pub correction: CorrectionPolicy,
    pub remote_position_rate: f32,
    pub remote_rotation_rate: f32,
    /// Seed remote bodies with the verified request velocity and extrapolate.
    pub remote_seed_velocity: bool,
    pub max_extrapolation_secs: f32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sample_interval: SAMPLE_INTERVAL,
            position_divergence_sq: POSITION_DIVERGENCE_SQ,
            rotation_divergence_rad: ROTATION_DIVERGENCE_RAD,
            max_pending_requests: MAX_PENDING_REQUESTS,
            correction: CorrectionPolicy::Snap,
            remote_position_rate: REMOTE_POSITION_RATE,
            remote_rotation_rate: REMOTE_ROTATION_RATE,
            remote_seed_velocity: true,
            max_extrapolation_secs: MAX_REMOTE_EXTRAPOLATE_SECS,
        }
    }
}
