use std::time::Duration;

use nalgebra as na;

/// Fixed-point scale for velocities, accelerations and ability values.
///
/// Current convention: `v_q: i32` stores `v * VELOCITY_SCALE` (0.1 mm/s resolution).
pub const VELOCITY_SCALE: f32 = 10_000.0;

/// Fixed-point scale for absolute world positions (0.01 mm resolution).
pub const POSITION_SCALE: f32 = 100_000.0;

/// Number of magnitude bits per component in a smallest-three quaternion.
pub const QUAT_COMPONENT_BITS: u32 = 9;

/// Largest possible magnitude of a non-largest component of a unit quaternion (1/sqrt(2)).
pub const QUAT_COMPONENT_MAX: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// How frequently the client integrates acceleration into velocity.
pub const INTEGRATION_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 15);

/// How frequently the client samples its velocity into a move request.
pub const SAMPLE_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 15);

/// Server tick rate for validating requests and publishing snapshots.
pub const SERVER_TICK_HZ: i64 = 15;

/// Squared positional error (m^2) above which reconciliation corrects the live pose.
///
/// 0.04 m^2 = 0.2 m.
pub const POSITION_DIVERGENCE_SQ: f32 = 0.04;

/// Rotation error (radians) above which reconciliation corrects the live orientation.
pub const ROTATION_DIVERGENCE_RAD: f32 = 0.06;

/// Upper bound on unacknowledged move requests kept for replay (~8.5 s at 15 Hz).
pub const MAX_PENDING_REQUESTS: usize = 128;

/// Exponential decay rate used when smoothing remote positions (1/s).
pub const REMOTE_POSITION_RATE: f32 = 12.0;

/// Exponential decay rate used when smoothing remote orientations (1/s).
pub const REMOTE_ROTATION_RATE: f32 = 24.0;

/// Don't extrapolate remote bodies past this age of the last snapshot.
pub const MAX_REMOTE_EXTRAPOLATE_SECS: f32 = 0.25;

/// Practical small value for squared-length comparisons.
pub const VELOCITY_EPS_SQ: f32 = 1.0e-12;

/// Local axes used to interpret linear acceleration intents.
///
/// Convention matches the client renderer: forward is -Z, right is +X, up is +Y.
pub fn local_forward() -> na::Vector3<f32> {
    na::Vector3::new(0.0, 0.0, -1.0)
}

pub fn local_right() -> na::Vector3<f32> {
    na::Vector3::x()
}

pub fn local_up() -> na::Vector3<f32> {
    na::Vector3::y()
}

/// World axis for "turn up" (pitch): positive rotation about +X raises a -Z forward.
pub fn pitch_up_axis() -> na::Vector3<f32> {
    na::Vector3::x()
}

/// World axis for "turn right" (yaw): clockwise seen from above is a rotation about -Y.
pub fn yaw_right_axis() -> na::Vector3<f32> {
    -na::Vector3::y()
}
