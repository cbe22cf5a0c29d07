//! In-memory forms of the two protocol messages.
//!
//! These always carry every field. The optional-field wire forms live in `crate::wire`.

use crate::{
    constants::{POSITION_SCALE, VELOCITY_SCALE},
    pose::{Pose, Vec3, Velocity},
    quantize::{
        CompressedQuat, QuantizedVec3, compress_quat, decode_vec3, decompress_quat, encode_vec3,
    },
};

/// One sampled velocity of a controlled entity, client to server.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveRequest {
    /// Strictly increasing per entity.
    pub sequence: u32,
    /// Client clock, seconds.
    pub client_time: f32,
    pub linear_velocity: QuantizedVec3,
    pub angular_velocity: QuantizedVec3,
}

impl MoveRequest {
    pub fn from_velocity(sequence: u32, client_time: f32, velocity: &Velocity) -> Self {
        Self {
            sequence,
            client_time,
            linear_velocity: encode_vec3(&velocity.linear, VELOCITY_SCALE),
            angular_velocity: encode_vec3(&velocity.angular, VELOCITY_SCALE),
        }
    }

    #[inline]
    pub fn linear(&self) -> Vec3 {
        decode_vec3(self.linear_velocity, VELOCITY_SCALE)
    }

    #[inline]
    pub fn angular(&self) -> Vec3 {
        decode_vec3(self.angular_velocity, VELOCITY_SCALE)
    }

    /// Dequantized velocity as both peers simulate it.
    pub fn velocity(&self) -> Velocity {
        Velocity::new(self.linear(), self.angular())
    }
}

/// Server truth for one entity, published once per tick when it changed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AuthoritativeSnapshot {
    pub entity_id: u64,
    /// Absolute position at `POSITION_SCALE`.
    pub position: QuantizedVec3,
    pub orientation: CompressedQuat,
    /// Last request the server applied, after clamping.
    pub verified: Option<MoveRequest>,
}

impl AuthoritativeSnapshot {
    pub fn from_pose(entity_id: u64, pose: &Pose, verified: Option<MoveRequest>) -> Self {
        Self {
            entity_id,
            position: encode_vec3(&pose.position, POSITION_SCALE),
            orientation: compress_quat(&pose.orientation),
            verified,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(
            decode_vec3(self.position, POSITION_SCALE),
            decompress_quat(self.orientation),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Quat;

    #[test]
    fn request_velocity_is_requantized() {
        let velocity = Velocity::new(Vec3::new(0.123_456, 0.0, -2.0), Vec3::new(0.0, 1.0e-6, 0.0));
        let request = MoveRequest::from_velocity(7, 1.5, &velocity);
        assert_eq!(request.linear_velocity, QuantizedVec3::new(1235, 0, -20_000));
        assert_eq!(request.angular(), Vec3::zeros());
        assert!((request.linear().x - 0.1235).abs() < 1.0e-6);
    }

    #[test]
    fn snapshot_pose_round_trips_within_quantization() {
        let pose = Pose::new(
            Vec3::new(12.345_678, -0.5, 1000.0),
            Quat::from_euler_angles(0.3, -1.1, 0.7),
        );
        let snapshot = AuthoritativeSnapshot::from_pose(1, &pose, None);
        let decoded = snapshot.pose();
        assert!((decoded.position - pose.position).norm() < 1.0e-3);
        assert!(decoded.orientation.angle_to(&pose.orientation) < 0.01);
    }
}
