use crate::{
    constants::VELOCITY_SCALE,
    pose::Vec3,
    quantize::{decode_scalar, encode_scalar},
};

/// Per-entity movement capability. Fixed for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveAbility {
    /// Acceleration magnitude applied per held linear input (m/s^2).
    pub linear_acceleration: f32,
    /// Acceleration magnitude applied per held angular input (rad/s^2).
    pub angular_acceleration: f32,
    /// Cap on `|linear velocity|` (m/s).
    pub max_linear_speed: f32,
    /// Cap on each angular velocity component (rad/s).
    pub max_angular_speed: f32,
}

impl Default for MoveAbility {
    fn default() -> Self {
        Self {
            linear_acceleration: 1.0,
            angular_acceleration: 1.0,
            max_linear_speed: 3.0,
            max_angular_speed: 2.0,
        }
    }
}

/// [`MoveAbility`] as stored and transmitted: each value at `VELOCITY_SCALE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuantizedMoveAbility {
    pub linear_acceleration: i32,
    pub angular_acceleration: i32,
    pub max_linear_speed: i32,
    pub max_angular_speed: i32,
}

impl MoveAbility {
    pub fn from_quantized(q: QuantizedMoveAbility) -> Self {
        Self {
            linear_acceleration: decode_scalar(q.linear_acceleration, VELOCITY_SCALE),
            angular_acceleration: decode_scalar(q.angular_acceleration, VELOCITY_SCALE),
            max_linear_speed: decode_scalar(q.max_linear_speed, VELOCITY_SCALE),
            max_angular_speed: decode_scalar(q.max_angular_speed, VELOCITY_SCALE),
        }
    }

    pub fn to_quantized(&self) -> QuantizedMoveAbility {
        QuantizedMoveAbility {
            linear_acceleration: encode_scalar(self.linear_acceleration, VELOCITY_SCALE),
            angular_acceleration: encode_scalar(self.angular_acceleration, VELOCITY_SCALE),
            max_linear_speed: encode_scalar(self.max_linear_speed, VELOCITY_SCALE),
            max_angular_speed: encode_scalar(self.max_angular_speed, VELOCITY_SCALE),
        }
    }
}

/// Transient drive state of one entity.
///
/// - `linear_intent` is in entity-local axes (forward/right/up), `angular_intent` in world axes.
/// - `None` means no intent exists for that axis group (nothing accumulated since the last stop).
/// - A set stop flag means "decelerate toward zero"; the integrator ignores the intent while it
///   is set and clears both once the velocity reaches zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementState {
    pub linear_intent: Option<Vec3>,
    pub angular_intent: Option<Vec3>,
    pub stop_movement: bool,
    pub stop_rotation: bool,
}

impl MovementState {
    /// True when nothing drives or brakes this entity.
    pub fn is_idle(&self) -> bool {
        self.linear_intent.is_none()
            && self.angular_intent.is_none()
            && !self.stop_movement
            && !self.stop_rotation
    }
}

/// Deferred change to a [`MovementState`], produced by a parallel pass and applied afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralEdit {
    /// Linear velocity reached zero while stopping.
    MovementStopped,
    /// Angular velocity reached zero while stopping.
    RotationStopped,
}

impl MovementState {
    pub fn apply_edit(&mut self, edit: StructuralEdit) {
        match edit {
            StructuralEdit::MovementStopped => {
                self.linear_intent = None;
                self.stop_movement = false;
            }
            StructuralEdit::RotationStopped => {
                self.angular_intent = None;
                self.stop_rotation = false;
            }
        }
    }
}
