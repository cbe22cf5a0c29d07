/*!
Pose and velocity types plus the physics accessor the protocol drives.

The protocol never steps a physics engine itself. It reads and writes the live
pose/velocity of a body through [`PhysicsBody`], which is implemented for the
plain [`KinematicBody`] below and for Rapier rigid bodies in `crate::rapier`.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;

/// World-space position and orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
        }
    }
}

impl Pose {
    #[inline]
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// Linear (m/s) and angular (rad/s, world axes) velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Default for Velocity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Velocity {
    pub const ZERO: Self = Self {
        linear: Vec3::new(0.0, 0.0, 0.0),
        angular: Vec3::new(0.0, 0.0, 0.0),
    };

    #[inline]
    pub fn new(linear: Vec3, angular: Vec3) -> Self {
        Self { linear, angular }
    }
}

/// Read/write access to a live physics body.
///
/// Implementors own the actual simulation state; the protocol only reads it and
/// writes corrections back.
pub trait PhysicsBody {
    fn pose(&self) -> Pose;
    fn velocity(&self) -> Velocity;
    fn set_pose(&mut self, pose: Pose);
    fn set_velocity(&mut self, velocity: Velocity);
}

/// Minimal velocity-integrated body (no collision).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KinematicBody {
    pub pose: Pose,
    pub velocity: Velocity,
}

impl KinematicBody {
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            velocity: Velocity::ZERO,
        }
    }

    /// Advance the pose by the current velocity.
    pub fn step(&mut self, dt: f32) {
        self.pose = integrate_pose(&self.pose, &self.velocity, dt);
    }
}

impl PhysicsBody for KinematicBody {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn velocity(&self) -> Velocity {
        self.velocity
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn set_velocity(&mut self, velocity: Velocity) {
        self.velocity = velocity;
    }
}

/// Advance a position by `linear * dt`.
#[inline]
pub fn integrate_position(position: &Vec3, linear: &Vec3, dt: f32) -> Vec3 {
    position + linear * dt
}

/// Advance an orientation by a world-space angular velocity over `dt`.
///
/// The rotation `omega * dt` is applied as a scaled axis on the left (world frame).
#[inline]
pub fn integrate_orientation(orientation: &Quat, angular: &Vec3, dt: f32) -> Quat {
    let delta = angular * dt;
    if delta.norm_squared() <= f32::EPSILON * f32::EPSILON {
        return *orientation;
    }
    let mut q = Quat::from_scaled_axis(delta) * orientation;
    q.renormalize_fast();
    q
}

#[inline]
pub fn integrate_pose(pose: &Pose, velocity: &Velocity, dt: f32) -> Pose {
    Pose {
        position: integrate_position(&pose.position, &velocity.linear, dt),
        orientation: integrate_orientation(&pose.orientation, &velocity.angular, dt),
    }
}
