//! [`PhysicsBody`] for Rapier rigid bodies, plus a small body store that advances kinematic
//! bodies by their velocity.
//!
//! Collision response is out of scope here: bodies are velocity-based kinematic bodies and are
//! moved with the same pose integration the protocol replays, so prediction and the live body
//! agree exactly when no correction is needed.

// Re-export Rapier so downstream crates can name its types without a direct dependency.
pub use rapier3d;

use rapier3d::{
    na::{Isometry3, Translation3},
    prelude::{RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet},
};

use crate::pose::{PhysicsBody, Pose, Velocity, integrate_pose};

impl PhysicsBody for RigidBody {
    fn pose(&self) -> Pose {
        let iso = self.position();
        Pose::new(iso.translation.vector, iso.rotation)
    }

    fn velocity(&self) -> Velocity {
        Velocity::new(*self.linvel(), *self.angvel())
    }

    fn set_pose(&mut self, pose: Pose) {
        self.set_position(pose_to_isometry(&pose), true);
    }

    fn set_velocity(&mut self, velocity: Velocity) {
        self.set_linvel(velocity.linear, true);
        self.set_angvel(velocity.angular, true);
    }
}

pub fn pose_to_isometry(pose: &Pose) -> Isometry3<f32> {
    Isometry3::from_parts(Translation3::from(pose.position), pose.orientation)
}

/// Kinematic movers stored in a Rapier [`RigidBodySet`].
#[derive(Default)]
pub struct KinematicBodies {
    bodies: RigidBodySet,
}

impl KinematicBodies {
    pub fn spawn(&mut self, pose: Pose) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_velocity_based()
            .pose(pose_to_isometry(&pose))
            .build();
        self.bodies.insert(body)
    }

    pub fn get(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn get_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Move every body by its current velocity over `dt`.
    pub fn step(&mut self, dt: f32) {
        for (_, body) in self.bodies.iter_mut() {
            let next = integrate_pose(&body.pose(), &body.velocity(), dt);
            body.set_position(pose_to_isometry(&next), false);
        }
    }
}
