//! Conversions between the simulation's `nalgebra` types and Bevy's `glam` types.

use bevy::prelude::{Quat, Transform, Vec3};
use movesync_shared::Pose;
use nalgebra as na;

pub fn to_bevy_vec3(v: &na::Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_bevy_quat(q: &na::UnitQuaternion<f32>) -> Quat {
    let q = q.quaternion();
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

pub fn pose_to_transform(pose: &Pose) -> Transform {
    Transform {
        translation: to_bevy_vec3(&pose.position),
        rotation: to_bevy_quat(&pose.orientation),
        scale: Vec3::ONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_maps_the_same_forward_axis() {
        let q = na::UnitQuaternion::from_euler_angles(0.3, -0.7, 0.2);
        let forward = q * movesync_shared::constants::local_forward();

        let bevy_forward = to_bevy_quat(&q) * Vec3::NEG_Z;

        assert!((to_bevy_vec3(&forward) - bevy_forward).length() < 1.0e-5);
    }
}
