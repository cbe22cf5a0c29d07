//! Lossy fixed-point codecs used on the wire.
//!
//! # Scalars and vectors
//! `encode_scalar(f, scale)` stores `round(f * scale)` as an `i32`. Decoding divides by the same
//! scale, so the round-trip error is at most `0.5 / scale` per axis. Vectors apply the scalar
//! codec per axis independently.
//!
//! # Orientations (smallest-three)
//! A unit quaternion is packed into 32 bits:
//!
//! ```text
//! | largest index (2) | sign (1) + magnitude (9) | sign (1) + magnitude (9) | sign (1) + magnitude (9) |
//! ```
//!
//! The three non-largest components are written in `(x, y, z, w)` index order, most significant
//! first. Each magnitude maps `[0, 1/sqrt(2)]` onto `[0, 511]`. The largest component is
//! omitted; because `q` and `-q` are the same rotation the quaternion is negated when that
//! component is negative, so the decoder can always take the positive root of
//! `1 - sum(others^2)`.

use crate::constants::{QUAT_COMPONENT_BITS, QUAT_COMPONENT_MAX};
use nalgebra as na;

/// Quantize a scalar to a fixed-point `i32` at `scale`.
///
/// Out-of-range values saturate at the `i32` bounds; NaN encodes as zero.
#[inline]
pub fn encode_scalar(value: f32, scale: f32) -> i32 {
    // `as` saturates float -> int casts and maps NaN to 0.
    (value * scale).round() as i32
}

/// Dequantize a fixed-point `i32` produced by [`encode_scalar`] at the same `scale`.
#[inline]
pub fn decode_scalar(code: i32, scale: f32) -> f32 {
    code as f32 / scale
}

/// A vector quantized per axis at a caller-chosen scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct QuantizedVec3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl QuantizedVec3 {
    pub const ZERO: Self = Self::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

#[inline]
pub fn encode_vec3(v: &na::Vector3<f32>, scale: f32) -> QuantizedVec3 {
    QuantizedVec3 {
        x: encode_scalar(v.x, scale),
        y: encode_scalar(v.y, scale),
        z: encode_scalar(v.z, scale),
    }
}

#[inline]
pub fn decode_vec3(q: QuantizedVec3, scale: f32) -> na::Vector3<f32> {
    na::Vector3::new(
        decode_scalar(q.x, scale),
        decode_scalar(q.y, scale),
        decode_scalar(q.z, scale),
    )
}

/// A smallest-three compressed unit quaternion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompressedQuat(pub u32);

impl Default for CompressedQuat {
    fn default() -> Self {
        compress_quat(&na::UnitQuaternion::identity())
    }
}

const COMPONENT_MASK: u32 = (1 << QUAT_COMPONENT_BITS) - 1;
const FIELD_BITS: u32 = QUAT_COMPONENT_BITS + 1;

/// Compress a unit quaternion with the smallest-three scheme.
///
/// Non-finite input compresses to identity.
pub fn compress_quat(rotation: &na::UnitQuaternion<f32>) -> CompressedQuat {
    let q = rotation.quaternion();
    // nalgebra stores [i, j, k, w] which matches the (x, y, z, w) wire order.
    let mut c = [q.i, q.j, q.k, q.w];

    let norm = c.iter().map(|v| v * v).sum::<f32>().sqrt();
    if !norm.is_finite() || norm <= f32::EPSILON {
        c = [0.0, 0.0, 0.0, 1.0];
    } else {
        c.iter_mut().for_each(|v| *v /= norm);
    }

    let mut largest = 0usize;
    for i in 1..4 {
        if c[i].abs() > c[largest].abs() {
            largest = i;
        }
    }

    // q == -q: flip so the omitted component is positive.
    if c[largest] < 0.0 {
        c.iter_mut().for_each(|v| *v = -*v);
    }

    let mut packed = largest as u32;
    for (i, value) in c.iter().enumerate() {
        if i == largest {
            continue;
        }
        let sign = u32::from(*value < 0.0);
        let t = (value.abs() / QUAT_COMPONENT_MAX).min(1.0);
        let magnitude = (t * COMPONENT_MASK as f32).round() as u32;
        packed = (packed << FIELD_BITS) | (sign << QUAT_COMPONENT_BITS) | magnitude;
    }

    CompressedQuat(packed)
}

/// Decompress a smallest-three quaternion back into a unit quaternion.
pub fn decompress_quat(compressed: CompressedQuat) -> na::UnitQuaternion<f32> {
    let mut bits = compressed.0;
    let largest = (bits >> 30) as usize;

    let mut c = [0.0f32; 4];
    let mut sum_sq = 0.0;
    // Fields were pushed in ascending index order, so the lowest bits hold the highest index.
    for i in (0..4).rev() {
        if i == largest {
            continue;
        }
        let magnitude = bits & COMPONENT_MASK;
        let sign = (bits >> QUAT_COMPONENT_BITS) & 1;
        let mut v = QUAT_COMPONENT_MAX * magnitude as f32 / COMPONENT_MASK as f32;
        if sign == 1 {
            v = -v;
        }
        c[i] = v;
        sum_sq += v * v;
        bits >>= FIELD_BITS;
    }

    c[largest] = (1.0 - sum_sq).max(0.0).sqrt();

    na::UnitQuaternion::from_quaternion(na::Quaternion::new(c[3], c[0], c[1], c[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{POSITION_SCALE, VELOCITY_SCALE};

    #[test]
    fn scalar_round_trip_is_within_half_a_step() {
        for scale in [VELOCITY_SCALE, POSITION_SCALE] {
            let mut f = -500.0f32;
            while f <= 500.0 {
                let back = decode_scalar(encode_scalar(f, scale), scale);
                // Allow for f32 representation error at large magnitudes.
                let tol = 0.5 / scale + f.abs() * f32::EPSILON * 2.0;
                assert!((back - f).abs() <= tol, "f={f} back={back} scale={scale}");
                f += 0.123_457;
            }
        }
    }

    #[test]
    fn encode_scalar_rounds_to_nearest() {
        assert_eq!(encode_scalar(1.23456, VELOCITY_SCALE), 12346);
        assert_eq!(encode_scalar(-1.23454, VELOCITY_SCALE), -12345);
        assert_eq!(encode_scalar(0.0, POSITION_SCALE), 0);
    }

    #[test]
    fn encode_scalar_saturates_and_maps_nan_to_zero() {
        assert_eq!(encode_scalar(f32::INFINITY, POSITION_SCALE), i32::MAX);
        assert_eq!(encode_scalar(f32::NEG_INFINITY, POSITION_SCALE), i32::MIN);
        assert_eq!(encode_scalar(f32::NAN, POSITION_SCALE), 0);
    }

    #[test]
    fn vec3_round_trip_is_per_axis() {
        let v = na::Vector3::new(1.5, -2.25, 3.000_04);
        let back = decode_vec3(encode_vec3(&v, VELOCITY_SCALE), VELOCITY_SCALE);
        for i in 0..3 {
            assert!((back[i] - v[i]).abs() <= 0.5 / VELOCITY_SCALE + 1.0e-6);
        }
    }

    fn sample_rotations() -> Vec<na::UnitQuaternion<f32>> {
        let mut out = vec![na::UnitQuaternion::identity()];
        let axes = [
            na::Vector3::x_axis(),
            na::Vector3::y_axis(),
            na::Vector3::z_axis(),
            na::Unit::new_normalize(na::Vector3::new(1.0, 1.0, 0.0)),
            na::Unit::new_normalize(na::Vector3::new(-0.3, 0.8, 0.5)),
        ];
        for axis in axes {
            for step in 0..24 {
                let angle = -std::f32::consts::PI + step as f32 * (std::f32::consts::TAU / 24.0);
                out.push(na::UnitQuaternion::from_axis_angle(&axis, angle));
            }
        }
        out
    }

    #[test]
    fn quat_round_trip_represents_same_rotation() {
        for q in sample_rotations() {
            let back = decompress_quat(compress_quat(&q));
            // |dot| handles q == -q.
            let dot = q.quaternion().dot(back.quaternion()).abs();
            assert!(dot >= 1.0 - 1.0e-4, "q={q:?} back={back:?} dot={dot}");
        }
    }

    #[test]
    fn quat_sign_ambiguity_encodes_identically() {
        let q = na::UnitQuaternion::from_euler_angles(0.3, -1.1, 2.0);
        let neg = na::UnitQuaternion::new_unchecked(-q.into_inner());
        assert_eq!(compress_quat(&q), compress_quat(&neg));
    }

    #[test]
    fn quat_identity_packs_largest_index_w() {
        let packed = compress_quat(&na::UnitQuaternion::identity());
        assert_eq!(packed.0 >> 30, 3);
        assert_eq!(packed.0 & ((1 << 30) - 1), 0);
    }

    #[test]
    fn quat_non_finite_compresses_to_identity() {
        let bad = na::UnitQuaternion::new_unchecked(na::Quaternion::new(f32::NAN, 0.0, 0.0, 0.0));
        assert_eq!(
            compress_quat(&bad),
            compress_quat(&na::UnitQuaternion::identity())
        );
    }
}
