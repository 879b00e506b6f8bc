//! Planar and orientation math shared by the state machine, the step bridge and seats.
//!
//! Conventions
//! - +Y is up, +Z is the avatar's local forward, +X its local left.
//! - Orientation vectors are flat (y = 0) and unit length.

use nalgebra as na;

use crate::physics::{Quat, Vec3};

/// Dot products above `1 - ANGLE_DOT_THRESHOLD` are treated as parallel.
const ANGLE_DOT_THRESHOLD: f32 = 5.0e-4;

/// Drop the Y component of a world vector.
#[inline]
pub fn to_planar(v: &Vec3) -> na::Vector2<f32> {
    na::Vector2::new(v.x, v.z)
}

/// Planar (XZ) distance squared between two world positions (meters^2).
#[inline]
pub fn planar_distance_sq(a: &Vec3, b: &Vec3) -> f32 {
    let x = b.x - a.x;
    let z = b.z - a.z;
    x * x + z * z
}

/// Flatten `v` onto the XZ plane and normalize it.
///
/// Returns `None` when the planar part is too small to carry a direction.
#[inline]
pub fn flat_direction(v: &Vec3) -> Option<Vec3> {
    Vec3::new(v.x, 0.0, v.z).try_normalize(1.0e-6)
}

/// Yaw (radians about +Y) that turns local +Z onto the planar direction `(x, z)`.
#[inline]
pub fn yaw_from_xz(x: f32, z: f32) -> f32 {
    x.atan2(z)
}

/// Yaw-only rotation facing `forward`.
///
/// A degenerate `forward` yields the identity rotation.
#[inline]
pub fn rotation_from_forward(forward: &Vec3) -> Quat {
    match flat_direction(forward) {
        Some(dir) => Quat::from_axis_angle(&Vec3::y_axis(), yaw_from_xz(dir.x, dir.z)),
        None => Quat::identity(),
    }
}

/// Flat forward vector (+Z rotated by `rotation`).
#[inline]
pub fn forward_from_rotation(rotation: &Quat) -> Vec3 {
    flat_direction(&(*rotation * Vec3::z())).unwrap_or_else(Vec3::z)
}

/// Rotate the avatar-local vector `local` into world space using the flat basis `forward`.
///
/// `forward` is the local +Z axis expressed in world space; local +X maps to the vector to
/// the left of it.
#[inline]
pub fn apply_vector_matrix_xz(forward: &Vec3, local: &Vec3) -> Vec3 {
    Vec3::new(
        forward.x * local.z + forward.z * local.x,
        local.y,
        forward.z * local.z - forward.x * local.x,
    )
}

/// Unsigned angle between two unit vectors, with near-parallel inputs snapped to 0 or π.
#[inline]
pub fn angle_between(a: &Vec3, b: &Vec3) -> f32 {
    let dot = a.dot(b);
    if dot > 1.0 - ANGLE_DOT_THRESHOLD {
        0.0
    } else if dot < -1.0 + ANGLE_DOT_THRESHOLD {
        std::f32::consts::PI
    } else {
        dot.acos()
    }
}

/// Signed angle (about +Y) that rotates `from` toward `to`.
#[inline]
pub fn signed_angle_between(from: &Vec3, to: &Vec3) -> f32 {
    let angle = angle_between(from, to);
    if Vec3::y().dot(&from.cross(to)) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Rotate `v` by `angle` radians about +Y.
#[inline]
pub fn rotate_about_y(v: &Vec3, angle: f32) -> Vec3 {
    Quat::from_axis_angle(&Vec3::y_axis(), angle) * *v
}

#[inline]
pub fn have_different_signs(a: f32, b: f32) -> bool {
    (a < 0.0) != (b < 0.0)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Sinusoidal ease for `t` in [0, 1].
#[inline]
pub fn ease_in_out_sine(t: f32) -> f32 {
    -((std::f32::consts::PI * t).cos() - 1.0) / 2.0
}

/// Rotation that maps world up onto `normal` (identity for degenerate normals).
#[inline]
pub fn rotation_from_up(normal: &Vec3) -> Quat {
    Quat::rotation_between(&Vec3::y(), normal).unwrap_or_else(Quat::identity)
}
