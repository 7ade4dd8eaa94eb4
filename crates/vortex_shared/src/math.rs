//! Transform math shared by descriptor building and asset baking.
//!
//! Vectors and quaternions are `glam` types; only the wire records in
//! [`crate::protocol`] flatten them to arrays.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::MIN_AXIS_SCALE;

/// Translation, rotation, non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position
    pub translation: Vec3,
    /// Rotation
    pub rotation: Quat,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a new transform
    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    /// Pure translation
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY, Vec3::ONE)
    }

    /// Local-to-world matrix (scale, then rotate, then translate).
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decomposes an affine matrix. Shear is discarded and the scale is the
    /// lossy per-axis scale.
    #[must_use]
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self { translation, rotation, scale }
    }

    /// `self * inner` as matrices, decomposed back.
    #[must_use]
    pub fn compose_matrix(&self, inner: &Mat4) -> Self {
        Self::from_matrix(&(self.to_matrix() * *inner))
    }

    /// Rotates a direction into world space.
    #[must_use]
    pub fn rotate(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Lifts near-zero components to [`MIN_AXIS_SCALE`], keeping the sign of
/// everything else.
#[must_use]
pub fn replace_zeroes(v: Vec3) -> Vec3 {
    let lift = |x: f32| if x.abs() < MIN_AXIS_SCALE { MIN_AXIS_SCALE } else { x };
    Vec3::new(lift(v.x), lift(v.y), lift(v.z))
}

/// Quaternion as the engine's `(x, y, z, w)` row.
#[must_use]
pub fn quat_row(q: Quat) -> [f32; 4] {
    [q.x, q.y, q.z, q.w]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_replace_zeroes() {
        let v = replace_zeroes(Vec3::new(0.0, -0.0005, 2.0));
        assert_eq!(v, Vec3::new(MIN_AXIS_SCALE, MIN_AXIS_SCALE, 2.0));

        let negative = replace_zeroes(Vec3::new(-3.0, 1.0, 1.0));
        assert_eq!(negative.x, -3.0);
    }

    #[test]
    fn test_matrix_round_trip() {
        let t = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(2.0, 0.5, 1.5),
        );
        let back = Transform::from_matrix(&t.to_matrix());
        assert!(approx(back.translation, t.translation));
        assert!(approx(back.scale, t.scale));
        assert!(back.rotation.dot(t.rotation).abs() > 0.9999);
    }

    #[test]
    fn test_compose_with_identity() {
        let t = Transform::from_translation(Vec3::new(4.0, 0.0, -1.0));
        let composed = t.compose_matrix(&Mat4::IDENTITY);
        assert!(approx(composed.translation, t.translation));
        assert!(approx(composed.scale, Vec3::ONE));
    }

    #[test]
    fn test_quat_row_order() {
        assert_eq!(quat_row(Quat::IDENTITY), [0.0, 0.0, 0.0, 1.0]);
    }
}
