// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decomposed 2D local transform.
//!
//! A node's local placement is kept in decomposed form (position, scale,
//! pivot, skew, rotation) rather than as a matrix, so that each component can
//! be animated independently. The rotation/skew basis scalars are cached on
//! mutation, and the full [`Affine`] is assembled on demand by
//! [`to_affine`](LocalTransform::to_affine).

use kurbo::{Affine, Point, Vec2};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Position, scale, pivot, skew, and rotation of a single node.
///
/// The four basis scalars `(cx, sx, cy, sy)` are the columns of the combined
/// rotation/skew 2×2 before scale is applied. They are recomputed whenever
/// rotation or skew changes, so assembling the local matrix involves no
/// trigonometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    /// Translation applied after rotation, skew, and scale.
    pub position: Vec2,
    /// Per-axis scale factor.
    pub scale: Vec2,
    /// Origin of rotation, skew, and scale, in local coordinates.
    ///
    /// The pivot point is invariant under the linear part of the transform;
    /// only the translation depends on it.
    pub pivot: Vec2,
    skew: Vec2,
    rotation: f64,
    cx: f64,
    sx: f64,
    cy: f64,
    sy: f64,
}

impl LocalTransform {
    /// The identity placement: no translation, unit scale, no rotation or skew.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        scale: Vec2::new(1.0, 1.0),
        pivot: Vec2::ZERO,
        skew: Vec2::ZERO,
        rotation: 0.0,
        cx: 1.0,
        sx: 0.0,
        cy: 0.0,
        sy: 1.0,
    };

    /// Returns the rotation in radians.
    #[inline]
    #[must_use]
    pub const fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Sets the rotation in radians, refreshing the cached basis scalars.
    pub fn set_rotation(&mut self, radians: f64) {
        self.rotation = radians;
        self.update_basis();
    }

    /// Returns the rotation in degrees.
    #[inline]
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.rotation.to_degrees()
    }

    /// Sets the rotation in degrees. Views the same underlying value as
    /// [`rotation`](Self::rotation).
    pub fn set_angle(&mut self, degrees: f64) {
        self.set_rotation(degrees.to_radians());
    }

    /// Returns the skew, in radians per axis.
    #[inline]
    #[must_use]
    pub const fn skew(&self) -> Vec2 {
        self.skew
    }

    /// Sets the skew, refreshing the cached basis scalars.
    pub fn set_skew(&mut self, skew: Vec2) {
        self.skew = skew;
        self.update_basis();
    }

    /// Returns the cached basis scalars `(cx, sx, cy, sy)`.
    #[inline]
    #[must_use]
    pub const fn basis(&self) -> (f64, f64, f64, f64) {
        (self.cx, self.sx, self.cy, self.sy)
    }

    /// Assembles the local affine matrix.
    ///
    /// The basis columns are scaled by `scale`, and the translation places
    /// `pivot` at `position`.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        let a = self.cx * self.scale.x;
        let b = self.sx * self.scale.x;
        let c = self.cy * self.scale.y;
        let d = self.sy * self.scale.y;
        let tx = self.position.x - (self.pivot.x * a + self.pivot.y * c);
        let ty = self.position.y - (self.pivot.x * b + self.pivot.y * d);
        Affine::new([a, b, c, d, tx, ty])
    }

    fn update_basis(&mut self) {
        self.cx = (self.rotation + self.skew.y).cos();
        self.sx = (self.rotation + self.skew.y).sin();
        self.cy = -((self.rotation - self.skew.x).sin());
        self.sy = (self.rotation - self.skew.x).cos();
    }
}

impl Default for LocalTransform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_affine_close(a: Affine, b: Affine) {
        let (ca, cb) = (a.as_coeffs(), b.as_coeffs());
        for i in 0..6 {
            assert!(
                (ca[i] - cb[i]).abs() < 1e-9,
                "coefficient {i} differs: {ca:?} vs {cb:?}"
            );
        }
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(LocalTransform::default(), LocalTransform::IDENTITY);
        assert_affine_close(LocalTransform::IDENTITY.to_affine(), Affine::IDENTITY);
    }

    #[test]
    fn translation_only() {
        let mut t = LocalTransform::IDENTITY;
        t.position = Vec2::new(10.0, -3.0);
        assert_affine_close(t.to_affine(), Affine::translate((10.0, -3.0)));
    }

    #[test]
    fn rotation_matches_affine_rotate() {
        let mut t = LocalTransform::IDENTITY;
        t.set_rotation(core::f64::consts::FRAC_PI_3);
        assert_affine_close(t.to_affine(), Affine::rotate(core::f64::consts::FRAC_PI_3));
    }

    #[test]
    fn angle_is_a_degrees_view_over_rotation() {
        let mut t = LocalTransform::IDENTITY;
        t.set_angle(90.0);
        assert!((t.rotation() - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
        t.set_rotation(core::f64::consts::PI);
        assert!((t.angle() - 180.0).abs() < 1e-12);
    }

    #[test]
    fn cross_skew_matches_pure_rotation() {
        // Rotation θ with zero skew and zero rotation with skew (−θ, θ)
        // produce the same basis scalars.
        let theta = 0.7;

        let mut rotated = LocalTransform::IDENTITY;
        rotated.set_rotation(theta);

        let mut skewed = LocalTransform::IDENTITY;
        skewed.set_skew(Vec2::new(-theta, theta));

        let (cx_r, sx_r, cy_r, sy_r) = rotated.basis();
        let (cx_s, sx_s, cy_s, sy_s) = skewed.basis();
        assert!((cx_r - cx_s).abs() < 1e-12);
        assert!((sx_r - sx_s).abs() < 1e-12);
        assert!((cy_r - cy_s).abs() < 1e-12);
        assert!((sy_r - sy_s).abs() < 1e-12);
    }

    #[test]
    fn pivot_is_fixed_under_rotation_and_scale() {
        let mut t = LocalTransform::IDENTITY;
        t.position = Vec2::new(100.0, 50.0);
        t.pivot = Vec2::new(8.0, 6.0);
        t.scale = Vec2::new(2.0, 3.0);
        t.set_rotation(1.1);

        // The pivot point lands exactly on `position`.
        let mapped = t.to_affine() * Point::new(8.0, 6.0);
        assert!((mapped.x - 100.0).abs() < 1e-9);
        assert!((mapped.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn scale_applies_to_basis_columns() {
        let mut t = LocalTransform::IDENTITY;
        t.scale = Vec2::new(2.0, 5.0);
        let coeffs = t.to_affine().as_coeffs();
        assert_eq!(coeffs, [2.0, 0.0, 0.0, 5.0, 0.0, 0.0]);
    }
}
