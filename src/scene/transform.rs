//! The transform capability set.
//!
//! The scene graph never looks inside a transformation; it only needs to
//! compose them, invert them and push points through them. Anything providing
//! those operations can parameterize a [`Scene`](crate::scene::Scene), which
//! is how the same hierarchy code serves both 2D and 3D scenes.

use glam::{Affine2, Affine3A, Vec2, Vec3};

/// Operations the scene graph requires of a transformation value.
///
/// Composition is written parent-first: `parent.compose(&local)` yields the
/// transformation that applies `local` in the parent's space.
pub trait TransformAlgebra: Copy + PartialEq + 'static {
    /// The point type this transformation acts on.
    type Point: Copy;

    /// The neutral transformation.
    const IDENTITY: Self;

    /// Returns `self ∘ other`.
    #[must_use]
    fn compose(&self, other: &Self) -> Self;

    /// Returns the inverse transformation.
    #[must_use]
    fn inverse(&self) -> Self;

    /// Applies the transformation to a point.
    #[must_use]
    fn transform_point(&self, point: Self::Point) -> Self::Point;
}

impl TransformAlgebra for Affine2 {
    type Point = Vec2;

    const IDENTITY: Self = Affine2::IDENTITY;

    #[inline]
    fn compose(&self, other: &Self) -> Self {
        *self * *other
    }

    #[inline]
    fn inverse(&self) -> Self {
        Affine2::inverse(self)
    }

    #[inline]
    fn transform_point(&self, point: Vec2) -> Vec2 {
        self.transform_point2(point)
    }
}

impl TransformAlgebra for Affine3A {
    type Point = Vec3;

    const IDENTITY: Self = Affine3A::IDENTITY;

    #[inline]
    fn compose(&self, other: &Self) -> Self {
        *self * *other
    }

    #[inline]
    fn inverse(&self) -> Self {
        Affine3A::inverse(self)
    }

    #[inline]
    fn transform_point(&self, point: Vec3) -> Vec3 {
        self.transform_point3(point)
    }
}
