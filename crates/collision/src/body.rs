//! Capability traits the index consults on the bodies it stores.

use glam::DVec2;

/// Faction handle used by the friend/foe filter.
pub trait Government {
    /// Whether `other` is hostile to this government.
    fn is_enemy(&self, other: &Self) -> bool;
}

/// Oriented silhouette supporting ray and ring tests in the body's local
/// frame. Masks may be animated, so the index asks the body for the mask of
/// the current simulation step.
pub trait Mask {
    /// Where along `direction` a ray starting at `offset` first enters the
    /// mask, as a fraction of the direction vector. Anything `>= 1.0` is a
    /// miss.
    ///
    /// `offset` is the ray origin relative to the mask's center; `facing`
    /// rotates the ray into the mask's local frame.
    fn collide(&self, offset: DVec2, direction: DVec2, facing: f64) -> f64;

    /// Whether any part of the mask lies within `inner..=outer` of the
    /// point at `offset` from the mask's center.
    fn within_ring(&self, offset: DVec2, facing: f64, inner: f64, outer: f64) -> bool;
}

/// Positioned object the index can store.
///
/// The index reads a narrow surface: world-space center, bounding radius,
/// facing, an optional government, and the collision mask for a given step.
/// Heterogeneous populations (ships, asteroids, mines) are a caller-side
/// enum implementing this trait.
pub trait Body {
    type Gov: Government;
    type Mask: Mask;

    fn position(&self) -> DVec2;

    /// Bounding radius of the silhouette. The grid footprint is the closed
    /// box `position ± radius`; over-approximation is safe because the mask
    /// test rejects false positives.
    fn radius(&self) -> f64;

    /// Facing angle in radians.
    fn facing(&self) -> f64;

    fn government(&self) -> Option<&Self::Gov>;

    /// Collision mask for the given simulation step.
    fn mask(&self, step: u64) -> &Self::Mask;
}

/// Source of a line query: the segment runs from `position` to
/// `position + velocity`, filtered by the projectile's government, with its
/// target always hittable.
pub trait Projectile {
    type Body: Body;

    fn position(&self) -> DVec2;
    fn velocity(&self) -> DVec2;
    fn government(&self) -> Option<&<Self::Body as Body>::Gov>;
    fn target(&self) -> Option<&Self::Body>;
}
