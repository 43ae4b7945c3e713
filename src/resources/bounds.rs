use glam::{Affine3A, Vec3};

/// Axis-aligned bounding box.
///
/// An empty box has `min = +inf` and `max = -inf`, so extending it by any point
/// or unioning it with any box yields that point or box unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all `points`; empty for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bound = Self::EMPTY;
        for p in points {
            bound.extend(p);
        }
        bound
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns true if `point` lies inside the box grown by `epsilon` on every side.
    #[must_use]
    pub fn contains_point(&self, point: Vec3, epsilon: f32) -> bool {
        let e = Vec3::splat(epsilon);
        point.cmpge(self.min - e).all() && point.cmple(self.max + e).all()
    }

    /// Returns true if `other` lies entirely inside the box grown by `epsilon`.
    #[must_use]
    pub fn contains_box(&self, other: &BoundingBox, epsilon: f32) -> bool {
        other.is_empty()
            || (self.contains_point(other.min, epsilon) && self.contains_point(other.max, epsilon))
    }

    /// Box enclosing the eight transformed corners. Empty stays empty.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        if self.is_empty() {
            return *self;
        }

        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        Self::from_points(corners.into_iter().map(|p| matrix.transform_point3(p)))
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}
