use crate::physics::math::{Scalar, Vector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3d {
    pub min: Vector,
    pub max: Vector,
}

impl Aabb3d {
    pub fn new(min: Vector, max: Vector) -> Self {
        Self { min, max }
    }

    /// Axis-aligned cube with the given centre and edge length
    pub fn cube(center: Vector, edge: Scalar) -> Self {
        let half = Vector::splat(edge * 0.5);
        Self::new(center - half, center + half)
    }

    /// Smallest box holding every point, or `None` for no points
    pub fn enclosing(points: impl IntoIterator<Item = Vector>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), point| {
            (min.min(point), max.max(point))
        });
        Some(Self::new(min, max))
    }

    #[inline]
    pub fn center(&self) -> Vector {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vector {
        self.max - self.min
    }

    /// Longest edge
    #[inline]
    pub fn edge(&self) -> Scalar {
        self.size().max_element()
    }

    #[inline]
    pub fn contains(&self, point: Vector) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Index of the octant of `position`, matching the order of [`Aabb3d::octants`]
    #[inline]
    pub fn octant_index(&self, position: Vector) -> usize {
        let center = self.center();
        ((position.x > center.x) as usize)
            | (((position.y > center.y) as usize) << 1)
            | (((position.z > center.z) as usize) << 2)
    }

    pub fn octants(self) -> [Aabb3d; 8] {
        let center = self.center();

        [
            Aabb3d::new(self.min, center),
            Aabb3d::new(
                Vector::new(center.x, self.min.y, self.min.z),
                Vector::new(self.max.x, center.y, center.z),
            ),
            Aabb3d::new(
                Vector::new(self.min.x, center.y, self.min.z),
                Vector::new(center.x, self.max.y, center.z),
            ),
            Aabb3d::new(
                Vector::new(center.x, center.y, self.min.z),
                Vector::new(self.max.x, self.max.y, center.z),
            ),
            Aabb3d::new(
                Vector::new(self.min.x, self.min.y, center.z),
                Vector::new(center.x, center.y, self.max.z),
            ),
            Aabb3d::new(
                Vector::new(center.x, self.min.y, center.z),
                Vector::new(self.max.x, center.y, self.max.z),
            ),
            Aabb3d::new(
                Vector::new(self.min.x, center.y, center.z),
                Vector::new(center.x, self.max.y, self.max.z),
            ),
            Aabb3d::new(center, self.max),
        ]
    }
}
