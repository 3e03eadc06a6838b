// Outline geometry: points and axis-aligned bounding boxes.
//
// The y axis points up, so `top >= bottom` for every valid box.

/// A point on an outline, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
    pub top: i16,
}

impl BoundingBox {
    pub const fn new(left: i16, bottom: i16, right: i16, top: i16) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// A degenerate box containing a single point.
    pub fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// Smallest box containing all the given points, or `None` if empty.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::from_point(first);
        for p in iter {
            bbox.include(p);
        }
        Some(bbox)
    }

    /// Grow the box to include `p`.
    pub fn include(&mut self, p: Point) {
        self.left = self.left.min(p.x);
        self.right = self.right.max(p.x);
        self.bottom = self.bottom.min(p.y);
        self.top = self.top.max(p.y);
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    pub fn width(&self) -> i32 {
        self.right as i32 - self.left as i32
    }

    pub fn height(&self) -> i32 {
        self.top as i32 - self.bottom as i32
    }

    /// Pack the four coordinates into one key for hashing and lookup.
    pub fn key(&self) -> u64 {
        ((self.left as u16 as u64) << 48)
            | ((self.bottom as u16 as u64) << 32)
            | ((self.right as u16 as u64) << 16)
            | (self.top as u16 as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_covers_all() {
        let bbox = BoundingBox::from_points([
            Point::new(3, 4),
            Point::new(-1, 10),
            Point::new(7, 2),
        ])
        .unwrap();
        assert_eq!(bbox, BoundingBox::new(-1, 2, 7, 10));
        assert_eq!(bbox.width(), 8);
        assert_eq!(bbox.height(), 8);
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn union_is_symmetric() {
        let a = BoundingBox::new(0, 0, 5, 5);
        let b = BoundingBox::new(4, -2, 9, 3);
        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&b), BoundingBox::new(0, -2, 9, 5));
    }

    #[test]
    fn key_distinguishes_negative_coordinates() {
        let a = BoundingBox::new(-1, 0, 0, 0);
        let b = BoundingBox::new(1, 0, 0, 0);
        assert_ne!(a.key(), b.key());
    }
}
