//! Page geometry: [`Point`], [`Region`] and the [`Ctm`] affine matrix.
//!
//! Regions produced by accessors are in PDF user space (origin bottom-left,
//! y grows upward). Layout output is expressed in top-left page space, see
//! [`Region::to_top_left`].

/// A point in 2D page space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle `(x0, y0, x1, y1)` on a page.
///
/// A violation or structure element may resolve to zero, one, or many
/// regions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Region {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Build a region from two opposite corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// Width of the region.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the region.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Return a copy with `x0 <= x1` and `y0 <= y1`.
    pub fn normalized(&self) -> Region {
        Region::from_corners(Point::new(self.x0, self.y0), Point::new(self.x1, self.y1))
    }

    /// True when the region has no area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Compute the union of two regions.
    pub fn union(&self, other: &Region) -> Region {
        Region {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// True when the two regions share any area.
    pub fn intersects(&self, other: &Region) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Stable textual key used to deduplicate highlights of the same area.
    ///
    /// Coordinates are rounded to hundredths of a point so that the same
    /// placement computed twice always yields the same signature.
    pub fn signature(&self) -> String {
        format!(
            "{:.2},{:.2},{:.2},{:.2}",
            self.x0, self.y0, self.x1, self.y1
        )
    }

    /// Convert from PDF user space into top-left page space.
    ///
    /// `page` is the page's box in user space; the result measures `y`
    /// downward from the top edge of that box.
    pub fn to_top_left(&self, page: &Region) -> Region {
        let r = self.normalized();
        Region::new(
            r.x0 - page.x0,
            page.y1 - r.y1,
            r.x1 - page.x0,
            page.y1 - r.y0,
        )
    }
}

/// A 2D affine transformation `[a b c d e f]` as used by the PDF `cm` operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ctm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Ctm {
    fn default() -> Self {
        Self::identity()
    }
}

impl Ctm {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Matrix product `self × other`: apply `self` first, then `other`.
    ///
    /// The `cm` operator updates the current matrix as `m.concat(&ctm)`.
    pub fn concat(&self, other: &Ctm) -> Ctm {
        Ctm {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Bounding region of `rect` after transformation.
    pub fn transform_region(&self, rect: &Region) -> Region {
        let corners = [
            self.transform_point(Point::new(rect.x0, rect.y0)),
            self.transform_point(Point::new(rect.x1, rect.y0)),
            self.transform_point(Point::new(rect.x0, rect.y1)),
            self.transform_point(Point::new(rect.x1, rect.y1)),
        ];
        let mut out = Region::from_corners(corners[0], corners[1]);
        for c in &corners[2..] {
            out = out.union(&Region::from_corners(*c, *c));
        }
        out
    }

    /// Where an image XObject lands: the unit square mapped through this matrix.
    pub fn unit_square(&self) -> Region {
        self.transform_region(&Region::new(0.0, 0.0, 1.0, 1.0))
    }
}
