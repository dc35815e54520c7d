use serde::{Deserialize, Serialize};

/// A position on a surface, in pixels. Y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned extent of a layer or image region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Smallest box holding every point; `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |b, p| Self {
            min: Point::new(b.min.x.min(p.x), b.min.y.min(p.y)),
            max: Point::new(b.max.x.max(p.x), b.max.y.max(p.y)),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Clockwise from `min`.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }
}

/// A 2D affine transform in canvas order:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Clockwise on screen for positive angles, like CSS `rotate()`.
    pub fn rotate_degrees(degrees: f64) -> Self {
        let rad = degrees.to_radians();
        let (sin_r, cos_r) = rad.sin_cos();
        Self {
            a: cos_r,
            b: sin_r,
            c: -sin_r,
            d: cos_r,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Flat approximation of a 3D tilt: turning the text plane about the
    /// horizontal axis by `tilt_x` foreshortens it vertically, about the
    /// vertical axis by `tilt_y` horizontally.
    pub fn tilt_degrees(tilt_x: f64, tilt_y: f64) -> Self {
        let x_rad = (-tilt_x).to_radians();
        let y_rad = (-tilt_y).to_radians();
        Self::scale(y_rad.cos(), x_rad.cos())
    }

    /// `self * other`: `other` is applied to points first, like
    /// `CanvasRenderingContext2D.transform`.
    pub fn concat(&self, other: &Affine) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, point: &Point) -> Point {
        Point::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Axis-aligned bounds of a transformed box.
    pub fn transform_bbox(&self, bbox: &BBox) -> BBox {
        let corners = bbox.corners().map(|p| self.apply(&p));
        // Four corners are never empty.
        BBox::from_points(&corners).unwrap_or(*bbox)
    }

    /// CSS `matrix()` function with the same coefficients.
    pub fn to_css(&self) -> String {
        format!(
            "matrix({}, {}, {}, {}, {}, {})",
            css_number(self.a),
            css_number(self.b),
            css_number(self.c),
            css_number(self.d),
            css_number(self.e),
            css_number(self.f)
        )
    }
}

/// Round to six decimals and drop negative zero so CSS output stays stable.
pub fn css_number(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_bbox_from_points() {
        assert!(BBox::from_points(&[]).is_none());
        let b = BBox::from_points(&[
            Point::new(3.0, -1.0),
            Point::new(-2.0, 4.0),
            Point::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(b.min, Point::new(-2.0, -1.0));
        assert_eq!(b.max, Point::new(3.0, 4.0));
        assert!(close(b.width(), 5.0));
    }

    #[test]
    fn test_transform_bbox_of_rotation() {
        let b = BBox::new(Point::new(-10.0, -2.0), Point::new(10.0, 2.0));
        let turned = Affine::rotate_degrees(90.0).transform_bbox(&b);
        assert!(close(turned.width(), 4.0));
        assert!(close(turned.height(), 20.0));
    }

    #[test]
    fn test_rotation_is_clockwise_on_screen() {
        let p = Affine::rotate_degrees(90.0).apply(&Point::new(1.0, 0.0));
        assert!(close(p.x, 0.0));
        assert!(close(p.y, 1.0));
    }

    #[test]
    fn test_concat_applies_right_operand_first() {
        let m = Affine::translate(10.0, 0.0).concat(&Affine::scale(2.0, 2.0));
        let p = m.apply(&Point::new(1.0, 1.0));
        assert!(close(p.x, 12.0));
        assert!(close(p.y, 2.0));
    }

    #[test]
    fn test_tilt_foreshortens() {
        let m = Affine::tilt_degrees(60.0, 0.0);
        let p = m.apply(&Point::new(10.0, 10.0));
        assert!(close(p.x, 10.0));
        assert!(close(p.y, 5.0));
        assert_eq!(Affine::tilt_degrees(-60.0, 0.0), m);
    }

    #[test]
    fn test_invert_round_trip() {
        let m = Affine::translate(5.0, -3.0)
            .concat(&Affine::rotate_degrees(30.0))
            .concat(&Affine::scale(2.0, 0.5));
        let inv = m.invert().unwrap();
        let p = inv.apply(&m.apply(&Point::new(7.0, 11.0)));
        assert!(close(p.x, 7.0));
        assert!(close(p.y, 11.0));
        assert!(Affine::tilt_degrees(90.0, 0.0).invert().is_none());
    }

    #[test]
    fn test_css_matrix() {
        assert_eq!(Affine::IDENTITY.to_css(), "matrix(1, 0, 0, 1, 0, 0)");
        assert_eq!(
            Affine::rotate_degrees(180.0).to_css(),
            "matrix(-1, 0, 0, -1, 0, 0)"
        );
    }
}
