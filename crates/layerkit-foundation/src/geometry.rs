//! 2D points, sizes, rects, vectors and an affine matrix, plus the scalar
//! sanitization helper used to snap coordinates to a pixel grid.

/// A real-valued coordinate or measurement.
pub type Scalar = f64;

/// A point in some layer's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: Scalar,
    pub y: Scalar,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: Scalar, y: Scalar) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> Scalar {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(self, dx: Scalar, dy: Scalar) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Sub for Point {
    type Output = Vector;
    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add<Vector> for Point {
    type Output = Point;
    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

impl std::ops::Div<Scalar> for Vector {
    type Output = Vector;
    fn div(self, rhs: Scalar) -> Vector {
        Vector::new(self.dx / rhs, self.dy / rhs)
    }
}

/// A width/height pair. Negative components are possible transiently but
/// layout never produces them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: Scalar,
    pub height: Scalar,
}

impl Size {
    pub fn new(width: Scalar, height: Scalar) -> Self {
        Self { width, height }
    }

    pub fn make_empty() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A displacement, or a wheel delta, or the direction vector between two
/// pointers in a multi-touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub dx: Scalar,
    pub dy: Scalar,
}

impl Vector {
    pub const ZERO: Vector = Vector { dx: 0.0, dy: 0.0 };

    pub fn new(dx: Scalar, dy: Scalar) -> Self {
        Self { dx, dy }
    }

    pub fn length(self) -> Scalar {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }
}

impl std::ops::Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.dx - rhs.dx, self.dy - rhs.dy)
    }
}

/// An axis-aligned rectangle stored as edges, matching the original's
/// left/top/right/bottom layout (rather than origin+size) since hit-testing
/// and touch-area-extension both want direct edge arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: Scalar,
    pub top: Scalar,
    pub right: Scalar,
    pub bottom: Scalar,
}

impl Rect {
    pub fn make_xywh(x: Scalar, y: Scalar, width: Scalar, height: Scalar) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    pub fn make_empty() -> Self {
        Self::default()
    }

    pub fn width(&self) -> Scalar {
        self.right - self.left
    }

    pub fn height(&self) -> Scalar {
        self.bottom - self.top
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Inset by `left/top/right/bottom`; negative values expand the rect.
    /// Used for `touchAreaExtension`.
    pub fn inset(&self, left: Scalar, top: Scalar, right: Scalar, bottom: Scalar) -> Rect {
        Rect {
            left: self.left - left,
            top: self.top - top,
            right: self.right + right,
            bottom: self.bottom + bottom,
        }
    }
}

/// An affine 3x3 matrix stored as the usual 2x3 row-major subset
/// `[a c tx; b d ty; 0 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: Scalar,
    pub b: Scalar,
    pub c: Scalar,
    pub d: Scalar,
    pub tx: Scalar,
    pub ty: Scalar,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn translation(dx: Scalar, dy: Scalar) -> Self {
        Self {
            tx: dx,
            ty: dy,
            ..Self::identity()
        }
    }

    pub fn scale(sx: Scalar, sy: Scalar) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    pub fn rotation(radians: Scalar) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Builds the transform described by a layer's translation/scale/rotation
    /// around the given anchor point (in the layer's own local space).
    pub fn from_components(
        translation: Vector,
        scale_x: Scalar,
        scale_y: Scalar,
        rotation: Scalar,
        anchor: Point,
    ) -> Self {
        Matrix::translation(anchor.x + translation.dx, anchor.y + translation.dy)
            .concat(&Matrix::rotation(rotation))
            .concat(&Matrix::scale(scale_x, scale_y))
            .concat(&Matrix::translation(-anchor.x, -anchor.y))
    }

    /// Returns `self * rhs`, i.e. applying `rhs` first, then `self`.
    pub fn concat(&self, rhs: &Matrix) -> Matrix {
        Matrix {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            tx: self.a * rhs.tx + self.c * rhs.ty + self.tx,
            ty: self.b * rhs.tx + self.d * rhs.ty + self.ty,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    pub fn determinant(&self) -> Scalar {
        self.a * self.d - self.b * self.c
    }

    /// Fallible inverse; `None` for a singular (non-invertible) matrix, which
    /// coordinate-conversion callers treat as "point unreachable".
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < Scalar::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;
        let tx = -(a * self.tx + c * self.ty);
        let ty = -(b * self.tx + d * self.ty);
        Some(Matrix { a, b, c, d, tx, ty })
    }

    /// `Result`-returning convenience over `invert` for callers (chiefly
    /// tests) that want a `?`-able error rather than an `Option`.
    pub fn try_invert(&self) -> Result<Matrix, GeometryError> {
        self.invert().ok_or(GeometryError::Singular)
    }
}

/// A matrix could not be inverted because its determinant is (numerically)
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    Singular,
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::Singular => write!(f, "matrix is singular and has no inverse"),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Snaps `value` to the nearest multiple of `1/scale`. Identity when
/// `scale <= 0`, matching `sanitizeScalarFromScale` in the original source
/// (named only, not included in the retrieved pack, but referenced directly
/// by `LayerRoot::sanitizeCoordinate`).
pub fn sanitize_scalar_from_scale(value: Scalar, scale: Scalar) -> Scalar {
    if scale <= 0.0 {
        return value;
    }
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_respects_half_open_bounds() {
        let r = Rect::make_xywh(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(!r.contains(Point::new(10.0, 0.0)));
        assert!(!r.contains(Point::new(0.0, 10.0)));
    }

    #[test]
    fn matrix_translation_then_apply() {
        let m = Matrix::translation(5.0, 7.0);
        let p = m.apply(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(6.0, 8.0));
    }

    #[test]
    fn matrix_concat_order_applies_rhs_first() {
        let t = Matrix::translation(10.0, 0.0);
        let s = Matrix::scale(2.0, 2.0);
        let combined = t.concat(&s);
        // scale first, then translate: (1,1) -> (2,2) -> (12,2)
        assert_eq!(combined.apply(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
    }

    #[test]
    fn try_invert_surfaces_a_typed_error_for_a_singular_matrix() {
        let singular = Matrix::from_components(Vector::ZERO, 0.0, 0.0, 0.0, Point::ZERO);
        assert_eq!(singular.try_invert(), Err(GeometryError::Singular));
    }

    #[test]
    fn matrix_round_trips_through_inverse() {
        let m = Matrix::from_components(Vector::new(3.0, -2.0), 2.0, 0.5, 0.3, Point::new(1.0, 1.0));
        let inv = m.invert().expect("invertible");
        let p = Point::new(12.5, -4.0);
        let round_tripped = inv.apply(m.apply(p));
        assert!((round_tripped.x - p.x).abs() < 1e-9);
        assert!((round_tripped.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Matrix::scale(0.0, 1.0);
        assert!(m.invert().is_none());
    }

    #[test]
    fn sanitize_is_identity_for_non_positive_scale() {
        assert_eq!(sanitize_scalar_from_scale(1.2345, 0.0), 1.2345);
        assert_eq!(sanitize_scalar_from_scale(1.2345, -2.0), 1.2345);
    }

    #[test]
    fn sanitize_snaps_to_pixel_grid() {
        // scale = 2 -> quantum of 0.5
        assert_eq!(sanitize_scalar_from_scale(1.24, 2.0), 1.0);
        assert_eq!(sanitize_scalar_from_scale(1.26, 2.0), 1.5);
    }
}
