//! Geometry of a single closed polygon ring.

use kurbo::{BezPath, Line, ParamCurveNearest as _, Point, Rect, Shape as _, Vec2};

/// A closed polygon ring.
///
/// The ring is implicitly closed: the last vertex connects back to the first.
/// (A repeated closing vertex is harmless; it just contributes an empty edge.)
///
/// Vertices are always stored "clockwise" in the y-axis-up sense, meaning that
/// the shoelace sum [`Loop::signed_area`] is non-negative. Input that winds the
/// other way is reversed on construction, and again after [`Loop::edit`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Loop {
    vertices: Vec<Point>,
    density: f64,
}

fn cyclic_pairs(xs: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    xs.windows(2)
        .map(|pair| (pair[0], pair[1]))
        .chain(xs.last().copied().zip(xs.first().copied()))
}

const BOUNDARY_TOLERANCE_SQ: f64 = 1e-18;

// The cross product term shared by all the closed-form sums below. For
// "clockwise" edges (in the y-up sense), this is positive.
fn cross(p: Point, q: Point) -> f64 {
    q.x * p.y - p.x * q.y
}

impl Loop {
    /// Creates a loop from its vertices, in either orientation.
    pub fn new<P: Into<Point>>(vertices: impl IntoIterator<Item = P>) -> Self {
        let mut ret = Loop {
            vertices: vertices.into_iter().map(Into::into).collect(),
            density: 1.0,
        };
        ret.normalize_winding();
        ret
    }

    /// Sets the density used by [`Loop::mass`].
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// The density used by [`Loop::mass`]. Defaults to 1.
    pub fn density(&self) -> f64 {
        self.density
    }

    fn normalize_winding(&mut self) {
        if self.signed_area() <= 0.0 {
            self.vertices.reverse();
        }
        self.check_invariants();
    }

    fn check_invariants(&self) {
        #[cfg(feature = "slow-asserts")]
        debug_assert!(
            self.signed_area() >= 0.0,
            "loop winds the wrong way: {self:?}"
        );
    }

    /// The vertices, in canonical order.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Gives mutable access to the vertices.
    ///
    /// When `f` returns, the winding invariant is restored (by reversing the
    /// vertices if necessary).
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Vec<Point>) -> R) -> R {
        let ret = f(&mut self.vertices);
        self.normalize_winding();
        ret
    }

    /// The number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Does this loop have no vertices at all?
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The shoelace area, assuming that the y axis points up.
    ///
    /// This is positive for clockwise loops, and so it is never negative for a
    /// constructed `Loop`. If the loop intersects itself, this is the sum of
    /// the lobes' signed areas.
    pub fn signed_area(&self) -> f64 {
        cyclic_pairs(&self.vertices)
            .map(|(p, q)| cross(p, q))
            .sum::<f64>()
            / 2.0
    }

    /// The enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Does this loop wind clockwise (assuming that the y axis points up)?
    ///
    /// This is false only for degenerate loops with zero area.
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// The area times the density.
    pub fn mass(&self) -> f64 {
        self.area() * self.density
    }

    /// The center of mass of the enclosed area.
    ///
    /// Returns `None` if the area is zero.
    pub fn centroid(&self) -> Option<Point> {
        let area = self.area();
        if area == 0.0 {
            return None;
        }

        let mut sum = Vec2::ZERO;
        for (p, q) in cyclic_pairs(&self.vertices) {
            sum += (p.to_vec2() + q.to_vec2()) * cross(p, q);
        }
        Some((sum / (6.0 * area)).to_point())
    }

    /// The second moment of area about the origin (the polar moment).
    pub fn moment(&self) -> f64 {
        cyclic_pairs(&self.vertices)
            .map(|(p, q)| {
                cross(p, q)
                    * (p.x * p.x + p.x * q.x + q.x * q.x + p.y * p.y + p.y * q.y + q.y * q.y)
            })
            .sum::<f64>()
            / 12.0
    }

    /// Translates every vertex in place.
    pub fn offset(&mut self, by: Vec2) {
        for v in &mut self.vertices {
            *v += by;
        }
        self.check_invariants();
    }

    /// The smallest axis-aligned rectangle containing every vertex.
    ///
    /// Returns `None` for an empty loop.
    pub fn bounding_box(&self) -> Option<Rect> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p)),
        )
    }

    /// This loop as a closed kurbo path.
    pub fn to_bez_path(&self) -> BezPath {
        let mut ret = BezPath::new();
        let mut vs = self.vertices.iter();
        if let Some(first) = vs.next() {
            ret.move_to(*first);
            for v in vs {
                ret.line_to(*v);
            }
            ret.close_path();
        }
        ret
    }

    /// Is `point` on (or within a rounding error of) one of this loop's edges?
    pub fn on_boundary(&self, point: Point) -> bool {
        cyclic_pairs(&self.vertices).any(|(p, q)| {
            Line::new(p, q).nearest(point, 1e-9).distance_sq <= BOUNDARY_TOLERANCE_SQ
        })
    }

    /// Is `point` enclosed by this loop (by the non-zero winding rule)?
    pub fn contains(&self, point: Point) -> bool {
        self.to_bez_path().contains(point)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn unit_square() -> Loop {
        Loop::new([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn square_properties() {
        let sq = unit_square();
        assert_eq!(sq.signed_area(), 1.0);
        assert_eq!(sq.area(), 1.0);
        assert!(sq.is_clockwise());
        assert_eq!(sq.centroid(), Some(Point::new(0.5, 0.5)));
        // Ix + Iy = 1/3 + 1/3 for a unit square with a corner at the origin.
        assert!(close(sq.moment(), 2.0 / 3.0));
        assert_eq!(sq.mass(), 1.0);
        assert_eq!(sq.clone().with_density(2.5).mass(), 2.5);
    }

    #[test]
    fn centered_square() {
        let mut sq = unit_square();
        sq.offset(Vec2::new(-0.5, -0.5));
        assert_eq!(sq.centroid(), Some(Point::ZERO));
        assert!(close(sq.moment(), 1.0 / 6.0));
        assert_eq!(sq.area(), 1.0);
    }

    #[test]
    fn reversed_once() {
        let ccw = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let mut cw = ccw;
        cw.reverse();
        let a = Loop::new(ccw);
        let b = Loop::new(cw);
        assert_eq!(a.vertices(), b.vertices());
        assert_eq!(a.vertices()[0], Point::new(0.0, 1.0));
    }

    #[test]
    fn closing_vertex_is_harmless() {
        let sq = Loop::new([(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]);
        assert_eq!(sq.area(), 4.0);
        assert_eq!(sq.centroid(), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn degenerate() {
        let line = Loop::new([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(line.area(), 0.0);
        assert_eq!(line.centroid(), None);
        assert!(!line.is_clockwise());
        assert_eq!(Loop::new(Vec::<Point>::new()).bounding_box(), None);
    }

    #[test]
    fn triangle_centroid() {
        let tri = Loop::new([(0.0, 0.0), (3.0, 0.0), (0.0, 3.0)]);
        let c = tri.centroid().unwrap();
        assert!(close(c.x, 1.0) && close(c.y, 1.0));
    }

    #[test]
    fn edit_restores_winding() {
        let mut sq = unit_square();
        sq.edit(|vs| vs.reverse());
        assert!(sq.signed_area() > 0.0);
        let n = sq.edit(|vs| {
            vs.push(Point::new(0.5, -1.0));
            vs.len()
        });
        assert_eq!(n, 5);
        assert!(sq.signed_area() >= 0.0);
    }

    #[test]
    fn containment_and_bounds() {
        let sq = unit_square();
        assert!(sq.contains(Point::new(0.25, 0.75)));
        assert!(!sq.contains(Point::new(1.5, 0.5)));
        assert!(sq.on_boundary(Point::new(1.0, 0.5)));
        assert!(sq.on_boundary(Point::new(0.0, 0.0)));
        assert!(!sq.on_boundary(Point::new(0.5, 0.5)));
        assert_eq!(sq.bounding_box(), Some(Rect::new(0.0, 0.0, 1.0, 1.0)));
    }

    fn polygon() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 3..12)
    }

    proptest! {
        #[test]
        fn winding_is_canonical(points in polygon()) {
            let mut reversed = points.clone();
            reversed.reverse();
            prop_assert!(Loop::new(points).signed_area() >= 0.0);
            prop_assert!(Loop::new(reversed).signed_area() >= 0.0);
        }

        #[test]
        fn offset_preserves_area(points in polygon(), dx in -1e3f64..1e3, dy in -1e3f64..1e3) {
            let mut lp = Loop::new(points);
            let before = lp.signed_area();
            lp.offset(Vec2::new(dx, dy));
            prop_assert!((lp.signed_area() - before).abs() <= 1e-6 * before.max(1.0));
        }
    }

    #[test]
    fn arbitrary_rings() {
        arbtest::arbtest(|u| {
            let ring = crate::arbitrary::ring(u)?;
            let lp = Loop::new(ring);
            assert!(lp.signed_area() >= 0.0);
            if let Some(c) = lp.centroid() {
                assert!(c.x.is_finite() && c.y.is_finite());
            }
            Ok(())
        });
    }
}
