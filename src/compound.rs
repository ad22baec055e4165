//! Shapes made of several loops.

use kurbo::{Point, Rect, Vec2};

use crate::{
    path::{PathError, PathTokenizer},
    polygon::Loop,
};

/// A shape's full outline, as a list of loops.
///
/// Since every [`Loop`] is normalized to the same orientation, holes can't be
/// recognized by their winding. Instead, a loop is a hole if it is nested
/// inside an odd number of the other loops. Holes subtract from the area,
/// mass, and moment, and pull the centroid away from themselves. This assumes
/// that loops don't cross one another.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Path {
    loops: Vec<Loop>,
}

impl Path {
    /// Creates a compound shape from its loops.
    pub fn new(loops: impl IntoIterator<Item = Loop>) -> Self {
        Path {
            loops: loops.into_iter().collect(),
        }
    }

    /// Builds a compound shape from path data, with one loop per subpath.
    ///
    /// Subpaths with fewer than three vertices enclose nothing, and are dropped.
    pub fn from_path_data(data: &str, strict: bool) -> Result<Self, PathError> {
        let loops = PathTokenizer::with_strictness(data, strict).loops()?;
        Ok(Path::new(
            loops.into_iter().filter(|l| l.len() >= 3).map(Loop::new),
        ))
    }

    /// The loops making up this shape.
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    /// For each loop, `1.0` if it's an outer boundary and `-1.0` if it's a hole.
    pub fn loop_signs(&self) -> Vec<f64> {
        self.loops
            .iter()
            .enumerate()
            .map(|(i, lp)| {
                let depth = self
                    .loops
                    .iter()
                    .enumerate()
                    .filter(|&(j, other)| j != i && is_nested(lp, other))
                    .count();
                if depth % 2 == 0 {
                    1.0
                } else {
                    -1.0
                }
            })
            .collect()
    }

    fn signed_sum(&self, f: impl Fn(&Loop) -> f64) -> f64 {
        self.loops
            .iter()
            .zip(self.loop_signs())
            .map(|(lp, sign)| sign * f(lp))
            .sum()
    }

    /// The enclosed area, with holes subtracted.
    pub fn area(&self) -> f64 {
        self.signed_sum(Loop::area)
    }

    /// The sum of all the loops' areas, holes included.
    pub fn gross_area(&self) -> f64 {
        self.loops.iter().map(Loop::area).sum()
    }

    /// The total mass, with holes subtracted.
    pub fn mass(&self) -> f64 {
        self.signed_sum(Loop::mass)
    }

    /// The second moment of area about the origin, with holes subtracted.
    pub fn moment(&self) -> f64 {
        self.signed_sum(Loop::moment)
    }

    /// The center of mass.
    ///
    /// Returns `None` if the net mass isn't positive.
    pub fn centroid(&self) -> Option<Point> {
        let mut weighted = Vec2::ZERO;
        let mut total = 0.0;
        for (lp, sign) in self.loops.iter().zip(self.loop_signs()) {
            // Zero-area loops have no centroid, but also no mass.
            if let Some(c) = lp.centroid() {
                let mass = sign * lp.mass();
                weighted += c.to_vec2() * mass;
                total += mass;
            }
        }
        (total > 0.0).then(|| (weighted / total).to_point())
    }

    /// The smallest axis-aligned rectangle containing every vertex of every loop.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.loops
            .iter()
            .filter_map(Loop::bounding_box)
            .reduce(|a, b| a.union(b))
    }

    /// The center of the bounding box.
    pub fn center(&self) -> Option<Point> {
        self.bounding_box().map(|r| r.center())
    }

    /// Is `point` inside this shape?
    ///
    /// The loops enclosing `point` are counted with the same signs as in
    /// [`Path::area`], and the point is inside if the total is positive. So
    /// points in holes are outside, but points where two outer loops
    /// overlap are inside.
    pub fn contains(&self, point: Point) -> bool {
        self.loops
            .iter()
            .zip(self.loop_signs())
            .filter(|(lp, _)| lp.contains(point))
            .map(|(_, sign)| sign)
            .sum::<f64>()
            > 0.0
    }

    /// Translates every loop in place.
    pub fn offset(&mut self, by: Vec2) {
        for lp in &mut self.loops {
            lp.offset(by);
        }
    }

    /// Translates this shape so that its centroid is at the origin.
    ///
    /// Returns the translation that was applied, or `None` (leaving the shape
    /// untouched) if there is no centroid.
    pub fn offset_to_origin(&mut self) -> Option<Vec2> {
        let by = -self.centroid()?.to_vec2();
        self.offset(by);
        Some(by)
    }
}

// Is `inner` inside `outer`? Loops that share boundary segments (like
// neighboring tiles) are not nested.
fn is_nested(inner: &Loop, outer: &Loop) -> bool {
    let (Some(ib), Some(ob)) = (inner.bounding_box(), outer.bounding_box()) else {
        return false;
    };
    if ib.x0 < ob.x0 || ib.y0 < ob.y0 || ib.x1 > ob.x1 || ib.y1 > ob.y1 {
        return false;
    }
    inner
        .vertices()
        .iter()
        .find(|p| !outer.on_boundary(**p))
        .is_some_and(|p| outer.contains(*p))
}

impl FromIterator<Loop> for Path {
    fn from_iter<T: IntoIterator<Item = Loop>>(iter: T) -> Self {
        Path::new(iter)
    }
}
