//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;
use kurbo::Point;

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

fn float(u: &mut Unstructured<'_>) -> Result<f64, arbitrary::Error> {
    float_in_range(-1e3, 1e3, u)
}

/// Generate an arbitrary point, with coordinates of magnitude at most 1000.
pub fn point(u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(float(u)?, float(u)?))
}

/// Generate the vertices of an arbitrary polygon, in either orientation.
///
/// The polygon has at least three vertices, and it might intersect itself.
pub fn ring(u: &mut Unstructured<'_>) -> Result<Vec<Point>, arbitrary::Error> {
    let len = u.int_in_range(3..=16)?;
    (0..len).map(|_| point(u)).collect()
}

/// Generate some path data.
///
/// Mostly, this sticks to the supported commands. Occasionally it throws in
/// a curve, a relative moveto, or some junk.
pub fn path_data(u: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    let p = point(u)?;
    let mut ret = format!("M {},{}", p.x, p.y);
    let len = u.int_in_range(0..=24)?;
    for _ in 0..len {
        let token = match u.int_in_range(0..=19)? {
            0..=3 => {
                let p = point(u)?;
                format!(" L {},{}", p.x, p.y)
            }
            4..=5 => {
                let p = point(u)?;
                format!(" l {} {}", p.x, p.y)
            }
            6 => format!(" H {}", float(u)?),
            7 => format!(" V {}", float(u)?),
            8 => format!(" h {} {}", float(u)?, float(u)?),
            9 => format!(" v{}", float(u)?),
            10 => " Z".to_owned(),
            11 => " z".to_owned(),
            12..=13 => {
                let p = point(u)?;
                format!(" M {} {}", p.x, p.y)
            }
            14 => {
                let p = point(u)?;
                format!(",{},{}", p.x, p.y)
            }
            15 => " Q 1,1 2,2".to_owned(),
            16 => " m 1,1".to_owned(),
            _ => {
                let junk = *u.choose(&["#", "e", "..", "L", "1,", "--3"])?;
                format!(" {junk}")
            }
        };
        ret.push_str(&token);
    }
    Ok(ret)
}
