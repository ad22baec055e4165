//! Utilities for generating examples, benchmarks, and test cases.

use kurbo::Point;

/// Generate a bunch of squares, arranged in a grid.
///
/// The top-left of the first square is at (x0, y0). Each square has size `size
/// x size`, and the distance between squares (both horizontally and vertically)
/// is `offset`. The square in column `i` and row `j` is named `s{i}_{j}`.
pub fn squares(
    (x0, y0): (f64, f64),
    size: f64,
    offset: f64,
    count: usize,
) -> Vec<(String, Vec<Point>)> {
    let mut ret = Vec::new();
    for i in 0..count {
        let x = x0 + i as f64 * offset;
        for j in 0..count {
            let y = y0 + j as f64 * offset;
            ret.push((
                format!("s{i}_{j}"),
                vec![
                    Point::new(x, y),
                    Point::new(x + size, y),
                    Point::new(x + size, y + size),
                    Point::new(x, y + size),
                ],
            ));
        }
    }

    ret
}

/// Generate an `n` by `n` grid of touching squares, as a document.
///
/// The squares are `polygon`s in a layer called `Device`. Every square is
/// adjacent to its horizontal and vertical neighbors, so there are
/// `2 * n * (n - 1)` adjacent pairs. There's also a `Connections` layer with
/// a connector joining each square to its right-hand neighbor, alternating
/// between `path` and `line` connectors.
pub fn grid_document(n: usize) -> String {
    let size = 10.0;
    let mut ret = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
<g inkscape:groupmode="layer" inkscape:label="Device">
"#,
    );

    for (id, vertices) in squares((0.0, 0.0), size, size, n) {
        let points: Vec<_> = vertices.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
        ret.push_str(&format!(
            "<polygon id=\"{id}\" points=\"{}\"/>\n",
            points.join(" ")
        ));
    }
    ret.push_str("</g>\n<g inkscape:groupmode=\"layer\" inkscape:label=\"Connections\">\n");

    for i in 0..n.saturating_sub(1) {
        for j in 0..n {
            let y = (j as f64 + 0.5) * size;
            let x1 = (i as f64 + 0.5) * size;
            let x2 = x1 + size;
            let connector = if (i + j) % 2 == 0 {
                format!(r#"<path id="c{i}_{j}" d="M {x1},{y} H {x2}"/>"#)
            } else {
                format!(r#"<line id="c{i}_{j}" x1="{x1}" y1="{y}" x2="{x2}" y2="{y}"/>"#)
            };
            ret.push_str(&connector);
            ret.push('\n');
        }
    }
    ret.push_str("</g>\n</svg>\n");
    ret
}
