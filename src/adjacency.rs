//! Finding shapes that sit next to one another.
//!
//! Two shapes are adjacent if, after pushing every vertex of one of them a
//! little further away from its center (along one axis at a time), its
//! bounding box pokes into the other's bounding box. This is a quadratic
//! all-pairs comparison, which is fine for the few hundred shapes of a
//! typical layout.

use std::collections::BTreeSet;

use kurbo::{Rect, Vec2};

use crate::{
    table::{bounding_box, ShapeCenter, ShapeTable, ID_COLUMN},
    Error,
};

/// An undirected edge between two shapes.
///
/// The endpoints are always stored in order, so `source < target`.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Edge<K> {
    /// The smaller endpoint.
    pub source: K,
    /// The larger endpoint.
    pub target: K,
}

impl<K: Ord> Edge<K> {
    /// Creates an edge, putting the endpoints in order.
    pub fn new(a: K, b: K) -> Self {
        if a <= b {
            Edge {
                source: a,
                target: b,
            }
        } else {
            Edge {
                source: b,
                target: a,
            }
        }
    }
}

/// Parameters for adjacency extraction.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AdjacencyOptions {
    /// The column whose values identify shapes. Shapes sharing a value are
    /// treated as one.
    pub key: String,
    /// How far to push vertices outwards, in document units.
    pub extend: f64,
}

impl Default for AdjacencyOptions {
    fn default() -> Self {
        AdjacencyOptions {
            key: ID_COLUMN.to_owned(),
            extend: 0.5,
        }
    }
}

impl AdjacencyOptions {
    /// Finds the adjacent shapes in `table`.
    pub fn extract(&self, table: &ShapeTable) -> Result<Vec<Edge<String>>, Error> {
        extract_adjacent_shapes(table, &self.key, self.extend)
    }
}

/// A shape's bounding box, with and without extension.
#[derive(Clone, Copy, Debug)]
struct Extents {
    original: Rect,
    extended_x: Rect,
    extended_y: Rect,
}

// Pushes `offset` away from zero by `extend`. Zero offsets go in the positive direction.
fn push(offset: f64, extend: f64) -> f64 {
    if offset < 0.0 {
        offset - extend
    } else {
        offset + extend
    }
}

impl Extents {
    fn new(shape: &ShapeCenter, extend: f64) -> Option<Self> {
        let c = shape.center;
        let original = bounding_box(shape.vertices())?;
        let extended_x = bounding_box(
            shape
                .offsets
                .iter()
                .map(|v| c + Vec2::new(push(v.x, extend), v.y)),
        )?;
        let extended_y = bounding_box(
            shape
                .offsets
                .iter()
                .map(|v| c + Vec2::new(v.x, push(v.y, extend))),
        )?;
        Some(Extents {
            original,
            extended_x,
            extended_y,
        })
    }

    /// Does our extended outline reach into `other`'s (unextended) box?
    fn touches(&self, other: &Extents) -> bool {
        let b = other.original;

        let ax = self.extended_x;
        let crosses_x = (b.x0 < ax.x1 && b.x1 >= ax.x1) || (b.x0 < ax.x0 && b.x1 >= ax.x0);
        let overlaps_y = b.y0 < ax.y1 && b.y1 > ax.y0;

        let ay = self.extended_y;
        let crosses_y = (b.y0 < ay.y1 && b.y1 >= ay.y1) || (b.y0 < ay.y0 && b.y1 >= ay.y0);
        let overlaps_x = b.x0 < ay.x1 && b.x1 > ay.x0;

        (crosses_x && overlaps_y) || (crosses_y && overlaps_x)
    }
}

/// Finds adjacent pairs among shapes that have already been centered.
///
/// The edges come out sorted, with no duplicates (in either direction) and
/// no self-loops.
pub fn adjacent_centers(centers: &[ShapeCenter], extend: f64) -> Vec<Edge<String>> {
    let extents: Vec<_> = centers
        .iter()
        .filter_map(|c| Some((c.id.as_str(), Extents::new(c, extend)?)))
        .collect();

    let mut edges = BTreeSet::new();
    for (i, (a_id, a)) in extents.iter().enumerate() {
        for (j, (b_id, b)) in extents.iter().enumerate() {
            if i == j || a_id == b_id {
                continue;
            }
            let edge = Edge::new(*a_id, *b_id);
            if !edges.contains(&edge) && a.touches(b) {
                edges.insert(edge);
            }
        }
    }

    tracing::debug!(
        shapes = extents.len(),
        edges = edges.len(),
        "extracted adjacency"
    );
    edges
        .into_iter()
        .map(|e| Edge {
            source: e.source.to_owned(),
            target: e.target.to_owned(),
        })
        .collect()
}

/// Finds pairs of adjacent shapes in a shape table.
///
/// Shapes are grouped by the values in the `key` column, and each group's
/// vertices are pushed `extend` units away from the group's center before
/// comparing bounding boxes. Fails only if `key` isn't a column of `table`.
///
/// ```
/// use shapegraph::{extract_adjacent_shapes, Edge, ParseOptions, ShapeTable};
///
/// let table = ShapeTable::from_svg(
///     r#"<svg>
///          <polygon id="left" points="0,0 10,0 10,10 0,10"/>
///          <polygon id="right" points="10,0 20,0 20,10 10,10"/>
///          <polygon id="far" points="30,0 40,0 40,10 30,10"/>
///        </svg>"#,
///     &ParseOptions::default(),
/// )
/// .unwrap();
///
/// let edges = extract_adjacent_shapes(&table, "id", 0.5).unwrap();
/// assert_eq!(edges, [Edge::new("left".to_owned(), "right".to_owned())]);
/// ```
pub fn extract_adjacent_shapes(
    table: &ShapeTable,
    key: &str,
    extend: f64,
) -> Result<Vec<Edge<String>>, Error> {
    let centers = table.shape_centers(key)?;
    Ok(adjacent_centers(&centers, extend))
}

/// A dense, symmetric 0/1 matrix describing which shapes are adjacent.
///
/// Rows and columns are indexed by position in [`AdjacencyMatrix::ids`],
/// which holds (in sorted order) every shape that appears in at least one edge.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AdjacencyMatrix<K> {
    ids: Vec<K>,
    cells: Vec<u8>,
}

impl<K: Ord + Clone> AdjacencyMatrix<K> {
    /// Builds the matrix from a list of edges.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Edge<K>>) -> Self
    where
        K: 'a,
    {
        let edges: Vec<_> = edges.into_iter().collect();
        let ids: Vec<K> = edges
            .iter()
            .flat_map(|e| [&e.source, &e.target])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();

        let n = ids.len();
        let mut ret = AdjacencyMatrix {
            ids,
            cells: vec![0; n * n],
        };
        for e in edges {
            if let (Some(i), Some(j)) = (ret.index_of(&e.source), ret.index_of(&e.target)) {
                ret.cells[i * n + j] = 1;
                ret.cells[j * n + i] = 1;
            }
        }
        ret
    }

    /// The identifier of each row (and column).
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    /// The row (and column) of the shape identified by `id`.
    pub fn index_of(&self, id: &K) -> Option<usize> {
        self.ids.binary_search(id).ok()
    }

    /// The number of rows (and columns).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Is the matrix empty?
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The entry at row `i` and column `j`.
    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[i * self.len() + j]
    }

    /// A whole row.
    pub fn row(&self, i: usize) -> &[u8] {
        let n = self.len();
        &self.cells[i * n..(i + 1) * n]
    }

    /// Are the shapes identified by `a` and `b` adjacent?
    pub fn is_adjacent(&self, a: &K, b: &K) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => self.get(i, j) != 0,
            _ => false,
        }
    }
}
