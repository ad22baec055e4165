//! The shape table: every selected shape's vertices, one row per vertex.

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Range,
};

use kurbo::{Point, Rect, Vec2};

use crate::{
    compound::Path,
    document::{Document, Element, ElementIdx, ParseOptions},
    path::{Outline, PathError, PathTokenizer},
    polygon::Loop,
    Error,
};

/// The column holding shape identifiers. It always comes first.
pub const ID_COLUMN: &str = "id";

/// Attributes holding geometry, which don't become columns.
const GEOMETRY_ATTRIBUTES: [&str; 2] = ["d", "points"];

/// A single shape could not be turned into vertices.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// The path data was bad.
    #[error("bad path data in shape {id}")]
    Path {
        /// The shape's identifier (or its position in the document, if it has none).
        id: String,
        /// What was wrong with the path data.
        #[source]
        source: PathError,
    },
    /// A polygon's point list contained something other than `x,y` pairs.
    #[error("bad point `{token}` in shape {id}")]
    Points {
        /// The shape's identifier (or its position in the document, if it has none).
        id: String,
        /// The offending token.
        token: String,
    },
}

/// Where a shape's vertices come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeSource<'a> {
    /// A `path` element's `d` attribute.
    Path {
        /// The path data.
        d: &'a str,
    },
    /// A `polygon` element's `points` attribute.
    Polygon {
        /// The point list.
        points: &'a str,
    },
}

impl<'a> ShapeSource<'a> {
    /// Figures out how to read the geometry of `element`.
    ///
    /// A missing geometry attribute is treated as empty.
    pub fn from_element(element: &'a Element) -> Result<Self, Error> {
        match element.name() {
            "path" => Ok(ShapeSource::Path {
                d: element.attribute("d").unwrap_or_default(),
            }),
            "polygon" => Ok(ShapeSource::Polygon {
                points: element.attribute("points").unwrap_or_default(),
            }),
            name => Err(Error::UnsupportedElement {
                name: name.to_owned(),
            }),
        }
    }

    /// Reads the vertices, naming the shape `id` in any error.
    ///
    /// The vertices are grouped into loops: one per subpath for paths, and
    /// just one for polygons.
    pub fn outline(&self, id: &str, strict: bool) -> Result<Outline, ShapeError> {
        match *self {
            ShapeSource::Path { d } => PathTokenizer::with_strictness(d, strict)
                .outline()
                .map_err(|source| ShapeError::Path {
                    id: id.to_owned(),
                    source,
                }),
            ShapeSource::Polygon { points } => {
                let ring = points
                    .split_whitespace()
                    .map(|token| {
                        parse_pair(token).ok_or_else(|| ShapeError::Points {
                            id: id.to_owned(),
                            token: token.to_owned(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Outline::ring(ring))
            }
        }
    }
}

fn parse_pair(token: &str) -> Option<Point> {
    let (x, y) = token.split_once(',')?;
    Some(Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// An index into a [`ShapeTable`]'s shapes.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ShapeIdx(pub usize);

impl std::fmt::Debug for ShapeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s_{}", self.0)
    }
}

/// One row of the table: a single vertex of a single shape.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ShapeRecord {
    /// The shape this vertex belongs to.
    pub shape: ShapeIdx,
    /// The position of this vertex within its shape, counting from zero.
    pub vertex: usize,
    /// Where the vertex is.
    pub point: Point,
}

/// A shape's attributes, and where to find its vertices.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ShapeEntry {
    /// The element this shape was read from.
    pub element: ElementIdx,
    /// Attribute values, aligned with [`ShapeTable::columns`].
    pub values: Vec<Option<String>>,
    /// This shape's rows in [`ShapeTable::rows`].
    pub rows: Range<usize>,
    /// The rows of each of this shape's loops. Consecutive loops may share
    /// a row.
    pub loops: Vec<Range<usize>>,
}

/// The center of a group of shapes, and how far each vertex is from it.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ShapeCenter {
    /// The group's key value.
    pub id: String,
    /// The middle of the group's bounding box.
    ///
    /// This is not the centroid: it's cheaper, and good enough for pushing
    /// vertices outwards.
    pub center: Point,
    /// The offset of each vertex (in row order) from `center`.
    pub offsets: Vec<Vec2>,
}

impl ShapeCenter {
    /// The vertices, recovered from the center and offsets.
    pub fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.offsets.iter().map(|v| self.center + *v)
    }
}

/// A table of shape vertices.
///
/// Each shape has a list of attribute values (one for each of the table's
/// columns, possibly missing) and a contiguous run of rows, one for each
/// vertex.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ShapeTable {
    columns: Vec<String>,
    shapes: Vec<ShapeEntry>,
    rows: Vec<ShapeRecord>,
}

impl ShapeTable {
    /// Parses a document and builds its shape table, failing on the first bad shape.
    pub fn from_svg(source: &str, options: &ParseOptions) -> Result<Self, Error> {
        let doc = Document::parse(source)?;
        ShapeTableBuilder::new(options.clone()).build(&doc)
    }

    /// The attribute columns: `id` first, then the others in sorted order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All the rows, grouped by shape.
    ///
    /// A shape's rows are exactly the vertices its geometry describes, in
    /// order. When a path draws on after a close, the closing vertex is not
    /// repeated: it ends one loop and starts the next.
    pub fn rows(&self) -> &[ShapeRecord] {
        &self.rows
    }

    /// All the shapes, in document order.
    pub fn shapes(&self) -> &[ShapeEntry] {
        &self.shapes
    }

    /// The number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Are there no shapes?
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Looks up one of a shape's attributes.
    pub fn attribute(&self, shape: ShapeIdx, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.shapes[shape.0].values[col].as_deref()
    }

    /// The shape's identifier, if it has one.
    pub fn id(&self, shape: ShapeIdx) -> Option<&str> {
        self.attribute(shape, ID_COLUMN)
    }

    /// The rows of a single shape.
    pub fn shape_rows(&self, shape: ShapeIdx) -> &[ShapeRecord] {
        &self.rows[self.shapes[shape.0].rows.clone()]
    }

    /// The rows of a single shape, split into loops.
    pub fn shape_loops(&self, shape: ShapeIdx) -> impl Iterator<Item = &[ShapeRecord]> + '_ {
        self.shapes[shape.0]
            .loops
            .iter()
            .map(|range| &self.rows[range.clone()])
    }

    /// The vertices of a single shape.
    pub fn vertices(&self, shape: ShapeIdx) -> impl Iterator<Item = Point> + '_ {
        self.shape_rows(shape).iter().map(|r| r.point)
    }

    /// Groups shapes by the value of a column.
    ///
    /// Shapes without a value in that column are left out. Fails if `key`
    /// isn't one of the columns.
    pub fn groups(&self, key: &str) -> Result<BTreeMap<&str, Vec<ShapeIdx>>, Error> {
        let col = self
            .column_index(key)
            .filter(|_| !key.is_empty())
            .ok_or_else(|| Error::InvalidGroupingKey(key.to_owned()))?;

        let mut ret: BTreeMap<&str, Vec<ShapeIdx>> = BTreeMap::new();
        for (i, shape) in self.shapes.iter().enumerate() {
            if let Some(value) = shape.values[col].as_deref() {
                ret.entry(value).or_default().push(ShapeIdx(i));
            }
        }
        Ok(ret)
    }

    fn group_vertices<'a>(&'a self, shapes: &'a [ShapeIdx]) -> impl Iterator<Item = Point> + 'a {
        shapes.iter().flat_map(|s| self.vertices(*s))
    }

    /// The bounding box of every group that has at least one vertex.
    pub fn bounding_boxes(&self, key: &str) -> Result<BTreeMap<String, Rect>, Error> {
        Ok(self
            .groups(key)?
            .into_iter()
            .filter_map(|(id, shapes)| {
                let bbox = bounding_box(self.group_vertices(&shapes))?;
                Some((id.to_owned(), bbox))
            })
            .collect())
    }

    /// The bounding-box center of every group that has at least one vertex,
    /// together with each vertex's offset from it.
    pub fn shape_centers(&self, key: &str) -> Result<Vec<ShapeCenter>, Error> {
        Ok(self
            .groups(key)?
            .into_iter()
            .filter_map(|(id, shapes)| {
                let center = bounding_box(self.group_vertices(&shapes))?.center();
                Some(ShapeCenter {
                    id: id.to_owned(),
                    center,
                    offsets: self.group_vertices(&shapes).map(|p| p - center).collect(),
                })
            })
            .collect())
    }

    /// Assembles every group into a compound shape.
    ///
    /// Each polygon contributes one loop, and each path contributes one loop
    /// per subpath. Loops with fewer than three vertices enclose nothing, and
    /// are left out.
    pub fn compound_shapes(&self, key: &str) -> Result<BTreeMap<String, Path>, Error> {
        Ok(self
            .groups(key)?
            .into_iter()
            .map(|(id, shapes)| {
                let path = shapes
                    .iter()
                    .flat_map(|s| self.shape_loops(*s))
                    .filter(|rows| rows.len() >= 3)
                    .map(|rows| Loop::new(rows.iter().map(|r| r.point)))
                    .collect();
                (id.to_owned(), path)
            })
            .collect())
    }
}

pub(crate) fn bounding_box(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut points = points.into_iter();
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

/// Builds a [`ShapeTable`] from a [`Document`].
///
/// ```
/// use shapegraph::{Document, ParseOptions, ShapeTableBuilder};
///
/// let doc = Document::parse(
///     r#"<svg><polygon id="a" points="0,0 1,0 1,1"/><path id="b" d="M 0,0 Q 1,1 2,0"/></svg>"#,
/// )
/// .unwrap();
///
/// let mut failed = Vec::new();
/// let table = ShapeTableBuilder::new(ParseOptions::default())
///     .on_error(|e| failed.push(e.clone()))
///     .build(&doc)
///     .unwrap();
/// assert_eq!(table.len(), 1);
/// assert_eq!(failed.len(), 1);
/// ```
pub struct ShapeTableBuilder<'a> {
    options: ParseOptions,
    on_error: Option<Box<dyn FnMut(&ShapeError) + 'a>>,
}

impl std::fmt::Debug for ShapeTableBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeTableBuilder")
            .field("options", &self.options)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<'a> ShapeTableBuilder<'a> {
    /// Creates a builder that fails on the first bad shape.
    pub fn new(options: ParseOptions) -> Self {
        ShapeTableBuilder {
            options,
            on_error: None,
        }
    }

    /// Reports bad shapes to `f` and skips them, instead of failing.
    pub fn on_error(mut self, f: impl FnMut(&ShapeError) + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Selects shapes from `doc` and reads their vertices.
    ///
    /// Every selected element contributes its attributes to the columns,
    /// even if it is skipped or fails to decode.
    pub fn build(mut self, doc: &Document) -> Result<ShapeTable, Error> {
        let mut shapes = Vec::new();
        let mut rows = Vec::new();
        let mut attributes = Vec::new();
        let mut keys = BTreeSet::new();

        for (idx, element) in doc.select(&self.options.elements, self.options.layer()) {
            let attrs: BTreeMap<_, _> = element
                .attributes()
                .filter(|(k, _)| !GEOMETRY_ATTRIBUTES.contains(k))
                .collect();
            keys.extend(attrs.keys().copied().filter(|k| *k != ID_COLUMN));

            let source = match ShapeSource::from_element(element) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!("skipping {idx:?}: {e}");
                    continue;
                }
            };

            let id = element
                .attribute(ID_COLUMN)
                .map_or_else(|| format!("{idx:?}"), str::to_owned);
            let outline = match source.outline(&id, self.options.strict) {
                Ok(outline) => outline,
                Err(e) => match self.on_error.as_mut() {
                    Some(f) => {
                        f(&e);
                        continue;
                    }
                    None => return Err(e.into()),
                },
            };

            let shape = ShapeIdx(shapes.len());
            let start = rows.len();
            rows.extend(
                outline
                    .vertices
                    .into_iter()
                    .enumerate()
                    .map(|(vertex, point)| ShapeRecord {
                        shape,
                        vertex,
                        point,
                    }),
            );
            let loops = outline
                .loops
                .into_iter()
                .map(|r| start + r.start..start + r.end)
                .collect();
            shapes.push((idx, start..rows.len(), loops));
            attributes.push(attrs);
        }

        let mut columns = vec![ID_COLUMN.to_owned()];
        columns.extend(keys.into_iter().map(str::to_owned));

        let shapes: Vec<_> = shapes
            .into_iter()
            .zip(&attributes)
            .map(|((element, rows, loops), attrs)| ShapeEntry {
                element,
                values: columns
                    .iter()
                    .map(|c| attrs.get(c.as_str()).map(|v| (*v).to_owned()))
                    .collect(),
                rows,
                loops,
            })
            .collect();

        tracing::debug!(
            shapes = shapes.len(),
            rows = rows.len(),
            "built shape table"
        );
        Ok(ShapeTable {
            columns,
            shapes,
            rows,
        })
    }
}
