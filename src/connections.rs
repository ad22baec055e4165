//! Explicit connections, drawn as line segments between shapes.
//!
//! Connectors live in their own layer. Each one is either a `line` element or
//! a `path` made of a single straight segment, and it connects whichever
//! shapes its two endpoints land in.

use kurbo::{Point, Rect};

use crate::{
    adjacency::Edge,
    compound::Path,
    document::{Document, Element, Layer, DEFAULT_LAYER_ATTRIBUTE},
    path::connector_endpoints,
    table::ShapeTable,
    Error,
};

/// Finds the shape containing a point.
pub trait PointLocator {
    /// Shape identifiers.
    type Id: Ord + Clone;

    /// Returns the shape that `point` is inside, if there is one.
    fn locate(&self, point: Point) -> Option<Self::Id>;
}

impl<F, K> PointLocator for F
where
    F: Fn(Point) -> Option<K>,
    K: Ord + Clone,
{
    type Id = K;

    fn locate(&self, point: Point) -> Option<K> {
        self(point)
    }
}

/// A [`PointLocator`] that checks every shape of a [`ShapeTable`] in turn.
#[derive(Clone, Debug)]
pub struct ShapeLocator {
    shapes: Vec<(String, Rect, Path)>,
}

impl ShapeLocator {
    /// Creates a locator for the shapes of `table`, grouped by the `key` column.
    pub fn new(table: &ShapeTable, key: &str) -> Result<Self, Error> {
        let shapes = table
            .compound_shapes(key)?
            .into_iter()
            .filter_map(|(id, path)| {
                let bbox = path.bounding_box()?;
                Some((id, bbox, path))
            })
            .collect();
        Ok(ShapeLocator { shapes })
    }
}

// Unlike `Rect::contains`, this includes the right and bottom edges.
fn in_box(rect: &Rect, p: Point) -> bool {
    rect.x0 <= p.x && p.x <= rect.x1 && rect.y0 <= p.y && p.y <= rect.y1
}

impl PointLocator for ShapeLocator {
    type Id = String;

    fn locate(&self, point: Point) -> Option<String> {
        self.shapes
            .iter()
            .find(|(_, bbox, path)| in_box(bbox, point) && path.contains(point))
            .map(|(id, _, _)| id.clone())
    }
}

/// Where to look for connectors.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// The name of the layer holding connectors.
    pub layer: String,
    /// The attribute that names layer groups.
    pub layer_attribute: String,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            layer: "Connections".to_owned(),
            layer_attribute: DEFAULT_LAYER_ATTRIBUTE.to_owned(),
        }
    }
}

impl ConnectionOptions {
    fn layer(&self) -> Layer<'_> {
        Layer {
            attribute: &self.layer_attribute,
            name: &self.layer,
        }
    }
}

/// A straight line drawn between two shapes.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Connector {
    /// The connector element's `id`.
    pub id: Option<String>,
    /// One end.
    pub start: Point,
    /// The other end.
    pub end: Point,
}

impl Connector {
    /// Reads a connector from a `line` or `path` element.
    ///
    /// Returns `None` for anything that isn't a single straight segment.
    pub fn from_element(element: &Element) -> Option<Self> {
        let (start, end) = match element.name() {
            "path" => connector_endpoints(element.attribute("d")?)?,
            "line" => {
                let coord = |name: &str| element.attribute(name)?.trim().parse::<f64>().ok();
                (
                    Point::new(coord("x1")?, coord("y1")?),
                    Point::new(coord("x2")?, coord("y2")?),
                )
            }
            _ => return None,
        };
        Some(Connector {
            id: element.attribute("id").map(str::to_owned),
            start,
            end,
        })
    }
}

/// Reads all the connectors in a document's connector layer.
///
/// Elements that aren't connectors are ignored.
pub fn connectors(doc: &Document, options: &ConnectionOptions) -> Vec<Connector> {
    doc.select(&["path", "line"], Some(options.layer()))
        .filter_map(|(_, el)| Connector::from_element(el))
        .collect()
}

/// Two shapes joined by a connector.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct Connection<K> {
    /// The smaller endpoint.
    pub source: K,
    /// The larger endpoint.
    pub target: K,
    /// The `id` of the connector that joins them.
    pub connector: Option<String>,
}

impl<K: Clone> Connection<K> {
    /// The edge between the two connected shapes.
    pub fn edge(&self) -> Edge<K> {
        Edge {
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }
}

/// Finds the pairs of shapes joined by connectors.
///
/// Connectors that don't have a shape at both ends are dropped, as are
/// connectors that start and end in the same shape. The results are in
/// document order.
pub fn extract_connections<L: PointLocator>(
    doc: &Document,
    locator: &L,
    options: &ConnectionOptions,
) -> Vec<Connection<L::Id>> {
    connectors(doc, options)
        .into_iter()
        .filter_map(|c| {
            let (Some(a), Some(b)) = (locator.locate(c.start), locator.locate(c.end)) else {
                tracing::debug!(
                    connector = ?c.id,
                    "dropping connector with an unattached end"
                );
                return None;
            };
            if a == b {
                tracing::debug!(connector = ?c.id, "dropping connector within a single shape");
                return None;
            }
            let Edge { source, target } = Edge::new(a, b);
            Some(Connection {
                source,
                target,
                connector: c.id,
            })
        })
        .collect()
}
