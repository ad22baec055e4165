#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod adjacency;
pub mod compound;
pub mod connections;
pub mod document;
pub mod path;
pub mod polygon;
pub mod table;

#[cfg(any(test, feature = "generators"))]
pub mod generators;

pub use adjacency::{extract_adjacent_shapes, AdjacencyMatrix, AdjacencyOptions, Edge};
pub use compound::Path;
pub use connections::{
    extract_connections, Connection, ConnectionOptions, PointLocator, ShapeLocator,
};
pub use document::{Document, ParseOptions, DEFAULT_LAYER_ATTRIBUTE};
pub use kurbo;
pub use path::{Outline, PathError, PathTokenizer};
pub use polygon::Loop;
pub use table::{ShapeCenter, ShapeError, ShapeRecord, ShapeTable, ShapeTableBuilder};

/// Something went wrong while reading a document or interpreting its shapes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The document couldn't be read.
    #[error("failed to read document")]
    Io(#[from] std::io::Error),
    /// The document isn't well-formed XML.
    #[error("malformed document: {0}")]
    Xml(#[from] svg::parser::Error),
    /// A shape's geometry couldn't be decoded.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// A selected element isn't a kind of shape we understand.
    #[error("unsupported shape element <{name}>")]
    UnsupportedElement {
        /// The element's name.
        name: String,
    },
    /// Shapes were to be grouped by something that isn't a column.
    #[error("invalid grouping key `{0}`")]
    InvalidGroupingKey(String),
    /// More than one layer has a transform, so there's no single transform to apply.
    #[error("{count} layers have transforms, but at most one may")]
    ConflictingTransform {
        /// How many layers have transforms.
        count: usize,
    },
}
