use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use shapegraph::{
    extract_connections, AdjacencyMatrix, AdjacencyOptions, Connection, ConnectionOptions,
    Document, Edge, ParseOptions, ShapeLocator, ShapeTableBuilder,
};

#[derive(Parser)]
struct Args {
    input: PathBuf,

    /// Draw the shapes and their adjacency graph to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only read shapes in this layer.
    #[arg(long)]
    layer: Option<String>,

    /// The attribute that identifies shapes.
    #[arg(long, default_value = "id")]
    key: String,

    #[arg(long)]
    extend: Option<f64>,

    /// The layer holding connectors.
    #[arg(long)]
    connections: Option<String>,

    /// Fail on path data that we don't understand.
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct Summary {
    columns: Vec<String>,
    shapes: usize,
    vertices: usize,
    adjacent: Vec<Edge<String>>,
    connections: Vec<Connection<String>>,
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let doc = Document::open(&args.input)?;
    if let Some(transform) = doc.layer_transform()? {
        tracing::info!("layers share the transform {transform:?}, which will be ignored");
    }

    let options = ParseOptions {
        layer: args.layer,
        strict: args.strict,
        ..Default::default()
    };
    let table = ShapeTableBuilder::new(options)
        .on_error(|e| tracing::warn!("skipping shape: {e}"))
        .build(&doc)?;

    let adjacency = AdjacencyOptions {
        key: args.key,
        extend: args.extend.unwrap_or(AdjacencyOptions::default().extend),
    };
    let adjacent = adjacency.extract(&table)?;

    let mut connection_options = ConnectionOptions::default();
    if let Some(layer) = args.connections {
        connection_options.layer = layer;
    }
    let locator = ShapeLocator::new(&table, &adjacency.key)?;
    let connections = extract_connections(&doc, &locator, &connection_options);

    if let Some(output) = args.output {
        let centers = table.shape_centers(&adjacency.key)?;
        let bbox = table
            .bounding_boxes(&adjacency.key)?
            .into_values()
            .reduce(|a, b| a.union(b))
            .unwrap_or_default();
        let pad = 8.0;
        let mut document = svg::Document::new().set(
            "viewBox",
            (
                bbox.min_x() - pad,
                bbox.min_y() - pad,
                bbox.width() + 2.0 * pad,
                bbox.height() + 2.0 * pad,
            ),
        );

        for (id, shape) in table.compound_shapes(&adjacency.key)? {
            for lp in shape.loops() {
                let points: Vec<_> = lp
                    .vertices()
                    .iter()
                    .map(|p| format!("{},{}", p.x, p.y))
                    .collect();
                let polygon = svg::node::element::Polygon::new()
                    .set("points", points.join(" "))
                    .set("fill", "none")
                    .set("stroke", "black")
                    .set("stroke-width", 0.5)
                    .set("data-shape", id.as_str());
                document = document.add(polygon);
            }
        }

        let matrix = AdjacencyMatrix::from_edges(&adjacent);
        for (i, a) in centers.iter().enumerate() {
            for b in &centers[i + 1..] {
                if matrix.is_adjacent(&a.id, &b.id) {
                    let line = svg::node::element::Line::new()
                        .set("x1", a.center.x)
                        .set("y1", a.center.y)
                        .set("x2", b.center.x)
                        .set("y2", b.center.y)
                        .set("stroke", "red")
                        .set("stroke-width", 0.5);
                    document = document.add(line);
                }
            }
        }

        svg::save(output, &document)?;
    }

    let summary = Summary {
        columns: table.columns().to_vec(),
        shapes: table.len(),
        vertices: table.rows().len(),
        adjacent,
        connections,
    };
    print!("{}", serde_yaml::to_string(&summary)?);

    Ok(())
}
