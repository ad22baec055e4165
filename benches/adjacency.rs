use criterion::{black_box, criterion_group, criterion_main, Criterion};

use shapegraph::{
    extract_adjacent_shapes, extract_connections, generators::grid_document, ConnectionOptions,
    Document, ParseOptions, ShapeLocator, ShapeTable, ShapeTableBuilder,
};

fn build_table(c: &mut Criterion) {
    let src = grid_document(20);
    let doc = Document::parse(&src).unwrap();

    c.bench_function("parse document", |b| {
        b.iter(|| black_box(Document::parse(&src).unwrap()))
    });
    c.bench_function("build shape table", |b| {
        b.iter(|| {
            black_box(
                ShapeTableBuilder::new(ParseOptions::default())
                    .build(&doc)
                    .unwrap(),
            )
        })
    });
}

fn adjacency(c: &mut Criterion) {
    let src = grid_document(20);
    let table = ShapeTable::from_svg(&src, &ParseOptions::default().in_layer("Device")).unwrap();

    c.bench_function("adjacency", |b| {
        b.iter(|| black_box(extract_adjacent_shapes(&table, "id", 0.5).unwrap()))
    });
}

fn connections(c: &mut Criterion) {
    let src = grid_document(20);
    let doc = Document::parse(&src).unwrap();
    let table = ShapeTableBuilder::new(ParseOptions::default().in_layer("Device"))
        .build(&doc)
        .unwrap();
    let locator = ShapeLocator::new(&table, "id").unwrap();

    c.bench_function("connections", |b| {
        b.iter(|| {
            black_box(extract_connections(
                &doc,
                &locator,
                &ConnectionOptions::default(),
            ))
        })
    });
}

criterion_group!(benches, build_table, adjacency, connections);
criterion_main!(benches);
