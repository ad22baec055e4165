use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;
use shapegraph::{
    extract_connections, AdjacencyMatrix, AdjacencyOptions, ConnectionOptions, Document,
    ParseOptions, ShapeLocator, ShapeTableBuilder,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct Expectations {
    /// Adjacent pairs, in sorted order.
    adjacent: Option<Vec<(String, String)>>,
    /// Connected pairs, in document order.
    connections: Option<Vec<(String, String)>>,
    /// Net areas of compound shapes.
    areas: BTreeMap<String, f64>,
    /// The number of shapes that should fail to parse.
    failures: usize,
}

#[derive(Deserialize, Debug)]
struct RegressionCaseDeclaration {
    document: String,
    #[serde(default)]
    options: ParseOptions,
    #[serde(default)]
    adjacency: AdjacencyOptions,
    #[serde(default)]
    connections: ConnectionOptions,
    #[serde(default)]
    expect: Expectations,
}

fn main() {
    let args = Arguments::from_args();
    let tests = regression_tests();

    libtest_mimic::run(&args, tests).exit();
}

fn regression_tests() -> Vec<Trial> {
    let ws = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let file_paths = glob::glob(&format!("{ws}/tests/regression/**/*.yml")).unwrap();

    file_paths
        .into_iter()
        .map(|p| {
            let p = p.unwrap();
            let name = input_path_base(&p).display().to_string();
            Trial::test(name, || run_regression_test(p))
        })
        .collect()
}

fn input_path_base(input_path: &Path) -> &Path {
    let ws = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let base = format!("{ws}/tests/regression");
    input_path.strip_prefix(base).unwrap()
}

fn check<T: PartialEq + std::fmt::Debug>(
    what: &str,
    expected: &T,
    actual: &T,
) -> Result<(), Failed> {
    if expected == actual {
        Ok(())
    } else {
        Err(format!("{what}: expected {expected:?}, got {actual:?}").into())
    }
}

fn run_regression_test(path: PathBuf) -> Result<(), Failed> {
    let input = std::fs::read_to_string(&path).unwrap();
    let case: RegressionCaseDeclaration = serde_yaml::from_str(&input).unwrap();
    let doc = Document::parse(&case.document).map_err(|e| e.to_string())?;

    let mut failures = 0;
    let table = ShapeTableBuilder::new(case.options.clone())
        .on_error(|_| failures += 1)
        .build(&doc)
        .map_err(|e| e.to_string())?;
    check("failures", &case.expect.failures, &failures)?;

    let edges = case.adjacency.extract(&table).map_err(|e| e.to_string())?;
    let matrix = AdjacencyMatrix::from_edges(&edges);
    for e in &edges {
        if !matrix.is_adjacent(&e.target, &e.source) {
            return Err(format!("matrix is missing {e:?}").into());
        }
    }
    if let Some(expected) = &case.expect.adjacent {
        let actual: Vec<_> = edges.into_iter().map(|e| (e.source, e.target)).collect();
        check("adjacent", expected, &actual)?;
    }

    if let Some(expected) = &case.expect.connections {
        let locator = ShapeLocator::new(&table, &case.adjacency.key).map_err(|e| e.to_string())?;
        let actual: Vec<_> = extract_connections(&doc, &locator, &case.connections)
            .into_iter()
            .map(|c| (c.source, c.target))
            .collect();
        check("connections", expected, &actual)?;
    }

    if !case.expect.areas.is_empty() {
        let shapes = table
            .compound_shapes(&case.adjacency.key)
            .map_err(|e| e.to_string())?;
        for (id, expected) in &case.expect.areas {
            let area = shapes.get(id).map(|s| s.area()).unwrap_or(0.0);
            if (area - expected).abs() > 1e-9 * expected.abs().max(1.0) {
                return Err(format!("area of {id}: expected {expected}, got {area}").into());
            }
        }
    }

    Ok(())
}
