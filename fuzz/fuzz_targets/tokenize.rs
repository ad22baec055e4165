#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use shapegraph::{PathError, PathTokenizer};

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(d) = shapegraph::arbitrary::path_data(&mut u) else {
        return;
    };

    let lenient: Vec<_> = PathTokenizer::new(&d).collect();
    // Lenient tokenizers only fail on curves, and only at the very end.
    for (i, p) in lenient.iter().enumerate() {
        match p {
            Ok(_) => {}
            Err(PathError::UnsupportedCommand { .. }) => assert_eq!(i + 1, lenient.len()),
            Err(e) => panic!("lenient tokenizer failed with {e:?} on {d:?}"),
        }
    }

    // Whatever a strict tokenizer accepts, a lenient one reads the same way.
    let strict: Result<Vec<_>, _> = PathTokenizer::strict(&d).collect();
    if let Ok(strict) = strict {
        let lenient: Vec<_> = lenient.into_iter().map(Result::unwrap).collect();
        assert_eq!(strict, lenient);
    }

    if let Ok(loops) = PathTokenizer::new(&d).loops() {
        let _ = shapegraph::Path::new(loops.into_iter().map(shapegraph::Loop::new)).area();
    }
});
