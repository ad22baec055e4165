#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use shapegraph::Loop;

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(ring) = shapegraph::arbitrary::ring(&mut u) else {
        return;
    };

    let mut lp = Loop::new(ring);
    assert!(lp.signed_area() >= 0.0);

    let Ok(by) = shapegraph::arbitrary::point(&mut u) else {
        return;
    };
    let area = lp.area();
    lp.offset(by.to_vec2());
    assert!((lp.area() - area).abs() <= 1e-6 * area.max(1.0));

    lp.edit(|vs| vs.reverse());
    assert!(lp.signed_area() >= 0.0);
});
