#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use yoloprep::geometry::{CxCyWh, RotatedBox};

pub const EPS_GEOMETRY: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Boxes with positive extent, anywhere near the unit square.
pub fn arb_box() -> BoxedStrategy<CxCyWh> {
    (-0.2f64..1.2, -0.2f64..1.2, 1e-3f64..1.0, 1e-3f64..1.0)
        .prop_map(|(cx, cy, w, h)| CxCyWh::new(cx, cy, w, h))
        .boxed()
}

/// Boxes that lie entirely inside the unit square.
pub fn arb_box_inside() -> BoxedStrategy<CxCyWh> {
    (0.0f64..0.9, 0.0f64..0.9, 0.01f64..0.99, 0.01f64..0.99)
        .prop_map(|(xmin, ymin, fw, fh)| {
            let w = (1.0 - xmin) * fw;
            let h = (1.0 - ymin) * fh;
            CxCyWh::new(xmin + w / 2.0, ymin + h / 2.0, w, h)
        })
        .boxed()
}

pub fn arb_rotated_box() -> BoxedStrategy<RotatedBox> {
    (arb_box(), -std::f64::consts::PI..std::f64::consts::PI)
        .prop_map(|(b, angle)| RotatedBox::new(b.cx, b.cy, b.w, b.h, angle))
        .boxed()
}

/// Distinct image file names.
pub fn arb_image_names(max: usize) -> BoxedStrategy<Vec<String>> {
    proptest::collection::btree_set(
        proptest::string::string_regex("[a-z0-9_]{1,12}\\.(jpg|png)").expect("valid filename regex"),
        1..=max,
    )
    .prop_map(|names| names.into_iter().collect())
    .boxed()
}

/// Ratio triples that sum to 1.0.
pub fn arb_ratios() -> BoxedStrategy<[f64; 3]> {
    (0u32..=100, 0u32..=100)
        .prop_map(|(a, b)| {
            let train = a as f64 / 100.0;
            let val = (1.0 - train) * (b as f64 / 100.0);
            [train, val, 1.0 - train - val]
        })
        .boxed()
}
