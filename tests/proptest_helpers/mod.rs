#![allow(dead_code)]

use armitage::bdd100k::{AttributeValue, Box2d, RawLabel, RawSample};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

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

pub fn arb_coord() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0u32..1280).prop_map(f64::from),
        -100.0f64..1400.0,
    ]
}

pub fn arb_box2d() -> impl Strategy<Value = Box2d> {
    (arb_coord(), arb_coord(), arb_coord(), arb_coord())
        .prop_map(|(x1, y1, x2, y2)| Box2d::new(x1, y1, x2, y2))
}

/// Attribute keys that never collide with reserved record fields.
pub fn arb_attr_key() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z]{0,11}".prop_filter("reserved field name", |k| {
        !matches!(
            k.as_str(),
            "id" | "category" | "box" | "height" | "width" | "labels" | "image"
        )
    })
}

pub fn arb_attr_value() -> impl Strategy<Value = AttributeValue> {
    prop_oneof![
        Just(AttributeValue::Null),
        any::<bool>().prop_map(AttributeValue::Bool),
        any::<i64>().prop_map(AttributeValue::Int),
        "[A-Za-z ]{0,8}".prop_map(AttributeValue::Text),
    ]
}

pub fn arb_raw_label() -> impl Strategy<Value = RawLabel> {
    (
        0u32..10_000,
        prop::sample::select(vec!["car", "person", "traffic light", "bus", "rider"]),
        prop::collection::btree_map(arb_attr_key(), arb_attr_value(), 0..4),
        arb_box2d(),
    )
        .prop_map(|(id, category, attributes, box2d)| RawLabel {
            id: id.to_string(),
            category: category.to_string(),
            attributes,
            box2d: Some(box2d),
        })
}

pub fn arb_raw_sample(max_labels: usize) -> impl Strategy<Value = RawSample> {
    (
        "[0-9a-f]{8}-[0-9a-f]{8}",
        prop::collection::btree_map(arb_attr_key(), "[a-z ]{1,10}", 0..3),
        prop::collection::vec(arb_raw_label(), 0..=max_labels),
    )
        .prop_map(|(stem, attributes, labels)| RawSample {
            name: format!("{stem}.jpg"),
            attributes,
            timestamp: Some(10000),
            labels,
        })
}

pub fn arb_raw_samples(
    max_samples: usize,
    max_labels: usize,
) -> impl Strategy<Value = Vec<RawSample>> {
    prop::collection::vec(arb_raw_sample(max_labels), 1..=max_samples)
}
