use serde_json::{Value, json};

use schema_drift::{
    CompareOptions, InferOptions, PresenceSet, PresenceState, Side, TypeTree, compare, flatten,
    infer_from_values, normalize,
};

fn data_side(label: &str, records: Vec<Value>, sample_size: usize) -> Side {
    let opts = InferOptions { sample_size, ..InferOptions::default() };
    Side::data(label, infer_from_values(records, &opts))
}

fn schema_side(root: TypeTree, required: &[&str]) -> Side {
    Side::schema("schema", root, required.iter().copied().collect::<PresenceSet>())
}

#[test]
fn field_only_in_left_sample() {
    let left = data_side("left", vec![json!({"id": 1, "name": "a"})], 1);
    let right = data_side("right", vec![json!({"id": 1})], 1);
    let diff = compare(&left, &right, &CompareOptions::default());
    assert_eq!(diff.only_left, ["name"]);
    assert!(diff.only_right.is_empty());
    assert!(diff.type_mismatches.is_empty());
}

#[test]
fn float_versus_str_is_a_type_mismatch() {
    let left = schema_side(TypeTree::object([("score", TypeTree::float())]), &[]);
    let right = schema_side(TypeTree::object([("score", TypeTree::str())]), &[]);
    let diff = compare(&left, &right, &CompareOptions::default());
    let got: Vec<(String, String, String)> = diff
        .type_mismatches
        .iter()
        .map(|m| (m.path.clone(), m.left.to_string(), m.right.to_string()))
        .collect();
    assert_eq!(got, [("score".to_string(), "float".to_string(), "str".to_string())]);
}

#[test]
fn required_versus_nullable_between_schemas() {
    let root = TypeTree::object([("user_id", TypeTree::int())]);
    let left = schema_side(root.clone(), &["user_id"]);
    let right = schema_side(root.clone(), &[]);
    let diff = compare(&left, &right, &CompareOptions::default());
    assert_eq!(diff.presence_mismatches.len(), 1);
    let m = &diff.presence_mismatches[0];
    assert_eq!((m.path.as_str(), m.left, m.right), ("user_id", PresenceState::Required, PresenceState::Nullable));
    assert_eq!((m.left.to_string(), m.right.to_string()), ("required".to_string(), "nullable".to_string()));

    // the same setup against sampled data carries no presence contract
    let right = data_side("data", vec![json!({"user_id": 7})], 10);
    let diff = compare(&left, &right, &CompareOptions::default());
    assert!(diff.presence_mismatches.is_empty());
}

#[test]
fn relocated_field_is_a_path_change() {
    let left = schema_side(TypeTree::object([("user_id", TypeTree::int())]), &[]);
    let right = schema_side(
        TypeTree::object([("events", TypeTree::array_of(TypeTree::object([("user_id", TypeTree::int())])))]),
        &[],
    );
    let diff = compare(&left, &right, &CompareOptions::default());
    let change = &diff.path_changes["user_id"];
    assert_eq!(change.only_left, ["user_id"]);
    assert_eq!(change.only_right, ["events[].user_id"]);
    assert!(change.shared.is_empty());
}

#[test]
fn always_empty_tags_match_a_concrete_array() {
    let left = data_side("left", vec![json!({"tags": []}), json!({"tags": []})], 10);
    let right = schema_side(TypeTree::object([("tags", TypeTree::array_of(TypeTree::str()))]), &[]);
    let diff = compare(&left, &right, &CompareOptions::default());
    assert!(diff.type_mismatches.is_empty());
}

#[test]
fn sampled_sides_never_report_presence_mismatches() {
    let left = data_side("a", vec![json!({"x": 1, "y": {"z": true}}), json!({"x": 2})], 10);
    let right = data_side("b", vec![json!({"x": 3, "y": {"z": false}})], 10);
    let diff = compare(&left, &right, &CompareOptions::default());
    assert!(diff.presence_mismatches.is_empty());
    assert!(diff.type_mismatches.is_empty());
}

#[test]
fn field_absent_from_some_records_is_missing_data_against_a_schema() {
    let left = data_side("a", vec![json!({"x": 1, "y": 1}), json!({"x": 2})], 10);
    let right = schema_side(TypeTree::object([("x", TypeTree::int()), ("y", TypeTree::int())]), &[]);
    let diff = compare(&left, &right, &CompareOptions::default());
    assert_eq!(diff.presence_mismatches.len(), 1);
    let m = &diff.presence_mismatches[0];
    assert_eq!((m.path.as_str(), m.left, m.right), ("y", PresenceState::MissingData, PresenceState::Present));
    assert_eq!(m.left.to_string(), "missing data");
}

#[test]
fn result_categories_partition_on_path() {
    let left = schema_side(
        TypeTree::object([
            ("user_id", TypeTree::int()),
            ("a", TypeTree::int()),
            ("b", TypeTree::str()),
            ("only_l", TypeTree::bool()),
        ]),
        &["user_id", "a"],
    );
    let right = schema_side(
        TypeTree::object([
            ("user_id", TypeTree::int()),
            ("a", TypeTree::str()),
            ("b", TypeTree::str()),
            ("only_r", TypeTree::bool()),
        ]),
        &[],
    );
    let opts = CompareOptions { include_common: true, ..CompareOptions::default() };
    let diff = compare(&left, &right, &opts);

    let mut seen = std::collections::BTreeSet::new();
    let all = diff
        .only_left
        .iter()
        .chain(&diff.only_right)
        .chain(diff.type_mismatches.iter().map(|m| &m.path))
        .chain(diff.presence_mismatches.iter().map(|m| &m.path))
        .chain(diff.common.iter().map(|c| &c.path));
    for path in all {
        assert!(seen.insert(path.clone()), "{path} reported twice");
    }
    assert_eq!(seen.len(), 5);
    assert_eq!(diff.type_mismatches[0].path, "a");
    assert_eq!(diff.presence_mismatches.len(), 1);
    assert_eq!(diff.presence_mismatches[0].path, "user_id");
    assert_eq!(diff.common.len(), 1);
    assert_eq!(diff.common[0].path, "b");
}

#[test]
fn inference_and_comparison_are_deterministic() {
    let records: Vec<Value> = (0..300)
        .map(|i| match i % 3 {
            0 => json!({"id": i, "at": "2024-01-01T00:00:00Z", "tags": ["a"]}),
            1 => json!({"id": i.to_string(), "nested": {"k": null}}),
            _ => json!({"id": i, "tags": [], "nested": {"k": 1.5}}),
        })
        .collect();
    let a = data_side("a", records.clone(), 25);
    let b = data_side("a", records, 25);
    assert_eq!(a, b);

    let other = data_side("b", vec![json!({"id": 1, "at": "x"})], 25);
    let opts = CompareOptions { include_common: true, ..CompareOptions::default() };
    let first = serde_json::to_string(&compare(&a, &other, &opts)).unwrap();
    let second = serde_json::to_string(&compare(&b, &other, &opts)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn flattened_paths_never_use_numeric_indices() {
    let side = data_side(
        "a",
        vec![json!({"x": [{"y": 1}, {"y": 2, "z": [[{"w": "s"}]]}]})],
        10,
    );
    let paths: Vec<String> = flatten(&normalize(&side.root)).into_iter().map(|(p, _)| p).collect();
    assert_eq!(paths, ["x", "x[].y", "x[].z", "x[].z[]", "x[].z[][].w"]);
    assert!(paths.iter().all(|p| !p.chars().any(|c| c.is_ascii_digit())));
}
