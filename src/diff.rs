//! Structural diff of two sides.
//!
//! Separates genuine type conflicts from optionality differences and from
//! fields that moved to another nesting level. Total and deterministic: every
//! collection here is ordered, so equal inputs give byte-identical results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::ir::TypeTree;
use crate::normalize::{DEFAULT_UNION_CAP, NormalizeOptions, normalize_with};
use crate::paths::{PathIndex, index};
use crate::side::{Side, path_key, terminal_segment};

#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Restrict the comparison to these paths and their descendants.
    /// `a.b` and `a[].b` select the same field.
    pub fields: Option<Vec<String>>,
    /// Populate [`DiffResult::common`].
    pub include_common: bool,
    pub union_cap: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self { fields: None, include_common: false, union_cap: DEFAULT_UNION_CAP }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PresenceState {
    #[serde(rename = "required")]
    Required,
    #[serde(rename = "nullable")]
    Nullable,
    #[serde(rename = "missing data")]
    MissingData,
    #[serde(rename = "present")]
    Present,
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PresenceState::Required => "required",
            PresenceState::Nullable => "nullable",
            PresenceState::MissingData => "missing data",
            PresenceState::Present => "present",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeMismatch {
    pub path: String,
    pub left: TypeTree,
    pub right: TypeTree,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceMismatch {
    pub path: String,
    pub left: PresenceState,
    pub right: PresenceState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathChange {
    pub shared: Vec<String>,
    pub only_left: Vec<String>,
    pub only_right: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonPath {
    pub path: String,
    #[serde(rename = "type")]
    pub ty: TypeTree,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffResult {
    pub only_left: Vec<String>,
    pub only_right: Vec<String>,
    pub type_mismatches: Vec<TypeMismatch>,
    pub presence_mismatches: Vec<PresenceMismatch>,
    pub path_changes: BTreeMap<String, PathChange>,
    pub common: Vec<CommonPath>,
}

impl DiffResult {
    /// No differences of any kind (`common` is not a difference).
    pub fn is_empty(&self) -> bool {
        self.only_left.is_empty()
            && self.only_right.is_empty()
            && self.type_mismatches.is_empty()
            && self.presence_mismatches.is_empty()
            && self.path_changes.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.only_left.len()
            + self.only_right.len()
            + self.type_mismatches.len()
            + self.presence_mismatches.len()
            + self.path_changes.len()
    }

    pub fn has_type_conflicts(&self) -> bool {
        !self.type_mismatches.is_empty()
    }
}

pub fn compare(left: &Side, right: &Side, opts: &CompareOptions) -> DiffResult {
    let nopts = NormalizeOptions { union_cap: opts.union_cap };
    let mut l = index(&normalize_with(&left.root, &nopts));
    let mut r = index(&normalize_with(&right.root, &nopts));

    if let Some(fields) = &opts.fields {
        let filter = FieldFilter::new(fields);
        l.retain(|p, _| filter.allows(p));
        r.retain(|p, _| filter.allows(p));
    }

    let mut out = DiffResult {
        only_left: l.keys().filter(|p| !r.contains_key(*p)).cloned().collect(),
        only_right: r.keys().filter(|p| !l.contains_key(*p)).cloned().collect(),
        ..DiffResult::default()
    };

    // Every path lands in at most one of type/presence/common.
    let mut reported = BTreeSet::new();
    let mut agreeing = Vec::new();
    for (path, lt) in &l {
        let Some(rt) = r.get(path) else { continue };
        match classify(path, lt, rt, left, right) {
            Verdict::Agree => agreeing.push(CommonPath { path: path.clone(), ty: lt.clone() }),
            Verdict::Type(m) => {
                reported.insert(path.clone());
                out.type_mismatches.push(m);
            }
            Verdict::Presence(m) => {
                reported.insert(path.clone());
                out.presence_mismatches.push(m);
            }
            Verdict::Inconclusive => {}
        }
    }

    // Declared presence only means something when both sides declare it.
    if !left.is_data() && !right.is_data() {
        for path in l.keys().filter(|p| r.contains_key(*p)) {
            if reported.contains(path) {
                continue;
            }
            let (lreq, rreq) = (left.required.contains(path), right.required.contains(path));
            if lreq != rreq {
                out.presence_mismatches.push(PresenceMismatch {
                    path: path.clone(),
                    left: declared_state(lreq),
                    right: declared_state(rreq),
                });
                reported.insert(path.clone());
            }
        }
        out.presence_mismatches.sort_by(|a, b| a.path.cmp(&b.path));
    }

    if opts.include_common {
        agreeing.retain(|c| !reported.contains(&c.path));
        out.common = agreeing;
    }

    out.path_changes = path_changes(&l, &r);

    debug!(
        left = %left.label,
        right = %right.label,
        only_left = out.only_left.len(),
        only_right = out.only_right.len(),
        type_mismatches = out.type_mismatches.len(),
        presence_mismatches = out.presence_mismatches.len(),
        path_changes = out.path_changes.len(),
        "compared sides"
    );
    out
}

enum Verdict {
    Agree,
    Type(TypeMismatch),
    Presence(PresenceMismatch),
    /// Neither agreement nor a reportable difference, e.g. one side only saw nulls.
    Inconclusive,
}

fn classify(path: &str, lt: &TypeTree, rt: &TypeTree, left: &Side, right: &Side) -> Verdict {
    if lt == rt {
        return Verdict::Agree;
    }

    let (lbase, lmissing) = strip_missing(lt);
    let (rbase, rmissing) = strip_missing(rt);
    let agree = compatible(&lbase, &rbase);
    // a side that only ever saw nulls has no type evidence
    let sampling_artifact = lbase.is_any() || rbase.is_any();

    if !agree && !sampling_artifact {
        return Verdict::Type(TypeMismatch { path: path.to_string(), left: lt.clone(), right: rt.clone() });
    }

    // two samples carry no presence contract; absence in one is just sampling
    let contract = !left.is_data() || !right.is_data();
    if lmissing != rmissing && contract {
        return Verdict::Presence(PresenceMismatch {
            path: path.to_string(),
            left: observed_state(left, path, lmissing),
            right: observed_state(right, path, rmissing),
        });
    }

    if agree { Verdict::Agree } else { Verdict::Inconclusive }
}

/// `T | missing` -> (`T`, true). A lone `missing` strips to `any`.
fn strip_missing(t: &TypeTree) -> (TypeTree, bool) {
    if !t.has_missing() {
        return (t.clone(), false);
    }
    let mut rest: Vec<TypeTree> = t.members().iter().filter(|m| !m.is_missing()).cloned().collect();
    let base = match rest.len() {
        0 => TypeTree::Any,
        1 => rest.remove(0),
        _ => TypeTree::Union(rest),
    };
    (base, true)
}

/// Structural equality, except an array observed only empty is compatible
/// with any concrete array.
fn compatible(a: &TypeTree, b: &TypeTree) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (TypeTree::Array(None), TypeTree::Array(_)) | (TypeTree::Array(_), TypeTree::Array(None)) => true,
        (TypeTree::Array(Some(x)), TypeTree::Array(Some(y))) => compatible(x, y),
        (TypeTree::Union(_), _) | (_, TypeTree::Union(_)) => {
            a.members().iter().all(|m| b.members().iter().any(|n| compatible(m, n)))
                && b.members().iter().all(|n| a.members().iter().any(|m| compatible(m, n)))
        }
        _ => false,
    }
}

fn observed_state(side: &Side, path: &str, missing: bool) -> PresenceState {
    match (missing, side.is_data()) {
        (true, true) => PresenceState::MissingData,
        (true, false) => PresenceState::Nullable,
        (false, _) if side.required.contains(path) => PresenceState::Required,
        (false, _) => PresenceState::Present,
    }
}

fn declared_state(required: bool) -> PresenceState {
    if required { PresenceState::Required } else { PresenceState::Nullable }
}

/// Group paths by terminal field name; a name living at different paths on
/// each side has moved.
fn path_changes(l: &PathIndex, r: &PathIndex) -> BTreeMap<String, PathChange> {
    let mut by_name: BTreeMap<&str, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();
    for p in l.keys() {
        by_name.entry(terminal_segment(p)).or_default().0.insert(p.as_str());
    }
    for p in r.keys() {
        by_name.entry(terminal_segment(p)).or_default().1.insert(p.as_str());
    }

    by_name
        .into_iter()
        .filter(|(_, (ls, rs))| !ls.is_empty() && !rs.is_empty() && ls != rs)
        .map(|(name, (ls, rs))| {
            let change = PathChange {
                shared: ls.intersection(&rs).map(|s| s.to_string()).collect(),
                only_left: ls.difference(&rs).map(|s| s.to_string()).collect(),
                only_right: rs.difference(&ls).map(|s| s.to_string()).collect(),
            };
            (name.to_string(), change)
        })
        .collect()
}

struct FieldFilter {
    keys: Vec<String>,
}

impl FieldFilter {
    fn new(fields: &[String]) -> Self {
        Self { keys: fields.iter().map(|f| path_key(f)).filter(|k| !k.is_empty()).collect() }
    }

    fn allows(&self, path: &str) -> bool {
        let key = path_key(path);
        self.keys.iter().any(|k| {
            key == *k || (key.starts_with(k.as_str()) && key[k.len()..].starts_with('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::PresenceSet;

    fn schema(root: TypeTree, required: &[&str]) -> Side {
        Side::schema("schema", root, required.iter().copied().collect())
    }

    fn data(root: TypeTree) -> Side {
        Side { root, required: PresenceSet::new(), label: "data".into(), source: crate::side::SourceKind::Data }
    }

    fn missing_or(t: TypeTree) -> TypeTree {
        TypeTree::Union(vec![t, TypeTree::Missing])
    }

    #[test]
    fn identical_sides_are_empty() {
        let t = TypeTree::object([("a", TypeTree::int())]);
        let d = compare(&schema(t.clone(), &[]), &schema(t, &[]), &CompareOptions::default());
        assert!(d.is_empty());
        assert_eq!(d.change_count(), 0);
        assert!(d.common.is_empty());
    }

    #[test]
    fn common_is_populated_only_on_request() {
        let t = TypeTree::object([("a", TypeTree::int())]);
        let opts = CompareOptions { include_common: true, ..CompareOptions::default() };
        let d = compare(&schema(t.clone(), &[]), &schema(t, &[]), &opts);
        assert_eq!(d.common, vec![CommonPath { path: "a".into(), ty: TypeTree::int() }]);
    }

    #[test]
    fn missing_union_is_presence_not_type() {
        let l = data(TypeTree::object([("a", missing_or(TypeTree::int()))]));
        let r = schema(TypeTree::object([("a", TypeTree::int())]), &["a"]);
        let d = compare(&l, &r, &CompareOptions::default());
        assert!(d.type_mismatches.is_empty());
        assert_eq!(
            d.presence_mismatches,
            vec![PresenceMismatch { path: "a".into(), left: PresenceState::MissingData, right: PresenceState::Required }]
        );

        let l = schema(TypeTree::object([("a", missing_or(TypeTree::int()))]), &[]);
        let d = compare(&l, &r, &CompareOptions::default());
        assert_eq!(d.presence_mismatches[0].left, PresenceState::Nullable);
        assert_eq!(d.presence_mismatches.len(), 1);
    }

    #[test]
    fn real_conflicts_keep_raw_types() {
        let l = data(TypeTree::object([("a", missing_or(TypeTree::int()))]));
        let r = data(TypeTree::object([("a", TypeTree::str())]));
        let d = compare(&l, &r, &CompareOptions::default());
        assert_eq!(d.type_mismatches.len(), 1);
        assert_eq!(d.type_mismatches[0].left.to_string(), "int | missing");
        assert_eq!(d.type_mismatches[0].right.to_string(), "str");
        assert!(d.has_type_conflicts());
    }

    #[test]
    fn all_null_fields_are_not_type_conflicts() {
        let l = data(TypeTree::object([("a", TypeTree::Any)]));
        let r = data(TypeTree::object([("a", TypeTree::str())]));
        let d = compare(&l, &r, &CompareOptions::default());
        assert!(d.type_mismatches.is_empty());
        assert!(d.presence_mismatches.is_empty());
    }

    #[test]
    fn data_sides_never_report_declared_presence() {
        let l = data(TypeTree::object([("a", TypeTree::int())]));
        let r = data(TypeTree::object([("a", TypeTree::int())]));
        assert!(compare(&l, &r, &CompareOptions::default()).presence_mismatches.is_empty());
    }

    #[test]
    fn absence_in_one_sample_is_not_a_presence_mismatch() {
        let l = data(TypeTree::object([("x", TypeTree::int()), ("y", missing_or(TypeTree::int()))]));
        let r = data(TypeTree::object([("x", TypeTree::int()), ("y", TypeTree::int())]));
        let opts = CompareOptions { include_common: true, ..CompareOptions::default() };
        let d = compare(&l, &r, &opts);
        assert!(d.presence_mismatches.is_empty());
        assert!(d.is_empty());
        let common: Vec<&str> = d.common.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(common, ["x", "y"]);
    }

    #[test]
    fn type_mismatch_is_not_also_a_declared_presence_mismatch() {
        let l = schema(TypeTree::object([("a", TypeTree::int())]), &["a"]);
        let r = schema(TypeTree::object([("a", TypeTree::str())]), &[]);
        let d = compare(&l, &r, &CompareOptions::default());
        assert_eq!(d.type_mismatches.len(), 1);
        assert!(d.presence_mismatches.is_empty());
    }

    #[test]
    fn declared_presence_mismatch_is_not_common() {
        let t = TypeTree::object([("user_id", TypeTree::int())]);
        let opts = CompareOptions { include_common: true, ..CompareOptions::default() };
        let d = compare(&schema(t.clone(), &["user_id"]), &schema(t, &[]), &opts);
        assert_eq!(d.presence_mismatches.len(), 1);
        assert!(d.common.is_empty());
    }

    #[test]
    fn erased_array_vs_concrete_array_is_compatible() {
        let l = data(TypeTree::object([("tags", TypeTree::erased_array())]));
        let r = schema(TypeTree::object([("tags", TypeTree::array_of(TypeTree::str()))]), &[]);
        assert!(compare(&l, &r, &CompareOptions::default()).is_empty());

        let l = data(TypeTree::object([("tags", TypeTree::array_of(TypeTree::int()))]));
        let d = compare(&l, &r, &CompareOptions::default());
        assert_eq!(d.type_mismatches.len(), 1);
    }

    #[test]
    fn child_changes_do_not_cascade_to_parents() {
        let l = schema(TypeTree::object([("u", TypeTree::object([("id", TypeTree::int())]))]), &[]);
        let r = schema(TypeTree::object([("u", TypeTree::object([("id", TypeTree::str())]))]), &[]);
        let d = compare(&l, &r, &CompareOptions::default());
        let paths: Vec<&str> = d.type_mismatches.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["u.id"]);
    }

    #[test]
    fn field_filter_accepts_both_notations() {
        let l = schema(
            TypeTree::object([
                ("items", TypeTree::array_of(TypeTree::object([("sku", TypeTree::int())]))),
                ("other", TypeTree::int()),
            ]),
            &[],
        );
        let r = schema(
            TypeTree::object([
                ("items", TypeTree::array_of(TypeTree::object([("sku", TypeTree::str())]))),
                ("other", TypeTree::str()),
            ]),
            &[],
        );
        for f in ["items.sku", "items[].sku", "items[0].sku"] {
            let opts = CompareOptions { fields: Some(vec![f.to_string()]), ..CompareOptions::default() };
            let d = compare(&l, &r, &opts);
            let paths: Vec<&str> = d.type_mismatches.iter().map(|m| m.path.as_str()).collect();
            assert_eq!(paths, ["items[].sku"], "filter {f}");
        }
    }

    #[test]
    fn field_filter_includes_descendants_but_not_siblings_sharing_a_prefix() {
        let tree = |t: TypeTree| {
            TypeTree::object([
                ("user", TypeTree::object([("id", t.clone())])),
                ("user_name", t),
            ])
        };
        let opts = CompareOptions { fields: Some(vec!["user".into()]), ..CompareOptions::default() };
        let d = compare(&schema(tree(TypeTree::int()), &[]), &schema(tree(TypeTree::str()), &[]), &opts);
        let paths: Vec<&str> = d.type_mismatches.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["user.id"]);
    }

    #[test]
    fn moved_field_shows_up_as_path_change() {
        let l = schema(TypeTree::object([("id", TypeTree::int()), ("items", TypeTree::array_of(TypeTree::object([("id", TypeTree::int())])))]), &[]);
        let r = schema(TypeTree::object([("id", TypeTree::int())]), &[]);
        let d = compare(&l, &r, &CompareOptions::default());
        let change = &d.path_changes["id"];
        assert_eq!(change.shared, ["id"]);
        assert_eq!(change.only_left, ["items[].id"]);
        assert!(change.only_right.is_empty());
        assert!(!d.path_changes.contains_key("items"));
    }

    #[test]
    fn deterministic() {
        let l = data(TypeTree::object([
            ("b", TypeTree::Union(vec![TypeTree::str(), TypeTree::int()])),
            ("a", missing_or(TypeTree::float())),
        ]));
        let r = schema(TypeTree::object([("a", TypeTree::float()), ("b", TypeTree::bool()), ("c", TypeTree::int())]), &["a"]);
        let opts = CompareOptions { include_common: true, ..CompareOptions::default() };
        let first = serde_json::to_string(&compare(&l, &r, &opts)).unwrap();
        for _ in 0..5 {
            assert_eq!(first, serde_json::to_string(&compare(&l, &r, &opts)).unwrap());
        }
    }
}
