//! One compared input: a type tree, its declared required paths and a label.
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::inference::Inference;
use crate::ir::TypeTree;

static INDEX_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d*\]").unwrap());

/// Rewrite legacy positional indices (`a[0].b`) to array notation (`a[].b`).
pub fn normalize_path(path: &str) -> String {
    INDEX_SEGMENT.replace_all(path, "[]").into_owned()
}

/// Path with every `[]` removed; `a.b` and `a[].b` share this key.
pub fn path_key(path: &str) -> String {
    normalize_path(path)
        .replace("[]", "")
        .trim_start_matches('.')
        .to_string()
}

/// Terminal field name of a path (`events[].user_id` -> `user_id`).
pub fn terminal_segment(path: &str) -> &str {
    let last = path.rsplit('.').next().unwrap_or(path);
    last.trim_end_matches("[]")
}

/// Paths a source declares non-nullable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PresenceSet(BTreeSet<String>);

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str) {
        let path = normalize_path(path.trim());
        if !path.is_empty() {
            self.0.insert(path);
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for PresenceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = PresenceSet::new();
        for p in iter {
            set.insert(p.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for PresenceSet {
    fn from(paths: Vec<String>) -> Self {
        paths.into_iter().collect()
    }
}

impl From<PresenceSet> for Vec<String> {
    fn from(set: PresenceSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Where a side's tree came from. Sampled data never carries presence contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Data,
    #[default]
    Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    pub root: TypeTree,
    pub required: PresenceSet,
    pub label: String,
    pub source: SourceKind,
}

impl Side {
    pub fn schema(label: impl Into<String>, root: TypeTree, required: PresenceSet) -> Self {
        Self { root, required, label: label.into(), source: SourceKind::Schema }
    }

    pub fn data(label: impl Into<String>, inference: Inference) -> Self {
        Self {
            root: inference.root,
            required: inference.required,
            label: label.into(),
            source: SourceKind::Data,
        }
    }

    pub fn is_data(&self) -> bool {
        self.source == SourceKind::Data
    }
}
