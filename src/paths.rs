//! Flatten a normalized tree into `(path, type)` pairs.
//!
//! Objects append `.name`, arrays append `[]` once per nesting level. Every
//! field and every inner array level gets an entry, not only leaves, so a
//! parent and its children can be told apart downstream. Entry types are shallow: nested objects render as
//! `object`, so a child change never cascades into its ancestors.

use std::collections::BTreeMap;

use crate::inference::merge;
use crate::ir::TypeTree;
use crate::normalize::normalize;
use crate::side::normalize_path;

pub type PathIndex = BTreeMap<String, TypeTree>;

/// Sorted `(path, type)` sequence for `tree`.
pub fn flatten(tree: &TypeTree) -> Vec<(String, TypeTree)> {
    index(tree).into_iter().collect()
}

/// Same entries as [`flatten`], keyed by path.
pub fn index(tree: &TypeTree) -> PathIndex {
    let mut out = PathIndex::new();
    walk(tree, "", &mut out);
    out
}

fn walk(tree: &TypeTree, prefix: &str, out: &mut PathIndex) {
    for member in tree.members() {
        match member {
            TypeTree::Object(fields) => {
                for (name, ty) in fields {
                    let path = child_path(prefix, name);
                    record(out, &path, shallow(ty));
                    walk(ty, &path, out);
                }
            }
            TypeTree::Array(Some(elem)) => {
                let path = format!("{prefix}[]");
                // an inner array level is a node of its own
                if elem.members().iter().any(|m| matches!(m, TypeTree::Array(Some(_)))) {
                    record(out, &path, shallow(elem));
                }
                walk(elem, &path, out);
            }
            _ => {}
        }
    }
}

fn child_path(prefix: &str, name: &str) -> String {
    let path = if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    };
    normalize_path(&path)
}

fn record(out: &mut PathIndex, path: &str, ty: TypeTree) {
    // A path reached through two union branches holds both shapes.
    let ty = match out.remove(path) {
        Some(prev) => normalize(&merge(&prev, &ty)),
        None => ty,
    };
    out.insert(path.to_string(), ty);
}

/// The node's own type with object contents erased.
pub fn shallow(ty: &TypeTree) -> TypeTree {
    match ty {
        TypeTree::Object(_) => TypeTree::erased_object(),
        TypeTree::Array(Some(elem)) => TypeTree::array_of(shallow(elem)),
        TypeTree::Union(members) => normalize(&TypeTree::Union(members.iter().map(shallow).collect())),
        other => other.clone(),
    }
}
