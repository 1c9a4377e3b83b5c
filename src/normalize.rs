//! Canonical form for type trees.
//!
//! Total and idempotent: `normalize(&normalize(t)) == normalize(t)`, and two
//! structurally equal trees always come out with identical member order, so
//! dumps and diffs are byte-stable.

use tracing::debug;

use crate::ir::TypeTree;

/// Largest number of concrete union members kept before collapsing to `any`.
pub const DEFAULT_UNION_CAP: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub union_cap: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { union_cap: DEFAULT_UNION_CAP }
    }
}

pub fn normalize(tree: &TypeTree) -> TypeTree {
    normalize_with(tree, &NormalizeOptions::default())
}

/// Bottom-up: children first, then the node's own collapsing rules.
pub fn normalize_with(tree: &TypeTree, opts: &NormalizeOptions) -> TypeTree {
    match tree {
        TypeTree::Primitive(p) => TypeTree::Primitive(*p),
        TypeTree::Any => TypeTree::Any,
        TypeTree::Missing => TypeTree::Missing,
        TypeTree::Blank => TypeTree::str(),
        TypeTree::Array(None) => TypeTree::erased_array(),
        TypeTree::Array(Some(elem)) => match normalize_with(elem, opts) {
            // only nulls were observed: no element evidence
            TypeTree::Any => TypeTree::erased_array(),
            elem => TypeTree::array_of(elem),
        },
        TypeTree::Object(fields) => TypeTree::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), normalize_with(v, opts)))
                .collect(),
        ),
        TypeTree::Union(members) => normalize_union(members, opts),
    }
}

fn normalize_union(members: &[TypeTree], opts: &NormalizeOptions) -> TypeTree {
    // flatten + dedupe
    let mut flat: Vec<TypeTree> = Vec::with_capacity(members.len());
    for m in members {
        for n in normalize_with(m, opts).members() {
            if !flat.contains(n) {
                flat.push(n.clone());
            }
        }
    }

    // an erased array carries nothing a concrete array doesn't
    if flat.iter().any(|m| matches!(m, TypeTree::Array(Some(_)))) {
        flat.retain(|m| !m.is_erased_array());
    }

    let concrete = flat.iter().filter(|m| m.is_concrete()).count();
    if concrete > 0 {
        flat.retain(|m| !m.is_any());
    }

    if concrete > opts.union_cap {
        debug!(members = concrete, cap = opts.union_cap, "union over cap; collapsing to any");
        let had_missing = flat.iter().any(TypeTree::is_missing);
        flat = vec![TypeTree::Any];
        if had_missing {
            flat.push(TypeTree::Missing);
        }
    }

    flat.sort_by(|a, b| a.sort_key_cmp(b));

    match flat.len() {
        0 => TypeTree::Any,
        1 => flat.remove(0),
        _ => TypeTree::Union(flat),
    }
}
