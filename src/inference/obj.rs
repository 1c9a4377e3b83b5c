use indexmap::IndexMap;

use crate::ir::TypeTree;

/// Field-set union. Shared fields merge recursively; a field seen on only one
/// side is unioned with `Missing`, which is how sampling exposes absence.
/// Display order: `a`'s fields first, then fields new in `b`.
pub(super) fn merge_objects(
    a: &IndexMap<String, TypeTree>,
    b: &IndexMap<String, TypeTree>,
) -> TypeTree {
    let mut out = IndexMap::with_capacity(a.len().max(b.len()));

    for (k, fa) in a {
        let ty = match b.get(k) {
            Some(fb) => super::merge(fa, fb),
            None => super::merge(fa, &TypeTree::Missing),
        };
        out.insert(k.clone(), ty);
    }
    for (k, fb) in b {
        if !out.contains_key(k) {
            out.insert(k.clone(), super::merge(fb, &TypeTree::Missing));
        }
    }

    TypeTree::Object(out)
}
