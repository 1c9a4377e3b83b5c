use crate::ir::TypeTree;

/// Arrays merge element-wise. An array seen only empty has no element
/// evidence and yields to any concrete element type.
pub(super) fn merge_arrays(
    a: &Option<Box<TypeTree>>,
    b: &Option<Box<TypeTree>>,
) -> TypeTree {
    match (a, b) {
        (None, None) => TypeTree::erased_array(),
        (Some(x), None) | (None, Some(x)) => TypeTree::Array(Some(x.clone())),
        (Some(x), Some(y)) => TypeTree::array_of(super::merge(x, y)),
    }
}
