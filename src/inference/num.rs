use serde_json::Number;

use crate::ir::Primitive;

/// Integers (signed or unsigned) stay `int`; anything carrying a fraction or
/// exponent in the source text is `float`.
pub fn classify_number(n: &Number) -> Primitive {
    if n.is_i64() || n.is_u64() {
        Primitive::Int
    } else {
        Primitive::Float
    }
}
