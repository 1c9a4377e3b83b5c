// Strongly-typed type tree shared by every source. No serde_json::Value here.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Scalar kinds every native type system is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Primitive {
    Int,
    Float,
    Bool,
    Str,
    Date,
    Time,
    Timestamp,
}

impl Primitive {
    pub const ALL: [Primitive; 7] = [
        Primitive::Int,
        Primitive::Float,
        Primitive::Bool,
        Primitive::Str,
        Primitive::Date,
        Primitive::Time,
        Primitive::Timestamp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Bool => "bool",
            Primitive::Str => "str",
            Primitive::Date => "date",
            Primitive::Time => "time",
            Primitive::Timestamp => "timestamp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Recursive shape of a schema.
///
/// `Object` keeps its fields in display order, but equality treats them as a
/// set of `(name, type)` pairs. `Union` equality is likewise order-independent;
/// only the normalizer fixes a canonical member order.
#[derive(Debug, Clone)]
pub enum TypeTree {
    Primitive(Primitive),
    Object(IndexMap<String, TypeTree>),
    /// `None` is the "no element observed" marker.
    Array(Option<Box<TypeTree>>),
    Union(Vec<TypeTree>),
    Any,
    /// Field absent from some sampled objects.
    Missing,
    /// A string slot that was seen but only ever held `""`.
    Blank,
}

impl TypeTree {
    pub fn int() -> Self { TypeTree::Primitive(Primitive::Int) }
    pub fn float() -> Self { TypeTree::Primitive(Primitive::Float) }
    pub fn bool() -> Self { TypeTree::Primitive(Primitive::Bool) }
    pub fn str() -> Self { TypeTree::Primitive(Primitive::Str) }

    pub fn array_of(elem: TypeTree) -> Self {
        TypeTree::Array(Some(Box::new(elem)))
    }

    pub fn erased_array() -> Self {
        TypeTree::Array(None)
    }

    pub fn erased_object() -> Self {
        TypeTree::Object(IndexMap::new())
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TypeTree)>,
        K: Into<String>,
    {
        TypeTree::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeTree::Any)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, TypeTree::Missing)
    }

    /// Neither `Any` nor `Missing`.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, TypeTree::Any | TypeTree::Missing)
    }

    pub fn is_erased_array(&self) -> bool {
        matches!(self, TypeTree::Array(None))
    }

    /// True when this is a union that carries a `Missing` member.
    pub fn has_missing(&self) -> bool {
        match self {
            TypeTree::Missing => true,
            TypeTree::Union(members) => members.iter().any(TypeTree::is_missing),
            _ => false,
        }
    }

    /// Coarse kind label; first component of the union sort key.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeTree::Primitive(p) => p.name(),
            TypeTree::Object(_) => "object",
            TypeTree::Array(_) => "array",
            TypeTree::Union(_) => "union",
            TypeTree::Any => "any",
            TypeTree::Missing => "missing",
            TypeTree::Blank => "blank",
        }
    }

    /// Structural rendering with object fields sorted by name.
    /// Two structurally equal normalized trees always render identically.
    pub fn canonical_string(&self) -> String {
        let mut out = String::new();
        write_tree(&mut out, self, true);
        out
    }

    /// Total order used to canonicalize union members: kind name, then structure.
    pub fn sort_key_cmp(&self, other: &Self) -> Ordering {
        self.kind_name()
            .cmp(other.kind_name())
            .then_with(|| self.canonical_string().cmp(&other.canonical_string()))
    }

    /// Members of a union, or the tree itself as a single member.
    pub fn members(&self) -> &[TypeTree] {
        match self {
            TypeTree::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }
}

impl PartialEq for TypeTree {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeTree::Primitive(a), TypeTree::Primitive(b)) => a == b,
            // IndexMap equality is already order-independent.
            (TypeTree::Object(a), TypeTree::Object(b)) => a == b,
            (TypeTree::Array(a), TypeTree::Array(b)) => a == b,
            (TypeTree::Union(a), TypeTree::Union(b)) => {
                a.iter().all(|m| b.contains(m)) && b.iter().all(|m| a.contains(m))
            }
            (TypeTree::Any, TypeTree::Any)
            | (TypeTree::Missing, TypeTree::Missing)
            | (TypeTree::Blank, TypeTree::Blank) => true,
            _ => false,
        }
    }
}

impl Eq for TypeTree {}

impl fmt::Display for TypeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_tree(&mut out, self, false);
        f.write_str(&out)
    }
}

/// Reports carry types as their display strings.
impl Serialize for TypeTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn write_tree(out: &mut String, tree: &TypeTree, sorted: bool) {
    match tree {
        TypeTree::Primitive(p) => out.push_str(p.name()),
        TypeTree::Any => out.push_str("any"),
        TypeTree::Missing => out.push_str("missing"),
        TypeTree::Blank => out.push_str("blank"),
        TypeTree::Array(None) => out.push_str("array"),
        TypeTree::Array(Some(elem)) => {
            out.push('[');
            write_tree(out, elem, sorted);
            out.push(']');
        }
        TypeTree::Object(fields) if fields.is_empty() => out.push_str("object"),
        TypeTree::Object(fields) => {
            let mut entries: Vec<(&String, &TypeTree)> = fields.iter().collect();
            if sorted {
                entries.sort_by(|a, b| a.0.cmp(b.0));
            }
            out.push('{');
            for (i, (name, ty)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push_str(": ");
                write_tree(out, ty, sorted);
            }
            out.push('}');
        }
        TypeTree::Union(members) => {
            let mut parts: Vec<String> = members
                .iter()
                .map(|m| {
                    let mut s = String::new();
                    write_tree(&mut s, m, sorted);
                    s
                })
                .collect();
            if sorted {
                parts.sort();
            }
            out.push_str(&parts.join(" | "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_equality_ignores_field_order() {
        let a = TypeTree::object([("a", TypeTree::int()), ("b", TypeTree::str())]);
        let b = TypeTree::object([("b", TypeTree::str()), ("a", TypeTree::int())]);
        assert_eq!(a, b);
        assert_eq!(a.canonical_string(), b.canonical_string());
        // display keeps insertion order
        assert_eq!(a.to_string(), "{a: int, b: str}");
        assert_eq!(b.to_string(), "{b: str, a: int}");
    }

    #[test]
    fn union_equality_is_set_like() {
        let a = TypeTree::Union(vec![TypeTree::int(), TypeTree::str()]);
        let b = TypeTree::Union(vec![TypeTree::str(), TypeTree::int()]);
        assert_eq!(a, b);
        assert_ne!(a, TypeTree::Union(vec![TypeTree::int()]));
    }

    #[test]
    fn erased_markers_render_as_kind_names() {
        assert_eq!(TypeTree::erased_array().to_string(), "array");
        assert_eq!(TypeTree::erased_object().to_string(), "object");
        assert_eq!(TypeTree::array_of(TypeTree::str()).to_string(), "[str]");
    }

    #[test]
    fn sort_key_orders_by_kind_then_structure() {
        let mut xs = vec![TypeTree::str(), TypeTree::Missing, TypeTree::int(), TypeTree::float()];
        xs.sort_by(|a, b| a.sort_key_cmp(b));
        let names: Vec<String> = xs.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, ["float", "int", "missing", "str"]);
    }

    #[test]
    fn primitive_names_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("decimal"), None);
    }
}
