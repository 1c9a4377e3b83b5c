//! Compact JSON form of a side, as emitted by external format parsers and
//! written by `--dump-schemas`.
//!
//! ```json
//! { "label": "orders.ddl", "source": "schema", "required": ["id"],
//!   "root": { "id": "int", "items": [{ "sku": "str" }], "tags": [],
//!             "status": { "$union": ["str", "missing"] } } }
//! ```
//!
//! Strings are type tags, `[]` is an array with no element evidence, `[T]` an
//! array of `T`, a JSON object is an object type, and `{"$union": [...]}` a
//! union. Anything unrecognized decodes to `any`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::ir::{Primitive, TypeTree};
use crate::normalize::normalize;
use crate::side::{PresenceSet, Side, SourceKind};

const UNION_KEY: &str = "$union";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideDocument {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default)]
    pub required: PresenceSet,
    pub root: Value,
}

impl SideDocument {
    /// Encode the normalized form of `side`.
    pub fn from_side(side: &Side) -> Self {
        Self {
            label: side.label.clone(),
            source: side.source,
            required: side.required.clone(),
            root: encode(&normalize(&side.root)),
        }
    }

    pub fn into_side(self) -> Side {
        Side {
            root: decode(&self.root),
            required: self.required,
            label: self.label,
            source: self.source,
        }
    }
}

/// Parse a side document; an empty label falls back to `origin`.
pub fn parse_side(src: &str, origin: &str) -> Result<Side> {
    let mut doc: SideDocument = crate::path_de::from_str_with_path(src, origin)?;
    if doc.label.is_empty() {
        doc.label = origin.to_string();
    }
    Ok(doc.into_side())
}

pub fn load_side(path: &Path) -> Result<Side> {
    let src = std::fs::read_to_string(path)
        .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    parse_side(&src, &path.to_string_lossy())
}

/// Pretty JSON, byte-stable for equal sides.
pub fn to_pretty_string(side: &Side) -> String {
    // Value serialization cannot fail: all keys are strings
    serde_json::to_string_pretty(&SideDocument::from_side(side)).unwrap_or_default()
}

pub fn decode(v: &Value) -> TypeTree {
    match v {
        Value::String(tag) => decode_tag(tag),
        Value::Array(xs) => match xs.as_slice() {
            [] => TypeTree::erased_array(),
            [x] => TypeTree::array_of(decode(x)),
            many => TypeTree::array_of(TypeTree::Union(many.iter().map(decode).collect())),
        },
        Value::Object(m) => match (m.len(), m.get(UNION_KEY)) {
            (1, Some(Value::Array(members))) => TypeTree::Union(members.iter().map(decode).collect()),
            _ => TypeTree::Object(m.iter().map(|(k, v)| (k.clone(), decode(v))).collect()),
        },
        other => {
            warn!(node = %other, "unrecognized type node; treating as any");
            TypeTree::Any
        }
    }
}

fn decode_tag(tag: &str) -> TypeTree {
    if let Some(p) = Primitive::from_name(tag) {
        return TypeTree::Primitive(p);
    }
    match tag {
        "any" | "null" => TypeTree::Any,
        "missing" => TypeTree::Missing,
        "array" => TypeTree::erased_array(),
        "object" => TypeTree::erased_object(),
        other => {
            warn!(tag = other, "unrecognized type tag; treating as any");
            TypeTree::Any
        }
    }
}

pub fn encode(t: &TypeTree) -> Value {
    match t {
        TypeTree::Primitive(p) => Value::from(p.name()),
        TypeTree::Any => Value::from("any"),
        TypeTree::Missing => Value::from("missing"),
        TypeTree::Blank => Value::from(Primitive::Str.name()),
        TypeTree::Array(None) => Value::Array(Vec::new()),
        TypeTree::Array(Some(elem)) => Value::Array(vec![encode(elem)]),
        TypeTree::Object(fields) => Value::Object(
            fields.iter().map(|(k, v)| (k.clone(), encode(v))).collect::<Map<_, _>>(),
        ),
        TypeTree::Union(members) => {
            let mut m = Map::new();
            m.insert(UNION_KEY.into(), Value::Array(members.iter().map(encode).collect()));
            Value::Object(m)
        }
    }
}
