//! Structural schema comparison.
//!
//! Every source (sampled JSON/NDJSON, or a schema already converted by an
//! external parser) becomes a [`Side`]: a canonical [`TypeTree`] plus the
//! paths it declares required. [`compare`] then separates type conflicts
//! from optionality differences and from fields that moved.
pub mod diff;
pub mod error;
pub mod inference;
pub mod ir;
pub mod jq_exec;
pub mod normalize;
pub mod path_de;
pub mod paths;
pub mod records;
pub mod render;
pub mod side;
pub mod wire;

pub use diff::{CompareOptions, DiffResult, PresenceState, compare};
pub use error::{Error, Result};
pub use inference::{InferOptions, Inference, infer, infer_from_values};
pub use ir::{Primitive, TypeTree};
pub use normalize::{NormalizeOptions, normalize, normalize_with};
pub use paths::flatten;
pub use side::{PresenceSet, Side, SourceKind};
