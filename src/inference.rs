//! Sampling-based type inference.
//!
//! Stream JSON records in, keep a bounded reservoir (or every record up to a
//! safety ceiling), type each record, and merge the observations into one
//! tree. Merge is associative and commutative up to normalization, so the
//! order records arrive in never changes the normalized result.
//!
//! Absence is not a contract: a field seen in only some records becomes
//! `T | missing`, and the presence set of a data side is always empty.
pub mod arr;
pub mod num;
pub mod obj;
pub mod sample;
pub mod str;

use std::fmt::Display;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::ir::TypeTree;
use crate::normalize::{NormalizeOptions, normalize_with};
use crate::side::PresenceSet;

pub use sample::Reservoir;

// ------------------------------- Policy ---------------------------------- //

pub const DEFAULT_SAMPLE_SIZE: usize = 1000;
pub const DEFAULT_SEED: u64 = 42;
/// Hard stop for `all_records` (and for the reservoir scan).
pub const ALL_RECORDS_CEILING: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct InferOptions {
    pub sample_size: usize,
    pub seed: u64,
    pub all_records: bool,
    pub infer_datetimes: bool,
    pub union_cap: usize,
    pub record_ceiling: usize,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: DEFAULT_SEED,
            all_records: false,
            infer_datetimes: true,
            union_cap: crate::normalize::DEFAULT_UNION_CAP,
            record_ceiling: ALL_RECORDS_CEILING,
        }
    }
}

/// Result of inference: a normalized tree plus bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub root: TypeTree,
    /// Always empty for sampled data.
    pub required: PresenceSet,
    /// Records that contributed type information.
    pub sampled: usize,
    /// Malformed records that were dropped.
    pub skipped: usize,
    /// The record ceiling stopped the scan before the input ran out.
    pub truncated: bool,
}

// ------------------------------ Observe ---------------------------------- //

/// Type a single record.
pub fn observe_value(v: &Value, infer_datetimes: bool) -> TypeTree {
    match v {
        Value::Null => TypeTree::Any,
        Value::Bool(_) => TypeTree::bool(),
        Value::Number(n) => TypeTree::Primitive(num::classify_number(n)),
        Value::String(s) => str::classify_string(s, infer_datetimes),
        Value::Array(xs) => observe_array(xs, infer_datetimes),
        Value::Object(m) => observe_object(m, infer_datetimes),
    }
}

fn observe_array(xs: &[Value], infer_datetimes: bool) -> TypeTree {
    if xs.is_empty() {
        return TypeTree::erased_array();
    }
    let elem = xs
        .iter()
        .fold(TypeTree::Any, |acc, el| merge(&acc, &observe_value(el, infer_datetimes)));
    TypeTree::array_of(elem)
}

fn observe_object(map: &Map<String, Value>, infer_datetimes: bool) -> TypeTree {
    TypeTree::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), observe_value(v, infer_datetimes)))
            .collect(),
    )
}

// ------------------------------- Merge ----------------------------------- //

/// Combine two observations of the same slot.
///
/// `Any` is the identity. Equal kinds merge structurally (objects by field,
/// arrays by element); distinct kinds end up side by side in a flat union
/// holding at most one member per kind.
pub fn merge(a: &TypeTree, b: &TypeTree) -> TypeTree {
    match (a, b) {
        (TypeTree::Any, x) | (x, TypeTree::Any) => x.clone(),
        _ if same_slot(a, b) => merge_same(a, b),
        _ => {
            let mut members = Vec::new();
            absorb_all(&mut members, a);
            absorb_all(&mut members, b);
            match members.len() {
                0 => TypeTree::Any,
                1 => members.remove(0),
                _ => TypeTree::Union(members),
            }
        }
    }
}

fn absorb_all(members: &mut Vec<TypeTree>, t: &TypeTree) {
    match t {
        TypeTree::Any => {}
        TypeTree::Union(inner) => inner.iter().for_each(|m| absorb_all(members, m)),
        other => match members.iter().position(|m| same_slot(m, other)) {
            Some(i) => members[i] = merge_same(&members[i], other),
            None => members.push(other.clone()),
        },
    }
}

/// Same kind of non-union node: these merge into one member.
fn same_slot(a: &TypeTree, b: &TypeTree) -> bool {
    match (a, b) {
        (TypeTree::Primitive(x), TypeTree::Primitive(y)) => x == y,
        (TypeTree::Object(_), TypeTree::Object(_))
        | (TypeTree::Array(_), TypeTree::Array(_))
        | (TypeTree::Missing, TypeTree::Missing)
        | (TypeTree::Blank, TypeTree::Blank) => true,
        _ => false,
    }
}

fn merge_same(a: &TypeTree, b: &TypeTree) -> TypeTree {
    match (a, b) {
        (TypeTree::Object(x), TypeTree::Object(y)) => obj::merge_objects(x, y),
        (TypeTree::Array(x), TypeTree::Array(y)) => arr::merge_arrays(x, y),
        _ => a.clone(),
    }
}

// ------------------------------- Front API -------------------------------- //

/// Streaming inference state. Feed records with [`Inferer::offer`] until it
/// returns `false`, then [`Inferer::solve`].
pub struct Inferer {
    opts: InferOptions,
    mode: Mode,
    consumed: usize,
    skipped: usize,
}

enum Mode {
    Sampled(Reservoir<Value>),
    All(TypeTree),
}

impl Inferer {
    pub fn new(opts: InferOptions) -> Self {
        let mode = if opts.all_records {
            Mode::All(TypeTree::Any)
        } else {
            Mode::Sampled(Reservoir::new(opts.sample_size, opts.seed))
        };
        Self { opts, mode, consumed: 0, skipped: 0 }
    }

    /// Take one well-formed record. Returns `false` once the ceiling is reached
    /// and the caller should stop pulling.
    pub fn offer(&mut self, record: Value) -> bool {
        if self.is_full() {
            return false;
        }
        self.consumed += 1;
        match &mut self.mode {
            Mode::Sampled(reservoir) => reservoir.offer(record),
            Mode::All(acc) => {
                let obs = observe_value(&record, self.opts.infer_datetimes);
                *acc = merge(acc, &obs);
            }
        }
        !self.is_full()
    }

    /// Record a malformed input; it never counts toward the sample.
    pub fn skip(&mut self, reason: impl Display) {
        self.skipped += 1;
        debug!(%reason, skipped = self.skipped, "skipping malformed record");
    }

    pub fn is_full(&self) -> bool {
        self.consumed >= self.opts.record_ceiling
    }

    pub fn solve(self, truncated: bool) -> Inference {
        let (raw, sampled) = match self.mode {
            Mode::All(acc) => (acc, self.consumed),
            Mode::Sampled(reservoir) => {
                let items = reservoir.into_items();
                let n = items.len();
                let tree = items.iter().fold(TypeTree::Any, |acc, v| {
                    merge(&acc, &observe_value(v, self.opts.infer_datetimes))
                });
                (tree, n)
            }
        };
        let root = normalize_with(&raw, &NormalizeOptions { union_cap: self.opts.union_cap });
        debug!(sampled, consumed = self.consumed, skipped = self.skipped, truncated, "inference solved");
        Inference {
            root,
            required: PresenceSet::new(),
            sampled,
            skipped: self.skipped,
            truncated,
        }
    }
}

/// Infer a tree from a record stream. `Err` items are malformed records and
/// are skipped. Pulling stops as soon as the record ceiling is reached.
pub fn infer<I, E>(records: I, opts: &InferOptions) -> Inference
where
    I: IntoIterator<Item = Result<Value, E>>,
    E: Display,
{
    let mut inferer = Inferer::new(opts.clone());
    let mut iter = records.into_iter();
    let mut truncated = false;

    loop {
        if inferer.is_full() {
            truncated = iter.next().is_some();
            break;
        }
        match iter.next() {
            Some(Ok(record)) => {
                inferer.offer(record);
            }
            Some(Err(reason)) => inferer.skip(reason),
            None => break,
        }
    }

    if truncated {
        warn!(ceiling = opts.record_ceiling, "record ceiling reached before end of input; result is truncated");
    }
    inferer.solve(truncated)
}

/// Convenience for in-memory values that are all well formed.
pub fn infer_from_values<I>(values: I, opts: &InferOptions) -> Inference
where
    I: IntoIterator<Item = Value>,
{
    infer(values.into_iter().map(Ok::<_, std::convert::Infallible>), opts)
}

// ------------------------------- Tests ------------------------------------ //
