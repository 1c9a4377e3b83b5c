//! Record sources: JSON documents and NDJSON streams on disk.
//!
//! Records are produced lazily. Malformed records come out as
//! `Err(Error::MalformedInput)` items so inference can skip them; a read
//! failure ends the stream and is kept for the caller to surface.
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct RecordSettings {
    /// Treat every input as newline-delimited JSON regardless of extension.
    pub ndjson: bool,
    /// JSON Pointer selecting a subnode of each document.
    pub json_pointer: Option<String>,
    /// jq filter applied to each document; each output is a record.
    pub jq_expr: Option<String>,
}

pub struct RecordReader {
    settings: RecordSettings,
    files: std::vec::IntoIter<PathBuf>,
    current: Option<NdjsonFile>,
    pending: VecDeque<Result<Value>>,
    failure: Option<Error>,
}

struct NdjsonFile {
    origin: String,
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl RecordReader {
    pub fn new(paths: Vec<PathBuf>, settings: RecordSettings) -> Self {
        Self {
            settings,
            files: paths.into_iter(),
            current: None,
            pending: VecDeque::new(),
            failure: None,
        }
    }

    /// The read error that ended the stream early, if any.
    pub fn take_failure(&mut self) -> Option<Error> {
        self.failure.take()
    }

    fn is_ndjson(&self, path: &Path) -> bool {
        self.settings.ndjson
            || matches!(path.extension().and_then(|e| e.to_str()), Some("ndjson" | "jsonl"))
    }

    fn open(&mut self, path: PathBuf) {
        let origin = path.to_string_lossy().to_string();
        debug!(%origin, "opening input");
        if self.is_ndjson(&path) {
            match File::open(&path) {
                Ok(file) => {
                    self.current = Some(NdjsonFile {
                        origin,
                        path,
                        lines: BufReader::new(file).lines(),
                        line_no: 0,
                    })
                }
                Err(source) => self.failure = Some(Error::Io { path, source }),
            }
            return;
        }
        match std::fs::read_to_string(&path) {
            Ok(src) => match serde_json::from_str::<Value>(&src) {
                Ok(doc) => self.push_document(doc, &origin, 0, true),
                Err(error) => self.pending.push_back(Err(malformed(&origin, 0, error))),
            },
            Err(source) => self.failure = Some(Error::Io { path, source }),
        }
    }

    /// Apply pointer and jq selection, then queue the resulting records.
    /// A whole-file document that is a top-level array is one record per element.
    fn push_document(&mut self, doc: Value, origin: &str, line: usize, expand_arrays: bool) {
        let selected = match &self.settings.json_pointer {
            None => doc,
            Some(ptr) => match doc.pointer(ptr) {
                Some(v) => v.clone(),
                None => {
                    let msg = format!("JSON pointer {ptr} selects nothing");
                    self.pending.push_back(Err(malformed(origin, line, msg)));
                    return;
                }
            },
        };
        let docs = match &self.settings.jq_expr {
            None => vec![selected],
            Some(expr) => match crate::jq_exec::run_jaq(expr, &selected) {
                Ok(outputs) => outputs,
                Err(error) => {
                    self.pending.push_back(Err(malformed(origin, line, error)));
                    return;
                }
            },
        };
        for doc in docs {
            match doc {
                Value::Array(items) if expand_arrays => {
                    self.pending.extend(items.into_iter().map(Ok));
                }
                other => self.pending.push_back(Ok(other)),
            }
        }
    }
}

impl Iterator for RecordReader {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }
            if self.failure.is_some() {
                return None;
            }
            let Some(file) = self.current.as_mut() else {
                let path = self.files.next()?;
                self.open(path);
                continue;
            };
            match file.lines.next() {
                None => self.current = None,
                Some(Err(source)) => {
                    let path = file.path.clone();
                    self.current = None;
                    self.failure = Some(Error::Io { path, source });
                }
                Some(Ok(line)) => {
                    file.line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let (origin, line_no) = (file.origin.clone(), file.line_no);
                    match serde_json::from_str::<Value>(&line) {
                        Ok(doc) => self.push_document(doc, &origin, line_no, false),
                        Err(error) => self.pending.push_back(Err(malformed(&origin, line_no, error))),
                    }
                }
            }
        }
    }
}

fn malformed(origin: &str, line: usize, message: impl ToString) -> Error {
    Error::MalformedInput { origin: origin.to_string(), line, message: message.to_string() }
}

/// Expand literal paths and quoted glob patterns.
pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let entries = glob::glob(pattern).map_err(|e| Error::Glob(e.to_string()))?;
        let before = out.len();
        for entry in entries {
            out.push(entry.map_err(|e| Error::Glob(e.to_string()))?);
        }
        if out.len() == before {
            return Err(Error::Glob(format!("glob pattern matched no files: {pattern}")));
        }
    }
    Ok(out)
}
