use std::path::PathBuf;

/// Failures of the I/O surface around the core. The core itself
/// (`infer`, `normalize`, `flatten`, `compare`) never fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sampled record is not valid structured data. Inference skips these.
    #[error("malformed record in {origin} (line {line}): {message}")]
    MalformedInput {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("invalid input pattern: {0}")]
    Glob(String),

    #[error("invalid side document {origin}: {message}")]
    SideDocument { origin: String, message: String },

    #[error("jq filter failed: {message}")]
    Jq { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
