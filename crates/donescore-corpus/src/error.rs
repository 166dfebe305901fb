//! Error types for corpus assembly.

use donescore_kernel::KernelError;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    /// Artifacts must be UTF-8; anything else fails the run.
    #[error("{path}: not valid UTF-8 (byte offset {offset})")]
    Encoding { path: String, offset: usize },

    #[error("docs root not found: {0}")]
    MissingRoot(String),

    #[error("no {domain} artifacts matching {pattern} under {dir}")]
    EmptyCorpus {
        domain: String,
        dir: String,
        pattern: String,
    },

    #[error("unknown domain `{name}` (known: {known})")]
    UnknownDomain { name: String, known: String },

    #[error("invalid configuration at {path}: {message}")]
    Config { path: String, message: String },

    #[error("invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    #[error("invalid registry at {path}: {message}")]
    Registry { path: String, message: String },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

impl CorpusError {
    pub(crate) fn io(path: &std::path::Path, error: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }

    pub(crate) fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}
