//! Error types for Crammese.
//!
//! Library crates use [`CrammeseError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Crammese operations.
#[derive(Debug, thiserror::Error)]
pub enum CrammeseError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The base game bundle pair could not be loaded. Fatal for a run.
    #[error("base game bundle for {variant} unavailable: {reason}")]
    BaseBundleUnavailable { variant: String, reason: String },

    /// The module is not installed.
    #[error("module '{module}' not found")]
    ModuleNotFound { module: String },

    /// The module is installed but ships no language file for the variant.
    #[error("module '{module}' has no translation file for {variant}")]
    TranslationFileNotFound { module: String, variant: String },

    /// A bundle exists but its content cannot be decoded.
    #[error("malformed bundle {origin}: {message}")]
    MalformedBundle { origin: String, message: String },

    /// Lexical lookup failed or returned nothing usable.
    #[error("lookup error for '{word}': {message}")]
    Lookup { word: String, message: String },

    /// Network/HTTP error.
    #[error("network error: {0}")]
    Network(String),

    /// JSON or other content parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad language code, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CrammeseError>;

impl CrammeseError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-bundle error for the given origin (file or archive entry).
    pub fn malformed(origin: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MalformedBundle {
            origin: origin.into(),
            message: msg.into(),
        }
    }

    /// Create a lookup error for a headword.
    pub fn lookup(word: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Lookup {
            word: word.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CrammeseError::config("unknown language");
        assert_eq!(err.to_string(), "config error: unknown language");

        let err = CrammeseError::TranslationFileNotFound {
            module: "jei".into(),
            variant: "es_ar".into(),
        };
        assert_eq!(
            err.to_string(),
            "module 'jei' has no translation file for es_ar"
        );

        let err = CrammeseError::lookup("pomme", "HTTP 404");
        assert!(err.to_string().contains("'pomme'"));
    }
}
