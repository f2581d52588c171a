//! Common types and utilities shared across wordtally crates.
//!
//! This crate defines the shared error type, the output format enum, and the
//! observability helpers used throughout the workspace. It is kept small so
//! that every crate can depend on it without pulling in the HTTP stack.
//!
//! # Overview
//!
//! - [`TallyError`] and [`Result`]: shared error handling
//! - [`OutputFormat`]: how ranked results are rendered
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use tally_common::{OutputFormat, TallyError};
//!
//! let err = TallyError::PreconditionFailed(tally_common::CONTENT_NOT_PRESENT);
//! assert_eq!(err.to_string(), "Web content is not present.");
//! assert!(matches!(OutputFormat::default(), OutputFormat::Text));
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Message carried by [`TallyError::PreconditionFailed`] when a document
/// is cleaned before any content was loaded into it.
pub const CONTENT_NOT_PRESENT: &str = "Web content is not present.";

/// Preferred output format for ranked results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `"{rank}. {word} --- {count}"` line per entry.
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(TallyError::Config(format!("unknown output format: {other}"))),
        }
    }
}

/// Error types used across the wordtally system.
#[derive(thiserror::Error, Debug)]
pub enum TallyError {
    /// The input failed URL syntax validation. Raised before any network use.
    #[error(
        "Can't process web content because of invalid url format: {0} \
         (valid formats: http://www.example.com, https://www.example.com)"
    )]
    InvalidUrl(String),

    /// The network fetch failed; the cause chain is preserved.
    #[error("http/https GET request failed: {0}")]
    Fetch(#[from] anyhow::Error),

    /// A cleaning stage ran before any content was loaded.
    #[error("{0}")]
    PreconditionFailed(&'static str),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Results could not be written.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Convenient alias for results that use [`TallyError`].
pub type Result<T> = std::result::Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_output_formats() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(" TEXT ".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!(matches!(
            "yaml".parse::<OutputFormat>(),
            Err(TallyError::Config(_))
        ));
    }

    #[test]
    fn fetch_error_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = TallyError::from(anyhow::Error::new(cause));
        assert!(err.to_string().contains("timed out"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
