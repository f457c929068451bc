//! Error types shared across the catalog pipeline.
//!
//! "Not found" is never an error here: REST lookups report it through
//! [`crate::forge::Lookup::NotFound`]. Everything in [`ForgeError`] means the
//! forge could not be asked, or answered in a way we cannot trust, and fails
//! the run instead of silently dropping metadata.

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the forge.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// The forge answered with a non-success status other than 404
    /// (bad token, rate limit, server error).
    #[error("forge returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response arrived but its body was not what the forge promises.
    #[error("unexpected response from {context}: {message}")]
    Decode { context: String, message: String },

    /// The query-language endpoint answered but reported errors other than
    /// an unknown repository. Each entry is `TYPE: message`.
    #[error("query for {repository} failed: {}", errors.join("; "))]
    Query {
        repository: String,
        errors: Vec<String>,
    },

    /// The access token cannot be sent as an HTTP header.
    #[error("access token contains characters not allowed in an HTTP header")]
    InvalidToken,
}

/// Failure building or writing a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to list repositories for {account}: {source}")]
    Listing {
        account: String,
        #[source]
        source: ForgeError,
    },

    #[error("failed to resolve repository {repository}: {source}")]
    Resolve {
        repository: String,
        #[source]
        source: ForgeError,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write catalog to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure in the local prune/upgrade/commit workflow.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest {} has no numeric `timestamp` field", path.display())]
    MissingTimestamp { path: PathBuf },

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(f64),

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },
}
