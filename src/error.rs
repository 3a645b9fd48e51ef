// src/error.rs

use thiserror::Error;

/// Core error types for factory-status
///
/// Every variant is fatal to a run: nothing is retried and no partial
/// report is produced.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or non-success HTTP status from the build service
    #[error("Failed to fetch {path}: {reason}")]
    RemoteFetch { path: String, reason: String },

    /// Response body could not be decoded
    #[error("Failed to parse document: {0}")]
    DocumentParse(String),

    /// Package history has no revisions to pick a checksum from
    #[error("Package {project}/{package} has no revisions")]
    NoRevisions { project: String, package: String },

    /// Two merged projects define the same package name
    #[error("Package '{name}' is defined by both {existing_project} and {project}")]
    DuplicatePackage {
        name: String,
        existing_project: String,
        project: String,
    },

    /// Not enough command line arguments
    #[error("{0}")]
    Usage(String),

    /// A project URL names an API with no configured account
    #[error("No account configured for API URL: {0}")]
    AccountNotFound(String),

    /// Configuration or runtime setup error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using factory-status's Error type
pub type Result<T> = std::result::Result<T, Error>;
