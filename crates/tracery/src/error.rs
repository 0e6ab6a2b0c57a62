//! Error types for Tracery operations.
//!
//! [`TraceryError`] is the error returned by the public API. Contract breaches
//! of the element model and the layout engine surface as
//! [`TraceryError::Model`]; problems reading diagram files keep the source
//! text so that front ends can point at the offending location.

use std::io;

use thiserror::Error;

use tracery_core::diagram::ModelError;

use crate::persistence::PersistenceError;

/// The main error type for Tracery operations.
#[derive(Debug, Error)]
pub enum TraceryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// A diagram file could not be decoded. `src` holds the file contents.
    #[error("{err}")]
    Persistence { err: PersistenceError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TraceryError {
    /// Create a new `Persistence` error with the associated source text.
    pub fn new_persistence_error(err: PersistenceError, src: impl Into<String>) -> Self {
        Self::Persistence {
            err,
            src: src.into(),
        }
    }
}

impl From<PersistenceError> for TraceryError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence {
            err,
            src: String::new(),
        }
    }
}
