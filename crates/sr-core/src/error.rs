//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown travel mode {0:?}: expected walk, bike, or car")]
    UnknownMode(String),

    #[error("coordinate ({lat}, {lon}) is outside the valid degree range")]
    CoordinateOutOfRange { lat: f64, lon: f64 },
}

pub type CoreResult<T> = Result<T, CoreError>;
