//! Street-subsystem error types.

use thiserror::Error;

use sr_core::{EdgeId, VertexId};

/// Errors produced by the street stores and layer.
#[derive(Debug, Error)]
pub enum StreetError {
    #[error("vertex {id} out of range (store holds {count})")]
    VertexOutOfRange { id: VertexId, count: usize },

    #[error("edge {id} out of range (store holds {count})")]
    EdgeOutOfRange { id: EdgeId, count: usize },

    #[error("query matched {count} edges, more than the cap of {cap}")]
    ResultTooLarge { count: usize, cap: usize },

    #[error("edge {edge} has invalid geometry: {reason}")]
    InvalidGeometry { edge: EdgeId, reason: String },
}

pub type StreetResult<T> = Result<T, StreetError>;

/// Errors produced by [`StreetRouter`](crate::StreetRouter).
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("search started before an origin was set")]
    OriginNotSet,
}
