//! Error types for the editing engine

use thiserror::Error;

use crate::types::ObjectId;

/// Errors surfaced by document and editor operations.
///
/// Every variant is recoverable: a failed command leaves the document as it
/// was before the call.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A width, height, radius, font size or scale that is not strictly positive
    #[error("invalid geometry: {field} must be positive (got {value})")]
    InvalidGeometry { field: &'static str, value: f64 },

    /// Element or shape tag the engine does not know
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),

    /// Image bytes could not be decoded
    #[error("could not decode image: {0}")]
    DecodeFailure(String),

    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("object id {0} is already in use")]
    DuplicateId(ObjectId),

    /// Every id up to `u32::MAX` is taken
    #[error("no object ids left")]
    IdSpaceExhausted,

    #[error("invalid color '{0}'")]
    InvalidColor(String),

    /// Raster export could not be produced
    #[error("export failed: {0}")]
    Encode(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EditorError {
    pub fn invalid_geometry(field: &'static str, value: f64) -> Self {
        Self::InvalidGeometry { field, value }
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;

/// Rejects non-positive and non-finite values.
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(EditorError::invalid_geometry(field, value))
    }
}
