//! Error types for the appointment indexer.

use appointment_search_repository::SearchIndexError;
use thiserror::Error;

/// Errors raised by the booking backend client.
#[derive(Error, Debug, Clone)]
pub enum BookingError {
    /// The request could not be sent or returned an error status.
    #[error("Booking request error: {0}")]
    RequestError(String),

    /// A resource that must exist was not found.
    #[error("Booking resource not found: {0}")]
    NotFound(String),

    /// The response body could not be decoded.
    #[error("Booking decode error: {0}")]
    DecodeError(String),
}

impl BookingError {
    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<reqwest::Error> for BookingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::DecodeError(err.to_string())
        } else {
            Self::RequestError(err.to_string())
        }
    }
}

/// Errors that can occur while indexing forms and slots.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Error from the search index.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),

    /// Error from the booking backend.
    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    /// A document could not be built.
    #[error("Mapping error: {0}")]
    MappingError(String),
}

impl IndexerError {
    /// Create a mapping error.
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::MappingError(msg.into())
    }
}
