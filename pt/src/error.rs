//! Error types for pagetext

use thiserror::Error;

/// Errors raised by the chunker
///
/// Extraction and assembly never fail; only a chunker precondition can.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("max length must be greater than zero, got {0}")]
    InvalidMaxLength(usize),
}
