//! Errors raised while validating a cutting request.

use thiserror::Error;

/// Result type alias for planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Input rejected before any packing starts. Oversized pieces are not errors;
/// they are flagged on their placement instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("stock dimensions must be non-zero, got {length}x{width}")]
    InvalidStock { length: u32, width: u32 },

    #[error("cut {index} has a zero dimension: {length}x{width}")]
    InvalidPiece {
        index: usize,
        length: u32,
        width: u32,
    },

    #[error("cut {index} has a zero quantity")]
    InvalidQuantity { index: usize },
}
