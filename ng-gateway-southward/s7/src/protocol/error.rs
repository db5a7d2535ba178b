use std::result::Result as StdResult;
use thiserror::Error as ThisError;

/// Unified S7 result type
pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed address string, empty input or non-positive count
    #[error("invalid address '{address}': {reason}")]
    AddressFormat {
        address: String,
        reason: &'static str,
    },

    /// Resolved bit index is outside 0..=7
    #[error("invalid address '{address}': bit index {bit} is out of range (0..=7)")]
    BitIndexOutOfRange { address: String, bit: u32 },

    /// Area prefix is not one of I/Q/M/D/V/T/C, or the area has no textual form
    #[error("unknown area: {area}")]
    UnknownArea { area: String },

    /// The PDU budget leaves no room for a single payload byte per chunk.
    ///
    /// Raised before any chunk is produced; this is a caller configuration
    /// problem (negotiated PDU too small for the per-item overhead).
    #[error(
        "PDU budget too small: target {target_size} bytes, overhead {overhead_size} bytes, margin {margin} bytes"
    )]
    BudgetTooSmall {
        target_size: usize,
        overhead_size: usize,
        margin: usize,
    },

    /// Responses or payloads handed to a plan do not match its groups/chunks
    #[error("plan mismatch: {context}")]
    PlanMismatch { context: &'static str },

    /// Input does not have enough bytes to complete the operation
    #[error("insufficient data: needed {needed} bytes, available {available} bytes")]
    InsufficientData { needed: usize, available: usize },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// True for every failure produced while resolving an address string.
    #[inline]
    pub fn is_address_error(&self) -> bool {
        matches!(
            self,
            Error::AddressFormat { .. } | Error::BitIndexOutOfRange { .. } | Error::UnknownArea { .. }
        )
    }

    #[inline]
    pub(crate) fn address_format(address: &str, reason: &'static str) -> Self {
        Error::AddressFormat {
            address: address.to_string(),
            reason,
        }
    }
}
