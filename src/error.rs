//! Error types for EMOS E6016 decoding

use crate::protocol::Stage;
use thiserror::Error;

/// Result type for EMOS E6016 operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Error types encountered while decoding an EMOS E6016 transmission
///
/// Every variant aborts the current decode attempt only. No partial
/// reading is ever produced alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not enough identical repeats in the buffer
    #[error("Repeated row not found: need {min_repeats} rows matching over {compare_bits} bits")]
    RowNotFound {
        /// Required number of identical rows
        min_repeats: usize,
        /// Number of leading bits compared
        compare_bits: usize,
    },

    /// Selected row has the wrong bit count
    #[error("Length mismatch: expected {expected} bits, got {actual}")]
    LengthMismatch {
        /// Required bit count
        expected: usize,
        /// Bit count of the selected row
        actual: usize,
    },

    /// Leading bytes are not the device signature
    #[error("Signature mismatch: found {:02x} {:02x} {:02x}", .found[0], .found[1], .found[2])]
    SignatureMismatch {
        /// The three leading bytes as received
        found: [u8; 3],
    },

    /// Additive checksum does not match
    #[error("Integrity failure: checksum byte {expected:#04x}, computed {computed:#04x}")]
    IntegrityFailure {
        /// Checksum byte carried in the frame
        expected: u8,
        /// Checksum computed over the payload
        computed: u8,
    },

    /// Malformed textual bit row
    #[error("Invalid bit string: {0}")]
    InvalidBitString(String),

    /// Insufficient data to build a frame
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

impl DecodeError {
    /// Create a new InvalidBitString error
    pub fn invalid_bits(msg: impl Into<String>) -> Self {
        DecodeError::InvalidBitString(msg.into())
    }

    /// Create a new InsufficientData error
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        DecodeError::InsufficientData(msg.into())
    }

    /// Stable reason code, suitable for logs and counters
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::RowNotFound { .. } => "row_not_found",
            DecodeError::LengthMismatch { .. } => "length_mismatch",
            DecodeError::SignatureMismatch { .. } => "signature_mismatch",
            DecodeError::IntegrityFailure { .. } => "integrity_failure",
            DecodeError::InvalidBitString(_) => "invalid_bit_string",
            DecodeError::InsufficientData(_) => "insufficient_data",
        }
    }

    /// Numeric abort class used by decoder dispatchers
    ///
    /// `-1` length abort, `-2` early abort, `-3` integrity failure.
    pub fn abort_code(&self) -> i32 {
        match self {
            DecodeError::LengthMismatch { .. } | DecodeError::InsufficientData(_) => -1,
            DecodeError::RowNotFound { .. }
            | DecodeError::SignatureMismatch { .. }
            | DecodeError::InvalidBitString(_) => -2,
            DecodeError::IntegrityFailure { .. } => -3,
        }
    }

    /// Pipeline stage which raised this error
    pub fn stage(&self) -> Stage {
        match self {
            DecodeError::RowNotFound { .. } | DecodeError::InvalidBitString(_) => Stage::Start,
            DecodeError::LengthMismatch { .. }
            | DecodeError::SignatureMismatch { .. }
            | DecodeError::InsufficientData(_) => Stage::RowSelected,
            DecodeError::IntegrityFailure { .. } => Stage::Normalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DecodeError::SignatureMismatch {
            found: [0x55, 0x5a, 0x7d],
        };
        assert_eq!(err.to_string(), "Signature mismatch: found 55 5a 7d");

        let err = DecodeError::IntegrityFailure {
            expected: 0xc7,
            computed: 0xc8,
        };
        assert!(err.to_string().contains("0xc7"));
    }

    #[test]
    fn test_reason_codes_are_distinct() {
        let errors = [
            DecodeError::RowNotFound {
                min_repeats: 3,
                compare_bits: 112,
            },
            DecodeError::LengthMismatch {
                expected: 120,
                actual: 119,
            },
            DecodeError::SignatureMismatch { found: [0; 3] },
            DecodeError::IntegrityFailure {
                expected: 0,
                computed: 1,
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(DecodeError::code).collect();
        codes.dedup();
        assert_eq!(codes.len(), 4);
        assert_eq!(errors[1].abort_code(), -1);
        assert_eq!(errors[2].abort_code(), -2);
        assert_eq!(errors[3].abort_code(), -3);
    }

    #[test]
    fn test_error_stage() {
        let err = DecodeError::IntegrityFailure {
            expected: 0,
            computed: 1,
        };
        assert_eq!(err.stage(), Stage::Normalized);
    }
}
