//! Error and warning types for the broker client.

use thiserror::Error;

/// Errors surfaced by broker operations.
#[derive(Error, Debug)]
pub enum SisowError {
    /// Missing or unusable merchant credentials at construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller input violates a precondition the client cannot silently fix.
    #[error("validation error: {0}")]
    Validation(String),

    /// The broker answered with a SOAP fault.
    #[error("broker fault: {0}")]
    Fault(String),

    /// The broker answered with a nonzero result code.
    #[error("broker error {code} for {reference}: {detail}")]
    Remote {
        /// Broker-defined result code (0 means success and never lands here)
        code: i64,
        /// Purchase id or transaction id the failed call was about
        reference: String,
        /// Documented meaning of the code, where known
        detail: String,
    },

    /// The HTTP exchange itself failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The broker's response could not be interpreted.
    #[error("malformed broker response: {0}")]
    Response(String),
}

impl SisowError {
    /// Remote error for a nonzero result code, with the documented detail
    /// filled in where the code is known.
    pub(crate) fn remote(code: i64, reference: impl Into<String>) -> Self {
        Self::Remote {
            code,
            reference: reference.into(),
            detail: describe_result_code(code)
                .unwrap_or("broker-defined error")
                .to_string(),
        }
    }
}

/// Documented meaning of a broker result code, if any.
pub fn describe_result_code(code: i64) -> Option<&'static str> {
    match code {
        317 => Some("testing not allowed on this merchant account"),
        _ => None,
    }
}

/// Codes for non-fatal input adjustments made while preparing a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentCode {
    /// Purchase id was sanitized and truncated to the broker maximum
    PurchaseIdShortened,
    /// Description exceeds the broker maximum (sent unchanged)
    DescriptionTooLong,
    /// Entrance code was truncated to the broker maximum
    EntranceCodeShortened,
}

impl AdjustmentCode {
    /// Get the string code for this adjustment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseIdShortened => "PURCHASE_ID_SHORTENED",
            Self::DescriptionTooLong => "DESCRIPTION_TOO_LONG",
            Self::EntranceCodeShortened => "ENTRANCE_CODE_SHORTENED",
        }
    }
}

/// An input adjustment that did not block the call.
///
/// Adjustments are logged at warn level when the call is made; they are
/// never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    /// Adjustment code
    pub code: AdjustmentCode,
    /// Human-readable message
    pub message: String,
}

impl Adjustment {
    /// Create a new adjustment.
    pub fn new(code: AdjustmentCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
