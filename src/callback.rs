//! Callback signature verification.
//!
//! The broker signs the redirect back to the merchant with a SHA-1 digest
//! over the payload fields and the merchant credentials. Recomputing the
//! digest authenticates the redirect without another broker round trip.

use crate::config::MerchantConfig;
use crate::transaction::CallbackPayload;
use sha1::{Digest, Sha1};
use tracing::warn;

/// Hex-encoded SHA-1 over the concatenation, without separators, of
/// `trxid + ec + status + merchantid + merchantkey`.
pub fn compute_signature(
    transaction_id: &str,
    error_code: &str,
    status: &str,
    merchant_id: &str,
    merchant_key: &str,
) -> String {
    let mut hasher = Sha1::new();
    hasher.update(transaction_id.as_bytes());
    hasher.update(error_code.as_bytes());
    hasher.update(status.as_bytes());
    hasher.update(merchant_id.as_bytes());
    hasher.update(merchant_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a callback payload against the merchant credentials.
///
/// A mismatch is a normal negative outcome: it is logged as an alert and
/// reported as `false`, never as an error.
pub fn verify(payload: &CallbackPayload, config: &MerchantConfig) -> bool {
    let expected = compute_signature(
        &payload.transaction_id,
        &payload.error_code,
        &payload.status,
        &config.merchant_id,
        &config.merchant_key,
    );

    if expected != payload.signature {
        warn!(
            trxid = %payload.transaction_id,
            error_code = %payload.error_code,
            status = %payload.status,
            computed = %expected,
            "callback signature mismatch"
        );
        return false;
    }
    true
}
