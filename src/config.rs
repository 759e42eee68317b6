//! Merchant credential configuration.

use crate::error::SisowError;
use serde::{Deserialize, Serialize};

/// Merchant credentials and mode for the broker.
///
/// Immutable after construction; a client built from it can be shared
/// across sequential calls without further coordination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    /// Merchant identifier issued by the broker
    pub merchant_id: String,

    /// Merchant secret key, also used to sign callback payloads
    pub merchant_key: String,

    /// Run calls against the broker's test facility
    #[serde(default)]
    pub test: bool,
}

impl MerchantConfig {
    /// Create a configuration, rejecting empty credentials.
    pub fn new(
        merchant_id: impl Into<String>,
        merchant_key: impl Into<String>,
    ) -> Result<Self, SisowError> {
        let merchant_id = merchant_id.into();
        let merchant_key = merchant_key.into();

        if merchant_id.is_empty() {
            return Err(SisowError::Configuration(
                "merchant id must not be empty".to_string(),
            ));
        }
        if merchant_key.is_empty() {
            return Err(SisowError::Configuration(
                "merchant key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            merchant_id,
            merchant_key,
            test: false,
        })
    }

    /// Enable or disable test mode for every call made with this
    /// configuration. Individual calls may still override it.
    pub fn with_test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }
}
