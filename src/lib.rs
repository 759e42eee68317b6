//! Client for the Sisow payment broker's SOAP API.
//!
//! Wraps the broker's four WSDL operations behind typed methods: listing
//! iDEAL issuers, starting a payment, and polling transaction status and
//! details, plus offline verification of the signed callback the broker
//! redirects the customer back with.
//!
//! # Features
//!
//! - Issuer (bank) listing for iDEAL
//! - Payment start with broker-conform input sanitization
//! - Transaction status and detail queries with typed results
//! - SHA-1 callback signature verification
//! - Transport seam ([`PaymentBroker`]) for test doubles
//!
//! # Example
//!
//! ```ignore
//! use sisow_client::{MerchantConfig, PaymentBroker, PaymentRequest, SisowClient};
//!
//! let config = MerchantConfig::new("2537407781", "merchant-key")?;
//! let client = SisowClient::new(config);
//!
//! let request = PaymentRequest::new("order-1042", 12.50, "https://shop.example/return")
//!     .with_issuer("0721");
//! let handle = client.start_payment(&request).await?;
//! // send the customer to handle.redirect_url
//! ```

pub mod callback;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod sanitize;
pub mod transaction;

pub use client::{PaymentBroker, SisowClient};
pub use config::MerchantConfig;
pub use error::{Adjustment, AdjustmentCode, SisowError};
pub use transaction::{
    CallbackPayload, Issuer, PaymentHandle, PaymentRequest, Provider, TransactionDetails,
    TransactionStatus,
};
