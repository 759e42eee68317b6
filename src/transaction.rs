//! Domain types for broker payments and transactions.

use crate::error::SisowError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A bank participating in iDEAL, as returned by the issuer listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// Issuer id, passed back when starting an iDEAL payment
    pub id: String,
    /// Display name of the bank
    pub name: String,
}

/// Payment method offered through the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// iDEAL bank payment; requires an issuer id
    #[default]
    Ideal,
    /// Manual bank transfer
    Overboeking,
    /// Sofortbanking
    Sofort,
    /// Bancontact / Mister Cash
    Mistercash,
    /// PayPal Express Checkout
    PaypalEc,
}

impl Provider {
    /// Method name as the broker spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ideal => "ideal",
            Self::Overboeking => "overboeking",
            Self::Sofort => "sofort",
            Self::Mistercash => "mistercash",
            Self::PaypalEc => "paypalec",
        }
    }

    /// Value sent as the `payment` request parameter. The broker expects
    /// an empty string for iDEAL.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Self::Ideal => "",
            _ => self.as_str(),
        }
    }
}

/// Everything needed to start a payment.
///
/// Optional fields fall back on the wire the way the broker prescribes;
/// see the field docs. Input sanitization happens when the payment is
/// started, not here.
#[derive(Debug, Clone, Default)]
pub struct PaymentRequest {
    /// Merchant-chosen reference, at most 16 characters on the wire
    pub purchase_id: String,
    /// Amount in euros; converted to whole cents when the call is made
    pub amount: f64,
    /// Issuer (bank) id; required for iDEAL
    pub issuer_id: Option<String>,
    /// Free-form description, at most 32 characters
    pub description: Option<String>,
    /// Secondary reference; defaults to the purchase id
    pub entrance_code: Option<String>,
    /// Payment method; defaults to iDEAL
    pub provider: Provider,
    /// Where the customer's browser returns after payment
    pub return_url: String,
    /// Where the customer returns after cancelling; defaults to `return_url`
    pub cancel_url: Option<String>,
    /// Server-to-server callback target; defaults to `return_url`
    pub callback_url: Option<String>,
    /// Notification target; defaults to `return_url`
    pub notify_url: Option<String>,
}

impl PaymentRequest {
    /// Request with the required fields set and broker defaults elsewhere.
    pub fn new(
        purchase_id: impl Into<String>,
        amount: f64,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            purchase_id: purchase_id.into(),
            amount,
            return_url: return_url.into(),
            ..Self::default()
        }
    }

    /// Select the issuing bank for an iDEAL payment.
    pub fn with_issuer(mut self, issuer_id: impl Into<String>) -> Self {
        self.issuer_id = Some(issuer_id.into());
        self
    }

    /// Select a payment method other than iDEAL.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }
}

/// Broker-issued handle for a started payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentHandle {
    /// Broker transaction id (`trxid`)
    pub transaction_id: String,
    /// URL to send the customer to for completing the payment
    pub redirect_url: String,
}

/// Lifecycle states the broker reports for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Open,
    Success,
    Expired,
    Cancelled,
    Failure,
    Pending,
    Credited,
    Reversed,
}

impl TransactionStatus {
    /// Status name as the broker spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Success => "Success",
            Self::Expired => "Expired",
            Self::Cancelled => "Cancelled",
            Self::Failure => "Failure",
            Self::Pending => "Pending",
            Self::Credited => "Credited",
            Self::Reversed => "Reversed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = SisowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Success" => Ok(Self::Success),
            "Expired" => Ok(Self::Expired),
            "Cancelled" => Ok(Self::Cancelled),
            "Failure" => Ok(Self::Failure),
            "Pending" => Ok(Self::Pending),
            "Credited" => Ok(Self::Credited),
            "Reversed" => Ok(Self::Reversed),
            other => Err(SisowError::Response(format!(
                "unknown transaction status '{other}'"
            ))),
        }
    }
}

/// Typed view of the broker's transaction record.
///
/// Fields the contract names are lifted out; anything else the broker
/// adds is preserved in `extra` under its wire spelling. The raw result
/// code never appears here.
#[derive(Debug, Clone, Default)]
pub struct TransactionDetails {
    /// Broker transaction id
    pub transaction_id: Option<String>,
    /// Transaction status
    pub status: Option<TransactionStatus>,
    /// Amount in whole cents
    pub amount_cents: Option<i64>,
    /// Merchant purchase id
    pub purchase_id: Option<String>,
    /// Description as stored by the broker
    pub description: Option<String>,
    /// Entrance code as stored by the broker
    pub entrance_code: Option<String>,
    /// Issuer the customer paid with
    pub issuer_id: Option<String>,
    /// Broker timestamp, normalized to ISO-8601 ('T' date/time separator)
    pub timestamp: Option<String>,
    /// Unrecognized broker fields
    pub extra: BTreeMap<String, String>,
}

impl TransactionDetails {
    /// Lift a parsed `GetTransaction` response into the typed record.
    /// The result-code element is already stripped during parsing.
    pub fn from_response(response: &crate::envelope::SoapResponse) -> Result<Self, SisowError> {
        let mut details = Self::default();
        for (name, value) in response.fields() {
            match name.as_str() {
                "trxid" => details.transaction_id = Some(value.clone()),
                "status" => details.status = Some(value.parse()?),
                "amount" => {
                    let cents = value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| SisowError::Response(format!("invalid amount '{value}'")))?;
                    details.amount_cents = Some(cents);
                }
                "purchaseid" => details.purchase_id = Some(value.clone()),
                "description" => details.description = Some(value.clone()),
                "entrancecode" => details.entrance_code = Some(value.clone()),
                "issuerid" => details.issuer_id = Some(value.clone()),
                // Broker timestamps separate date and time with a space;
                // normalize to the ISO-8601 'T' separator.
                "timestamp" => details.timestamp = Some(value.replacen(' ', "T", 1)),
                _ => {
                    details.extra.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(details)
    }
}

/// Query parameters the broker appends when redirecting the customer
/// back to the merchant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    /// Broker transaction id
    #[serde(rename = "trxid")]
    pub transaction_id: String,
    /// Broker error code ("00" on success)
    #[serde(rename = "ec")]
    pub error_code: String,
    /// Status string, verbatim as signed
    pub status: String,
    /// Hex-encoded SHA-1 signature over the payload and credentials
    #[serde(rename = "sha1")]
    pub signature: String,
}
