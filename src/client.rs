//! Broker client over the SOAP transport.

use crate::callback;
use crate::config::MerchantConfig;
use crate::envelope::{self, SoapResponse, DEFAULT_ENDPOINT};
use crate::error::{Adjustment, SisowError};
use crate::sanitize::{
    amount_to_cents, clean_description, clean_entrance_code, clean_purchase_id,
};
use crate::transaction::{
    CallbackPayload, Issuer, PaymentHandle, PaymentRequest, Provider, TransactionDetails,
    TransactionStatus,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The four remote operations every broker transport offers.
///
/// [`SisowClient`] is the SOAP implementation; the seam exists so callers
/// can substitute another transport or a test double.
#[async_trait]
pub trait PaymentBroker: Send + Sync {
    /// List the banks available for iDEAL payments.
    async fn issuers(&self, test: Option<bool>) -> Result<Vec<Issuer>, SisowError>;

    /// Start a payment and obtain the customer redirect.
    async fn start_payment(&self, request: &PaymentRequest)
        -> Result<PaymentHandle, SisowError>;

    /// Current status of a transaction, `None` when the broker has no
    /// answer for it.
    async fn payment_status(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionStatus>, SisowError>;

    /// Full transaction record, `None` when the broker has no answer for
    /// it.
    async fn payment_details(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionDetails>, SisowError>;
}

/// SOAP client for the Sisow payment broker.
///
/// Holds immutable merchant credentials and an HTTP client; safe to share
/// across tasks.
pub struct SisowClient {
    config: MerchantConfig,
    endpoint: String,
    http: reqwest::Client,
}

impl SisowClient {
    /// Client against the production endpoint.
    pub fn new(config: MerchantConfig) -> Self {
        Self::with_endpoint(config, DEFAULT_ENDPOINT)
    }

    /// Client against a specific endpoint, for test or mirror
    /// environments.
    pub fn with_endpoint(config: MerchantConfig, endpoint: impl Into<String>) -> Self {
        Self {
            config,
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Apply a request timeout to the underlying HTTP client. Purely a
    /// transport setting; result mapping is unaffected.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, SisowError> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Merchant configuration in use.
    pub fn config(&self) -> &MerchantConfig {
        &self.config
    }

    /// Verify the signature on a broker callback. Pure computation, no
    /// broker round trip.
    pub fn verify_callback(&self, payload: &CallbackPayload) -> bool {
        callback::verify(payload, &self.config)
    }

    /// POST one operation envelope and parse the response.
    async fn call(
        &self,
        operation: &str,
        params: &[(&str, &str)],
    ) -> Result<SoapResponse, SisowError> {
        let body = envelope::request_envelope(operation, params);
        debug!(operation, endpoint = %self.endpoint, "calling broker");

        let response = self
            .http
            .post(self.endpoint.as_str())
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", envelope::soap_action(operation))
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        envelope::parse_response(operation, &bytes)
    }

    /// Sanitize a payment request and assemble the `GetURL` parameters,
    /// in wire order. Returns the parameters together with the purchase
    /// id as sent, for error reporting.
    fn build_start_params(
        &self,
        request: &PaymentRequest,
    ) -> Result<(Vec<(&'static str, String)>, String), SisowError> {
        let amount_cents = amount_to_cents(request.amount);
        if amount_cents <= 0 {
            return Err(SisowError::Validation(
                "amount must be at least one cent".to_string(),
            ));
        }

        let (purchase_id, mut adjustments) = clean_purchase_id(&request.purchase_id);
        if purchase_id.is_empty() {
            return Err(SisowError::Validation(
                "purchase id is required".to_string(),
            ));
        }

        let description = match &request.description {
            Some(raw) => {
                let (cleaned, more) = clean_description(raw);
                adjustments.extend(more);
                Some(cleaned)
            }
            None => None,
        };

        let (entrance_code, more) =
            clean_entrance_code(request.entrance_code.as_deref(), &purchase_id);
        adjustments.extend(more);

        if request.provider == Provider::Ideal && request.issuer_id.is_none() {
            return Err(SisowError::Validation(
                "provider iDEAL requires a bank id".to_string(),
            ));
        }
        if request.return_url.is_empty() {
            return Err(SisowError::Validation(
                "return url is required".to_string(),
            ));
        }

        log_adjustments(&adjustments);

        let mut params: Vec<(&'static str, String)> = vec![
            ("merchantid", self.config.merchant_id.clone()),
            ("merchantkey", self.config.merchant_key.clone()),
            ("payment", request.provider.wire_value().to_string()),
        ];
        if let Some(issuer_id) = &request.issuer_id {
            params.push(("issuerid", issuer_id.clone()));
        }
        params.push(("amount", amount_cents.to_string()));
        params.push(("purchaseid", purchase_id.clone()));
        if let Some(description) = description {
            params.push(("description", description));
        }
        if !entrance_code.is_empty() {
            params.push(("entrancecode", entrance_code));
        }
        params.push(("returnurl", request.return_url.clone()));
        // The broker defaults cancel and callback urls to the return url,
        // so equal values are omitted entirely.
        if let Some(cancel_url) = &request.cancel_url {
            if cancel_url != &request.return_url {
                params.push(("cancelurl", cancel_url.clone()));
            }
        }
        if let Some(callback_url) = &request.callback_url {
            if callback_url != &request.return_url {
                params.push(("callbackurl", callback_url.clone()));
            }
        }
        params.push((
            "notifyurl",
            request
                .notify_url
                .clone()
                .unwrap_or_else(|| request.return_url.clone()),
        ));
        if self.config.test {
            params.push(("testmode", "true".to_string()));
        }

        Ok((params, purchase_id))
    }
}

#[async_trait]
impl PaymentBroker for SisowClient {
    /// Call `GetIssuers`; the argument overrides the configured test flag.
    async fn issuers(&self, test: Option<bool>) -> Result<Vec<Issuer>, SisowError> {
        let test = test.unwrap_or(self.config.test);
        let params = [
            ("merchantid", self.config.merchant_id.as_str()),
            ("merchantkey", self.config.merchant_key.as_str()),
            ("test", if test { "true" } else { "false" }),
        ];

        let response = self.call("GetIssuers", &params).await?;
        if !response.has_result() {
            return Err(SisowError::Response(
                "issuer listing returned no result".to_string(),
            ));
        }

        Ok(pair_issuers(&response.values("string")))
    }

    /// Sanitize, call `GetURL`, and map the redirect out-parameters.
    async fn start_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentHandle, SisowError> {
        let (params, purchase_id) = self.build_start_params(request)?;
        let borrowed: Vec<(&str, &str)> =
            params.iter().map(|(n, v)| (*n, v.as_str())).collect();

        let response = self.call("GetURL", &borrowed).await?;
        match response.result_code() {
            Some(0) => {}
            Some(code) => return Err(SisowError::remote(code, purchase_id)),
            None => {
                return Err(SisowError::Response(
                    "payment start returned no result code".to_string(),
                ))
            }
        }

        let transaction_id = response
            .field("trxid")
            .ok_or_else(|| SisowError::Response("missing trxid in payment response".to_string()))?
            .to_string();
        let redirect_url = response
            .field("issuerurl")
            .ok_or_else(|| {
                SisowError::Response("missing issuerurl in payment response".to_string())
            })?
            .to_string();

        info!(trxid = %transaction_id, url = %redirect_url, "payment started, redirecting customer");
        Ok(PaymentHandle {
            transaction_id,
            redirect_url,
        })
    }

    /// Call `GetStatus` and map the status out-parameter.
    async fn payment_status(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionStatus>, SisowError> {
        let params = [
            ("transaction", transaction_id),
            ("merchantid", self.config.merchant_id.as_str()),
            ("merchantkey", self.config.merchant_key.as_str()),
        ];

        let response = self.call("GetStatus", &params).await?;
        if !response.has_result() {
            return Ok(None);
        }
        if let Some(code) = response.result_code() {
            if code != 0 {
                return Err(SisowError::remote(code, transaction_id));
            }
        }

        let status = response
            .field("status")
            .ok_or_else(|| SisowError::Response("missing status in broker response".to_string()))?;
        status.parse().map(Some)
    }

    /// Call `GetTransaction` and lift the field bag into a typed record.
    async fn payment_details(
        &self,
        transaction_id: &str,
    ) -> Result<Option<TransactionDetails>, SisowError> {
        let params = [
            ("transaction", transaction_id),
            ("merchantid", self.config.merchant_id.as_str()),
            ("merchantkey", self.config.merchant_key.as_str()),
        ];

        let response = self.call("GetTransaction", &params).await?;
        if !response.has_result() {
            return Ok(None);
        }
        if let Some(code) = response.result_code() {
            if code != 0 {
                return Err(SisowError::remote(code, transaction_id));
            }
        }

        TransactionDetails::from_response(&response).map(Some)
    }
}

/// Pair the flat alternating name/id sequence of an issuer listing into
/// records, preserving order. A dangling odd entry is dropped.
fn pair_issuers(values: &[&str]) -> Vec<Issuer> {
    if values.len() % 2 != 0 {
        warn!(
            count = values.len(),
            "issuer listing has a dangling entry, ignoring it"
        );
    }
    values
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| Issuer {
            id: pair[1].to_string(),
            name: pair[0].to_string(),
        })
        .collect()
}

fn log_adjustments(adjustments: &[Adjustment]) {
    for adjustment in adjustments {
        warn!(code = adjustment.code.as_str(), "{}", adjustment.message);
    }
}
