//! Checkout-session creation against the external payment provider.
//!
//! The provider is a black box reachable over HTTP; all this side needs back
//! is an opaque checkout reference. When no provider is configured the
//! gateway generates local references so the rest of the payment flow still
//! works end to end.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug)]
pub struct CheckoutError(pub String);

impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checkout session creation failed: {}", self.0)
    }
}

#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Create a checkout session for one payment attempt and return its
    /// opaque reference.
    async fn create_checkout(
        &self,
        payment_id: &str,
        amount: f64,
        currency: &str,
    ) -> Result<String, CheckoutError>;
}

#[derive(Deserialize)]
struct CheckoutSessionResponse {
    checkout_id: String,
}

/// HTTP-backed provider: POSTs the payment to the configured checkout API.
pub struct HttpCheckoutProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCheckoutProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build checkout HTTP client");
        HttpCheckoutProvider {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl CheckoutProvider for HttpCheckoutProvider {
    async fn create_checkout(
        &self,
        payment_id: &str,
        amount: f64,
        currency: &str,
    ) -> Result<String, CheckoutError> {
        let url = format!("{}/checkouts", self.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&serde_json::json!({
            "payment_id": payment_id,
            "amount": amount,
            "currency": currency,
        }));
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CheckoutError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CheckoutError(format!("provider returned {}", status)));
        }

        let session: CheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| CheckoutError(e.to_string()))?;
        Ok(session.checkout_id)
    }
}

/// Fallback when no provider is configured: generates an opaque local
/// reference in the provider's `checkout_<hex>` shape.
pub struct LocalCheckoutProvider;

#[async_trait]
impl CheckoutProvider for LocalCheckoutProvider {
    async fn create_checkout(
        &self,
        _payment_id: &str,
        _amount: f64,
        _currency: &str,
    ) -> Result<String, CheckoutError> {
        let hex = Uuid::new_v4().simple().to_string();
        Ok(format!("checkout_{}", &hex[..8]))
    }
}

pub fn provider_from_config(config: &Config) -> Arc<dyn CheckoutProvider> {
    match &config.checkout_api_url {
        Some(url) => {
            log::info!("Using HTTP checkout provider at {}", url);
            Arc::new(HttpCheckoutProvider::new(
                url.clone(),
                config.checkout_api_key.clone(),
            ))
        }
        None => {
            log::warn!("No checkout provider configured - generating local checkout references");
            Arc::new(LocalCheckoutProvider)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_provider_reference_shape() {
        let provider = LocalCheckoutProvider;
        let a = provider.create_checkout("p1", 1.0, "USD").await.unwrap();
        let b = provider.create_checkout("p2", 1.0, "USD").await.unwrap();
        assert!(a.starts_with("checkout_"));
        assert_eq!(a.len(), "checkout_".len() + 8);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_http_provider_unreachable_is_error() {
        let provider = HttpCheckoutProvider::new("http://127.0.0.1:1".to_string(), None);
        let err = provider.create_checkout("p1", 1.0, "USD").await.unwrap_err();
        assert!(!err.0.is_empty());
    }
}
