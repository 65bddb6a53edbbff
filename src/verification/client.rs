use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::models::VerificationResponse;
use super::PaymentVerifier;
use crate::error::{ApiError, ApiResult};

/// HTTP client for the payment verification API
pub struct TbkClient {
    base_url: String,
    client: Client,
}

impl TbkClient {
    pub fn new(base_url: String, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl PaymentVerifier for TbkClient {
    async fn verify(&self, external_id: &str, token: &str) -> ApiResult<VerificationResponse> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("aplicacionId", external_id), ("token", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let parsed: VerificationResponse = serde_json::from_slice(&body)?;
        debug!("Verification for {}: {:?}", external_id, parsed.status);
        Ok(parsed)
    }
}
