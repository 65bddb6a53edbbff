// External verification of pending records under a global failure budget
pub mod client;
pub mod models;

pub use client::TbkClient;
pub use models::{AttentionRecord, SoftFailure, VerificationOutcome, VerificationResponse};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{ApiResult, FatalError};
use crate::extraction::PendingRecord;
use crate::report::RunContext;
use crate::retry::RetryPolicy;

/// Anything that can ask the payment provider about one payment
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(&self, external_id: &str, token: &str) -> ApiResult<VerificationResponse>;
}

pub struct VerificationRunner {
    verifier: Arc<dyn PaymentVerifier>,
    policy: RetryPolicy,
}

impl VerificationRunner {
    pub fn new(verifier: Arc<dyn PaymentVerifier>, policy: RetryPolicy) -> Self {
        Self { verifier, policy }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Verifies records in order, recording each outcome in `ctx`.
    ///
    /// The failure ceiling is checked before every record, so the run stops
    /// without issuing another call once the budget is spent.
    pub async fn verify_all(
        &self,
        records: &[PendingRecord],
        ctx: &mut RunContext,
    ) -> Result<(), FatalError> {
        for record in records {
            if ctx.ceiling_reached() {
                error!(
                    "🛑 {} verification failures reached, stopping before record {}",
                    ctx.hard_failures(),
                    record.id
                );
                return Err(FatalError::FailureCeiling {
                    max_failures: ctx.max_failures(),
                });
            }

            let outcome = self.verify_one(record).await;
            ctx.record(outcome);
        }

        Ok(())
    }

    pub async fn verify_one(&self, record: &PendingRecord) -> VerificationOutcome {
        let token = record.verification_token();
        let label = format!("Verification of record {}", record.id);

        let response = self
            .policy
            .run(&label, |_| self.verifier.verify(&record.external_id, token))
            .await;

        match response {
            Ok(response) if response.is_authorized() => {
                info!(
                    "💰 Paid record ID {} | DB: {} | CLIENTE: {}",
                    record.id, record.source, record.client
                );
                VerificationOutcome::Authorized(AttentionRecord::from(record))
            }
            Ok(_) => VerificationOutcome::NotAuthorized,
            Err(e) => {
                error!(
                    "❌ Persistent API failure for record {} ({}): {}",
                    record.id, record.source, e
                );
                VerificationOutcome::Failed(SoftFailure::from(record))
            }
        }
    }
}
