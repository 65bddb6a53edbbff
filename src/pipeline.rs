// Reconciliation run: extract -> verify -> report
//
// Fatal conditions travel back as `FatalError` values; `conclude` is the only
// place that turns an outcome into a notification and an exit status.

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::FatalError;
use crate::extraction::{MultiSourceExtractor, PendingSource, TenantDatabase};
use crate::notify::{self, Notifier};
use crate::report::{RunContext, RunReport};
use crate::retry::RetryPolicy;
use crate::verification::{PaymentVerifier, VerificationRunner};

pub struct Reconciler {
    extractor: MultiSourceExtractor,
    verification: VerificationRunner,
    tenants: Vec<TenantDatabase>,
    max_failures: u32,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn PendingSource>,
        verifier: Arc<dyn PaymentVerifier>,
        tenants: Vec<TenantDatabase>,
        max_failures: u32,
    ) -> Self {
        Self {
            extractor: MultiSourceExtractor::new(source, RetryPolicy::extraction()),
            verification: VerificationRunner::new(verifier, RetryPolicy::verification()),
            tenants,
            max_failures,
        }
    }

    pub fn with_retry_policies(
        mut self,
        extraction: RetryPolicy,
        verification: RetryPolicy,
    ) -> Self {
        self.extractor = self.extractor.with_policy(extraction);
        self.verification = self.verification.with_policy(verification);
        self
    }

    pub async fn run(&self) -> Result<RunReport, FatalError> {
        info!("🔎 Extracting pending records from {} databases", self.tenants.len());
        let records = self.extractor.extract(&self.tenants).await?;

        info!("📋 {} pending records found, querying verification API", records.len());
        let mut ctx = RunContext::new(self.max_failures);
        ctx.set_total_records(records.len());
        self.verification.verify_all(&records, &mut ctx).await?;

        let report = ctx.into_report();
        info!(
            "✓ Verification finished: {} authorized, {} persistent failures",
            report.attention.len(),
            report.soft_errors.len()
        );
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Aborted,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Completed => ExitCode::SUCCESS,
            RunStatus::Aborted => ExitCode::from(1),
        }
    }
}

/// Sends exactly one notification for the run: the summary when it completed,
/// a critical alert when it aborted.
pub async fn conclude(
    notifier: &dyn Notifier,
    outcome: Result<RunReport, FatalError>,
) -> RunStatus {
    match outcome {
        Ok(report) => {
            notify::run_summary(notifier, &report.render_summary()).await;
            info!("✅ Run finished successfully");
            RunStatus::Completed
        }
        Err(fatal) => {
            error!("🛑 Run aborted: {:?}", fatal);
            notify::critical_alert(notifier, &fatal.to_string()).await;
            RunStatus::Aborted
        }
    }
}
