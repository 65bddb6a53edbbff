mod bootstrap;
mod config;
mod error;
mod extraction;
mod notify;
mod pipeline;
mod report;
mod retry;
mod verification;

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::Config;
use crate::error::FatalError;
use crate::extraction::MySqlPendingSource;
use crate::notify::SmtpNotifier;
use crate::pipeline::{Reconciler, RunStatus};
use crate::report::RunReport;
use crate::verification::TbkClient;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,reconciler=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting payment intent reconciliation");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {}", e);
            return RunStatus::Aborted.into();
        }
    };

    let notifier = match SmtpNotifier::new(&config.mail) {
        Ok(notifier) => notifier,
        Err(e) => {
            error!("❌ Mail transport unavailable, no alerts can be sent: {}", e);
            return RunStatus::Aborted.into();
        }
    };

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);

    let outcome = reconcile(&config).instrument(span.clone()).await;
    let status = pipeline::conclude(&notifier, outcome)
        .instrument(span)
        .await;

    status.into()
}

/// Pool setup plus the reconciliation itself; every failure is a `FatalError`
async fn reconcile(config: &Config) -> Result<RunReport, FatalError> {
    let pool = bootstrap::initialize_pool(&config.database)
        .await
        .map_err(FatalError::PoolInit)?;

    let verifier = TbkClient::new(config.api.base_url.clone(), config.api.timeout)
        .map_err(FatalError::ClientInit)?;

    Reconciler::new(
        Arc::new(MySqlPendingSource::new(pool)),
        Arc::new(verifier),
        config.database.tenants.clone(),
        config.api.max_failures,
    )
    .with_retry_policies(config.extraction_retry, config.verification_retry)
    .run()
    .await
}
