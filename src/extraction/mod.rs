// Multi-source extraction of pending payment attempts
pub mod models;
pub mod repository;

pub use models::{PendingRecord, TenantDatabase};
pub use repository::MySqlPendingSource;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{DatabaseError, DbResult, FatalError};
use crate::retry::RetryPolicy;

/// Anything that can list the pending attempts of one tenant
#[async_trait]
pub trait PendingSource: Send + Sync {
    async fn fetch_pending(&self, database: &TenantDatabase) -> DbResult<Vec<PendingRecord>>;
}

/// Walks the tenant list in order and fails fast on the first unreachable one
pub struct MultiSourceExtractor {
    source: Arc<dyn PendingSource>,
    policy: RetryPolicy,
}

impl MultiSourceExtractor {
    pub fn new(source: Arc<dyn PendingSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn extract(
        &self,
        tenants: &[TenantDatabase],
    ) -> Result<Vec<PendingRecord>, FatalError> {
        let mut records = Vec::new();

        for database in tenants {
            let label = format!("Extraction from {}", database);
            let fetched = self
                .policy
                .run_if(
                    &label,
                    |_| self.source.fetch_pending(database),
                    DatabaseError::is_transient,
                )
                .await;

            match fetched {
                Ok(rows) => {
                    info!("📥 {} pending records from {}", rows.len(), database);
                    records.extend(rows);
                }
                Err(source) => {
                    error!("❌ Database {} unreachable after retries: {}", database, source);
                    return Err(FatalError::SourceUnreachable {
                        database: database.clone(),
                        source,
                    });
                }
            }
        }

        Ok(records)
    }
}
