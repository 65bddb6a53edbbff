// Bounded fixed-delay retry
//
// Both extraction (2 attempts, 2s apart) and verification (2 attempts, 1s
// apart) go through this helper. The delay is constant between attempts and
// is never applied after the final one.

use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Tenant extraction: one retry after two seconds
    pub const fn extraction() -> Self {
        Self::fixed(2, Duration::from_secs(2))
    }

    /// External verification: one retry after one second
    pub const fn verification() -> Self {
        Self::fixed(2, Duration::from_secs(1))
    }

    /// Retry every error until the attempts run out
    pub async fn run<T, E, F, Fut>(&self, label: &str, op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(label, op, |_| true).await
    }

    /// Retry only errors accepted by `is_retryable`; others are returned at once.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        label: &str,
        mut op: F,
        is_retryable: P,
    ) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        "⚠️ {} failed (attempt {}/{}): {}",
                        label, attempt, max_attempts, e
                    );

                    if attempt >= max_attempts || !is_retryable(&e) {
                        return Err(e);
                    }
                }
            }

            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            attempt += 1;
        }
    }
}
