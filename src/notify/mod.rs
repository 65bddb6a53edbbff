// Operator notifications
//
// Two kinds of mail leave this process: a critical alert when the run aborts
// and a summary when it completes. Delivery problems are logged and swallowed
// so they never change how the run ends.

pub mod smtp;

pub use smtp::SmtpNotifier;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::NotifyResult;

pub const CRITICAL_SUBJECT: &str = "FALLO CRÍTICO SCRIPT";
pub const SUMMARY_SUBJECT: &str = "Reporte Proceso";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> NotifyResult<()>;
}

/// Sends a message, logging instead of failing when delivery does not work
pub async fn deliver(notifier: &dyn Notifier, subject: &str, body: &str) {
    match notifier.send(subject, body).await {
        Ok(()) => info!("📧 Email \"{}\" sent", subject),
        Err(e) => error!("❌ Could not send email \"{}\": {}", subject, e),
    }
}

pub async fn critical_alert(notifier: &dyn Notifier, message: &str) {
    error!("🚨 {}", message);
    deliver(notifier, CRITICAL_SUBJECT, message).await;
}

pub async fn run_summary(notifier: &dyn Notifier, body: &str) {
    deliver(notifier, SUMMARY_SUBJECT, body).await;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::NotifyError;
    use std::sync::Mutex;

    /// Records every message; optionally fails each send after recording it
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn subjects(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(subject, _)| subject.clone())
                .collect()
        }

        pub fn bodies(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(_, body)| body.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, subject: &str, body: &str) -> NotifyResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string()));

            if self.fail {
                let address_error = "not an address"
                    .parse::<lettre::Address>()
                    .unwrap_err();
                return Err(NotifyError::Address(address_error));
            }
            Ok(())
        }
    }
}
