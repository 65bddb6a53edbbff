use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::Notifier;
use crate::config::MailConfig;
use crate::error::NotifyResult;

/// Delivers plain-text mail through an authenticated STARTTLS relay
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> NotifyResult<Self> {
        let from: Mailbox = config.user.parse()?;
        let to: Mailbox = config.receiver.parse()?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> NotifyResult<()> {
        let message = compose(&self.from, &self.to, subject, body)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn compose(from: &Mailbox, to: &Mailbox, subject: &str, body: &str) -> NotifyResult<Message> {
    let message = Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use std::time::Duration;

    fn mail_config(user: &str) -> MailConfig {
        MailConfig {
            server: "smtp.example.com".to_string(),
            port: 587,
            user: user.to_string(),
            password: "secret".to_string(),
            receiver: "ops@example.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let err = SmtpNotifier::new(&mail_config("not-an-address")).err().unwrap();
        assert!(matches!(err, NotifyError::Address(_)));
    }

    #[test]
    fn test_compose_plain_text_message() {
        let from: Mailbox = "robot@example.com".parse().unwrap();
        let to: Mailbox = "ops@example.com".parse().unwrap();

        let message = compose(&from, &to, "Reporte Proceso", "- Total procesados: 0").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: robot@example.com"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Subject: Reporte Proceso"));
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(raw.contains("- Total procesados: 0"));
    }
}
