//! Failure notices for the payment probe

use async_trait::async_trait;
use chrono::{DateTime, Local};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::NotifyConfig;
use crate::error::{E2eError, E2eResult};

/// What went wrong in one payment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureNotice {
    pub payment_method: String,
    pub payment_link: String,
    pub error: String,
    pub at: DateTime<Local>,
}

impl FailureNotice {
    pub fn new(payment_method: &str, payment_link: &str, error: &str) -> Self {
        Self {
            payment_method: payment_method.to_string(),
            payment_link: payment_link.to_string(),
            error: error.to_string(),
            at: Local::now(),
        }
    }

    pub fn subject(&self) -> String {
        format!("Payment test failed: {}", self.payment_method)
    }

    pub fn html_body(&self) -> String {
        format!(
            "<h2>Payment test failed</h2>\n\
             <p><strong>Payment method:</strong> {}</p>\n\
             <p><strong>Link:</strong> {}</p>\n\
             <p><strong>Error:</strong> {}</p>\n\
             <p><strong>Date:</strong> {}</p>\n\
             <hr>\n\
             <p>Please check the payment system.</p>\n",
            escape(&self.payment_method),
            escape(&self.payment_link),
            escape(&self.error),
            self.at.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_failure(&self, notice: &FailureNotice) -> E2eResult<()>;
}

/// Mails notices through an SMTP relay with STARTTLS
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpNotifier {
    pub fn from_config(config: &NotifyConfig) -> E2eResult<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| E2eError::Config("SMTP host not set".into()))?;
        let from = config
            .from
            .as_deref()
            .ok_or_else(|| E2eError::Config("notice sender not set".into()))?
            .parse::<Mailbox>()
            .map_err(|e| E2eError::Config(format!("bad sender address: {}", e)))?;
        let to = config
            .to
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .map_err(|e| E2eError::Config(format!("bad recipient {}: {}", addr, e)))
            })
            .collect::<E2eResult<Vec<_>>>()?;
        if to.is_empty() {
            return Err(E2eError::Config("no notice recipients".into()));
        }

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| E2eError::Notify(e.to_string()))?
            .port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn message(&self, notice: &FailureNotice) -> E2eResult<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(notice.subject())
            .header(ContentType::TEXT_HTML);
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        builder
            .body(notice.html_body())
            .map_err(|e| E2eError::Notify(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_failure(&self, notice: &FailureNotice) -> E2eResult<()> {
        let message = self.message(notice)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| E2eError::Notify(e.to_string()))?;
        info!("Failure notice sent to {} recipient(s)", self.to.len());
        Ok(())
    }
}

/// Writes notices to the log; used when no relay is configured
#[derive(Debug, Default)]
pub struct LogNotifier {
    sent: Mutex<Vec<FailureNotice>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<FailureNotice> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_failure(&self, notice: &FailureNotice) -> E2eResult<()> {
        warn!(
            "{} ({}): {}",
            notice.subject(),
            notice.payment_link,
            notice.error
        );
        self.sent.lock().push(notice.clone());
        Ok(())
    }
}

/// SMTP when the relay is configured, the log otherwise
pub fn from_config(config: &NotifyConfig) -> E2eResult<Box<dyn Notifier>> {
    if config.is_configured() {
        Ok(Box::new(SmtpNotifier::from_config(config)?))
    } else {
        info!("SMTP not configured, failure notices go to the log");
        Ok(Box::new(LogNotifier::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_carries_details() {
        let notice = FailureNotice::new("ideal", "https://pay.example/x?a=1&b=2", "Invoice page not loaded");
        let body = notice.html_body();
        assert!(body.contains("ideal"));
        assert!(body.contains("a=1&amp;b=2"));
        assert!(body.contains("Invoice page not loaded"));
        assert_eq!(notice.subject(), "Payment test failed: ideal");
    }

    #[test]
    fn test_error_text_escaped() {
        let notice = FailureNotice::new("credit_card", "l", "<script>");
        assert!(notice.html_body().contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_smtp_message_builds() {
        let config = NotifyConfig {
            smtp_host: Some("smtp.example.org".into()),
            from: Some("Payment Probe <probe@example.org>".into()),
            to: vec!["ops@example.org".into()],
            ..Default::default()
        };
        let notifier = SmtpNotifier::from_config(&config).unwrap();
        let message = notifier
            .message(&FailureNotice::new("ideal", "link", "boom"))
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Payment test failed: ideal"));
        assert!(raw.contains("To: ops@example.org"));
    }

    #[test]
    fn test_unconfigured_falls_back() {
        assert!(SmtpNotifier::from_config(&NotifyConfig::default()).is_err());
        assert!(from_config(&NotifyConfig::default()).is_ok());
    }
}
