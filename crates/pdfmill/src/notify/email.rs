//! SMTP delivery for job outcome notifications.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

use crate::config::SmtpConfig;

use super::{compose_body, compose_subject, JobOutcome, Notifier};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

/// Sends plain-text outcome emails through a configured SMTP relay.
pub struct EmailNotifier {
    config: SmtpConfig,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn send(&self, to_address: &str, outcome: &JobOutcome) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_address.parse()?)
            .subject(compose_subject(outcome))
            .header(ContentType::TEXT_PLAIN)
            .body(compose_body(outcome))
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let mut builder =
            SmtpTransport::builder_dangerous(&self.config.host).port(self.config.port);
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        builder.build().send(&email)?;
        Ok(())
    }
}

impl Notifier for EmailNotifier {
    fn notify(&self, target: &str, outcome: &JobOutcome) {
        match self.send(target, outcome) {
            Ok(()) => info!(job_id = outcome.job_id(), "notification email sent"),
            Err(e) => warn!(
                job_id = outcome.job_id(),
                error = %e,
                "notification email delivery failed"
            ),
        }
    }
}
