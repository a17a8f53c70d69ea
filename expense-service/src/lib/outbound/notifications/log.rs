use async_trait::async_trait;

use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::ports::Notifier;
use crate::identity::errors::NotificationError;

/// Notifier used in development when no SMTP relay is configured.
///
/// Records that a message would have been sent. The body is never logged:
/// it may carry a live reset token.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            recipient = %recipient,
            subject = %subject,
            body_bytes = html_body.len(),
            "Mail delivery disabled, message not sent"
        );
        Ok(())
    }
}
