use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::ports::Notifier;
use crate::identity::errors::NotificationError;

/// SMTP credentials for an authenticated relay.
#[derive(Debug, Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

/// Delivers HTML mail through an SMTP relay over TLS.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// # Arguments
    /// * `relay` - Relay host name, e.g. `smtp.gmail.com`
    /// * `credentials` - Optional login for the relay
    /// * `from` - Sender mailbox, e.g. `Expense Tracker <no-reply@example.com>`
    pub fn new(
        relay: &str,
        credentials: Option<SmtpCredentials>,
        from: &str,
    ) -> Result<Self, NotificationError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidMessage(format!("sender {}: {}", from, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
            .map_err(|e| NotificationError::DeliveryFailed(e.to_string()))?;
        if let Some(credentials) = credentials {
            builder = builder.credentials(Credentials::new(
                credentials.username,
                credentials.password,
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_body: &str,
    ) -> Result<Message, NotificationError> {
        let to = recipient
            .as_str()
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidMessage(e.to_string()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| NotificationError::InvalidMessage(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotificationError> {
        let message = self.build_message(recipient, subject, html_body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::DeliveryFailed(e.to_string()))?;

        tracing::info!(recipient = %recipient, subject = %subject, "Email sent");
        Ok(())
    }
}
