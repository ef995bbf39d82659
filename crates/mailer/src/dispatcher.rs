use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::render::{ConfigurationView, EmailRenderer, RenderError};
use crate::transport::{MailTransport, OutboundEmail};

/// Auxiliary delivery feedback. Never feeds back into the submission
/// outcome; partial failures are visible in logs only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NotificationStatus {
    pub customer_sent: bool,
    pub admin_sent: bool,
}

impl NotificationStatus {
    pub fn all_sent(&self) -> bool {
        self.customer_sent && self.admin_sent
    }
}

/// Seam between the submission pipeline and the mail stack. Implementations
/// must be infallible: every render or transport failure is caught at its
/// origin and reported through the returned status.
#[async_trait]
pub trait SubmissionNotifier: Send + Sync {
    async fn notify_submission(&self, view: &ConfigurationView) -> NotificationStatus;
}

/// Renders the customer confirmation and the admin alert from the same view
/// and hands both to the configured transport. The two sends are independent
/// and unordered, so they run concurrently.
pub struct NotificationDispatcher {
    renderer: EmailRenderer,
    transport: Arc<dyn MailTransport>,
    from_address: String,
    admin_address: String,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        from_address: &str,
        admin_address: &str,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            renderer: EmailRenderer::new()?,
            transport,
            from_address: from_address.to_string(),
            admin_address: admin_address.to_string(),
        })
    }

    async fn send_customer_confirmation(&self, view: &ConfigurationView) -> bool {
        let html = match self.renderer.render_customer_confirmation(view) {
            Ok(html) => html,
            Err(error) => {
                warn!(
                    event_name = "notification.customer.render_failed",
                    configuration_id = %view.configuration_id,
                    error = %error,
                    "customer confirmation could not be rendered"
                );
                return false;
            }
        };

        let email = OutboundEmail {
            to: view.customer_email.clone(),
            subject: format!("We received your {} configuration", view.product_line),
            html,
            from: Some(self.from_address.clone()),
        };

        self.deliver("notification.customer", view, email).await
    }

    async fn send_admin_alert(&self, view: &ConfigurationView) -> bool {
        let html = match self.renderer.render_admin_alert(view) {
            Ok(html) => html,
            Err(error) => {
                warn!(
                    event_name = "notification.admin.render_failed",
                    configuration_id = %view.configuration_id,
                    error = %error,
                    "admin alert could not be rendered"
                );
                return false;
            }
        };

        let email = OutboundEmail {
            to: self.admin_address.clone(),
            subject: format!(
                "New {} lead from {} ({})",
                view.product_line, view.customer_name, view.configuration_id
            ),
            html,
            from: Some(self.from_address.clone()),
        };

        self.deliver("notification.admin", view, email).await
    }

    async fn deliver(&self, leg: &'static str, view: &ConfigurationView, email: OutboundEmail) -> bool {
        match self.transport.send(&email).await {
            Ok(message_id) => {
                info!(
                    event_name = %format!("{leg}.sent"),
                    configuration_id = %view.configuration_id,
                    to = %email.to,
                    message_id = %message_id.0,
                    "notification email sent"
                );
                true
            }
            Err(error) => {
                warn!(
                    event_name = %format!("{leg}.send_failed"),
                    configuration_id = %view.configuration_id,
                    to = %email.to,
                    error = %error,
                    "notification email failed; submission outcome is unaffected"
                );
                false
            }
        }
    }
}

#[async_trait]
impl SubmissionNotifier for NotificationDispatcher {
    async fn notify_submission(&self, view: &ConfigurationView) -> NotificationStatus {
        let (customer_sent, admin_sent) =
            tokio::join!(self.send_customer_confirmation(view), self.send_admin_alert(view));

        NotificationStatus { customer_sent, admin_sent }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::{NotificationDispatcher, SubmissionNotifier};
    use crate::render::ConfigurationView;
    use crate::transport::{MailError, MailTransport, MessageId, OutboundEmail};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundEmail>>,
        failing: bool,
    }

    impl RecordingTransport {
        fn failing() -> Self {
            Self { sent: Mutex::new(Vec::new()), failing: true }
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, email: &OutboundEmail) -> Result<MessageId, MailError> {
            if self.failing {
                return Err(MailError::Smtp("connection refused".to_string()));
            }
            self.sent.lock().await.push(email.clone());
            Ok(MessageId(Uuid::new_v4().to_string()))
        }
    }

    fn view() -> ConfigurationView {
        ConfigurationView {
            configuration_id: "cfg-777".to_string(),
            product_line: "steel".to_string(),
            structure_type: "Freestanding carport".to_string(),
            model: "Linea".to_string(),
            coverage: "Insulated panel".to_string(),
            color: "Anthracite Grey RAL 7016".to_string(),
            surface: "Concrete slab".to_string(),
            package: "N/A".to_string(),
            width_cm: Decimal::from(300),
            depth_cm: Decimal::from(500),
            height_cm: Decimal::from(230),
            area_m2: Decimal::from(15),
            total_price: Decimal::new(612_000, 2),
            customer_name: "Jon Pichler".to_string(),
            customer_email: "jon@example.com".to_string(),
            customer_phone: "+39 329 4445556".to_string(),
            customer_address: "Via Portici 30".to_string(),
            customer_city: "Merano".to_string(),
            customer_postal_code: "39012".to_string(),
            contact_preference: "phone".to_string(),
            notes: None,
            submitted_at: "2026-08-05T10:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn both_recipients_get_one_email_each() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = NotificationDispatcher::new(
            transport.clone(),
            "noreply@portico.example",
            "sales@portico.example",
        )
        .expect("dispatcher");

        let status = dispatcher.notify_submission(&view()).await;

        assert!(status.all_sent());
        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 2);

        let recipients: Vec<&str> = sent.iter().map(|email| email.to.as_str()).collect();
        assert!(recipients.contains(&"jon@example.com"));
        assert!(recipients.contains(&"sales@portico.example"));
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed_and_reported_as_unsent() {
        let dispatcher = NotificationDispatcher::new(
            Arc::new(RecordingTransport::failing()),
            "noreply@portico.example",
            "sales@portico.example",
        )
        .expect("dispatcher");

        let status = dispatcher.notify_submission(&view()).await;

        assert!(!status.customer_sent);
        assert!(!status.admin_sent);
        assert!(!status.all_sent());
    }
}
