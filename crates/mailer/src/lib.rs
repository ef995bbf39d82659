//! Notification stack for configuration submissions.
//!
//! Renders the customer confirmation and admin alert emails from embedded
//! Tera templates and hands them to an outbound transport (direct SMTP, a
//! JSON transactional API, or a log-only noop). Delivery is strictly
//! best-effort: nothing in this crate can fail a submission.

pub mod dispatcher;
pub mod render;
pub mod transport;

pub use dispatcher::{NotificationDispatcher, NotificationStatus, SubmissionNotifier};
pub use render::{ConfigurationView, EmailRenderer, RenderError, PLACEHOLDER};
pub use transport::{
    HttpApiMailer, MailError, MailTransport, MessageId, NoopMailer, OutboundEmail, SmtpMailer,
};
