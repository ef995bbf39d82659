use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub from: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageId(pub String);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("message construction failed: {0}")]
    Message(String),
    #[error("smtp transport error: {0}")]
    Smtp(String),
    #[error("mail api returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("mail api request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The one contract the dispatcher depends on. No retry policy lives here
/// beyond whatever the underlying client performs on its own.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<MessageId, MailError>;
}

/// Direct SMTP submission over STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    default_from: String,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &SecretString,
        default_from: &str,
    ) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|error| MailError::Smtp(error.to_string()))?
            .port(port);

        if !username.is_empty() {
            builder = builder.credentials(Credentials::new(
                username.to_string(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self { transport: builder.build(), default_from: default_from.to_string() })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<MessageId, MailError> {
        let from = email.from.as_deref().unwrap_or(&self.default_from);
        let message_id = format!("<{}@portico.mailer>", Uuid::new_v4());

        let message = Message::builder()
            .from(parse_mailbox(from)?)
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.as_str())
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|error| MailError::Message(error.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|error| MailError::Smtp(error.to_string()))?;

        Ok(MessageId(message_id))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|error| MailError::Message(format!("invalid address `{address}`: {error}")))
}

#[derive(Debug, Deserialize)]
struct ApiSendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Transactional email over a JSON HTTP API, authenticated with a bearer
/// key. The endpoint contract is `POST {base_url}/messages`.
pub struct HttpApiMailer {
    client: Client,
    base_url: String,
    api_key: SecretString,
    default_from: String,
}

impl HttpApiMailer {
    pub fn new(base_url: &str, api_key: SecretString, default_from: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_from: default_from.to_string(),
        }
    }
}

#[async_trait]
impl MailTransport for HttpApiMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<MessageId, MailError> {
        let from = email.from.as_deref().unwrap_or(&self.default_from);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "from": from,
                "to": email.to,
                "subject": email.subject,
                "html": email.html,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api { status: status.as_u16(), body });
        }

        let parsed: ApiSendResponse = response.json().await.unwrap_or(ApiSendResponse { id: None });
        Ok(MessageId(parsed.id.unwrap_or_else(|| Uuid::new_v4().to_string())))
    }
}

/// Log-only transport for unconfigured environments.
pub struct NoopMailer;

#[async_trait]
impl MailTransport for NoopMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<MessageId, MailError> {
        info!(
            event_name = "mail.noop.send",
            to = %email.to,
            subject = %email.subject,
            "mail transport is noop; message dropped"
        );
        Ok(MessageId(format!("noop-{}", Uuid::new_v4())))
    }
}
