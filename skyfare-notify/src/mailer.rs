//! Outbound email transport. `SmtpMailer` sends real mail; `ConsoleMailer`
//! logs instead (development), `RecordingMailer` captures messages (tests).

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
    pub attachment: Option<EmailAttachment>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid message: {0}")]
    Message(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// SMTP transport over rustls.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from_email: String,
    ) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();
        Ok(Self {
            transport,
            from_email,
        })
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, MailError> {
        let from: Mailbox = self
            .from_email
            .parse()
            .map_err(|_| MailError::Message(format!("invalid from address {}", self.from_email)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::Message(format!("invalid recipient {}", email.to)))?;

        let builder = Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone());

        let body = match &email.html_body {
            Some(html) => {
                MultiPart::alternative_plain_html(email.text_body.clone(), html.clone())
            }
            None => MultiPart::mixed().singlepart(
                lettre::message::SinglePart::plain(email.text_body.clone()),
            ),
        };

        let body = match &email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|_| {
                    MailError::Message(format!(
                        "invalid attachment content type {}",
                        attachment.content_type
                    ))
                })?;
                MultiPart::mixed().multipart(body).singlepart(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.bytes.clone(), content_type),
                )
            }
            None => body,
        };

        builder
            .multipart(body)
            .map_err(|e| MailError::Message(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let message = self.build_message(&email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Logs outbound mail instead of sending it.
#[derive(Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            attachment = email.attachment.as_ref().map(|a| a.filename.as_str()),
            "email (console transport):\n{}",
            email.text_body
        );
        Ok(())
    }
}

/// Captures sent messages; can be switched to fail every send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: std::sync::atomic::AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(MailError::Transport("recording mailer set to fail".into()));
        }
        self.sent.lock().await.push(email);
        Ok(())
    }
}
