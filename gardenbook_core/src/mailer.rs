//! Outgoing mail.
//!
//! Services never talk to a transport directly. They push a [`MailMessage`]
//! onto a [`MailQueue`]; a background task started by [`spawn_mail_worker`]
//! hands each message to a [`MailTransport`]. Delivery is fire and forget:
//! failures are logged and dropped.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{entity::user, html::escape};

pub const WELCOME_SUBJECT: &str = "Welcome to GardenBook!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl MailMessage {
    /// Every message carries a text and an HTML part.
    pub fn content_type(&self) -> &'static str {
        "multipart/alternative"
    }
}

/// Sender address and public URL baked into outgoing mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub from: String,
    pub site_url: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from: "from@example.com".to_string(),
            site_url: "http://localhost:3000/".to_string(),
        }
    }
}

pub fn welcome_email(user: &user::Model, settings: &MailSettings) -> MailMessage {
    let text_body = format!(
        "Welcome to GardenBook, {name}!\n\
         \n\
         We're thrilled to have you join our community of gardening enthusiasts.\n\
         \n\
         Here's what you can do:\n\
         - Share your gardening journey with photos and updates\n\
         - Connect with fellow gardeners and make friends\n\
         - Like and comment on posts from your garden friends\n\
         \n\
         Visit GardenBook: {url}\n\
         \n\
         Happy gardening!\n",
        name = user.name,
        url = settings.site_url,
    );

    let html_body = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><meta content=\"text/html; charset=UTF-8\" http-equiv=\"Content-Type\" /></head>\n\
         <body>\n\
         <h1>Welcome to GardenBook, {name}!</h1>\n\
         <p>We&#39;re thrilled to have you join our community of gardening enthusiasts.</p>\n\
         <ul>\n\
         <li>Share your gardening journey with photos and updates</li>\n\
         <li>Connect with fellow gardeners and make friends</li>\n\
         <li>Like and comment on posts from your garden friends</li>\n\
         </ul>\n\
         <p><a href=\"{url}\">Visit GardenBook</a></p>\n\
         <p>Happy gardening!</p>\n\
         </body>\n\
         </html>\n",
        name = escape(&user.name),
        url = escape(&settings.site_url),
    );

    MailMessage {
        to: user.email.clone(),
        from: settings.from.clone(),
        subject: WELCOME_SUBJECT.to_string(),
        text_body,
        html_body,
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Writes each message to the log instead of sending it anywhere.
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, message: &MailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, "delivering mail");
        debug!(body = %message.text_body, "mail text part");
        Ok(())
    }
}

/// Keeps every delivered message; handy in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    delivered: Arc<Mutex<Vec<MailMessage>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<MailMessage> {
        match self.delivered.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn deliver(&self, message: &MailMessage) -> Result<(), MailError> {
        let mut guard = self
            .delivered
            .lock()
            .map_err(|_| MailError::Transport("memory transport poisoned".to_string()))?;
        guard.push(message.clone());
        Ok(())
    }
}

/// Clonable producer side of the mail queue.
#[derive(Debug, Clone)]
pub struct MailQueue {
    sender: mpsc::UnboundedSender<MailMessage>,
    settings: MailSettings,
}

/// Consumer side of the mail queue, owned by the worker (or by a test).
#[derive(Debug)]
pub struct MailReceiver {
    receiver: mpsc::UnboundedReceiver<MailMessage>,
}

impl MailQueue {
    pub fn new(settings: MailSettings) -> (MailQueue, MailReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (MailQueue { sender, settings }, MailReceiver { receiver })
    }

    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    /// Never blocks and never fails the caller.
    pub fn enqueue(&self, message: MailMessage) {
        let to = message.to.clone();
        if self.sender.send(message).is_err() {
            warn!(%to, "mail queue is closed, dropping message");
        }
    }

    pub fn enqueue_welcome(&self, user: &user::Model) {
        self.enqueue(welcome_email(user, &self.settings));
    }
}

impl MailReceiver {
    pub async fn recv(&mut self) -> Option<MailMessage> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<MailMessage> {
        self.receiver.try_recv().ok()
    }

    /// Everything queued right now, without waiting.
    pub fn drain_pending(&mut self) -> Vec<MailMessage> {
        let mut messages = Vec::new();
        while let Some(message) = self.try_recv() {
            messages.push(message);
        }
        messages
    }
}

/// Runs until every [`MailQueue`] handle is dropped.
pub fn spawn_mail_worker(
    mut receiver: MailReceiver,
    transport: Arc<dyn MailTransport>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            if let Err(error) = transport.deliver(&message).await {
                warn!(to = %message.to, %error, "mail delivery failed");
            }
        }
        debug!("mail worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::UserId;

    fn gardener(name: &str) -> user::Model {
        user::Model {
            id: UserId::new(),
            name: name.to_string(),
            email: "rose@example.com".to_string(),
            password_hash: String::new(),
            avatar: None,
            avatar_content_type: None,
            created_at: chrono::Utc::now(),
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl MailTransport for FailingTransport {
        async fn deliver(&self, _message: &MailMessage) -> Result<(), MailError> {
            Err(MailError::Transport("smtp down".to_string()))
        }
    }

    #[test]
    fn test_welcome_email_headers() {
        let mail = welcome_email(&gardener("Rose"), &MailSettings::default());
        assert_eq!(mail.subject, "Welcome to GardenBook!");
        assert_eq!(mail.to, "rose@example.com");
        assert_eq!(mail.from, "from@example.com");
        assert_eq!(mail.content_type(), "multipart/alternative");
    }

    #[test]
    fn test_welcome_email_bodies() {
        let settings = MailSettings {
            from: "garden@example.org".to_string(),
            site_url: "https://gardenbook.example/".to_string(),
        };
        let mail = welcome_email(&gardener("Rose"), &settings);

        for body in [&mail.text_body, &mail.html_body] {
            assert!(body.contains("Welcome to GardenBook, Rose!"));
            assert!(body.contains("gardening enthusiasts"));
            assert!(body.contains("Share your gardening journey"));
            assert!(body.contains("Connect with fellow gardeners"));
            assert!(body.contains("Visit GardenBook"));
            assert!(body.contains("https://gardenbook.example/"));
        }
        assert_eq!(mail.from, "garden@example.org");
    }

    #[test]
    fn test_welcome_email_escapes_html() {
        let mail = welcome_email(&gardener("O'Hara <b>"), &MailSettings::default());
        assert!(mail.html_body.contains("Welcome to GardenBook, O&#39;Hara &lt;b&gt;!"));
        assert!(mail.text_body.contains("Welcome to GardenBook, O'Hara <b>!"));
    }

    #[tokio::test]
    async fn test_worker_delivers_queued_mail() {
        let (queue, receiver) = MailQueue::new(MailSettings::default());
        let transport = MemoryTransport::new();
        let worker = spawn_mail_worker(receiver, Arc::new(transport.clone()));

        queue.enqueue_welcome(&gardener("Rose"));
        queue.enqueue_welcome(&gardener("Ivy"));
        drop(queue);
        worker.await.unwrap();

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 2);
        assert!(delivered[1].text_body.contains("Ivy"));
    }

    #[tokio::test]
    async fn test_worker_survives_transport_failures() {
        let (queue, receiver) = MailQueue::new(MailSettings::default());
        let worker = spawn_mail_worker(receiver, Arc::new(FailingTransport));

        queue.enqueue_welcome(&gardener("Rose"));
        drop(queue);

        // The worker logs the failure and exits normally once the queue closes
        worker.await.expect("worker should not panic");
    }

    #[test]
    fn test_enqueue_on_closed_queue_is_silent() {
        let (queue, receiver) = MailQueue::new(MailSettings::default());
        drop(receiver);
        queue.enqueue_welcome(&gardener("Rose"));
    }
}
