use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, error, instrument};

/// Chat transport used to deliver verdict messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier").finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot: Bot::new(bot_token),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        self.bot
            .send_message(recipient(chat_id), text.to_string())
            .await?;
        Ok(())
    }
}

/// Numeric ids address a chat directly, anything else is a channel username.
pub fn recipient(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.to_string()),
    }
}

/// Deliver `message`, logging the outcome. Transport failures stay here:
/// the return value only reports whether the message went out.
#[instrument(skip_all, fields(chat_id = %chat_id))]
pub async fn send_message(notifier: &dyn Notifier, chat_id: &str, message: &str) -> bool {
    debug!("sending message to telegram");
    match notifier.send_message(chat_id, message).await {
        Ok(()) => {
            debug!(text = message, "message sent to telegram");
            true
        }
        Err(err) => {
            error!(?err, "failed to send message to telegram");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send_message(&self, _chat_id: &str, _text: &str) -> Result<()> {
            Err(anyhow!("telegram is down"))
        }
    }

    struct OkNotifier;

    #[async_trait]
    impl Notifier for OkNotifier {
        async fn send_message(&self, _chat_id: &str, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn recipient_parsing() {
        assert_eq!(recipient("123456789"), Recipient::Id(ChatId(123456789)));
        assert_eq!(recipient("-1001234"), Recipient::Id(ChatId(-1001234)));
        assert_eq!(
            recipient("@reviews"),
            Recipient::ChannelUsername("@reviews".into())
        );
    }

    #[tokio::test]
    async fn send_failure_is_contained() {
        assert!(!send_message(&FailingNotifier, "1", "hello").await);
        assert!(send_message(&OkNotifier, "1", "hello").await);
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn sent_text_is_logged_as_its_own_field() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        assert!(send_message(&OkNotifier, "1", "VERDICT").await);

        let out = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("message sent to telegram text=\"VERDICT\""), "{out}");
        assert!(!out.contains("message sent to telegram VERDICT"), "{out}");
    }
}
