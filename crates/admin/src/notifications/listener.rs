//! WebSocket listener that feeds [`NotificationFeed`].

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;

use super::{NotificationFeed, NotificationPayload, parse_frame};
use crate::config::NotificationsConfig;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Why a socket session ended.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid socket request: {0}")]
    Request(String),
    #[error("WebSocket error: {0}")]
    Socket(#[from] Box<tokio_tungstenite::tungstenite::Error>),
}

/// Run the listener in the background until the process exits.
///
/// The socket is reopened after every disconnect, waiting 1s, 2s, 4s ...
/// up to a minute between attempts; a session that delivered at least one
/// notification resets the wait.
pub fn spawn_listener(config: NotificationsConfig, feed: NotificationFeed) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match listen_once(&config, &feed).await {
                Ok(delivered) => {
                    tracing::info!(delivered, "Notification socket closed");
                    if delivered > 0 {
                        backoff = INITIAL_BACKOFF;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Notification socket failed"),
            }
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
        }
    })
}

const fn next_backoff(current: Duration) -> Duration {
    let doubled = current.saturating_mul(2);
    if doubled.as_secs() > MAX_BACKOFF.as_secs() {
        MAX_BACKOFF
    } else {
        doubled
    }
}

/// What one socket message means to the listener.
#[derive(Debug)]
enum Incoming {
    Notification(NotificationPayload),
    Reply(Message),
    Close,
    Ignored,
}

fn classify(message: Message) -> Incoming {
    match message {
        Message::Text(text) => parse_frame(text.as_str()).map_or_else(
            || {
                tracing::trace!("Ignoring non-notification frame");
                Incoming::Ignored
            },
            Incoming::Notification,
        ),
        Message::Ping(data) => Incoming::Reply(Message::Pong(data)),
        Message::Close(_) => Incoming::Close,
        Message::Binary(_) | Message::Pong(_) | Message::Frame(_) => Incoming::Ignored,
    }
}

/// One socket session; returns how many notifications it delivered.
/// Keep-alives do not count.
async fn listen_once(
    config: &NotificationsConfig,
    feed: &NotificationFeed,
) -> Result<usize, ListenerError> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| ListenerError::Request(e.to_string()))?;
    if let Some(token) = &config.token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| ListenerError::Request(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    let (mut stream, _) = connect_async(request).await.map_err(Box::new)?;
    tracing::info!(url = %config.url, "Notification socket connected");

    let mut delivered = 0;
    while let Some(message) = stream.next().await {
        match classify(message.map_err(Box::new)?) {
            Incoming::Notification(payload) => {
                tracing::debug!(title = %payload.title, "Notification received");
                feed.push(payload).await;
                delivered += 1;
            }
            Incoming::Reply(reply) => stream.send(reply).await.map_err(Box::new)?,
            Incoming::Close => break,
            Incoming::Ignored => {}
        }
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_up_to_a_minute() {
        assert_eq!(next_backoff(INITIAL_BACKOFF), Duration::from_secs(2));
        assert_eq!(next_backoff(Duration::from_secs(32)), MAX_BACKOFF);
        assert_eq!(next_backoff(MAX_BACKOFF), MAX_BACKOFF);
    }

    #[test]
    fn test_keep_alives_are_not_notifications() {
        assert!(matches!(
            classify(Message::Ping(vec![1, 2].into())),
            Incoming::Reply(Message::Pong(_))
        ));
        assert!(matches!(
            classify(Message::Pong(Vec::new().into())),
            Incoming::Ignored
        ));
        assert!(matches!(
            classify(Message::text(
                r#"{"event":"typing","data":{"title":"x"}}"#.to_string()
            )),
            Incoming::Ignored
        ));
        assert!(matches!(classify(Message::Close(None)), Incoming::Close));
    }

    #[test]
    fn test_notification_frames_are_delivered() {
        let incoming = classify(Message::text(
            r#"{"event":"notification","data":{"title":"Ticket opened","message":"Order 12"}}"#
                .to_string(),
        ));
        match incoming {
            Incoming::Notification(payload) => assert_eq!(payload.title, "Ticket opened"),
            other => panic!("expected a notification, got {other:?}"),
        }
    }
}
