//! Live staff notifications.
//!
//! The backend pushes `notification` events over a WebSocket (new orders,
//! new tickets, low stock...). One listener task per process writes them
//! into a bounded in-memory [`NotificationFeed`]; pages read from it.
//! Nothing is persisted: a restart starts with an empty feed.

mod listener;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

pub use listener::{ListenerError, spawn_listener};

/// How many notifications the feed keeps.
pub const FEED_CAPACITY: usize = 50;

/// A notification as shown in the back-office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub kind: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// The `data` of a `notification` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(default)]
    pub id: Option<PayloadId>,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Backend IDs arrive as numbers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PayloadId {
    Number(i64),
    Text(String),
}

impl PayloadId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Parse one text frame; anything that is not a well-formed
/// `notification` event yields `None`.
#[must_use]
pub fn parse_frame(text: &str) -> Option<NotificationPayload> {
    let frame: Frame = serde_json::from_str(text).ok()?;
    if frame.event != "notification" {
        return None;
    }
    serde_json::from_value(frame.data?).ok()
}

/// Bounded, newest-first notification list shared by all handlers.
#[derive(Clone, Default)]
pub struct NotificationFeed {
    items: Arc<RwLock<VecDeque<Notification>>>,
}

impl NotificationFeed {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notification at the front, dropping the oldest past
    /// [`FEED_CAPACITY`]. A payload whose ID is already in the feed is
    /// ignored, so a replay after reconnecting does not duplicate.
    pub async fn push(&self, payload: NotificationPayload) {
        let id = payload
            .id
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), PayloadId::into_string);
        let mut items = self.items.write().await;
        if items.iter().any(|n| n.id == id) {
            return;
        }
        items.push_front(Notification {
            id,
            title: payload.title,
            message: payload.message,
            kind: payload.kind,
            created_at: payload.created_at.unwrap_or_else(Utc::now),
            read: false,
        });
        items.truncate(FEED_CAPACITY);
    }

    /// Snapshot of the feed, newest first.
    pub async fn recent(&self) -> Vec<Notification> {
        self.items.read().await.iter().cloned().collect()
    }

    pub async fn unread_count(&self) -> usize {
        self.items.read().await.iter().filter(|n| !n.read).count()
    }

    /// Mark everything currently in the feed as read.
    pub async fn mark_all_read(&self) {
        for item in self.items.write().await.iter_mut() {
            item.read = true;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload(id: i64, title: &str) -> NotificationPayload {
        NotificationPayload {
            id: Some(PayloadId::Number(id)),
            title: title.to_string(),
            message: String::new(),
            kind: None,
            created_at: None,
        }
    }

    #[test]
    fn test_parse_frame_accepts_notification_events() {
        let payload = parse_frame(
            r##"{"event":"notification","data":{"id":"n-1","title":"New order","message":"#1042 placed","kind":"ORDER","createdAt":"2026-10-01T08:00:00Z"}}"##,
        )
        .unwrap();
        assert_eq!(payload.title, "New order");
        assert_eq!(payload.kind.as_deref(), Some("ORDER"));
        assert!(payload.created_at.is_some());
    }

    #[test]
    fn test_parse_frame_ignores_other_frames() {
        assert!(parse_frame(r#"{"event":"typing","data":{"title":"x"}}"#).is_none());
        assert!(parse_frame(r#"{"event":"notification"}"#).is_none());
        assert!(parse_frame(r#"{"event":"notification","data":{"message":"no title"}}"#).is_none());
        assert!(parse_frame("not json").is_none());
    }

    #[tokio::test]
    async fn test_feed_is_newest_first_and_bounded() {
        let feed = NotificationFeed::new();
        for i in 0..60 {
            feed.push(payload(i, &format!("n{i}"))).await;
        }
        let recent = feed.recent().await;
        assert_eq!(recent.len(), FEED_CAPACITY);
        assert_eq!(recent[0].title, "n59");
        assert_eq!(recent[FEED_CAPACITY - 1].title, "n10");
    }

    #[tokio::test]
    async fn test_feed_skips_duplicate_ids() {
        let feed = NotificationFeed::new();
        feed.push(payload(1, "first")).await;
        feed.push(payload(1, "replayed")).await;
        let recent = feed.recent().await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "first");
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let feed = NotificationFeed::new();
        feed.push(payload(1, "a")).await;
        feed.push(payload(2, "b")).await;
        assert_eq!(feed.unread_count().await, 2);

        feed.mark_all_read().await;
        assert_eq!(feed.unread_count().await, 0);

        feed.push(payload(3, "c")).await;
        assert_eq!(feed.unread_count().await, 1);
    }
}
