//! Cross-view slide synchronization.
//!
//! Every view of a deck joins a topic on a [`Transport`]. Local index changes
//! are published as [`SyncMessage`]s; messages from other views are applied
//! without being re-published, and a view ignores its own messages.

pub mod file;
pub mod local;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileTransport;
pub use local::LocalBus;

/// Topic shared by every view unless a deck or the config names another.
pub const DEFAULT_TOPIC: &str = "presentation-sync";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode sync message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to watch sync directory: {0}")]
    Watch(#[from] notify_debouncer_mini::notify::Error),
}

/// Opaque per-view identity, used to drop messages a view sent itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(String);

impl SenderId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    SlideChange,
}

/// Wire payload: `{"type":"slide-change","slideIndex":2,"senderId":"..","timestamp":..}`.
///
/// `timestamp` is advisory only; the last message processed wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub slide_index: i64,
    pub sender_id: SenderId,
    pub timestamp: u64,
}

impl SyncMessage {
    pub fn slide_change(slide_index: usize, sender_id: SenderId) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            kind: MessageKind::SlideChange,
            slide_index: slide_index as i64,
            sender_id,
            timestamp,
        }
    }
}

pub type Handler = Arc<dyn Fn(SyncMessage) + Send + Sync>;

/// A publish/subscribe capability keyed by topic name.
pub trait Transport: Send + Sync {
    /// Fire-and-forget delivery to every subscriber of `topic`.
    fn publish(&self, topic: &str, message: &SyncMessage) -> Result<(), SyncError>;

    /// Register `handler` for `topic` until the returned guard is dropped.
    fn subscribe(&self, topic: &str, handler: Handler) -> Result<Subscription, SyncError>;
}

/// Live subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

/// Single-view mode: publishing goes nowhere and nothing is ever received.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn publish(&self, _topic: &str, _message: &SyncMessage) -> Result<(), SyncError> {
        Ok(())
    }

    fn subscribe(&self, _topic: &str, _handler: Handler) -> Result<Subscription, SyncError> {
        Ok(Subscription::noop())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// Other processes on this machine, through a shared directory.
    #[default]
    File,
    /// Other views in this process only.
    Local,
    Off,
}

impl TransportKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "file" => Some(Self::File),
            "local" => Some(Self::Local),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Local => "local",
            Self::Off => "off",
        }
    }
}

/// Build the transport for `kind`. A file transport that cannot be set up
/// falls back to single-view mode.
pub fn open_transport(kind: TransportKind, dir: Option<PathBuf>) -> Arc<dyn Transport> {
    match kind {
        TransportKind::File => {
            let dir = dir.unwrap_or_else(FileTransport::default_dir);
            match FileTransport::new(dir) {
                Ok(t) => {
                    tracing::debug!(dir = %t.dir().display(), "Syncing through shared directory");
                    Arc::new(t)
                }
                Err(e) => {
                    tracing::warn!("{e}; continuing in single-view mode");
                    Arc::new(NullTransport)
                }
            }
        }
        TransportKind::Local => Arc::new(LocalBus::new()),
        TransportKind::Off => Arc::new(NullTransport),
    }
}

/// One view's membership in a sync topic.
pub struct PresenterChannel {
    transport: Arc<dyn Transport>,
    topic: String,
    sender_id: SenderId,
    subscription: Option<Subscription>,
}

impl PresenterChannel {
    /// Join `topic`. `on_remote` receives the slide index of every message sent
    /// by another view. If the transport refuses the subscription the channel
    /// stays usable but inert.
    pub fn open(
        transport: Arc<dyn Transport>,
        topic: impl Into<String>,
        on_remote: impl Fn(i64) + Send + Sync + 'static,
    ) -> Self {
        let topic = topic.into();
        let sender_id = SenderId::generate();

        let own_id = sender_id.clone();
        let handler: Handler = Arc::new(move |message: SyncMessage| {
            if message.sender_id == own_id {
                tracing::trace!("Ignoring own sync message");
                return;
            }
            match message.kind {
                MessageKind::SlideChange => {
                    tracing::debug!(
                        from = %message.sender_id,
                        slide = message.slide_index,
                        "Received slide change"
                    );
                    on_remote(message.slide_index);
                }
            }
        });

        let subscription = match transport.subscribe(&topic, handler) {
            Ok(sub) => Some(sub),
            Err(e) => {
                tracing::warn!("{e}; continuing in single-view mode");
                None
            }
        };

        Self {
            transport,
            topic,
            sender_id,
            subscription,
        }
    }

    pub fn sender_id(&self) -> &SenderId {
        &self.sender_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_some()
    }

    /// Publish a local index change. Failures are logged, never returned.
    pub fn broadcast(&self, slide_index: usize) {
        if !self.is_connected() {
            return;
        }
        let message = SyncMessage::slide_change(slide_index, self.sender_id.clone());
        if let Err(e) = self.transport.publish(&self.topic, &message) {
            tracing::warn!("Failed to publish slide change: {e}");
        }
    }

    /// Leave the topic. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.cancel();
            tracing::debug!(topic = %self.topic, "Left sync topic");
        }
    }
}

impl Drop for PresenterChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn publish(&self, _topic: &str, _message: &SyncMessage) -> Result<(), SyncError> {
            Err(broken())
        }

        fn subscribe(&self, _topic: &str, _handler: Handler) -> Result<Subscription, SyncError> {
            Err(broken())
        }
    }

    fn broken() -> SyncError {
        SyncError::Io {
            path: PathBuf::from("/nonexistent"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "broken"),
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<i64>>>, impl Fn(i64) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |i| sink.lock().push(i))
    }

    #[test]
    fn test_message_wire_format() {
        let msg = SyncMessage {
            kind: MessageKind::SlideChange,
            slide_index: 2,
            sender_id: SenderId("abc".into()),
            timestamp: 1700000000000,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"type":"slide-change","slideIndex":2,"senderId":"abc","timestamp":1700000000000}"#
        );
    }

    #[test]
    fn test_unknown_message_type_rejected() {
        let json = r#"{"type":"cursor-move","slideIndex":2,"senderId":"abc","timestamp":1}"#;
        assert!(serde_json::from_str::<SyncMessage>(json).is_err());
    }

    #[test]
    fn test_sender_ids_are_unique() {
        assert_ne!(SenderId::generate(), SenderId::generate());
    }

    #[test]
    fn test_self_echo_is_ignored_but_others_apply() {
        let bus: Arc<dyn Transport> = Arc::new(LocalBus::new());
        let (seen_a, on_a) = recorder();
        let (seen_b, on_b) = recorder();
        let a = PresenterChannel::open(Arc::clone(&bus), DEFAULT_TOPIC, on_a);
        let _b = PresenterChannel::open(Arc::clone(&bus), DEFAULT_TOPIC, on_b);

        a.broadcast(2);

        assert!(seen_a.lock().is_empty());
        assert_eq!(*seen_b.lock(), vec![2]);
    }

    #[test]
    fn test_closed_channel_receives_nothing() {
        let bus: Arc<dyn Transport> = Arc::new(LocalBus::new());
        let (seen_b, on_b) = recorder();
        let a = PresenterChannel::open(Arc::clone(&bus), DEFAULT_TOPIC, |_| {});
        let mut b = PresenterChannel::open(Arc::clone(&bus), DEFAULT_TOPIC, on_b);

        b.close();
        b.close();
        a.broadcast(1);

        assert!(seen_b.lock().is_empty());
        assert!(!b.is_connected());
    }

    #[test]
    fn test_dropped_channel_receives_nothing() {
        let bus: Arc<dyn Transport> = Arc::new(LocalBus::new());
        let (seen_b, on_b) = recorder();
        let a = PresenterChannel::open(Arc::clone(&bus), DEFAULT_TOPIC, |_| {});
        {
            let _b = PresenterChannel::open(Arc::clone(&bus), DEFAULT_TOPIC, on_b);
        }
        a.broadcast(1);
        assert!(seen_b.lock().is_empty());
    }

    #[test]
    fn test_topics_are_isolated() {
        let bus: Arc<dyn Transport> = Arc::new(LocalBus::new());
        let (seen, on_remote) = recorder();
        let a = PresenterChannel::open(Arc::clone(&bus), "presentation-sync/one", |_| {});
        let _b = PresenterChannel::open(Arc::clone(&bus), "presentation-sync/two", on_remote);
        a.broadcast(3);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_unavailable_transport_degrades() {
        let mut channel = PresenterChannel::open(Arc::new(FailingTransport), DEFAULT_TOPIC, |_| {});
        assert!(!channel.is_connected());
        channel.broadcast(1);
        channel.close();
    }

    #[test]
    fn test_null_transport() {
        let channel = PresenterChannel::open(Arc::new(NullTransport), DEFAULT_TOPIC, |_| {});
        assert!(channel.is_connected());
        channel.broadcast(4);
    }

    #[test]
    fn test_transport_kind_names() {
        for kind in [TransportKind::File, TransportKind::Local, TransportKind::Off] {
            assert_eq!(TransportKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TransportKind::from_name("none"), Some(TransportKind::Off));
        assert_eq!(TransportKind::from_name("carrier-pigeon"), None);
    }
}
