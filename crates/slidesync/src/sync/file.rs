use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify_debouncer_mini::new_debouncer;
use notify_debouncer_mini::notify::RecursiveMode;
use notify_debouncer_mini::DebounceEventResult;

use super::{Handler, Subscription, SyncError, SyncMessage, Transport};

const DEBOUNCE: Duration = Duration::from_millis(50);
const APP_DIR: &str = "slidesync";

/// Cross-process transport over a shared directory.
///
/// Each topic is one JSON file holding the latest message. Publishing replaces
/// the file atomically; subscribers watch the directory and read the file when
/// it changes. A burst of writes may be coalesced into its last message.
#[derive(Debug, Clone)]
pub struct FileTransport {
    dir: PathBuf,
}

impl FileTransport {
    pub fn new(dir: PathBuf) -> Result<Self, SyncError> {
        std::fs::create_dir_all(&dir).map_err(|source| SyncError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Per-user runtime directory when the platform has one, else the temp dir.
    pub fn default_dir() -> PathBuf {
        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn topic_path(&self, topic: &str) -> PathBuf {
        self.dir.join(topic_file_name(topic))
    }
}

/// Map a topic to a file name that is safe on every platform. Bytes outside
/// `[A-Za-z0-9_-]` are percent-encoded, so distinct topics never share a file.
fn topic_file_name(topic: &str) -> String {
    let mut stem = String::with_capacity(topic.len());
    for byte in topic.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("{stem}.json")
}

fn read_message(path: &Path) -> Result<SyncMessage, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

impl Transport for FileTransport {
    fn publish(&self, topic: &str, message: &SyncMessage) -> Result<(), SyncError> {
        let path = self.topic_path(topic);
        let json = serde_json::to_string(message)?;

        let tmp = self.dir.join(format!(
            ".{}.{}.tmp",
            topic_file_name(topic),
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::write(&tmp, json).map_err(|source| SyncError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp);
            SyncError::Io {
                path: path.clone(),
                source,
            }
        })?;
        Ok(())
    }

    fn subscribe(&self, topic: &str, handler: Handler) -> Result<Subscription, SyncError> {
        let path = self.topic_path(topic);
        let file_name = path.file_name().map(|n| n.to_os_string());
        let closed = Arc::new(AtomicBool::new(false));

        let watch_closed = Arc::clone(&closed);
        let watch_path = path.clone();
        let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| {
            if watch_closed.load(Ordering::SeqCst) {
                return;
            }
            let events = match result {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!("Sync watcher error: {e:?}");
                    return;
                }
            };
            if !events
                .iter()
                .any(|e| e.path.file_name().map(|n| n.to_os_string()) == file_name)
            {
                return;
            }
            match read_message(&watch_path) {
                Ok(message) => handler(message),
                Err(e) => tracing::debug!("Skipping unreadable sync message: {e}"),
            }
        })?;
        debouncer
            .watcher()
            .watch(&self.dir, RecursiveMode::NonRecursive)?;

        tracing::debug!(topic, path = %path.display(), "Watching sync topic");
        Ok(Subscription::new(move || {
            closed.store(true, Ordering::SeqCst);
            drop(debouncer);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SenderId;
    use std::sync::mpsc;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_topic_file_name() {
        assert_eq!(topic_file_name("presentation-sync"), "presentation-sync.json");
        assert_eq!(
            topic_file_name("presentation-sync/my talk"),
            "presentation-sync%2Fmy%20talk.json"
        );
        assert_eq!(topic_file_name("100%"), "100%25.json");
        assert_eq!(topic_file_name("café"), "caf%C3%A9.json");
    }

    #[test]
    fn test_similar_topics_get_distinct_files() {
        let names = [
            "presentation-sync/my talk",
            "presentation-sync/my_talk",
            "presentation-sync_my_talk",
            "presentation-sync%2Fmy%20talk",
        ];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(topic_file_name(a), topic_file_name(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_similar_topics_stay_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = FileTransport::new(dir.path().to_path_buf()).unwrap();
        let listener = FileTransport::new(dir.path().to_path_buf()).unwrap();

        let (tx, rx) = mpsc::channel();
        let _sub = listener
            .subscribe(
                "presentation-sync/my talk",
                Arc::new(move |m: SyncMessage| {
                    let _ = tx.send(m.slide_index);
                }),
            )
            .unwrap();

        publisher
            .publish(
                "presentation-sync/my_talk",
                &SyncMessage::slide_change(7, SenderId::generate()),
            )
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());

        publisher
            .publish(
                "presentation-sync/my talk",
                &SyncMessage::slide_change(2, SenderId::generate()),
            )
            .unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 2);
    }

    #[test]
    fn test_publish_writes_latest_message() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FileTransport::new(dir.path().to_path_buf()).unwrap();
        let sender = SenderId::generate();

        transport
            .publish("t", &SyncMessage::slide_change(1, sender.clone()))
            .unwrap();
        transport
            .publish("t", &SyncMessage::slide_change(4, sender))
            .unwrap();

        let message = read_message(&dir.path().join("t.json")).unwrap();
        assert_eq!(message.slide_index, 4);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let transport = FileTransport::new(nested.clone()).unwrap();
        assert_eq!(transport.dir(), nested.as_path());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_subscriber_in_other_instance_receives() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = FileTransport::new(dir.path().to_path_buf()).unwrap();
        let listener = FileTransport::new(dir.path().to_path_buf()).unwrap();

        let (tx, rx) = mpsc::channel();
        let sub = listener
            .subscribe(
                "deck",
                Arc::new(move |m: SyncMessage| {
                    let _ = tx.send(m.slide_index);
                }),
            )
            .unwrap();

        publisher
            .publish("deck", &SyncMessage::slide_change(2, SenderId::generate()))
            .unwrap();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 2);

        sub.cancel();
        publisher
            .publish("deck", &SyncMessage::slide_change(3, SenderId::generate()))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
    }
}
