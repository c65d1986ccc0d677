use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use super::{Handler, Subscription, SyncError, SyncMessage, Transport};

/// In-process fan-out between views of the same process.
///
/// Handlers run on the publishing thread, after the registry lock has been
/// released, so a handler may itself publish or unsubscribe. Each delivery
/// holds its subscription's gate, so once `cancel` returns the handler is
/// neither running nor called again.
#[derive(Clone, Default)]
pub struct LocalBus {
    inner: Arc<Mutex<Registry>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    topics: HashMap<String, Vec<Entry>>,
}

/// `true` once the subscription is cancelled.
type Gate = Arc<ReentrantMutex<Cell<bool>>>;

#[derive(Clone)]
struct Entry {
    id: u64,
    gate: Gate,
    handler: Handler,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.lock().topics.get(topic).map_or(0, Vec::len)
    }
}

impl Transport for LocalBus {
    fn publish(&self, topic: &str, message: &SyncMessage) -> Result<(), SyncError> {
        let entries: Vec<Entry> = {
            let registry = self.inner.lock();
            registry.topics.get(topic).cloned().unwrap_or_default()
        };
        for entry in entries {
            let closed = entry.gate.lock();
            if !closed.get() {
                (entry.handler)(message.clone());
            }
        }
        Ok(())
    }

    fn subscribe(&self, topic: &str, handler: Handler) -> Result<Subscription, SyncError> {
        let gate: Gate = Arc::new(ReentrantMutex::new(Cell::new(false)));
        let id = {
            let mut registry = self.inner.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .topics
                .entry(topic.to_string())
                .or_default()
                .push(Entry {
                    id,
                    gate: Arc::clone(&gate),
                    handler,
                });
            id
        };

        let inner = Arc::clone(&self.inner);
        let topic = topic.to_string();
        Ok(Subscription::new(move || {
            // Waits for a delivery in progress on another thread
            gate.lock().set(true);
            let mut registry = inner.lock();
            if let Some(subs) = registry.topics.get_mut(&topic) {
                subs.retain(|entry| entry.id != id);
                if subs.is_empty() {
                    registry.topics.remove(&topic);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SenderId;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = LocalBus::new();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let h1 = Arc::clone(&hits);
        let _s1 = bus
            .subscribe("t", Arc::new(move |m: SyncMessage| h1.lock().push(("one", m.slide_index))))
            .unwrap();
        let h2 = Arc::clone(&hits);
        let _s2 = bus
            .subscribe("t", Arc::new(move |m: SyncMessage| h2.lock().push(("two", m.slide_index))))
            .unwrap();

        bus.publish("t", &SyncMessage::slide_change(3, SenderId::generate()))
            .unwrap();

        assert_eq!(*hits.lock(), vec![("one", 3), ("two", 3)]);
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let bus = LocalBus::new();
        let sub = bus.subscribe("t", Arc::new(|_: SyncMessage| {})).unwrap();
        assert_eq!(bus.subscriber_count("t"), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count("t"), 0);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = LocalBus::new();
        assert!(
            bus.publish("nobody", &SyncMessage::slide_change(0, SenderId::generate()))
                .is_ok()
        );
    }

    #[test]
    fn test_no_delivery_after_cancel_in_snapshot() {
        let bus = LocalBus::new();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let later: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        // The first handler cancels the second one while a publish is already
        // iterating over both
        let slot = Arc::clone(&later);
        let h1 = Arc::clone(&hits);
        let _first = bus
            .subscribe(
                "t",
                Arc::new(move |_: SyncMessage| {
                    h1.lock().push("first");
                    if let Some(sub) = slot.lock().take() {
                        sub.cancel();
                    }
                }),
            )
            .unwrap();
        let h2 = Arc::clone(&hits);
        let second = bus
            .subscribe("t", Arc::new(move |_: SyncMessage| h2.lock().push("second")))
            .unwrap();
        *later.lock() = Some(second);

        bus.publish("t", &SyncMessage::slide_change(1, SenderId::generate()))
            .unwrap();
        assert_eq!(*hits.lock(), vec!["first"]);
        assert_eq!(bus.subscriber_count("t"), 1);
    }

    #[test]
    fn test_cancel_from_other_thread_waits_for_delivery() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::mpsc;
        use std::time::Duration;

        let bus = LocalBus::new();
        let running = Arc::new(AtomicBool::new(false));
        let (entered_tx, entered_rx) = mpsc::channel();
        let flag = Arc::clone(&running);
        let sub = bus
            .subscribe(
                "t",
                Arc::new(move |_: SyncMessage| {
                    flag.store(true, Ordering::SeqCst);
                    let _ = entered_tx.send(());
                    std::thread::sleep(Duration::from_millis(100));
                    flag.store(false, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let publisher = bus.clone();
        let worker = std::thread::spawn(move || {
            publisher
                .publish("t", &SyncMessage::slide_change(1, SenderId::generate()))
                .unwrap();
        });

        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        sub.cancel();
        assert!(!running.load(Ordering::SeqCst));
        worker.join().unwrap();
    }

    #[test]
    fn test_handler_may_publish() {
        let bus = LocalBus::new();
        let relay = bus.clone();
        let received = Arc::new(Mutex::new(0));
        let count = Arc::clone(&received);

        let _echo = bus
            .subscribe(
                "in",
                Arc::new(move |m: SyncMessage| {
                    let _ = relay.publish("out", &m);
                }),
            )
            .unwrap();
        let _sink = bus
            .subscribe("out", Arc::new(move |_: SyncMessage| *count.lock() += 1))
            .unwrap();

        bus.publish("in", &SyncMessage::slide_change(1, SenderId::generate()))
            .unwrap();
        assert_eq!(*received.lock(), 1);
    }
}
