//! Coalescing rescan trigger between the monitor and the dispatcher.
//!
//! Built on a `watch` channel: any number of fires before the dispatcher
//! next looks collapse into one pending trigger, and the latest hint wins.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

/// A pending rescan request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigger {
    /// A path that changed, when the source knows one.
    pub hint: Option<PathBuf>,
}

/// Sending side, cheap to clone.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    tx: Arc<watch::Sender<Trigger>>,
}

/// Receiving side, owned by the dispatcher.
#[derive(Debug)]
pub struct TriggerListener {
    rx: watch::Receiver<Trigger>,
}

/// Create a connected handle/listener pair.
pub fn trigger_channel() -> (TriggerHandle, TriggerListener) {
    let (tx, rx) = watch::channel(Trigger::default());
    (
        TriggerHandle { tx: Arc::new(tx) },
        TriggerListener { rx },
    )
}

impl TriggerHandle {
    /// Mark a rescan as pending.
    pub fn fire(&self, hint: Option<PathBuf>) {
        self.tx.send_replace(Trigger { hint });
    }
}

impl TriggerListener {
    /// Wait for the next pending trigger; `None` once every handle is gone.
    pub async fn wait(&mut self) -> Option<Trigger> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Whether a trigger is pending without waiting.
    pub fn is_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fires_coalesce_latest_hint_wins() {
        let (handle, mut listener) = trigger_channel();
        assert!(!listener.is_pending());

        handle.fire(Some(PathBuf::from("1-a.txt")));
        handle.fire(None);
        handle.fire(Some(PathBuf::from("2-b.txt")));
        assert!(listener.is_pending());

        let trigger = listener.wait().await.unwrap();
        assert_eq!(trigger.hint, Some(PathBuf::from("2-b.txt")));
        assert!(!listener.is_pending());
    }

    #[tokio::test]
    async fn test_wait_ends_when_handles_dropped() {
        let (handle, mut listener) = trigger_channel();
        let clone = handle.clone();
        drop(handle);
        drop(clone);
        assert_eq!(listener.wait().await, None);
    }
}
