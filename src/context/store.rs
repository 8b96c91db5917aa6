//! Single-writer, multi-reader holder of the latest context snapshot.

use crate::context::Context;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

/// Holds the most recent [`Context`].
///
/// The screen sensor is the only writer. Snapshots are built outside the lock
/// and installed by swapping an `Arc`, so the write lock is held only for the
/// pointer swap and readers never observe a partially written snapshot.
pub struct ContextStore {
    current: RwLock<Arc<Context>>,
    /// Bumped on every replace; 0 means nothing has been captured yet.
    version: watch::Sender<u64>,
}

impl Default for ContextStore {
    fn default() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            current: RwLock::new(Arc::new(Context::default())),
            version,
        }
    }
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new snapshot, fully replacing the previous one.
    ///
    /// Returns the new version number.
    pub fn replace(&self, context: Context) -> u64 {
        let next = Arc::new(context);
        let mut guard = self.current.write();
        *guard = next;
        let mut version = 0;
        self.version.send_modify(|v| {
            *v += 1;
            version = *v;
        });
        version
    }

    /// Immutable view of the latest snapshot.
    pub fn snapshot(&self) -> Arc<Context> {
        Arc::clone(&self.current.read())
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Whether the screen sensor has completed at least one capture.
    pub fn has_capture(&self) -> bool {
        self.version() > 0
    }

    /// Receiver notified after every replace.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}
