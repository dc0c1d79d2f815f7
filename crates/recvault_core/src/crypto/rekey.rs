//! Background mass re-encryption.
//!
//! Rotating a Control-Key Domain over a large dataset is the one
//! long-running operation in the crate, so it can run on a dedicated
//! worker thread while the interactive session stays responsive. The
//! worker reports progress through a [`RekeyFeed`] and honors
//! cooperative cancellation at a configurable record-count
//! checkpoint. Cancellation is not transactional: records already
//! rekeyed stay rekeyed, and the run is safe to resume.

use crate::collection::Collection;
use crate::config::Config;
use crate::crypto::encrypted::CipherSet;
use crate::crypto::keys::{ControlKey, ControlKeyDomain};
use crate::error::{VaultError, VaultResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// One progress report from a rekey run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RekeyProgress {
    /// Records visited so far.
    pub visited: usize,
    /// Records actually re-encrypted so far.
    pub rekeyed: usize,
    /// Total records in the collection.
    pub total: usize,
}

/// Summary of a finished (or cancelled) rekey run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RekeyOutcome {
    /// Records visited.
    pub visited: usize,
    /// Records re-encrypted.
    pub rekeyed: usize,
    /// Records already bound to the target key.
    pub skipped: usize,
    /// Whether the run stopped at a cancellation checkpoint.
    pub cancelled: bool,
}

/// Distributes rekey progress events to subscribers.
///
/// Supports multiple subscribers; disconnected receivers are dropped
/// on the next emit.
pub struct RekeyFeed {
    subscribers: RwLock<Vec<Sender<RekeyProgress>>>,
}

impl RekeyFeed {
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to progress events.
    pub fn subscribe(&self) -> Receiver<RekeyProgress> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits a progress event to all subscribers.
    pub fn emit(&self, progress: RekeyProgress) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(progress).is_ok());
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for RekeyFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-encrypts one collection under a new key, synchronously.
///
/// Every `Config::rekey_checkpoint` records the cancellation flag is
/// consulted and a progress event is emitted. Deleted and hidden
/// records are processed like any other.
pub fn rekey_collection<V: CipherSet>(
    collection: &mut Collection<V>,
    key: &ControlKey,
    domain: &ControlKeyDomain,
    config: &Config,
    cancel: &AtomicBool,
    feed: &RekeyFeed,
) -> VaultResult<RekeyOutcome> {
    let total = collection.len();
    let checkpoint = config.rekey_checkpoint.max(1);
    info!(key = %key.id(), total, "rekey started");

    let mut visited = 0;
    let mut rekeyed = 0;
    let mut cancelled = false;

    for idx in 0..total {
        if visited % checkpoint == 0 {
            if config.rekey_progress_events && visited > 0 {
                feed.emit(RekeyProgress {
                    visited,
                    rekeyed,
                    total,
                });
                debug!(visited, rekeyed, total, "rekey checkpoint");
            }
            if cancel.load(Ordering::Relaxed) {
                cancelled = true;
                warn!(visited, rekeyed, total, "rekey cancelled");
                break;
            }
        }
        if collection.records[idx].rekey(key, domain)? {
            rekeyed += 1;
        }
        visited += 1;
    }

    collection.refresh_edit_state();
    if config.rekey_progress_events {
        feed.emit(RekeyProgress {
            visited,
            rekeyed,
            total,
        });
    }
    if !cancelled {
        info!(visited, rekeyed, total, "rekey finished");
    }
    Ok(RekeyOutcome {
        visited,
        rekeyed,
        skipped: visited - rekeyed,
        cancelled,
    })
}

/// Handle to a running rekey worker.
pub struct RekeyHandle<V: CipherSet> {
    join: JoinHandle<VaultResult<(Collection<V>, RekeyOutcome)>>,
    cancel: Arc<AtomicBool>,
}

impl<V: CipherSet> RekeyHandle<V> {
    /// Requests cooperative cancellation; the worker stops at its
    /// next checkpoint.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the worker and returns the collection and outcome.
    pub fn join(self) -> VaultResult<(Collection<V>, RekeyOutcome)> {
        self.join
            .join()
            .map_err(|_| VaultError::logic("rekey worker panicked"))?
    }
}

/// Spawns a rekey run on a dedicated worker thread.
///
/// The worker takes ownership of the collection for the duration of
/// the run and hands it back through [`RekeyHandle::join`].
pub fn spawn_rekey<V>(
    mut collection: Collection<V>,
    key: ControlKey,
    domain: ControlKeyDomain,
    config: Config,
    feed: Arc<RekeyFeed>,
) -> RekeyHandle<V>
where
    V: CipherSet + Send + 'static,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let join = thread::spawn(move || {
        let outcome = rekey_collection(&mut collection, &key, &domain, &config, &flag, &feed)?;
        Ok((collection, outcome))
    });
    RekeyHandle { join, cancel }
}
