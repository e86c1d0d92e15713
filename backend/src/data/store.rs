//! Process-wide snapshot cache with atomic reload.
//!
//! Readers clone an `Arc<Snapshot>` under a short read lock and then work on
//! it lock-free. A reload builds the replacement snapshot outside the lock and
//! publishes it with a single pointer swap, so in-flight readers keep a
//! consistent view.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use super::error::DataLoadResult;
use super::loader::load_snapshot;
use super::snapshot::Snapshot;
use crate::config::DataSources;

/// Where a store gets its snapshots from.
enum Source {
    Files(DataSources),
    Fixed(Arc<Snapshot>),
}

/// Shared, read-mostly holder of the current [`Snapshot`].
pub struct SnapshotStore {
    source: Source,
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Serializes loads so concurrent first requests read the files once.
    load_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Store backed by the configured files. Nothing is read until the first
    /// [`get`](Self::get) or [`reload`](Self::reload).
    pub fn new(sources: DataSources) -> Self {
        Self {
            source: Source::Files(sources),
            current: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Store serving a fixed, pre-built snapshot. `reload` is a no-op.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let snapshot = Arc::new(snapshot);
        Self {
            source: Source::Fixed(Arc::clone(&snapshot)),
            current: RwLock::new(Some(snapshot)),
            load_lock: Mutex::new(()),
        }
    }

    /// Configured input files, if this store reads from disk.
    pub fn sources(&self) -> Option<&DataSources> {
        match &self.source {
            Source::Files(sources) => Some(sources),
            Source::Fixed(_) => None,
        }
    }

    /// Current snapshot, if one has been loaded.
    pub fn peek(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Current snapshot, loading it on first access.
    pub fn get(&self) -> DataLoadResult<Arc<Snapshot>> {
        if let Some(snapshot) = self.peek() {
            return Ok(snapshot);
        }

        let _guard = self.load_lock.lock();
        // Another caller may have finished the load while we waited.
        if let Some(snapshot) = self.peek() {
            return Ok(snapshot);
        }

        let snapshot = Arc::new(self.build()?);
        *self.current.write() = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Re-read the input files and publish the result.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self) -> DataLoadResult<Arc<Snapshot>> {
        let _guard = self.load_lock.lock();

        let snapshot = match self.build() {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!("Reload failed, keeping previous snapshot: {}", e);
                return Err(e);
            }
        };

        let previous = self.current.write().replace(Arc::clone(&snapshot));
        info!(
            "Snapshot reloaded: {} missions, {} cities (checksum {} -> {})",
            snapshot.missions.len(),
            snapshot.cities.len(),
            previous.as_ref().map_or("none", |s| s.checksum.as_str()),
            snapshot.checksum
        );
        Ok(snapshot)
    }

    fn build(&self) -> DataLoadResult<Snapshot> {
        match &self.source {
            Source::Files(sources) => load_snapshot(sources),
            Source::Fixed(snapshot) => Ok(snapshot.as_ref().clone()),
        }
    }
}
