//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::HeatmapSettings;
use crate::data::SnapshotStore;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Snapshot store shared by every view
    pub store: Arc<SnapshotStore>,
    /// Rendering defaults for the HTML heatmap
    pub heatmap: Arc<HeatmapSettings>,
}

impl AppState {
    /// Create a new application state around the given store.
    pub fn new(store: Arc<SnapshotStore>, heatmap: HeatmapSettings) -> Self {
        Self {
            store,
            heatmap: Arc::new(heatmap),
        }
    }
}
