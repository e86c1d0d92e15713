//! Data layer: typed schema, file loading and the process-wide snapshot.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / services                               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │ Arc<Snapshot>
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  SnapshotStore (store.rs) - lazy load, atomic reload     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Loader (loader.rs) - CSV / JSON → validated records     │
//! │  events.rs, weather.rs - optional closure and weather    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary installs one store with [`init_store`]; tests build their own
//! [`SnapshotStore`] and pass it around explicitly.

pub mod checksum;
pub mod error;
pub mod events;
pub mod loader;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod weather;

pub use error::{DataLoadError, DataLoadResult, DataQualityWarning, LoadWarnings};
pub use events::{ClosureEvent, EventCatalog};
pub use loader::{load_city_coordinates, load_missions, load_snapshot, MissionLog};
pub use schema::{CityTable, Coordinate, MissionRecord, UNKNOWN_VEHICLE_TYPE};
pub use snapshot::Snapshot;
pub use store::SnapshotStore;
pub use weather::{WeatherObservation, WeatherTable};

use std::sync::{Arc, OnceLock};

use crate::config::DataSources;

/// Global snapshot store initialized once per process.
static STORE: OnceLock<Arc<SnapshotStore>> = OnceLock::new();

/// Initialize the global snapshot store. Later calls are no-ops.
pub fn init_store(sources: DataSources) -> &'static Arc<SnapshotStore> {
    STORE.get_or_init(|| Arc::new(SnapshotStore::new(sources)))
}
