//! crates/turntable_core/src/persistence.rs
//!
//! The bridge between the turntable state and local storage.
//!
//! One JSON blob lives under [`STORAGE_KEY`]. Loading never fails: missing or
//! corrupt data is logged and treated as "nothing stored". Saving never fails
//! either; the bridge is registered as a store subscriber and runs after every
//! mutation.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{lenient_array, Category, SelectionPointers};
use crate::ports::{KeyValueStore, PortError, PortResult};
use crate::state::{Mutation, TurntableState};

/// The local storage key holding the serialized snapshot.
pub const STORAGE_KEY: &str = "learning-turntable";

/// The persisted shape: all categories plus the selection pointers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient_array")]
    pub categories: Vec<Category>,
    #[serde(default, deserialize_with = "pointers_or_default")]
    pub current_category_ids: SelectionPointers,
}

impl Snapshot {
    pub fn from_state(state: &TurntableState) -> Self {
        Self {
            categories: state.categories().to_vec(),
            current_category_ids: state.current_ids().clone(),
        }
    }

    pub fn into_state(self) -> TurntableState {
        TurntableState::new(self.categories, self.current_category_ids)
    }
}

/// Unreadable pointers read as unset.
fn pointers_or_default<'de, D>(deserializer: D) -> Result<SelectionPointers, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Every shape the blob has ever been written in.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredShape {
    /// Older builds stored the bare category list.
    Legacy(#[serde(deserialize_with = "lenient_array")] Vec<Category>),
    Current(Snapshot),
}

impl StoredShape {
    fn into_snapshot(self) -> Snapshot {
        match self {
            StoredShape::Legacy(categories) => Snapshot {
                categories,
                current_category_ids: SelectionPointers::default(),
            },
            StoredShape::Current(snapshot) => snapshot,
        }
    }
}

/// Parses a stored blob, upgrading the legacy shape.
pub fn parse_snapshot(raw: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str::<StoredShape>(raw).map(StoredShape::into_snapshot)
}

/// Reads and writes the snapshot through a `KeyValueStore`.
#[derive(Clone)]
pub struct PersistenceBridge {
    storage: Arc<dyn KeyValueStore>,
    key: String,
}

impl PersistenceBridge {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            key: STORAGE_KEY.to_string(),
        }
    }

    /// The stored blob as-is, without parsing it.
    pub fn load_raw(&self) -> PortResult<Option<String>> {
        self.storage.get_item(&self.key)
    }

    /// Loads the stored snapshot, or `None` if nothing usable is stored.
    pub fn load(&self) -> Option<Snapshot> {
        let raw = match self.load_raw() {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                warn!("Failed to read local cache: {}", e);
                return None;
            }
        };

        match parse_snapshot(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Failed to parse local cache: {}", e);
                None
            }
        }
    }

    /// Writes the snapshot, logging instead of returning failures.
    pub fn save(&self, state: &TurntableState) {
        if let Err(e) = self.try_save(state) {
            warn!("Failed to write local cache: {}", e);
        }
    }

    fn try_save(&self, state: &TurntableState) -> PortResult<()> {
        let serialized = serde_json::to_string(&Snapshot::from_state(state))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.storage.set_item(&self.key, &serialized)
    }

    pub fn clear(&self) -> PortResult<()> {
        self.storage.remove_item(&self.key)
    }

    /// A store subscriber that persists the state after each mutation.
    pub fn subscriber(&self) -> impl Fn(&Mutation, &TurntableState) + Send + Sync + 'static {
        let bridge = self.clone();
        move |mutation, state| {
            debug!(mutation = mutation.name(), "Persisting state");
            bridge.save(state);
        }
    }
}
