pub mod defaults;
pub mod domain;
pub mod persistence;
pub mod ports;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use domain::{Category, CategoryDraft, CategoryId, CategoryType, Resource, SelectionPointers};
pub use persistence::{PersistenceBridge, Snapshot, STORAGE_KEY};
pub use ports::{CategoryRepository, KeyValueStore, PortError, PortResult};
pub use state::{Mutation, TurntableState};
pub use store::Turntable;
