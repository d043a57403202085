// vigil-core: domain layer for the Vigil hosted security platform client
//
// Installations, normalized entity snapshots, change detection, and
// listener fan-out. Wire mechanics (session, failover, retries) live in
// `vigil-api`; this crate decides what the data means and who hears
// about it.

pub mod client;
pub mod config;
pub mod error;
pub mod listeners;
pub mod model;
mod normalize;
pub mod registry;
pub mod store;
pub mod sync;

pub use client::VigilClient;
pub use config::ClientConfig;
pub use error::CoreError;
pub use listeners::{ListenerHandle, ListenerRegistry};
pub use model::{
    ArmMode, Category, EntityId, EntitySnapshot, EntityState, Installation, InstallationId,
};
pub use registry::InstallationRegistry;
pub use store::SnapshotStore;
pub use sync::EntitySynchronizer;
