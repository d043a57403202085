// ── Domain model ──
//
// Vendor-agnostic types. Wire shapes from `vigil-api` are normalized
// into these at the synchronizer boundary and never leak past it.

mod entity;
mod installation;

pub use entity::{ArmMode, Category, EntityId, EntitySnapshot, EntityState};
pub use installation::{Installation, InstallationId};
