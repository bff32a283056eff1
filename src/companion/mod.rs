//! Companion catalog
//!
//! Companions are the configured tutor personas users browse, create, and
//! start lesson sessions with. The store is in-memory; a database-backed
//! implementation would replace it behind the same surface.

mod model;
mod store;

pub use model::{Companion, NewCompanion};
pub use store::{CompanionQuery, CompanionStore};
