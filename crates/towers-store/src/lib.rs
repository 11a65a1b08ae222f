//! Versioned persistence for Turn Table Towers game states.
//!
//! - [`GameStore`] — the async trait the service depends on: create,
//!   load, and commit-if-version-matches
//! - [`Versioned`] — a state plus the version it was read at
//! - [`MemoryStore`] — an in-memory implementation for tests, demos, and
//!   single-process deployments
//! - [`StoreError`] — what can go wrong

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{GameStore, Versioned};
