//! Server-authoritative action processing for Turn Table Towers.
//!
//! [`GameService`] is the only thing clients talk to. Every request runs
//! the same pipeline:
//!
//! ```text
//! load (state, version) → engine::apply_action → commit if version unchanged → notify
//! ```
//!
//! Rule violations come back as [`ServiceError::Engine`] with nothing
//! written. A lost race comes back as
//! [`ServiceError::ConcurrentModification`]; the service never retries on
//! its own.

mod config;
mod error;
mod event;
mod service;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use event::Notification;
pub use service::{ActionOutcome, GameService};
