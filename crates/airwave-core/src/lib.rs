//! Airwave core.
//!
//! Sans-IO domain logic for live sessions: the [`SessionStore`] that owns every
//! [`Session`] and its chat log, and the rules for composing chat messages.
//! Nothing in this crate performs I/O. Time and randomness come from an
//! [`Environment`] so the same code runs against the system clock in
//! production and a seeded simulation in tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat;
pub mod env;
pub mod error;
pub mod session;
pub mod store;

pub use chat::ChatDraft;
pub use env::Environment;
pub use error::StoreError;
pub use session::Session;
pub use store::SessionStore;
