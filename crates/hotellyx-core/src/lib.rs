#![forbid(unsafe_code)]
//! hotellyx-core library.
//!
//! Guest requests, rooms, and the service catalog all live in a single
//! key-value [`store::RecordStore`]. Every engine borrows the store and a
//! [`clock::Clock`] explicitly; there is no ambient "current store".
//!
//! # Conventions
//!
//! - **Errors**: Backend failures are [`error::StoreError`]. Malformed data and
//!   unknown ids never error; they degrade to empty or unchanged collections.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod policy;
pub mod rooms;
pub mod store;
pub mod token;
