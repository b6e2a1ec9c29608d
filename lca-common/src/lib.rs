//! # LCA Dashboard Common Library
//!
//! Shared code for the LCA dashboard client crates including:
//! - Error types
//! - Bootstrap configuration loading
//! - Notification events (DashEvent enum) and EventBus
//! - Observable stores (memory and JSON-file backed)
//! - Impact value and percentage formatting

pub mod config;
pub mod error;
pub mod events;
pub mod impact_format;
pub mod store;

pub use error::{Error, Result};
pub use events::{DashEvent, EventBus};
pub use store::{JsonFileStore, MemoryStore, Store};
