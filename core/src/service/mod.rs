//! Background services

pub mod sync;

pub use sync::{SyncService, SyncServiceConfig};
