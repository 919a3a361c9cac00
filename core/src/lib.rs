//! Roster sync core
//!
//! Keeps a canonical roster worksheet ("Listing") reconciled with the
//! registration form submissions that accumulate in a second worksheet of
//! the same document. Submissions arrive out of order with respect to the
//! roster, so each pass merges them by identity with last-write-wins
//! tie-breaking, writes the result back, clears the consumed submissions
//! and advances the table's last-synced watermark.
//!
//! ## Architecture
//!
//! - `domain` - typed roster entries and the published snapshot
//! - `infra::store` - the external tabular store boundary (trait + adapters)
//! - `sync` - column codec, pure merge engine, one-pass orchestrator
//! - `service` - the periodic scheduler that owns the latest snapshot
//! - `chat` - the text-command surface collaborators plug a transport into
//!
//! Raw cell grids never escape `infra::store` and `sync::codec`; everything
//! else works with typed records.

pub mod chat;
pub mod config;
pub mod domain;
pub mod infra;
pub mod service;
pub mod sync;

pub use config::AppConfig;
pub use domain::{Day, Record, Snapshot};
pub use service::sync::{SyncService, SyncServiceConfig};
pub use sync::engine::{SyncEngine, SyncTables};
