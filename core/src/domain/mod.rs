//! Domain model for roster entries

mod record;
mod snapshot;

pub use record::{normalize_identity, Availability, Day, Record};
pub use snapshot::Snapshot;
