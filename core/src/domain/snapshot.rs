//! The published roster snapshot

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{normalize_identity, Record};

/// The most recently merged roster.
///
/// Produced by one reconciliation pass and handed out as an immutable
/// whole: readers never observe a half-updated roster, and a failing pass
/// leaves the previously published snapshot in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
	records: BTreeMap<String, Record>,
	/// Watermark written to the table by the pass that produced this snapshot
	pub synced_at: DateTime<Utc>,
}

impl Snapshot {
	pub fn new(records: BTreeMap<String, Record>, synced_at: DateTime<Utc>) -> Self {
		Self { records, synced_at }
	}

	/// Look up an entry by identity.
	///
	/// The probe is normalized the same way the codec normalizes stored
	/// identities, so `get("amy")` and `get("Amy")` hit the same entry.
	pub fn get(&self, identity: &str) -> Option<&Record> {
		self.records.get(&normalize_identity(identity))
	}

	/// Records in ascending identity order
	pub fn records(&self) -> impl Iterator<Item = &Record> {
		self.records.values()
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}
