//! Last-write-wins roster reconciliation
//!
//! Pure and I/O-free: the one part of a pass that can be tested
//! exhaustively without a store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::Record;

/// Merge form submissions into the canonical roster.
///
/// Canonical entries carry the table-wide `watermark` as their effective
/// timestamp, so a submission wins only when it was filed strictly after
/// the last sync (or after a fresher submission for the same identity seen
/// earlier in the batch). Ties keep the entry already in place. Unknown
/// identities are inserted; nothing is ever deleted.
///
/// The result is keyed and ordered by identity, which is exactly the
/// stable order the listing encoder expects.
pub fn merge(
	canonical: Vec<Record>,
	submissions: Vec<Record>,
	watermark: DateTime<Utc>,
) -> BTreeMap<String, Record> {
	let mut merged: BTreeMap<String, Record> = canonical
		.into_iter()
		.map(|mut record| {
			record.last_modified = watermark;
			(record.identity.clone(), record)
		})
		.collect();

	for submission in submissions {
		match merged.get(&submission.identity) {
			Some(existing) if submission.last_modified <= existing.last_modified => {}
			_ => {
				merged.insert(submission.identity.clone(), submission);
			}
		}
	}

	merged
}
