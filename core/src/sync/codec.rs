//! Fixed-column table codec
//!
//! The two worksheets are a positional contract: the registration form
//! writes submissions in one column order, the canonical listing stores
//! entries in another. Both orders live here and nowhere else - everything
//! outside this module works with typed [`Record`]s, never `row[n]`.
//!
//! Listing layout (15 columns, `A..O`): identity, group, role, four focus
//! slots, a spacer, then Mon..Sun availability. The last-synced watermark
//! sits outside the data columns in fixed cell `S1`.
//!
//! Form layout (12 columns, `A..L`): raw timestamp, identity, role,
//! comma-separated focus tags, Mon..Sun availability, group.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::domain::{normalize_identity, Availability, Day, Record};

/// Timestamp format used by both the form tagger and the watermark cell,
/// e.g. `8/7/2026 09:15:00`. The store carries no timezone; values are
/// taken as UTC.
pub const TIMESTAMP_PARSE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Emitting counterpart of [`TIMESTAMP_PARSE_FORMAT`]: month and day
/// unpadded, matching what the form writes
pub const TIMESTAMP_EMIT_FORMAT: &str = "%-m/%-d/%Y %H:%M:%S";

/// Data width of the listing layout
pub const LISTING_WIDTH: usize = 15;

/// Data width of the form layout
pub const SUBMISSION_WIDTH: usize = 12;

/// Focus slots in the listing layout
pub const FOCUS_SLOTS: usize = 4;

/// Fixed cell holding the listing watermark
pub const WATERMARK_CELL: &str = "S1";

const LISTING_AVAILABILITY_START: usize = 8;
const SUBMISSION_AVAILABILITY_START: usize = 4;

#[derive(Debug, Error)]
pub enum CodecError {
	#[error("row {row}: expected at least {expected} columns, got {got}")]
	MalformedRow {
		row: usize,
		expected: usize,
		got: usize,
	},
	#[error("row {row}: timestamp {value:?} is not in M/D/YYYY HH:mm:ss form")]
	Timestamp {
		row: usize,
		value: String,
		#[source]
		source: chrono::ParseError,
	},
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
	NaiveDateTime::parse_from_str(value, TIMESTAMP_PARSE_FORMAT).map(|naive| naive.and_utc())
}

pub fn format_timestamp(when: DateTime<Utc>) -> String {
	when.format(TIMESTAMP_EMIT_FORMAT).to_string()
}

fn require_width(row: usize, cells: &[String], expected: usize) -> Result<(), CodecError> {
	if cells.len() < expected {
		Err(CodecError::MalformedRow {
			row,
			expected,
			got: cells.len(),
		})
	} else {
		Ok(())
	}
}

/// Decode listing data rows (header already stripped).
///
/// Every row is assumed meaningful; a short row aborts the whole decode
/// rather than silently dropping a roster entry. Row indexes in errors are
/// 0-based data-row indexes. All decoded records carry `watermark` as their
/// effective timestamp.
pub fn decode_listing(
	rows: &[Vec<String>],
	watermark: DateTime<Utc>,
) -> Result<Vec<Record>, CodecError> {
	rows.iter()
		.enumerate()
		.map(|(row, cells)| {
			require_width(row, cells, LISTING_WIDTH)?;

			// Trailing empty focus slots are padding, not tags.
			let mut focus_list: Vec<String> = cells[3..3 + FOCUS_SLOTS].to_vec();
			while focus_list.last().is_some_and(String::is_empty) {
				focus_list.pop();
			}

			Ok(Record {
				identity: normalize_identity(&cells[0]),
				group: cells[1].clone(),
				role: cells[2].clone(),
				focus_list,
				availability: Availability::from_fn(|day| {
					cells[LISTING_AVAILABILITY_START + day as usize].clone()
				}),
				last_modified: watermark,
			})
		})
		.collect()
}

/// Decode form data rows (header already stripped).
///
/// Rows with an empty timestamp cell are blank placeholders left behind by
/// a previous clear and are skipped, not errors. Tags beyond the four
/// listing slots are dropped so the fixed row width holds on re-encode.
pub fn decode_submissions(rows: &[Vec<String>]) -> Result<Vec<Record>, CodecError> {
	let mut records = Vec::new();
	for (row, cells) in rows.iter().enumerate() {
		let stamp = cells.first().map(String::as_str).unwrap_or("");
		if stamp.is_empty() {
			continue;
		}
		require_width(row, cells, SUBMISSION_WIDTH)?;

		let when = parse_timestamp(stamp).map_err(|source| CodecError::Timestamp {
			row,
			value: stamp.to_string(),
			source,
		})?;

		let focus_list: Vec<String> = cells[3]
			.split(',')
			.map(|tag| tag.trim().to_string())
			.filter(|tag| !tag.is_empty())
			.take(FOCUS_SLOTS)
			.collect();

		records.push(Record {
			identity: normalize_identity(&cells[1]),
			group: cells[11].clone(),
			role: cells[2].clone(),
			focus_list,
			availability: Availability::from_fn(|day| {
				cells[SUBMISSION_AVAILABILITY_START + day as usize].clone()
			}),
			last_modified: when,
		});
	}
	Ok(records)
}

/// Encode records into full-width listing rows.
///
/// Deterministic inverse of [`decode_listing`] for an identity-sorted
/// sequence: the encoder never reorders, always emits 15-wide rows and
/// exactly four focus slots (shorter lists padded with empty cells).
pub fn encode_listing(records: &[Record]) -> Vec<Vec<String>> {
	records
		.iter()
		.map(|record| {
			let mut row = Vec::with_capacity(LISTING_WIDTH);
			row.push(record.identity.clone());
			row.push(record.group.clone());
			row.push(record.role.clone());
			for slot in 0..FOCUS_SLOTS {
				row.push(record.focus_list.get(slot).cloned().unwrap_or_default());
			}
			row.push(String::new()); // spacer
			for day in Day::ALL {
				row.push(record.availability.get(day).to_string());
			}
			row
		})
		.collect()
}
