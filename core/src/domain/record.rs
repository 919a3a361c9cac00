//! Roster entry value types
//!
//! A `Record` is the typed form of one roster row. Records are immutable by
//! convention: the merge engine builds new ones rather than patching fields
//! in place, and identity (after normalization) is the only key used to
//! compare entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Days of the week in the fixed order the availability columns use.
///
/// A closed enum instead of day-name strings, so a typo'd key is a compile
/// error rather than a silently absent column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
	Mon,
	Tue,
	Wed,
	Thu,
	Fri,
	Sat,
	Sun,
}

impl Day {
	/// All days in table column order
	pub const ALL: [Day; 7] = [
		Day::Mon,
		Day::Tue,
		Day::Wed,
		Day::Thu,
		Day::Fri,
		Day::Sat,
		Day::Sun,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Day::Mon => "Mon",
			Day::Tue => "Tue",
			Day::Wed => "Wed",
			Day::Thu => "Thu",
			Day::Fri => "Fri",
			Day::Sat => "Sat",
			Day::Sun => "Sun",
		}
	}
}

/// Per-day availability cells.
///
/// All seven days are always present; a day with no data holds an empty
/// string, never a missing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability([String; 7]);

impl Availability {
	pub fn get(&self, day: Day) -> &str {
		&self.0[day as usize]
	}

	pub fn set(&mut self, day: Day, value: impl Into<String>) {
		self.0[day as usize] = value.into();
	}

	/// Build a full week by evaluating `f` for each day in order
	pub fn from_fn(f: impl FnMut(Day) -> String) -> Self {
		Self(Day::ALL.map(f))
	}
}

/// A single roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	/// Natural key, already normalized via [`normalize_identity`]
	pub identity: String,
	pub group: String,
	pub role: String,
	/// Up to four free-text focus tags
	pub focus_list: Vec<String>,
	pub availability: Availability,
	/// Submission time for form records; for canonical records that were not
	/// touched in the last pass this is the table-wide watermark, which is
	/// coarser than true per-record history
	pub last_modified: DateTime<Utc>,
}

/// Lower-case the whole string, then capitalize the first character.
///
/// Both table layouts run identities through this, so case variance in the
/// source data ("bob", "BOB", "Bob") cannot fork one person into several
/// entries.
pub fn normalize_identity(raw: &str) -> String {
	let lower = raw.to_lowercase();
	let mut chars = lower.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
		None => String::new(),
	}
}
