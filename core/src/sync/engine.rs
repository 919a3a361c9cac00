//! One reconciliation pass
//!
//! Reads both worksheets, merges, writes the listing back, prunes stale
//! tail rows, clears consumed submissions and advances the watermark. All
//! reads and decodes happen before the first write, so a pass that fails in
//! that phase leaves the store untouched. The write phase has no
//! transactional guarantee from the store; the watermark write always comes
//! last so a crash mid-sequence can only cause a redundant re-merge, never
//! a false "already synced" marker.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Snapshot;
use crate::infra::store::{self, StoreError, TabularStore};

use super::codec::{self, CodecError};
use super::merge::merge;

#[derive(Debug, Error)]
pub enum SyncError {
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error(transparent)]
	Codec(#[from] CodecError),
	#[error("watermark cell holds {value:?}, not a M/D/YYYY HH:mm:ss timestamp")]
	Watermark {
		value: String,
		#[source]
		source: chrono::ParseError,
	},
}

/// Names of the two worksheets a pass touches
#[derive(Debug, Clone)]
pub struct SyncTables {
	pub listing: String,
	pub submissions: String,
}

impl Default for SyncTables {
	fn default() -> Self {
		Self {
			listing: "Listing".to_string(),
			submissions: "Registration Form Responses".to_string(),
		}
	}
}

pub struct SyncEngine<S> {
	store: Arc<S>,
	tables: SyncTables,
}

impl<S: TabularStore> SyncEngine<S> {
	pub fn new(store: Arc<S>, tables: SyncTables) -> Self {
		Self { store, tables }
	}

	/// Run exactly one reconciliation pass and return the merged snapshot.
	///
	/// Idempotent: running it again with no new submissions rewrites the
	/// same roster.
	pub async fn run_once(&self) -> Result<Snapshot, SyncError> {
		let listing = self.tables.listing.as_str();
		let submissions = self.tables.submissions.as_str();

		// Read phase: nothing is mutated until both tables decode cleanly.
		let listing_raw = self.store.read_all(listing).await?;
		let watermark_raw = self.store.read_cell(listing, codec::WATERMARK_CELL).await?;
		let watermark = codec::parse_timestamp(&watermark_raw).map_err(|source| {
			SyncError::Watermark {
				value: watermark_raw.clone(),
				source,
			}
		})?;

		let listing_body = listing_raw.get(1..).unwrap_or_default();
		let canonical = codec::decode_listing(listing_body, watermark)?;

		let form_raw = self.store.read_all(submissions).await?;
		let form_body = form_raw.get(1..).unwrap_or_default();
		let batch = codec::decode_submissions(form_body)?;

		debug!(
			canonical = canonical.len(),
			submissions = batch.len(),
			"decoded worksheets"
		);

		let previous_rows = canonical.len();
		let merged = merge(canonical, batch, watermark);

		// Write phase: listing body first, watermark strictly last.
		let records: Vec<_> = merged.values().cloned().collect();
		let rows = codec::encode_listing(&records);
		let row_count = rows.len();
		if row_count > 0 {
			self.store
				.write_range(
					listing,
					&store::body_range(codec::LISTING_WIDTH, 2, row_count + 1),
					rows,
				)
				.await?;
		}

		if row_count < previous_rows {
			// Leftover tail rows would decode as phantom records on the
			// next pass; cut them off.
			self.store
				.delete_rows(listing, row_count + 2, previous_rows - row_count)
				.await?;
		}

		// Consumed submissions: the store requires one data row to exist
		// structurally, so delete down to a single row and blank it.
		let form_data_rows = form_body.len();
		if form_data_rows > 1 {
			self.store
				.delete_rows(submissions, 3, form_data_rows - 1)
				.await?;
		}
		self.store.clear_from(submissions, "A2").await?;

		let synced_at = Utc::now();
		self.store
			.write_cell(
				listing,
				codec::WATERMARK_CELL,
				&codec::format_timestamp(synced_at),
			)
			.await?;

		info!(records = merged.len(), "reconciliation pass complete");
		Ok(Snapshot::new(merged, synced_at))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::infra::store::{Grid, MemoryStore};
	use async_trait::async_trait;
	use chrono::DateTime;
	use pretty_assertions::assert_eq;
	use tokio::sync::Mutex;

	const T0: &str = "1/1/2026 00:00:00";
	const T1: &str = "1/2/2026 10:30:00";

	fn ts(value: &str) -> DateTime<Utc> {
		codec::parse_timestamp(value).unwrap()
	}

	/// Listing header row with the watermark parked in S1
	fn listing_header(watermark: &str) -> Vec<String> {
		let mut row: Vec<String> = (0..codec::LISTING_WIDTH).map(|i| format!("h{i}")).collect();
		row.extend([String::new(), String::new(), String::new()]);
		row.push(watermark.to_string());
		row
	}

	fn listing_row(identity: &str, role: &str) -> Vec<String> {
		let mut row = vec![
			identity.to_string(),
			"Harpers".to_string(),
			role.to_string(),
			"song".to_string(),
			String::new(),
			String::new(),
			String::new(),
			String::new(),
		];
		row.extend((0..7).map(|_| String::new()));
		row
	}

	fn submission_row(stamp: &str, identity: &str, role: &str) -> Vec<String> {
		let mut row = vec![
			stamp.to_string(),
			identity.to_string(),
			role.to_string(),
			"song, lore".to_string(),
		];
		row.extend((0..7).map(|_| String::new()));
		row.push("Harpers".to_string());
		row
	}

	fn form_header() -> Vec<String> {
		(0..codec::SUBMISSION_WIDTH).map(|i| format!("h{i}")).collect()
	}

	async fn seed(store: &MemoryStore, listing_rows: Grid, form_rows: Grid) {
		let mut listing = vec![listing_header(T0)];
		listing.extend(listing_rows);
		store.insert_table("Listing", listing).await;

		let mut form = vec![form_header()];
		form.extend(form_rows);
		store
			.insert_table("Registration Form Responses", form)
			.await;
	}

	fn engine(store: Arc<MemoryStore>) -> SyncEngine<MemoryStore> {
		SyncEngine::new(store, SyncTables::default())
	}

	#[tokio::test]
	async fn test_fresher_submission_overwrites_listing() {
		let store = Arc::new(MemoryStore::new());
		seed(
			&store,
			vec![listing_row("Amy", "Mentor")],
			vec![submission_row(T1, "amy", "Student")],
		)
		.await;

		let snapshot = engine(store.clone()).run_once().await.unwrap();

		// One record, keyed by the normalized identity, with the
		// submission's role.
		assert_eq!(snapshot.len(), 1);
		assert_eq!(snapshot.get("Amy").unwrap().role, "Student");

		// Listing row count unchanged: header plus one data row.
		let listing = store.table("Listing").await.unwrap();
		assert_eq!(listing.len(), 2);
		assert_eq!(listing[1][0], "Amy");
		assert_eq!(listing[1][2], "Student");

		// Form cleared down to a single blank data row.
		let form = store.table("Registration Form Responses").await.unwrap();
		assert_eq!(form.len(), 2);
		assert!(form[1].iter().all(String::is_empty));

		// New watermark advanced past the submission time.
		let stamp = store.read_cell("Listing", "S1").await.unwrap();
		assert!(codec::parse_timestamp(&stamp).unwrap() > ts(T1));
		assert_eq!(stamp, codec::format_timestamp(snapshot.synced_at));
	}

	#[tokio::test]
	async fn test_stale_submission_is_discarded() {
		let store = Arc::new(MemoryStore::new());
		// Submission predates the watermark in S1.
		seed(
			&store,
			vec![listing_row("Amy", "Mentor")],
			vec![submission_row("12/31/2025 23:00:00", "amy", "Student")],
		)
		.await;

		let snapshot = engine(store.clone()).run_once().await.unwrap();

		assert_eq!(snapshot.get("Amy").unwrap().role, "Mentor");
		// Consumed regardless of the merge outcome.
		let form = store.table("Registration Form Responses").await.unwrap();
		assert!(form[1].iter().all(String::is_empty));
	}

	#[tokio::test]
	async fn test_new_identity_extends_listing() {
		let store = Arc::new(MemoryStore::new());
		seed(
			&store,
			vec![listing_row("Amy", "Mentor")],
			vec![submission_row(T1, "bob", "Student")],
		)
		.await;

		let snapshot = engine(store.clone()).run_once().await.unwrap();

		assert_eq!(snapshot.len(), 2);
		let listing = store.table("Listing").await.unwrap();
		assert_eq!(listing.len(), 3);
		// Identity-sorted body: Amy then Bob.
		assert_eq!(listing[1][0], "Amy");
		assert_eq!(listing[2][0], "Bob");
	}

	#[tokio::test]
	async fn test_surplus_form_rows_are_deleted() {
		let store = Arc::new(MemoryStore::new());
		seed(
			&store,
			vec![listing_row("Amy", "Mentor")],
			vec![
				submission_row(T1, "bob", "Student"),
				submission_row(T1, "cleo", "Student"),
				submission_row(T1, "dana", "Student"),
			],
		)
		.await;

		engine(store.clone()).run_once().await.unwrap();

		let form = store.table("Registration Form Responses").await.unwrap();
		assert_eq!(form.len(), 2);
		assert!(form[1].iter().all(String::is_empty));
	}

	#[tokio::test]
	async fn test_read_phase_failure_leaves_store_untouched() {
		let store = Arc::new(MemoryStore::new());
		seed(
			&store,
			vec![listing_row("Amy", "Mentor")],
			vec![submission_row("not a date", "bob", "Student")],
		)
		.await;
		let before_listing = store.table("Listing").await.unwrap();
		let before_form = store.table("Registration Form Responses").await.unwrap();

		let err = engine(store.clone()).run_once().await.unwrap_err();
		assert!(matches!(err, SyncError::Codec(CodecError::Timestamp { .. })));

		assert_eq!(store.table("Listing").await.unwrap(), before_listing);
		assert_eq!(
			store.table("Registration Form Responses").await.unwrap(),
			before_form
		);
	}

	#[tokio::test]
	async fn test_malformed_listing_row_aborts_pass() {
		let store = Arc::new(MemoryStore::new());
		seed(
			&store,
			vec![listing_row("Amy", "Mentor"), vec!["Bob".to_string()]],
			vec![],
		)
		.await;

		let err = engine(store.clone()).run_once().await.unwrap_err();
		assert!(matches!(
			err,
			SyncError::Codec(CodecError::MalformedRow { row: 1, .. })
		));
	}

	/// Store decorator that records mutating calls in order
	struct RecordingStore {
		inner: MemoryStore,
		ops: Mutex<Vec<String>>,
	}

	impl RecordingStore {
		fn new(inner: MemoryStore) -> Self {
			Self {
				inner,
				ops: Mutex::new(Vec::new()),
			}
		}

		async fn record(&self, op: String) {
			self.ops.lock().await.push(op);
		}
	}

	#[async_trait]
	impl TabularStore for RecordingStore {
		async fn read_all(&self, table: &str) -> Result<Grid, StoreError> {
			self.inner.read_all(table).await
		}

		async fn read_cell(&self, table: &str, cell: &str) -> Result<String, StoreError> {
			self.inner.read_cell(table, cell).await
		}

		async fn write_range(
			&self,
			table: &str,
			range: &str,
			rows: Grid,
		) -> Result<(), StoreError> {
			self.record(format!("write_range {table} {range}")).await;
			self.inner.write_range(table, range, rows).await
		}

		async fn write_cell(&self, table: &str, cell: &str, value: &str) -> Result<(), StoreError> {
			self.record(format!("write_cell {table} {cell}")).await;
			self.inner.write_cell(table, cell, value).await
		}

		async fn delete_rows(
			&self,
			table: &str,
			start: usize,
			count: usize,
		) -> Result<(), StoreError> {
			self.record(format!("delete_rows {table} {start} {count}")).await;
			self.inner.delete_rows(table, start, count).await
		}

		async fn clear_from(&self, table: &str, cell: &str) -> Result<(), StoreError> {
			self.record(format!("clear_from {table} {cell}")).await;
			self.inner.clear_from(table, cell).await
		}
	}

	#[tokio::test]
	async fn test_identity_collapse_prunes_tail_rows() {
		let memory = MemoryStore::new();
		let mut listing = vec![listing_header(T0)];
		// Case variants collapse to one identity on decode, shrinking the
		// merged set below the previous row count.
		listing.push(listing_row("Bob", "Mentor"));
		listing.push(listing_row("BOB", "Mentor"));
		listing.push(listing_row("bob", "Mentor"));
		memory.insert_table("Listing", listing).await;
		memory
			.insert_table("Registration Form Responses", vec![form_header()])
			.await;

		let store = Arc::new(RecordingStore::new(memory));
		let engine = SyncEngine::new(store.clone(), SyncTables::default());
		let snapshot = engine.run_once().await.unwrap();

		assert_eq!(snapshot.len(), 1);
		// One merged row: stale tail starts at table row 3 and is 2 rows long.
		let ops = store.ops.lock().await.clone();
		assert!(ops.contains(&"delete_rows Listing 3 2".to_string()));

		let listing = store.inner.table("Listing").await.unwrap();
		assert_eq!(listing.len(), 2);
		assert_eq!(listing[1][0], "Bob");
	}

	#[tokio::test]
	async fn test_watermark_write_is_last() {
		let memory = MemoryStore::new();
		let mut listing = vec![listing_header(T0)];
		listing.push(listing_row("Amy", "Mentor"));
		memory.insert_table("Listing", listing).await;
		memory
			.insert_table(
				"Registration Form Responses",
				vec![form_header(), submission_row(T1, "bob", "Student")],
			)
			.await;

		let store = Arc::new(RecordingStore::new(memory));
		let engine = SyncEngine::new(store.clone(), SyncTables::default());
		engine.run_once().await.unwrap();

		let ops = store.ops.lock().await.clone();
		let last = ops.last().unwrap();
		assert_eq!(last, "write_cell Listing S1");
		// Body write precedes the submission clear, which precedes the
		// watermark write.
		let body = ops.iter().position(|op| op.starts_with("write_range Listing")).unwrap();
		let clear = ops
			.iter()
			.position(|op| op.starts_with("clear_from Registration Form Responses"))
			.unwrap();
		assert!(body < clear);
		assert!(clear < ops.len() - 1);
	}
}
