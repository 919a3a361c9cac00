//! Periodic roster sync service
//!
//! Drives the sync engine on a fixed cadence from a dedicated task and
//! publishes the latest merged snapshot for the interactive path. Passes
//! are strictly serial: a manual trigger racing the scheduled tick waits on
//! the pass lock instead of interleaving store reads and writes. A failing
//! pass is logged and swallowed - the loop keeps its cadence and the
//! published snapshot stays at the last known good roster.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::domain::Snapshot;
use crate::infra::store::TabularStore;
use crate::sync::engine::{SyncEngine, SyncError};

/// Upper bound on store-bound work in flight at once. Passes themselves are
/// serialized by the pass lock; the slots bound whatever else borrows the
/// store through this service.
const STORE_IO_SLOTS: usize = 3;

#[derive(Debug, Clone)]
pub struct SyncServiceConfig {
	/// Time between scheduled passes
	pub interval: Duration,
}

impl Default for SyncServiceConfig {
	fn default() -> Self {
		Self {
			interval: Duration::from_secs(60),
		}
	}
}

pub struct SyncService<S> {
	engine: SyncEngine<S>,
	config: SyncServiceConfig,
	/// Latest successful snapshot, swapped whole on publish
	snapshot: RwLock<Option<Arc<Snapshot>>>,
	/// Guards the read-canonical -> write-canonical critical section
	pass_lock: Mutex<()>,
	io_slots: Semaphore,
	shutdown: Notify,
}

impl<S: TabularStore + 'static> SyncService<S> {
	pub fn new(engine: SyncEngine<S>, config: SyncServiceConfig) -> Arc<Self> {
		Arc::new(Self {
			engine,
			config,
			snapshot: RwLock::new(None),
			pass_lock: Mutex::new(()),
			io_slots: Semaphore::new(STORE_IO_SLOTS),
			shutdown: Notify::new(),
		})
	}

	/// Latest successfully merged snapshot, if any pass has completed.
	///
	/// Readers get an immutable handle to a complete roster, never a view
	/// into an in-progress pass.
	pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
		self.snapshot.read().await.clone()
	}

	/// Run one pass now, waiting for any in-flight pass to finish first.
	pub async fn trigger(&self) -> Result<Arc<Snapshot>, SyncError> {
		let _pass = self.pass_lock.lock().await;
		let _slot = self
			.io_slots
			.acquire()
			.await
			.expect("store I/O semaphore is never closed");

		let snapshot = Arc::new(self.engine.run_once().await?);
		*self.snapshot.write().await = Some(snapshot.clone());
		Ok(snapshot)
	}

	/// Spawn the periodic loop.
	///
	/// The first pass runs immediately, then one per configured interval.
	/// The loop only exits via [`stop`](Self::stop); a bad pass never
	/// terminates it.
	pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
		let service = self.clone();
		tokio::spawn(async move {
			info!(
				interval_secs = service.config.interval.as_secs(),
				"starting roster sync loop"
			);
			let mut interval = tokio::time::interval(service.config.interval);
			interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				tokio::select! {
					_ = service.shutdown.notified() => {
						info!("roster sync loop stopped");
						break;
					}
					_ = interval.tick() => {
						match service.trigger().await {
							Ok(snapshot) => {
								info!(records = snapshot.len(), "sync pass published");
							}
							Err(e) => {
								warn!(error = %e, "sync pass failed, keeping previous snapshot");
							}
						}
					}
				}
			}
		})
	}

	/// Stop the loop. An in-flight pass is abandoned with the process, not
	/// drained.
	pub fn stop(&self) {
		self.shutdown.notify_waiters();
	}
}
