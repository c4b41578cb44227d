//! Store module for the cirrus observation log.
//!
//! This module provides the store contract the statistics generator reads
//! through, and the shipped implementation backed by an in-memory index and
//! an optional on-disk journal.
//!
//! # Design
//!
//! - [`ObservationStore`] is the write side plus [`ObservationStore::view`].
//! - [`ObservationView`] answers every windowed query against one consistent
//!   snapshot. A view of [`Store`] holds the index read lock, so inserts
//!   that arrive while a view is alive wait until it is dropped.
//! - Writers are serialized by the journal lock. The index write lock is
//!   only taken after the record is durable, so readers never wait on disk.
//!
//! # File Layout
//!
//! ```text
//! store_dir/
//! └── observations.journal    <- Append-only observation records
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use chrono::{TimeDelta, Utc};
//! use cirrus::observation::{Column, Observation};
//! use cirrus::store::{ObservationStore, ObservationView, Store};
//! use cirrus::window::Window;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::open("./weather")?;
//!
//! let mut reading = Observation::new(Utc::now());
//! reading.temp_outdoor_c = 13.7;
//! let stored = store.insert(reading)?;
//! assert!(stored.id > 0);
//!
//! let view = store.view()?;
//! let hour = Window::trailing(&Utc::now(), TimeDelta::hours(1));
//! let mean = view.average(Column::TempOutdoor, &hour)?;
//! # let _ = mean;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::events::{Event, EventBus};
use crate::journal::Journal;
use crate::observation::{Column, Observation};
use crate::query::{self, Extremum, Sample};
use crate::window::Window;

/// Name of the journal file in the store directory.
const JOURNAL_FILE: &str = "observations.journal";

/// Read operations over one consistent snapshot of stored observations.
///
/// Every method sees the same set of rows for the lifetime of the view.
pub trait ObservationView {
    /// Row with the greatest timestamp at or before `at`.
    fn last_at_or_before(&self, at: DateTime<Utc>) -> Result<Option<Observation>>;

    /// Minimum or maximum of `column` inside `window`, or `None` if empty.
    fn extremum(&self, column: Column, kind: Extremum, window: &Window) -> Result<Option<Sample>>;

    /// Arithmetic mean of `column` inside `window`; `0.0` when empty.
    fn average(&self, column: Column, window: &Window) -> Result<f64>;

    /// `(seconds since window start, value)` pairs in timestamp order.
    fn paired_series(&self, column: Column, window: &Window) -> Result<Vec<(f64, f64)>>;

    /// Sum of value times seconds since the previous row, in column units
    /// times seconds.
    fn delta_weighted_sum(&self, column: Column, window: &Window) -> Result<f64>;
}

/// A durable, timestamp-indexed log of observations.
pub trait ObservationStore {
    /// Snapshot type returned by [`ObservationStore::view`].
    type View<'a>: ObservationView
    where
        Self: 'a;

    /// Assigns an id, commits the observation and returns the stored row.
    ///
    /// # Errors
    ///
    /// Fails if the observation cannot be made durable. Values are stored
    /// as reported; a failed insert leaves no partial row behind.
    fn insert(&self, observation: Observation) -> Result<Observation>;

    /// Opens a consistent read snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the store can no longer be read.
    fn view(&self) -> Result<Self::View<'_>>;
}

impl<S: ObservationStore> ObservationStore for Arc<S> {
    type View<'a>
        = S::View<'a>
    where
        Self: 'a;

    fn insert(&self, observation: Observation) -> Result<Observation> {
        (**self).insert(observation)
    }

    fn view(&self) -> Result<Self::View<'_>> {
        (**self).view()
    }
}

/// The shipped observation store.
///
/// # Thread Safety
///
/// `Store` is `Send + Sync`. Share it behind an [`Arc`] between the
/// ingestion path and the statistics service.
#[derive(Debug)]
pub struct Store {
    /// Store directory, `None` for in-memory stores.
    path: Option<PathBuf>,
    /// Observations sorted by `(timestamp, id)`.
    rows: RwLock<Vec<Observation>>,
    /// Next id to hand out. An insert whose journal append fails still
    /// consumes its id.
    next_id: AtomicU64,
    /// Durable log; its lock also serializes writers.
    journal: Mutex<Option<Journal>>,
    /// Optional bus notified after each committed insert.
    bus: Option<Arc<EventBus>>,
}

impl Store {
    /// Creates a store that keeps observations in memory only.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            rows: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            journal: Mutex::new(None),
            bus: None,
        }
    }

    /// Creates a new store or opens an existing one in `path`.
    ///
    /// The directory is created if needed. An existing journal is replayed
    /// into memory; a torn trailing record is truncated away.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DirectoryAccess`] if the directory cannot be
    /// created, [`crate::error::JournalError::Locked`] if another `Store`
    /// already has the directory open, or a journal error if the journal
    /// cannot be opened or is corrupted.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        fs::create_dir_all(path).map_err(|e| StoreError::DirectoryAccess {
            path: path.display().to_string(),
            source: e,
        })?;

        let (journal, mut rows) = Journal::open(path.join(JOURNAL_FILE))?;
        rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        let next_id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;

        info!(path = %path.display(), observations = rows.len(), "opened store");

        Ok(Self {
            path: Some(path.to_path_buf()),
            rows: RwLock::new(rows),
            next_id: AtomicU64::new(next_id),
            journal: Mutex::new(Some(journal)),
            bus: None,
        })
    }

    /// Publishes [`Event::NewObservation`] on `bus` after every committed insert.
    #[must_use]
    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Returns the store directory, if the store is persistent.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the number of stored observations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked.
    pub fn len(&self) -> Result<usize> {
        Ok(self.rows.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    /// Returns `true` if no observation has been stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ObservationStore for Store {
    type View<'a> = StoreView<'a>;

    fn insert(&self, mut observation: Observation) -> Result<Observation> {
        let mut journal = self.journal.lock().map_err(|_| StoreError::Poisoned)?;

        observation.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Some(journal) = journal.as_mut() {
            journal.append(&observation)?;
        }

        {
            let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
            let pos = rows.partition_point(|row| row.timestamp <= observation.timestamp);
            rows.insert(pos, observation.clone());
        }
        drop(journal);

        debug!(id = observation.id, timestamp = %observation.timestamp, "inserted observation");

        if let Some(bus) = &self.bus {
            bus.publish(Event::NewObservation(observation.clone()));
        }

        Ok(observation)
    }

    fn view(&self) -> Result<StoreView<'_>> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(StoreView { rows })
    }
}

/// Read snapshot of a [`Store`]; holds the index read lock until dropped.
#[derive(Debug)]
pub struct StoreView<'a> {
    rows: RwLockReadGuard<'a, Vec<Observation>>,
}

impl StoreView<'_> {
    /// Number of observations visible in this snapshot.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the snapshot holds no observations.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ObservationView for StoreView<'_> {
    fn last_at_or_before(&self, at: DateTime<Utc>) -> Result<Option<Observation>> {
        Ok(query::last_at_or_before(&self.rows, at).cloned())
    }

    fn extremum(&self, column: Column, kind: Extremum, window: &Window) -> Result<Option<Sample>> {
        Ok(query::extremum(&self.rows, column, kind, window))
    }

    fn average(&self, column: Column, window: &Window) -> Result<f64> {
        Ok(query::average(&self.rows, column, window))
    }

    fn paired_series(&self, column: Column, window: &Window) -> Result<Vec<(f64, f64)>> {
        Ok(query::paired_series(&self.rows, column, window))
    }

    fn delta_weighted_sum(&self, column: Column, window: &Window) -> Result<f64> {
        Ok(query::delta_weighted_sum(&self.rows, column, window))
    }
}
