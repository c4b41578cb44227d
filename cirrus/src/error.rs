//! Error types for the cirrus weather statistics engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The main error type for all cirrus operations.
///
/// This enum covers every failure that can surface from the store, the
/// journal, statistics generation, configuration loading and the realtime
/// service loop.
#[derive(Error, Debug)]
pub enum CirrusError {
    /// Error opening or querying the observation store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error reading or appending the on-disk journal.
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    /// Error while generating a statistics snapshot.
    #[error("generate error: {0}")]
    Generate(#[from] GenerateError),

    /// Error loading or validating configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error in the realtime publishing service.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Error reading observations from a JSON lines source.
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
}

/// Errors that can occur when opening or using a store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store directory could not be created or accessed.
    #[error("failed to access store directory '{path}': {source}")]
    DirectoryAccess {
        /// The path that could not be accessed.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors that can occur during journal I/O.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Failed to open or create the journal file.
    #[error("failed to open journal '{path}': {source}")]
    OpenFailed {
        /// The journal file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to append a record to the journal.
    #[error("failed to append to journal '{path}' at offset {offset}: {source}")]
    AppendFailed {
        /// The journal file path.
        path: String,
        /// The byte offset where the append started.
        offset: u64,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Another process already holds the journal open.
    #[error("journal '{path}' is in use by another process")]
    Locked {
        /// The journal file path.
        path: String,
    },

    /// Failed to memory-map the journal for replay.
    #[error("failed to map journal '{path}': {source}")]
    MapFailed {
        /// The journal file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The journal header or a record is invalid.
    #[error("journal '{path}' is corrupted: {reason}")]
    Corrupted {
        /// The journal file path.
        path: String,
        /// Description of the corruption.
        reason: String,
    },
}

/// Errors that can occur while ingesting JSON lines.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The source could not be read.
    #[error("failed to read observations: {source}")]
    Read {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line is not a valid observation.
    #[error("line {line}: {source}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while generating statistics.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// No observation exists at or before the requested instant.
    ///
    /// Callers should skip publishing for this cycle.
    #[error("no observation recorded at or before {at}")]
    NoObservation {
        /// The instant statistics were requested for.
        at: DateTime<Utc>,
    },
}

/// Errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Read {
        /// The config file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected schema.
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        /// The config file path.
        path: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A configuration value is out of range or malformed.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// The offending key.
        key: &'static str,
        /// Why the value is invalid.
        reason: String,
    },
}

/// Errors that can occur in the realtime publishing service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Failed to write the realtime record to disk.
    #[error("failed to write realtime record to '{path}': {source}")]
    WriteFailed {
        /// The output path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl CirrusError {
    /// Returns `true` if this error means no data has been recorded yet.
    pub fn is_no_observation(&self) -> bool {
        matches!(self, Self::Generate(GenerateError::NoObservation { .. }))
    }
}

/// Type alias for `Result<T, CirrusError>`.
pub type Result<T> = std::result::Result<T, CirrusError>;
