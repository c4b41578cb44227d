//! # cirrus
//!
//! Weather station observation log and realtime statistics engine.
//!
//! cirrus stores timestamped sensor readings from a weather station and, on
//! its own cadence, derives a snapshot of meteorological statistics (daily
//! extremes, trends, comfort indices, daylight) which it encodes as the
//! fixed-format realtime text record read by weather display software.
//!
//! ## Key Properties
//!
//! - Append-only, fsynced journal replayed into a sorted in-memory index
//! - Half-open windowed queries with local-calendar boundaries
//! - Every snapshot is computed from one consistent view of the store
//! - Byte-identical realtime records for equal snapshots
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use cirrus::{GeneratorConfig, Observation, ObservationStore, StatisticsGenerator, Store};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::open("./weather")?;
//!
//! let mut reading = Observation::new(Utc::now());
//! reading.temp_outdoor_c = 8.4;
//! reading.humidity_outdoor = 84;
//! store.insert(reading)?;
//!
//! let generator = StatisticsGenerator::new(store, GeneratorConfig::default());
//! let stats = generator.generate(&Utc::now())?;
//! let record = cirrus::realtime::marshal(&stats);
//! println!("{}", String::from_utf8_lossy(&record));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Store`]: Durable observation log behind the [`ObservationStore`] trait
//! - [`StatisticsGenerator`]: Builds a [`Statistics`] snapshot for an instant
//! - [`realtime::marshal`]: Encodes a snapshot as the 59-field record
//! - [`RealtimeService`]: Scheduled generate, write and publish loop
//!
//! ## Modules
//!
//! - [`store`]: Store traits and the journal-backed store
//! - [`journal`]: On-disk record format
//! - [`query`]: Windowed queries over sorted observations
//! - [`window`]: Half-open windows and local calendar boundaries
//! - [`meteorology`]: Dew point, comfort indices, wind and daylight
//! - [`generator`]: Statistics generation
//! - [`ingest`]: Loading observations from JSON lines
//! - [`realtime`]: Realtime record encoding
//! - [`service`], [`schedule`], [`events`]: Publishing loop and notifications
//! - [`config`]: TOML configuration
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod events;
pub mod generator;
pub mod ingest;
pub mod journal;
pub mod meteorology;
pub mod observation;
pub mod query;
pub mod realtime;
pub mod schedule;
pub mod service;
pub mod statistics;
pub mod store;
pub mod window;

// Re-export primary API types at crate root for convenience.
pub use config::Config;
pub use error::{CirrusError, Result};
pub use events::{Event, EventBus};
pub use generator::{BarometricMeasurement, GeneratorConfig, StatisticsGenerator};
pub use ingest::{IngestSummary, OnBadLine, ingest_lines};
pub use observation::{Column, Observation};
pub use service::RealtimeService;
pub use statistics::Statistics;
pub use store::{ObservationStore, ObservationView, Store};
pub use window::Window;
