//! Realtime publishing service.
//!
//! On every [`Schedule`] firing the service generates a snapshot, writes its
//! realtime record to disk and announces it on the event bus. The file is
//! replaced atomically so readers never see a partial record.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use crossbeam_channel::{Receiver, after, select};
use tracing::{error, info, warn};

use crate::error::{Result, ServiceError};
use crate::events::{Event, EventBus};
use crate::generator::StatisticsGenerator;
use crate::realtime::marshal;
use crate::schedule::Schedule;
use crate::statistics::Statistics;
use crate::store::ObservationStore;

/// Periodically publishes the realtime record.
#[derive(Debug)]
pub struct RealtimeService<S> {
    generator: StatisticsGenerator<S>,
    schedule: Schedule,
    output_path: PathBuf,
    bus: Option<Arc<EventBus>>,
}

impl<S: ObservationStore> RealtimeService<S> {
    /// Creates a service writing to `output_path` on every `schedule` firing.
    pub fn new<P: Into<PathBuf>>(
        generator: StatisticsGenerator<S>,
        schedule: Schedule,
        output_path: P,
    ) -> Self {
        Self {
            generator,
            schedule,
            output_path: output_path.into(),
            bus: None,
        }
    }

    /// Publishes [`Event::NewStatistics`] on `bus` after each write.
    #[must_use]
    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Path of the realtime record.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Runs one publishing cycle for `now`.
    ///
    /// Returns `Ok(None)` without writing anything when no observation has
    /// been recorded yet.
    ///
    /// # Errors
    ///
    /// Returns a store error if generation fails, or
    /// [`ServiceError::WriteFailed`] if the record cannot be written.
    pub fn run_once<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> Result<Option<Arc<Statistics>>> {
        let stats = match self.generator.generate(now) {
            Ok(stats) => Arc::new(stats),
            Err(e) if e.is_no_observation() => {
                warn!(error = %e, "skipping realtime publish");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        write_atomically(&self.output_path, &marshal(&stats))?;

        if let Some(bus) = &self.bus {
            bus.publish(Event::NewStatistics(Arc::clone(&stats)));
        }

        info!(
            path = %self.output_path.display(),
            at = %stats.timestamp,
            "published realtime record"
        );
        Ok(Some(stats))
    }

    /// Runs cycles on the schedule until `stop` receives a message or
    /// disconnects. Failed cycles are logged and the loop continues.
    pub fn run(&self, stop: &Receiver<()>) {
        info!(
            interval_secs = self.schedule.interval().num_seconds(),
            path = %self.output_path.display(),
            "realtime service started"
        );

        loop {
            let delay = self.schedule.delay_after(&Local::now());

            select! {
                recv(stop) -> _ => break,
                recv(after(delay)) -> _ => {
                    if let Err(e) = self.run_once(&Local::now()) {
                        error!(error = %e, "realtime publish failed");
                    }
                }
            }
        }

        info!("realtime service stopped");
    }
}

/// Writes `bytes` to a sibling temporary file and renames it over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    let tmp = path.with_file_name(name);

    fs::write(&tmp, bytes)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|e| ServiceError::WriteFailed {
            path: path.display().to_string(),
            source: e,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorConfig;
    use crate::meteorology::{SunCalculator, SunError, SunTimes};
    use crate::observation::Observation;
    use crate::store::Store;
    use chrono::Utc;
    use crossbeam_channel::bounded;
    use std::time::Duration;
    use tempfile::tempdir;

    struct Night;

    impl SunCalculator for Night {
        fn sun_times(
            &self,
            _: DateTime<Utc>,
            _: f64,
            _: f64,
        ) -> std::result::Result<SunTimes, SunError> {
            Ok(SunTimes::PolarNight)
        }
    }

    fn service(store: Arc<Store>, path: &Path) -> RealtimeService<Arc<Store>> {
        let generator = StatisticsGenerator::new(store, GeneratorConfig::default())
            .with_sun_calculator(Box::new(Night));
        let schedule = Schedule::every(Duration::from_secs(300)).unwrap();
        RealtimeService::new(generator, schedule, path)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 10, 18, 16, 3, 45).unwrap()
    }

    #[test]
    fn test_run_once_skips_without_observations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("realtime.txt");
        let service = service(Arc::new(Store::in_memory()), &path);

        assert!(service.run_once(&now()).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_run_once_writes_record_and_publishes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("realtime.txt");

        let store = Arc::new(Store::in_memory());
        let mut obs = Observation::new(now() - chrono::TimeDelta::minutes(2));
        obs.temp_outdoor_c = 8.4;
        obs.humidity_outdoor = 84;
        store.insert(obs).unwrap();

        let bus = Arc::new(EventBus::new());
        let rx = bus.subscribe();
        let service = service(store, &path).with_bus(Arc::clone(&bus));

        let stats = service.run_once(&now()).unwrap().unwrap();
        let record = fs::read_to_string(&path).unwrap();
        assert!(record.starts_with("18/10/08 16:03:45 8.4 84 "));
        assert_eq!(record.as_bytes(), marshal(&stats).as_slice());
        assert!(!dir.path().join("realtime.txt.tmp").exists());

        assert_eq!(rx.try_recv().unwrap(), Event::NewStatistics(stats));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("realtime.txt");

        let store = Arc::new(Store::in_memory());
        store.insert(Observation::new(now())).unwrap();

        let err = service(store, &path).run_once(&now()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CirrusError::Service(ServiceError::WriteFailed { .. })
        ));
    }

    #[test]
    fn test_run_stops_on_signal() {
        let dir = tempdir().unwrap();
        let service = service(Arc::new(Store::in_memory()), &dir.path().join("realtime.txt"));
        let (tx, rx) = bounded(1);
        tx.send(()).unwrap();

        std::thread::scope(|s| {
            let handle = s.spawn(|| service.run(&rx));
            handle.join().unwrap();
        });
    }
}
