//! Integration tests for the config -> store -> generator -> realtime record path.

use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use cirrus::meteorology::{SunCalculator, SunError, SunTimes};
use cirrus::realtime::{FIELD_COUNT, marshal};
use cirrus::{
    Config, Event, EventBus, Observation, ObservationStore, OnBadLine, RealtimeService,
    StatisticsGenerator, Store, ingest_lines,
};
use tempfile::tempdir;

struct AlwaysUp;

impl SunCalculator for AlwaysUp {
    fn sun_times(&self, _: DateTime<Utc>, _: f64, _: f64) -> Result<SunTimes, SunError> {
        Ok(SunTimes::PolarDay)
    }
}

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2008, 10, 18, h, m, s).unwrap()
}

fn observation(timestamp: DateTime<Utc>, temp: f64, gust: f64, pressure: f64) -> Observation {
    let mut obs = Observation::new(timestamp);
    obs.temp_outdoor_c = temp;
    obs.humidity_outdoor = 84;
    obs.wind_speed_kph = 33.0;
    obs.wind_gust_kph = gust;
    obs.wind_dir_deg = 261.0;
    obs.barometric_abs_hpa = pressure - 25.0;
    obs.barometric_rel_hpa = pressure;
    obs.daily_rain_mm = 1.0;
    obs.monthly_rain_mm = 85.2;
    obs.total_rain_mm = 588.4;
    obs.temp_indoor_c = 20.3;
    obs.humidity_indoor = 57;
    obs
}

fn fields(record: &[u8]) -> Vec<String> {
    std::str::from_utf8(record)
        .unwrap()
        .split(' ')
        .map(str::to_string)
        .collect()
}

#[test]
fn test_configured_pipeline_writes_record() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("cirrus.toml");
    let store_path = temp_dir.path().join("weather");
    let output_path = temp_dir.path().join("realtime.txt");

    fs::write(
        &config_path,
        format!(
            r#"
database_path = "{}"

[location]
latitude = 51.48
longitude = 0.0

[reporting]
barometric_measurement = "relative"
cloud_base_units = "ft"
version = "1.9.4"
build_number = 1099

[realtime]
interval_secs = 60
output_path = "{}"
"#,
            store_path.display(),
            output_path.display()
        ),
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    let store = Arc::new(Store::open(&config.database_path).unwrap());
    store.insert(observation(at(12, 0, 20), 10.9, 25.0, 1023.9)).unwrap();
    store.insert(observation(at(14, 41, 30), 7.8, 44.0, 1023.4)).unwrap();
    store.insert(observation(at(16, 1, 12), 8.4, 34.0, 1024.8)).unwrap();

    let generator = StatisticsGenerator::new(Arc::clone(&store), config.generator_config())
        .with_sun_calculator(Box::new(AlwaysUp));
    let bus = Arc::new(EventBus::new());
    let events = bus.subscribe();
    let service = RealtimeService::new(
        generator,
        config.schedule().unwrap(),
        &config.realtime.output_path,
    )
    .with_bus(Arc::clone(&bus));

    let stats = service.run_once(&at(16, 3, 45)).unwrap().unwrap();
    let record = fs::read(service.output_path()).unwrap();
    assert_eq!(record, marshal(&stats));

    let f = fields(&record);
    assert_eq!(f.len(), FIELD_COUNT);
    assert_eq!(f[0], "18/10/08");
    assert_eq!(f[1], "16:03:45");
    assert_eq!(f[2], "8.4");
    assert_eq!(f[3], "84");
    assert_eq!(f[7], "261");
    assert_eq!(f[10], "1024.8");
    assert_eq!(f[11], "W");
    assert_eq!(f[13..17], ["km/h", "C", "hPa", "mm"]);
    assert_eq!(f[26], "10.9");
    assert_eq!(f[27], "12:00");
    assert_eq!(f[28], "7.8");
    assert_eq!(f[29], "14:41");
    assert_eq!(f[32], "44.0");
    assert_eq!(f[33], "14:41");
    assert_eq!(f[34], "1024.8");
    assert_eq!(f[35], "16:01");
    assert_eq!(f[36], "1023.4");
    assert_eq!(f[37], "14:41");
    assert_eq!(f[38], "1.9.4");
    assert_eq!(f[39], "1099");
    assert_eq!(f[49], "1");
    assert_eq!(f[50], "0");
    assert_eq!(f[53], "ft");

    assert_eq!(events.try_recv().unwrap(), Event::NewStatistics(stats));
}

#[test]
fn test_record_reflects_reopened_store() {
    let temp_dir = tempdir().unwrap();
    let store_path = temp_dir.path().join("weather");

    {
        let store = Store::open(&store_path).unwrap();
        store.insert(observation(at(15, 50, 0), 8.1, 30.0, 1024.5)).unwrap();
        store.insert(observation(at(16, 1, 12), 8.4, 34.0, 1024.8)).unwrap();
    }

    let config = Config::default();
    let store = Arc::new(Store::open(&store_path).unwrap());
    let generator = StatisticsGenerator::new(store, config.generator_config())
        .with_sun_calculator(Box::new(AlwaysUp));

    let first = marshal(&generator.generate(&at(16, 3, 45)).unwrap());
    let second = marshal(&generator.generate(&at(16, 3, 45)).unwrap());
    assert_eq!(first, second);

    let f = fields(&first);
    assert_eq!(f.len(), FIELD_COUNT);
    // Absolute pressure is the default barometer.
    assert_eq!(f[10], "999.8");
    assert_eq!(f[40], "34.0");
    assert_eq!(f[53], "m");
    assert!(!first.ends_with(b" "));
}

#[test]
fn test_stale_station_sets_contact_lost_flag() {
    let store = Arc::new(Store::in_memory());
    store.insert(observation(at(12, 0, 0), 8.4, 20.0, 1024.8)).unwrap();

    let generator = StatisticsGenerator::new(store, Config::default().generator_config())
        .with_sun_calculator(Box::new(AlwaysUp));
    let record = marshal(&generator.generate(&at(16, 3, 45)).unwrap());

    let f = fields(&record);
    assert_eq!(f[50], "1");
    // Ten-minute window is empty.
    assert_eq!(f[40], "0.0");
}

#[test]
fn test_lines_fed_to_running_store_reach_the_record() {
    let temp_dir = tempdir().unwrap();
    let output_path = temp_dir.path().join("realtime.txt");
    let store = Arc::new(Store::open(temp_dir.path().join("weather")).unwrap());
    store.insert(observation(at(15, 50, 0), 8.1, 30.0, 1024.5)).unwrap();

    let config = Config::default();
    let generator = StatisticsGenerator::new(Arc::clone(&store), config.generator_config())
        .with_sun_calculator(Box::new(AlwaysUp));
    let service = RealtimeService::new(generator, config.schedule().unwrap(), &output_path);

    let before = fields(&marshal(&service.run_once(&at(16, 3, 45)).unwrap().unwrap()));
    assert_eq!(before[2], "8.1");

    let feed = format!(
        "{}\nnot an observation\n",
        serde_json::to_string(&observation(at(16, 2, 0), 9.6, 41.0, 1024.9)).unwrap()
    );
    let writer = {
        let store = Arc::clone(&store);
        std::thread::spawn(move || ingest_lines(&*store, Cursor::new(feed), OnBadLine::Skip))
    };
    let summary = writer.join().unwrap().unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.skipped, 1);

    let after = service.run_once(&at(16, 3, 45)).unwrap().unwrap();
    let record = fs::read(&output_path).unwrap();
    assert_eq!(record, marshal(&after));
    let f = fields(&record);
    assert_eq!(f[2], "9.6");
    assert_eq!(f[10], "999.9");
}
