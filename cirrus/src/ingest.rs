//! Loading observations from JSON lines.
//!
//! Each non-blank line is one serialized [`Observation`]. The stored id is
//! always reassigned by the store, so any `id` in the input is ignored.

use std::io::BufRead;

use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::observation::Observation;
use crate::store::ObservationStore;

/// What to do with a line that does not parse as an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnBadLine {
    /// Stop and return the parse error. Earlier lines stay inserted.
    #[default]
    Abort,
    /// Log a warning and continue with the next line.
    Skip,
}

/// Counts from one ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    /// Observations committed to the store.
    pub inserted: usize,
    /// Lines dropped under [`OnBadLine::Skip`].
    pub skipped: usize,
}

/// Reads observations line by line and inserts each one into `store`.
///
/// Lines are committed as they are read, so a long-lived reader such as
/// stdin feeds the store continuously until it reaches end of input.
///
/// # Errors
///
/// Fails when the reader fails, when an insert fails, or when a line does
/// not parse and `on_bad_line` is [`OnBadLine::Abort`].
pub fn ingest_lines<S, R>(store: &S, reader: R, on_bad_line: OnBadLine) -> Result<IngestSummary>
where
    S: ObservationStore,
    R: BufRead,
{
    let mut summary = IngestSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| IngestError::Read { source })?;
        if line.trim().is_empty() {
            continue;
        }

        let observation: Observation = match serde_json::from_str(&line) {
            Ok(observation) => observation,
            Err(source) => match on_bad_line {
                OnBadLine::Abort => {
                    return Err(IngestError::Parse { line: index + 1, source }.into());
                }
                OnBadLine::Skip => {
                    warn!(line = index + 1, error = %source, "skipping unparseable observation");
                    summary.skipped += 1;
                    continue;
                }
            },
        };

        let stored = store.insert(observation)?;
        debug!(id = stored.id, timestamp = %stored.timestamp, "ingested observation");
        summary.inserted += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::error::CirrusError;
    use crate::store::{ObservationView, Store};

    fn line(minute: u32, temp: f64) -> String {
        let mut obs = Observation::new(Utc.with_ymd_and_hms(2008, 10, 18, 12, minute, 0).unwrap());
        obs.temp_outdoor_c = temp;
        obs.humidity_outdoor = 84;
        serde_json::to_string(&obs).unwrap()
    }

    #[test]
    fn test_ingests_every_line_and_ignores_blanks() {
        let input = format!("{}\n\n{}\n   \n{}\n", line(0, 7.0), line(5, 7.5), line(10, 8.0));
        let store = Store::in_memory();

        let summary = ingest_lines(&store, Cursor::new(input), OnBadLine::Abort).unwrap();
        assert_eq!(summary, IngestSummary { inserted: 3, skipped: 0 });

        let view = store.view().unwrap();
        let latest = view
            .last_at_or_before(Utc.with_ymd_and_hms(2008, 10, 18, 13, 0, 0).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(latest.temp_outdoor_c, 8.0);
        assert_eq!(latest.id, 3);
    }

    #[test]
    fn test_abort_reports_line_number_and_keeps_earlier_rows() {
        let input = format!("{}\n{{not json\n{}\n", line(0, 7.0), line(5, 7.5));
        let store = Store::in_memory();

        let err = ingest_lines(&store, Cursor::new(input), OnBadLine::Abort).unwrap_err();
        assert!(matches!(err, CirrusError::Ingest(IngestError::Parse { line: 2, .. })));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_skip_counts_bad_lines() {
        let input = format!("garbage\n{}\n{{}}\n{}\n", line(0, 7.0), line(5, 7.5));
        let store = Store::in_memory();

        let summary = ingest_lines(&store, Cursor::new(input), OnBadLine::Skip).unwrap();
        assert_eq!(summary, IngestSummary { inserted: 2, skipped: 2 });
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_input_ids_are_replaced() {
        let mut obs: Observation = serde_json::from_str(&line(0, 7.0)).unwrap();
        obs.id = 900;
        let input = serde_json::to_string(&obs).unwrap();
        let store = Store::in_memory();

        ingest_lines(&store, Cursor::new(input), OnBadLine::Abort).unwrap();
        let view = store.view().unwrap();
        let stored = view
            .last_at_or_before(Utc.with_ymd_and_hms(2008, 10, 18, 13, 0, 0).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, 1);
    }
}
