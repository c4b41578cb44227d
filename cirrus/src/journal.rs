//! Append-only on-disk journal of observations.
//!
//! The journal is the durable half of [`crate::store::Store`]. Every insert
//! appends one fixed-size record and syncs it before returning; on open the
//! file is memory-mapped read-only and replayed into the in-memory index.
//!
//! # File Format
//!
//! ```text
//! [0..16)          Header: magic "CRSJ", version u32, record size u32, reserved u32
//! [16..16+N*152)   Records, little-endian:
//!                    id u64, unix seconds i64, subsecond nanos u32,
//!                    16 x f64 measurements (declaration order of Observation),
//!                    humidity_outdoor u8, humidity_indoor u8, uv_index u8,
//!                    1 byte padding
//! ```
//!
//! A crash mid-append can leave a trailing partial record. Opening the
//! journal truncates it away; whole records are never rewritten.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use chrono::DateTime;
use memmap2::Mmap;
use tracing::{debug, warn};

use crate::error::{CirrusError, JournalError, Result};
use crate::observation::Observation;

/// Magic bytes identifying a cirrus journal file.
const JOURNAL_MAGIC: [u8; 4] = *b"CRSJ";

/// Current journal format version.
const JOURNAL_VERSION: u32 = 1;

/// Size of the journal header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of one encoded observation in bytes.
pub const RECORD_SIZE: usize = 152;

/// An open journal file positioned for appends.
#[derive(Debug)]
pub struct Journal {
    /// The journal file handle.
    file: File,
    /// Path to the journal (for error reporting).
    path: String,
    /// Length of the committed prefix of the file.
    len: u64,
}

impl Journal {
    /// Opens the journal at `path`, creating it if missing, and returns the
    /// observations it already holds in file order.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::Locked`] if another handle already has the
    /// journal open, or another [`JournalError`] if the file cannot be opened
    /// or mapped, or if the header or a record is invalid.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, Vec<Observation>)> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| JournalError::OpenFailed {
                path: path_str.clone(),
                source: e,
            })?;

        // One writer per journal; the lock is released when the file is closed.
        file.try_lock().map_err(|e| match e {
            TryLockError::WouldBlock => CirrusError::from(JournalError::Locked {
                path: path_str.clone(),
            }),
            TryLockError::Error(source) => CirrusError::from(JournalError::OpenFailed {
                path: path_str.clone(),
                source,
            }),
        })?;

        let file_len = file
            .metadata()
            .map_err(|e| JournalError::OpenFailed {
                path: path_str.clone(),
                source: e,
            })?
            .len();

        if file_len == 0 {
            let header = encode_header();
            file.write_all(&header)
                .and_then(|()| file.sync_data())
                .map_err(|e| JournalError::AppendFailed {
                    path: path_str.clone(),
                    offset: 0,
                    source: e,
                })?;
            debug!(path = %path_str, "created observation journal");

            let journal = Self {
                file,
                path: path_str,
                len: HEADER_SIZE as u64,
            };
            return Ok((journal, Vec::new()));
        }

        let (observations, committed_len) = Self::replay(&file, &path_str)?;

        if committed_len < file_len {
            warn!(
                path = %path_str,
                dropped_bytes = file_len - committed_len,
                "truncating partial trailing journal record"
            );
            file.set_len(committed_len)
                .map_err(|e| JournalError::AppendFailed {
                    path: path_str.clone(),
                    offset: committed_len,
                    source: e,
                })?;
        }

        debug!(path = %path_str, records = observations.len(), "replayed observation journal");

        Ok((
            Self {
                file,
                path: path_str,
                len: committed_len,
            },
            observations,
        ))
    }

    /// Decodes every whole record in the file.
    fn replay(file: &File, path: &str) -> Result<(Vec<Observation>, u64)> {
        // SAFETY: The mapping is read-only and dropped before this function
        // returns. The caller holds the exclusive file lock, so no other
        // handle appends or truncates while the journal is being replayed.
        let mmap = unsafe {
            Mmap::map(file).map_err(|e| JournalError::MapFailed {
                path: path.to_string(),
                source: e,
            })?
        };

        if mmap.len() < HEADER_SIZE {
            return Err(JournalError::Corrupted {
                path: path.to_string(),
                reason: format!("file is {} bytes, shorter than the header", mmap.len()),
            }
            .into());
        }

        validate_header(&mmap[..HEADER_SIZE], path)?;

        let body = &mmap[HEADER_SIZE..];
        let record_count = body.len() / RECORD_SIZE;
        let mut observations = Vec::with_capacity(record_count);

        for (index, chunk) in body.chunks_exact(RECORD_SIZE).enumerate() {
            let observation = decode_record(chunk).ok_or_else(|| JournalError::Corrupted {
                path: path.to_string(),
                reason: format!("record {index} has an out-of-range timestamp"),
            })?;
            observations.push(observation);
        }

        let committed_len = (HEADER_SIZE + record_count * RECORD_SIZE) as u64;
        Ok((observations, committed_len))
    }

    /// Appends one observation and syncs it to disk.
    ///
    /// On failure the file is truncated back to its previous length so no
    /// partial record remains.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError::AppendFailed`] on I/O failure.
    pub fn append(&mut self, observation: &Observation) -> Result<()> {
        let record = encode_record(observation);
        let offset = self.len;

        let written = self
            .file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.write_all(&record))
            .and_then(|()| self.file.sync_data());

        if let Err(e) = written {
            // Best effort: the original error is the one worth reporting.
            let _ = self.file.set_len(offset);
            return Err(JournalError::AppendFailed {
                path: self.path.clone(),
                offset,
                source: e,
            }
            .into());
        }

        self.len += RECORD_SIZE as u64;
        Ok(())
    }

    /// Number of records committed to the journal.
    pub fn record_count(&self) -> u64 {
        (self.len - HEADER_SIZE as u64) / RECORD_SIZE as u64
    }
}

fn encode_header() -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(&JOURNAL_MAGIC);
    header[4..8].copy_from_slice(&JOURNAL_VERSION.to_le_bytes());
    #[allow(clippy::cast_possible_truncation)] // RECORD_SIZE is a small constant
    let record_size = RECORD_SIZE as u32;
    header[8..12].copy_from_slice(&record_size.to_le_bytes());
    header
}

fn validate_header(header: &[u8], path: &str) -> Result<()> {
    let mut reader = RecordReader::new(header);
    let magic: [u8; 4] = reader.take();
    let version = u32::from_le_bytes(reader.take());
    let record_size = u32::from_le_bytes(reader.take());

    let reason = if magic != JOURNAL_MAGIC {
        format!("invalid magic bytes: expected {JOURNAL_MAGIC:?}, found {magic:?}")
    } else if version != JOURNAL_VERSION {
        format!("unsupported version: expected {JOURNAL_VERSION}, found {version}")
    } else if record_size as usize != RECORD_SIZE {
        format!("record size mismatch: expected {RECORD_SIZE}, found {record_size}")
    } else {
        return Ok(());
    };

    Err(JournalError::Corrupted {
        path: path.to_string(),
        reason,
    }
    .into())
}

/// Encodes an observation into its fixed-size record.
pub fn encode_record(observation: &Observation) -> [u8; RECORD_SIZE] {
    let mut record = [0u8; RECORD_SIZE];
    let mut pos = 0;
    let mut put = |bytes: &[u8]| {
        record[pos..pos + bytes.len()].copy_from_slice(bytes);
        pos += bytes.len();
    };

    put(&observation.id.to_le_bytes());
    put(&observation.timestamp.timestamp().to_le_bytes());
    put(&observation.timestamp.timestamp_subsec_nanos().to_le_bytes());
    for value in measurements(observation) {
        put(&value.to_le_bytes());
    }
    put(&[
        observation.humidity_outdoor,
        observation.humidity_indoor,
        observation.uv_index,
    ]);

    record
}

/// Decodes a record produced by [`encode_record`].
///
/// Returns `None` if the stored timestamp is out of range.
pub fn decode_record(bytes: &[u8]) -> Option<Observation> {
    let mut reader = RecordReader::new(bytes);

    let id = u64::from_le_bytes(reader.take());
    let secs = i64::from_le_bytes(reader.take());
    let nanos = u32::from_le_bytes(reader.take());
    let timestamp = DateTime::from_timestamp(secs, nanos)?;

    let mut f = || f64::from_le_bytes(reader.take());
    let mut observation = Observation::new(timestamp);
    observation.id = id;
    observation.barometric_abs_hpa = f();
    observation.barometric_rel_hpa = f();
    observation.hourly_rain_mm = f();
    observation.daily_rain_mm = f();
    observation.weekly_rain_mm = f();
    observation.monthly_rain_mm = f();
    observation.total_rain_mm = f();
    observation.event_rain_mm = f();
    observation.rain_rate_mm = f();
    observation.wind_dir_deg = f();
    observation.wind_gust_kph = f();
    observation.wind_speed_kph = f();
    observation.max_daily_gust_kph = f();
    observation.solar_radiation_wm2 = f();
    observation.temp_outdoor_c = f();
    observation.temp_indoor_c = f();

    let [humidity_outdoor, humidity_indoor, uv_index] = reader.take();
    observation.humidity_outdoor = humidity_outdoor;
    observation.humidity_indoor = humidity_indoor;
    observation.uv_index = uv_index;

    Some(observation)
}

/// The f64 fields of an observation in record order.
fn measurements(o: &Observation) -> [f64; 16] {
    [
        o.barometric_abs_hpa,
        o.barometric_rel_hpa,
        o.hourly_rain_mm,
        o.daily_rain_mm,
        o.weekly_rain_mm,
        o.monthly_rain_mm,
        o.total_rain_mm,
        o.event_rain_mm,
        o.rain_rate_mm,
        o.wind_dir_deg,
        o.wind_gust_kph,
        o.wind_speed_kph,
        o.max_daily_gust_kph,
        o.solar_radiation_wm2,
        o.temp_outdoor_c,
        o.temp_indoor_c,
    ]
}

/// Sequential fixed-width reader over a record slice.
struct RecordReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Reads the next `N` bytes. Callers size the input slice to the layout.
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }
}
