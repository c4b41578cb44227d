//! Windowed queries over a timestamp-ordered slice of observations.
//!
//! These functions are the read path of the store: every
//! [`crate::store::ObservationView`] operation is a thin call into this
//! module over the snapshot it holds. Keeping them free functions over
//! `&[Observation]` lets the windowing semantics be tested without a store.
//!
//! All functions require `rows` to be sorted by ascending timestamp. Values
//! that are NaN are skipped by every aggregate.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::observation::{Column, Observation};
use crate::window::Window;

/// Which end of a column's range to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extremum {
    /// Smallest value; ties go to the earliest row.
    Min,
    /// Largest value; ties go to the earliest row.
    Max,
}

/// A single column value and the instant it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the value was observed.
    pub timestamp: DateTime<Utc>,
    /// The column value.
    pub value: f64,
}

/// Returns the rows whose timestamps fall inside `window`.
pub fn window_slice<'a>(rows: &'a [Observation], window: &Window) -> &'a [Observation] {
    let lo = rows.partition_point(|row| row.timestamp < window.start);
    let hi = rows.partition_point(|row| row.timestamp < window.end);
    if lo >= hi { &[] } else { &rows[lo..hi] }
}

/// Returns the row with the greatest timestamp at or before `at`.
pub fn last_at_or_before(rows: &[Observation], at: DateTime<Utc>) -> Option<&Observation> {
    let idx = rows.partition_point(|row| row.timestamp <= at);
    idx.checked_sub(1).map(|i| &rows[i])
}

/// Finds the minimum or maximum of `column` inside `window`.
///
/// Rows are visited in timestamp order and only a strictly better value
/// replaces the current best, so equal values resolve to the earliest row.
/// Returns `None` when the window holds no (non-NaN) values.
pub fn extremum(
    rows: &[Observation],
    column: Column,
    kind: Extremum,
    window: &Window,
) -> Option<Sample> {
    let mut best: Option<Sample> = None;

    for row in window_slice(rows, window) {
        let value = column.value(row);
        if value.is_nan() {
            continue;
        }

        let better = match (best, kind) {
            (None, _) => true,
            (Some(current), Extremum::Max) => value > current.value,
            (Some(current), Extremum::Min) => value < current.value,
        };

        if better {
            best = Some(Sample {
                timestamp: row.timestamp,
                value,
            });
        }
    }

    best
}

/// Arithmetic mean of `column` inside `window`, or `0.0` if it is empty.
pub fn average(rows: &[Observation], column: Column, window: &Window) -> f64 {
    let (sum, count) = window_slice(rows, window)
        .iter()
        .map(|row| column.value(row))
        .filter(|value| !value.is_nan())
        .fold((0.0, 0u32), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// `(seconds since window start, value)` pairs in timestamp order.
pub fn paired_series(rows: &[Observation], column: Column, window: &Window) -> Vec<(f64, f64)> {
    window_slice(rows, window)
        .iter()
        .filter_map(|row| {
            let value = column.value(row);
            (!value.is_nan()).then(|| (seconds(row.timestamp - window.start), value))
        })
        .collect()
}

/// Time-weighted sum of `column` over consecutive rows inside `window`.
///
/// Walking the rows newest first, each row contributes its value multiplied
/// by the seconds elapsed since the next older row. The oldest row has no
/// predecessor and contributes nothing. The result is in column units times
/// seconds.
pub fn delta_weighted_sum(rows: &[Observation], column: Column, window: &Window) -> f64 {
    window_slice(rows, window)
        .windows(2)
        .map(|pair| {
            let (older, newer) = (&pair[0], &pair[1]);
            let value = column.value(newer);
            if value.is_nan() {
                0.0
            } else {
                seconds(newer.timestamp - older.timestamp) * value
            }
        })
        .sum()
}

/// Ordinary least-squares slope of `y` against `x`.
///
/// Returns `None` for fewer than two points or when every `x` is equal.
pub fn least_squares_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)] // point counts are far below 2^52
    let n = points.len() as f64;
    let x_bar = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_bar = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (covariance, variance) = points.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
        let dx = x - x_bar;
        (cov + dx * (y - y_bar), var + dx * dx)
    });

    if variance == 0.0 {
        None
    } else {
        Some(covariance / variance)
    }
}

/// Converts a time delta to fractional seconds.
pub(crate) fn seconds(delta: TimeDelta) -> f64 {
    #[allow(clippy::cast_precision_loss)] // millisecond deltas within a day are exact
    let millis = delta.num_milliseconds() as f64;
    millis / 1000.0
}
