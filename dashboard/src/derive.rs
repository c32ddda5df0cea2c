//! Read-only derivations over a chronologically ordered telemetry sequence.
//!
//! Nothing here performs I/O or mutates its input. Samples whose timestamp
//! did not parse are treated as having no position in time: they never pass
//! a time window and contribute no idle time.

use crate::model::{DoorStatus, Position, TelemetrySample, Timestamp};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Cold-chain cargo band in °C
pub const COLD_CHAIN_MIN_C: f64 = 2.0;
pub const COLD_CHAIN_MAX_C: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorEvent {
    pub timestamp: Timestamp,
    pub status: DoorStatus,
}

/// How a sample is marked on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    DoorOpen,
    Excursion,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedSample {
    pub index: usize,
    pub position: Position,
    pub state: MarkerState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySummary {
    pub sample_count: usize,
    pub latest: Option<TelemetrySample>,
    pub marker: Option<MarkerState>,
    pub idle_minutes: i64,
    pub door_events: Vec<DoorEvent>,
    pub excursions: usize,
}

pub fn latest(sequence: &[TelemetrySample]) -> Option<&TelemetrySample> {
    sequence.last()
}

/// Minutes spent between consecutive samples that both report zero speed,
/// rounded to the nearest minute. Missing speed counts as zero.
pub fn idle_minutes(sequence: &[TelemetrySample]) -> i64 {
    let total: f64 = sequence
        .windows(2)
        .filter(|pair| is_stationary(&pair[0]) && is_stationary(&pair[1]))
        .map(|pair| elapsed_minutes(&pair[0].timestamp, &pair[1].timestamp))
        .sum();
    total.round() as i64
}

fn is_stationary(sample: &TelemetrySample) -> bool {
    sample.speed_kmh.unwrap_or(0.0) == 0.0
}

fn elapsed_minutes(from: &Timestamp, to: &Timestamp) -> f64 {
    match (from.instant(), to.instant()) {
        (Some(from), Some(to)) => (to - from).num_milliseconds() as f64 / 60_000.0,
        _ => 0.0,
    }
}

/// One event per change of door state, carrying the state entered and the
/// timestamp of the sample where it was first seen.
pub fn door_transitions(sequence: &[TelemetrySample]) -> Vec<DoorEvent> {
    sequence
        .windows(2)
        .filter(|pair| pair[0].door_open != pair[1].door_open)
        .map(|pair| DoorEvent {
            timestamp: pair[1].timestamp.clone(),
            status: pair[1].door_status(),
        })
        .collect()
}

/// Samples no older than `hours` before `now`, in their original order.
///
/// A window reaching past the representable time range keeps every sample
/// with a valid timestamp.
pub fn filter_by_window(
    sequence: &[TelemetrySample],
    hours: f64,
    now: DateTime<Utc>,
) -> Vec<TelemetrySample> {
    let cutoff = window_cutoff(hours, now);
    sequence
        .iter()
        .filter(|sample| {
            sample
                .timestamp
                .instant()
                .is_some_and(|ts| cutoff.map_or(true, |cutoff| ts >= cutoff))
        })
        .cloned()
        .collect()
}

fn window_cutoff(hours: f64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    // float-to-int casts saturate, so only the chrono arithmetic can overflow
    let millis = (hours * 3_600_000.0) as i64;
    Duration::try_milliseconds(millis).and_then(|span| now.checked_sub_signed(span))
}

/// [`filter_by_window`] against the current wall clock, read once.
pub fn filter_recent(sequence: &[TelemetrySample], hours: f64) -> Vec<TelemetrySample> {
    filter_by_window(sequence, hours, Utc::now())
}

pub fn marker_state(sample: &TelemetrySample) -> MarkerState {
    if sample.door_open {
        MarkerState::DoorOpen
    } else if sample.temperature_c < COLD_CHAIN_MIN_C || sample.temperature_c > COLD_CHAIN_MAX_C {
        MarkerState::Excursion
    } else {
        MarkerState::Nominal
    }
}

/// Positions of samples `0..=upto`, clamped to the sequence.
pub fn trail(sequence: &[TelemetrySample], upto: usize) -> Vec<Position> {
    sequence
        .iter()
        .take(upto.saturating_add(1))
        .map(TelemetrySample::position)
        .collect()
}

/// Samples `0..=upto` that are not nominal.
pub fn flagged_samples(sequence: &[TelemetrySample], upto: usize) -> Vec<FlaggedSample> {
    sequence
        .iter()
        .take(upto.saturating_add(1))
        .enumerate()
        .filter_map(|(index, sample)| match marker_state(sample) {
            MarkerState::Nominal => None,
            state => Some(FlaggedSample {
                index,
                position: sample.position(),
                state,
            }),
        })
        .collect()
}

pub fn summarize(
    sequence: &[TelemetrySample],
    hours: Option<f64>,
    now: DateTime<Utc>,
) -> TelemetrySummary {
    let windowed;
    let samples = match hours {
        Some(hours) => {
            windowed = filter_by_window(sequence, hours, now);
            windowed.as_slice()
        }
        None => sequence,
    };

    let last = latest(samples);
    TelemetrySummary {
        sample_count: samples.len(),
        latest: last.cloned(),
        marker: last.map(marker_state),
        idle_minutes: idle_minutes(samples),
        door_events: door_transitions(samples),
        excursions: samples
            .iter()
            .filter(|s| !(COLD_CHAIN_MIN_C..=COLD_CHAIN_MAX_C).contains(&s.temperature_c))
            .count(),
    }
}
