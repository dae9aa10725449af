use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::constants::Constants;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{Device, DeviceStatus, Reservation};
use crate::time;

/// Half-open interval intersection: `[a_start, a_end)` and `[b_start, b_end)`
/// overlap iff `a_start < b_end && a_end > b_start`. Touching endpoints do not.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && a_end > b_start
}

/// A validated `(start, end)` pair of UTC instants with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range from trusted instants. Only `start < end` is enforced.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DashboardResult<Self> {
        if end <= start {
            return Err(DashboardError::InvalidRange(
                Constants::MSG_END_BEFORE_START.to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Validate raw picker input against `now`.
    ///
    /// Fails when either value is missing or unparseable, when the start lies in
    /// the past, or when the end does not come after the start.
    pub fn validate(raw_start: &str, raw_end: &str, now: DateTime<Utc>, tz: Tz) -> DashboardResult<Self> {
        if raw_start.trim().is_empty() || raw_end.trim().is_empty() {
            return Err(DashboardError::InvalidRange(
                Constants::MSG_SELECT_BOTH_TIMES.to_string(),
            ));
        }

        let start = time::parse_instant(raw_start, tz).ok_or_else(|| {
            DashboardError::InvalidRange(format!("Invalid start time: {}", raw_start.trim()))
        })?;
        let end = time::parse_instant(raw_end, tz).ok_or_else(|| {
            DashboardError::InvalidRange(format!("Invalid end time: {}", raw_end.trim()))
        })?;

        if start < now {
            return Err(DashboardError::InvalidRange(Constants::MSG_PAST_START.to_string()));
        }

        Self::new(start, end)
    }

    /// Quick-select: start `minutes_from_now` after `now`, lasting `length_minutes`.
    pub fn starting_in(now: DateTime<Utc>, minutes_from_now: i64, length_minutes: i64) -> DashboardResult<Self> {
        let start = shift_minutes(now, minutes_from_now.max(0))?;
        Self::new(start, shift_minutes(start, length_minutes)?)
    }

    /// Move the end relative to the current start, as the end-time quick-select does.
    pub fn with_end_after_start(&self, minutes: i64) -> DashboardResult<Self> {
        Self::new(self.start, shift_minutes(self.start, minutes)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps_with(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        overlaps(self.start, self.end, start, end)
    }
}

/// `at + minutes`, failing instead of overflowing the calendar.
fn shift_minutes(at: DateTime<Utc>, minutes: i64) -> DashboardResult<DateTime<Utc>> {
    Duration::try_minutes(minutes)
        .and_then(|offset| at.checked_add_signed(offset))
        .ok_or_else(|| DashboardError::InvalidRange(format!("{} minutes is out of range", minutes)))
}

/// Status of `device_id` for `range` given the known bookings.
///
/// `Booked` iff any reservation on the same device overlaps the range.
pub fn device_status(device_id: &str, range: &TimeRange, bookings: &[Reservation]) -> DeviceStatus {
    let booked = bookings
        .iter()
        .filter(|booking| booking.device_id == device_id)
        .any(|booking| range.overlaps_with(booking.start, booking.end));

    if booked {
        DeviceStatus::Booked
    } else {
        DeviceStatus::Available
    }
}

/// First booking on `device_id` that collides with `range`, if any.
pub fn first_conflict<'a>(
    device_id: &str,
    range: &TimeRange,
    bookings: &'a [Reservation],
) -> Option<&'a Reservation> {
    bookings
        .iter()
        .filter(|booking| booking.device_id == device_id)
        .filter(|booking| range.overlaps_with(booking.start, booking.end))
        .min_by_key(|booking| booking.start)
}

/// Recompute derived device status for a catalog snapshot.
///
/// A device the server already reported as booked stays booked; a local
/// overlap against the loaded booking set additionally marks it booked and
/// records the colliding window.
pub fn apply_local_conflicts(devices: &mut [Device], bookings: &[Reservation], range: &TimeRange) {
    for device in devices.iter_mut() {
        if let Some(conflict) = first_conflict(&device.device_id, range, bookings) {
            if device.status != DeviceStatus::Booked {
                debug!(
                    "Device {} marked booked locally by reservation {}",
                    device.device_id, conflict.id
                );
            }
            device.status = DeviceStatus::Booked;
            device.reservation_start.get_or_insert(conflict.start);
            device.reservation_end.get_or_insert(conflict.end);
        }
    }
}

/// Outcome of the optimistic client-side check made before submitting.
///
/// The loaded booking set may be stale; the backend remains the only authority
/// on whether a reservation can be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precheck {
    Available,
    Conflict { message: String },
}

impl Precheck {
    pub fn is_success(&self) -> bool {
        matches!(self, Precheck::Available)
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            Precheck::Available => None,
            Precheck::Conflict { message } => Some(message.clone()),
        }
    }
}

/// Check a cached device entry before submission.
pub fn precheck(device: Option<&Device>) -> Precheck {
    match device {
        Some(device) if device.is_available() => Precheck::Available,
        _ => Precheck::Conflict {
            message: Constants::MSG_DEVICE_UNAVAILABLE.to_string(),
        },
    }
}
