use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use tracing::warn;

use crate::catalog::{page_count, paginate};
use crate::constants::Constants;
use crate::models::{BookedDevice, ReservationStatus};
use crate::utils::is_admin;

/// Status of a reservation at `now`.
///
/// `Expired` once `end < now`, `Active` while `start <= now <= end`,
/// `Upcoming` before `start`. Both boundary instants count as active.
pub fn reservation_status(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ReservationStatus {
    if end < now {
        ReservationStatus::Expired
    } else if start <= now {
        ReservationStatus::Active
    } else {
        ReservationStatus::Upcoming
    }
}

/// UI state of a single row while a cancellation is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowState {
    #[default]
    Idle,
    Cancelling,
    Removing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverIp {
    pub label: &'static str,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookedRow {
    pub reservation_id: i64,
    pub device_id: String,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: ReservationStatus,
    pub can_cancel: bool,
    pub drivers: Vec<DriverIp>,
    pub purpose: Option<String>,
    pub state: RowState,
}

impl BookedRow {
    /// Build a row, or `None` for records the table cannot show.
    pub fn from_booking(booking: &BookedDevice, now: DateTime<Utc>) -> Option<Self> {
        let device_id = booking.device.id.trim();
        if device_id.is_empty() {
            return None;
        }

        let ip = |value: &Option<String>| match value.as_deref().map(str::trim) {
            Some(ip) if !ip.is_empty() => ip.to_string(),
            _ => Constants::NOT_AVAILABLE.to_string(),
        };
        let drivers = vec![
            DriverIp { label: "CT1", ip: ip(&booking.device.ct1_ip) },
            DriverIp { label: "PC", ip: ip(&booking.device.pc_ip) },
            DriverIp { label: "Pulse1", ip: ip(&booking.device.pulse1_ip) },
            DriverIp { label: "Rutomatrix", ip: ip(&booking.device.rutomatrix_ip) },
        ];

        let can_cancel = is_admin(booking.user.role.as_deref());

        Some(Self {
            reservation_id: booking.id,
            device_id: device_id.to_string(),
            user_id: booking.user.id,
            user_name: booking.user.user_name.clone(),
            start: booking.time.start,
            end: booking.time.end,
            duration_minutes: booking
                .time
                .duration_minutes
                .unwrap_or_else(|| (booking.time.end - booking.time.start).num_minutes()),
            status: reservation_status(booking.time.start, booking.time.end, now),
            can_cancel,
            drivers,
            purpose: booking.purpose.clone(),
            state: RowState::Idle,
        })
    }

    /// Lowercased text the search box matches against.
    fn search_text(&self) -> String {
        let mut parts = vec![
            self.device_id.clone(),
            self.status.label().to_string(),
            self.duration_minutes.to_string(),
        ];
        if let Some(name) = &self.user_name {
            parts.push(name.clone());
        }
        if let Some(id) = self.user_id {
            parts.push(id.to_string());
        }
        if let Some(purpose) = &self.purpose {
            parts.push(purpose.clone());
        }
        parts.extend(self.drivers.iter().map(|driver| driver.ip.clone()));
        parts.join(" ").to_lowercase()
    }

    /// Instant after which this row's status will differ from `status`.
    fn next_transition(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match reservation_status(self.start, self.end, now) {
            ReservationStatus::Upcoming => Some(self.start),
            // Still active at `end` itself; expired from the next second on.
            ReservationStatus::Active => Some(self.end + Duration::seconds(1)),
            ReservationStatus::Expired => None,
        }
    }
}

/// Earliest future instant at which any row changes status.
pub fn next_refresh_at(rows: &[BookedRow], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    rows.iter()
        .filter_map(|row| row.next_transition(now))
        .filter(|at| *at > now)
        .min()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Device,
    User,
    Start,
    End,
    Status,
    Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

fn compare(a: &BookedRow, b: &BookedRow, key: SortKey) -> Ordering {
    match key {
        SortKey::Device => a.device_id.cmp(&b.device_id),
        SortKey::User => a
            .user_name
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            .cmp(&b.user_name.as_deref().unwrap_or_default().to_lowercase()),
        SortKey::Start => a.start.cmp(&b.start),
        SortKey::End => a.end.cmp(&b.end),
        SortKey::Status => a.status.cmp(&b.status),
        SortKey::Duration => a.duration_minutes.cmp(&b.duration_minutes),
    }
}

/// One page of the booked-devices table.
#[derive(Debug, Clone, PartialEq)]
pub struct BookedPage<'a> {
    pub rows: Vec<&'a BookedRow>,
    pub number: usize,
    pub page_count: usize,
    pub total: usize,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

/// Booked-devices table: statuses are derived against the instant of the
/// last render, never persisted.
#[derive(Debug, Clone)]
pub struct BookedView {
    rows: Vec<BookedRow>,
    rendered_at: Option<DateTime<Utc>>,
    filter: String,
    search: String,
    sort: Option<(SortKey, SortOrder)>,
    page: usize,
    per_page: usize,
}

impl Default for BookedView {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            rendered_at: None,
            filter: String::new(),
            search: String::new(),
            sort: None,
            page: 1,
            per_page: Constants::BOOKED_ROWS_PER_PAGE,
        }
    }
}

impl BookedView {
    pub fn from_bookings(bookings: &[BookedDevice], now: DateTime<Utc>) -> Self {
        let mut view = Self::default();
        view.reload(bookings, now);
        view
    }

    /// Replace all rows from a fresh fetch; table settings survive.
    pub fn reload(&mut self, bookings: &[BookedDevice], now: DateTime<Utc>) {
        self.rows = bookings
            .iter()
            .filter_map(|booking| {
                let row = BookedRow::from_booking(booking, now);
                if row.is_none() {
                    warn!("Skipping booking {} with no device id", booking.id);
                }
                row
            })
            .collect();
        self.rendered_at = Some(now);
        self.go_to(self.page);
    }

    /// Re-derive every status against `now` without refetching.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        for row in self.rows.iter_mut() {
            row.status = reservation_status(row.start, row.end, now);
        }
        self.rendered_at = Some(now);
    }

    pub fn rendered_at(&self) -> Option<DateTime<Utc>> {
        self.rendered_at
    }

    pub fn rows(&self) -> &[BookedRow] {
        &self.rows
    }

    pub fn row(&self, reservation_id: i64) -> Option<&BookedRow> {
        self.rows.iter().find(|row| row.reservation_id == reservation_id)
    }

    pub fn row_mut(&mut self, reservation_id: i64) -> Option<&mut BookedRow> {
        self.rows
            .iter_mut()
            .find(|row| row.reservation_id == reservation_id)
    }

    pub fn remove_row(&mut self, reservation_id: i64) -> Option<BookedRow> {
        let index = self
            .rows
            .iter()
            .position(|row| row.reservation_id == reservation_id)?;
        Some(self.rows.remove(index))
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.trim().to_lowercase();
        self.page = 1;
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.trim().to_lowercase();
        self.page = 1;
    }

    /// Change the page size (at least one row) and return to page 1.
    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.page = 1;
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn sort_by(&mut self, key: SortKey, order: SortOrder) {
        self.sort = Some((key, order));
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    /// Jump to `page`, clamped into the valid range.
    pub fn go_to(&mut self, page: usize) -> usize {
        let pages = page_count(self.visible().len(), self.per_page);
        self.page = page.clamp(1, pages.max(1));
        self.page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to(self.page + 1)
    }

    pub fn prev_page(&mut self) -> usize {
        self.go_to(self.page.saturating_sub(1))
    }

    /// Rows after filter, search and sort, in display order.
    pub fn visible(&self) -> Vec<&BookedRow> {
        let mut rows: Vec<&BookedRow> = self
            .rows
            .iter()
            .filter(|row| {
                self.filter.is_empty() || row.device_id.to_lowercase().contains(&self.filter)
            })
            .filter(|row| self.search.is_empty() || row.search_text().contains(&self.search))
            .collect();

        if let Some((key, order)) = self.sort {
            rows.sort_by(|a, b| {
                let ordering = compare(a, b, key);
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        rows
    }

    pub fn page(&self) -> BookedPage<'_> {
        let visible = self.visible();
        let page = paginate(&visible, self.page, self.per_page);
        BookedPage {
            rows: page.items.to_vec(),
            number: page.number,
            page_count: page.page_count,
            total: page.total,
            prev_disabled: page.prev_disabled,
            next_disabled: page.next_disabled,
        }
    }

    pub fn next_refresh_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        next_refresh_at(&self.rows, now)
    }
}
