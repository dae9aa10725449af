use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Write;

use crate::availability::TimeRange;
use crate::booked::{BookedRow, BookedView, RowState};
use crate::catalog::{CatalogView, DeviceGroup};
use crate::constants::Constants;
use crate::history::format_duration_secs;
use crate::models::{Device, DeviceDetails, ReservationStatus, UsageRecord};
use crate::time;
use crate::utils::format_duration_minutes;

/// Plain-text rendering of the dashboard views
pub struct DashboardRenderer {
    tz: Tz,
}

impl DashboardRenderer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    fn show_ip(value: &Option<String>) -> &str {
        match value.as_deref().map(str::trim) {
            Some(ip) if !ip.is_empty() => ip,
            _ => Constants::NOT_AVAILABLE,
        }
    }

    pub fn range_header(&self, range: &TimeRange) -> String {
        format!(
            "{} → {} ({}, {})",
            time::format_display(range.start(), self.tz),
            time::format_display(range.end(), self.tz),
            format_duration_minutes(range.duration_minutes()),
            time::offset_label(self.tz, range.start()),
        )
    }

    /// Single device line inside a group card
    pub fn device_line(&self, device: &Device, selected: bool) -> String {
        let status_emoji = if device.is_available() {
            Constants::AVAILABLE_EMOJI
        } else {
            Constants::BOOKED_EMOJI
        };
        let marker = if selected { Constants::SELECTED_EMOJI } else { "  " };

        let mut line = format!(
            "{} {} {} [{}]",
            marker,
            status_emoji,
            device.device_id,
            device.status.as_str()
        );
        if let Some(name) = device.name.as_deref().filter(|name| !name.trim().is_empty()) {
            let _ = write!(line, " {}", name.trim());
        }
        if let (Some(start), Some(end)) = (device.reservation_start, device.reservation_end) {
            let _ = write!(
                line,
                " (booked {} - {})",
                time::format_short(start, self.tz),
                time::format_short(end, self.tz)
            );
        }
        line
    }

    pub fn group_card(&self, group: &DeviceGroup, selected: Option<&str>) -> String {
        let page = group.visible();
        let mut out = format!("== {} ({}) ==\n", group.key, page.total);
        for device in page.items {
            out.push_str(&self.device_line(device, selected == Some(device.device_id.as_str())));
            out.push('\n');
        }
        if page.has_controls() {
            let (from, to) = page.showing();
            let _ = writeln!(
                out,
                "   {} page {}/{} {} (showing {}-{} of {})",
                if page.prev_disabled { "·" } else { "<" },
                page.number,
                page.page_count,
                if page.next_disabled { "·" } else { ">" },
                from,
                to,
                page.total
            );
        }
        out
    }

    pub fn catalog(&self, catalog: &CatalogView, selected: Option<&str>) -> String {
        if catalog.is_empty() {
            return if catalog.filter().is_empty() {
                "No devices found for the selected time range.\n".to_string()
            } else {
                format!("No devices match \"{}\".\n", catalog.filter())
            };
        }
        catalog
            .groups()
            .iter()
            .map(|group| self.group_card(group, selected))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn status_badge(status: ReservationStatus) -> String {
        let emoji = match status {
            ReservationStatus::Active => Constants::ACTIVE_EMOJI,
            ReservationStatus::Upcoming => Constants::UPCOMING_EMOJI,
            ReservationStatus::Expired => Constants::EXPIRED_EMOJI,
        };
        format!("{} {}", emoji, status.label())
    }

    pub fn booked_row(&self, row: &BookedRow) -> String {
        let drivers = row
            .drivers
            .iter()
            .map(|driver| format!("{}: {}", driver.label, driver.ip))
            .collect::<Vec<_>>()
            .join(", ");
        let user = row
            .user_name
            .clone()
            .or_else(|| row.user_id.map(|id| format!("user #{}", id)))
            .unwrap_or_else(|| Constants::NOT_AVAILABLE.to_string());
        let state = match row.state {
            RowState::Idle => "",
            RowState::Cancelling => " (cancelling...)",
            RowState::Removing => " (removed)",
        };

        format!(
            "#{} {} | {} | {} - {} ({}) | {} | {}{}{}",
            row.reservation_id,
            row.device_id,
            user,
            time::format_display(row.start, self.tz),
            time::format_display(row.end, self.tz),
            format_duration_minutes(row.duration_minutes),
            Self::status_badge(row.status),
            drivers,
            if row.can_cancel { " [cancel]" } else { "" },
            state
        )
    }

    pub fn booked_view(&self, view: &BookedView) -> String {
        let page = view.page();
        if page.total == 0 {
            return "No booked devices.\n".to_string();
        }

        let mut out = String::new();
        if let Some(at) = view.rendered_at() {
            let _ = writeln!(out, "Booked devices as of {}", time::format_display(at, self.tz));
        }
        for row in &page.rows {
            out.push_str(&self.booked_row(row));
            out.push('\n');
        }
        if page.page_count > 1 {
            let _ = writeln!(out, "page {}/{} ({} reservations)", page.number, page.page_count, page.total);
        }
        out
    }

    pub fn device_details(&self, details: &DeviceDetails) -> String {
        format!(
            "Device {}\n  PC: {}\n  Rutomatrix: {}\n  Pulse1: {}\n  CT1: {}\n",
            details.device_id,
            Self::show_ip(&details.pc_ip),
            Self::show_ip(&details.rutomatrix_ip),
            Self::show_ip(&details.pulse1_ip),
            Self::show_ip(&details.ct1_ip),
        )
    }

    fn instant_or_na(&self, instant: Option<DateTime<Utc>>) -> String {
        instant
            .map(|at| time::format_display(at, self.tz))
            .unwrap_or_else(|| Constants::NOT_AVAILABLE.to_string())
    }

    pub fn usage_record(&self, record: &UsageRecord) -> String {
        let mut out = format!("Usage record #{} (device {})\n", record.id, record.device_id);
        let _ = writeln!(
            out,
            "  User: {} (id {}, ip {})",
            record.user_info.user_name.as_deref().unwrap_or(Constants::NOT_AVAILABLE),
            record.user_info.user_id,
            Self::show_ip(&record.user_info.user_ip)
        );
        let _ = writeln!(
            out,
            "  Time: {} - {} ({})",
            self.instant_or_na(record.timing.start_time),
            self.instant_or_na(record.timing.end_time),
            format_duration_secs(record.timing.duration)
        );
        let _ = writeln!(
            out,
            "  Network: {} ({})",
            Self::show_ip(&record.network_info.ip_address),
            record.network_info.ip_type.as_deref().unwrap_or(Constants::NOT_AVAILABLE)
        );
        let _ = writeln!(out, "  Status: {}", record.status_info.status.label());
        if let Some(reason) = &record.status_info.termination_reason {
            let _ = writeln!(out, "  Termination reason: {}", reason);
        }
        if let Some(reservation_id) = record.reservation_info.reservation_id {
            let _ = writeln!(out, "  Reservation: #{}", reservation_id);
        }
        out
    }
}
