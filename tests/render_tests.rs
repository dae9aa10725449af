use chrono_tz::Asia::Kolkata;
use rackdesk::booked::BookedView;
use rackdesk::catalog::CatalogView;
use rackdesk::constants::Constants;
use rackdesk::render::DashboardRenderer;

mod common;
use common::*;

fn renderer() -> DashboardRenderer {
    DashboardRenderer::new(Kolkata)
}

#[test]
fn test_range_header_uses_display_timezone() {
    let header = renderer().range_header(&range(0, 90));
    assert_eq!(
        header,
        "2024-01-15 18:30 → 2024-01-15 20:00 (1h 30m, Asia/Kolkata (UTC+05:30))"
    );
}

#[test]
fn test_device_line_marks_selection_and_booking() {
    let free = DeviceBuilder::new("D1").with_name("Bench scope").build();
    let line = renderer().device_line(&free, true);
    assert!(line.starts_with(Constants::SELECTED_EMOJI));
    assert!(line.contains(Constants::AVAILABLE_EMOJI));
    assert!(line.contains("Bench scope"));

    let mut taken = DeviceBuilder::new("D2").booked().build();
    taken.reservation_start = Some(at("2024-01-15T13:00:00Z"));
    taken.reservation_end = Some(at("2024-01-15T14:00:00Z"));
    let line = renderer().device_line(&taken, false);
    assert!(line.contains(Constants::BOOKED_EMOJI));
    assert!(line.contains("[booked]"));
    assert!(line.contains("(booked Jan 15 18:30 - Jan 15 19:30)"));
}

#[test]
fn test_catalog_page_controls_only_when_paginated() {
    let small: Vec<_> = (1..=3)
        .map(|i| DeviceBuilder::new(&format!("S{}", i)).with_type("Switch").build())
        .collect();
    let text = renderer().catalog(&CatalogView::build(&small, ""), None);
    assert!(text.contains("== Switch (3) =="));
    assert!(!text.contains("page"));

    let large: Vec<_> = (1..=12)
        .map(|i| DeviceBuilder::new(&format!("R{:02}", i)).with_type("Router").build())
        .collect();
    let text = renderer().catalog(&CatalogView::build(&large, ""), None);
    assert!(text.contains("page 1/2"));
    assert!(text.contains("showing 1-10 of 12"));
}

#[test]
fn test_empty_catalog_messages() {
    let devices = vec![DeviceBuilder::new("D1").build()];
    assert_eq!(
        renderer().catalog(&CatalogView::build(&[], ""), None),
        "No devices found for the selected time range.\n"
    );
    assert_eq!(
        renderer().catalog(&CatalogView::build(&devices, "zzz"), None),
        "No devices match \"zzz\".\n"
    );
}

#[test]
fn test_booked_row_rendering() {
    let bookings = vec![BookingBuilder::minutes(4, "D4", 30, 120)
        .with_user(9, "erin")
        .with_role("admin")
        .with_pc_ip("10.0.0.4")
        .build()];
    let view = BookedView::from_bookings(&bookings, base_time());

    let text = renderer().booked_view(&view);
    assert!(text.contains("#4 D4 | erin | 2024-01-15 19:00 - 2024-01-15 20:30 (1h 30m)"));
    assert!(text.contains("Upcoming"));
    assert!(text.contains("PC: 10.0.0.4"));
    assert!(text.contains("[cancel]"));

    let empty = BookedView::from_bookings(&[], base_time());
    assert_eq!(renderer().booked_view(&empty), "No booked devices.\n");
}

#[test]
fn test_device_details_and_usage_record() {
    let text = renderer().device_details(&device_details("D1"));
    assert!(text.contains("PC: 192.168.1.10"));
    assert!(text.contains(&format!("Pulse1: {}", Constants::NOT_AVAILABLE)));

    let record = UsageRecordBuilder::new(8, "D1")
        .started_at(at("2024-01-15T13:00:00Z"), 5400.0)
        .build();
    let text = renderer().usage_record(&record);
    assert!(text.contains("Usage record #8 (device D1)"));
    assert!(text.contains("2024-01-15 18:30 - 2024-01-15 20:00 (1h 30m)"));
    assert!(text.contains("Status: completed"));
}
