use rackdesk::catalog::*;
use rackdesk::constants::Constants;
use rackdesk::models::Device;

mod common;
use common::*;

fn numbered(count: usize, device_type: Option<&str>) -> Vec<Device> {
    (0..count)
        .map(|i| {
            let builder = DeviceBuilder::new(&format!("DEV-{:03}", i));
            match device_type {
                Some(kind) => builder.with_type(kind).build(),
                None => builder.build(),
            }
        })
        .collect()
}

#[test]
fn test_page_count() {
    assert_eq!(page_count(0, 10), 0);
    assert_eq!(page_count(1, 10), 1);
    assert_eq!(page_count(10, 10), 1);
    assert_eq!(page_count(11, 10), 2);
    assert_eq!(page_count(25, 10), 3);
}

#[test]
fn test_paginate_windows() {
    let items: Vec<usize> = (0..25).collect();

    for k in 1..=3 {
        let page = paginate(&items, k, 10);
        let expected: Vec<usize> = ((k - 1) * 10..(k * 10).min(25)).collect();
        assert_eq!(page.items, expected.as_slice());
        assert_eq!(page.range(), (k - 1) * 10..(k * 10).min(25));
        assert_eq!(page.page_count, 3);
    }

    let first = paginate(&items, 1, 10);
    assert!(first.prev_disabled);
    assert!(!first.next_disabled);
    assert_eq!(first.showing(), (1, 10));

    let last = paginate(&items, 3, 10);
    assert!(!last.prev_disabled);
    assert!(last.next_disabled);
    assert_eq!(last.showing(), (21, 25));
}

#[test]
fn test_paginate_clamps_out_of_range_pages() {
    let items: Vec<usize> = (0..15).collect();

    let page = paginate(&items, 0, 10);
    assert_eq!(page.number, 1);

    let page = paginate(&items, 99, 10);
    assert_eq!(page.number, 2);
    assert_eq!(page.items.len(), 5);
}

#[test]
fn test_paginate_single_and_empty() {
    let items: Vec<usize> = (0..4).collect();
    let page = paginate(&items, 1, 10);
    assert!(page.prev_disabled && page.next_disabled);
    assert!(!page.has_controls());

    let empty: Vec<usize> = Vec::new();
    let page = paginate(&empty, 1, 10);
    assert_eq!(page.page_count, 0);
    assert!(page.items.is_empty());
    assert!(page.prev_disabled && page.next_disabled);
    assert_eq!(page.showing(), (0, 0));
}

#[test]
fn test_group_by_type_preserves_order_and_partitions() {
    let devices = vec![
        DeviceBuilder::new("A1").with_type("Router").build(),
        DeviceBuilder::new("B1").build(),
        DeviceBuilder::new("A2").with_type(" Router ").build(),
        DeviceBuilder::new("C1").with_type("   ").build(),
        DeviceBuilder::new("D1").with_type("Switch").build(),
    ];

    let groups = group_by_type(&devices, Constants::DEVICES_PER_PAGE);
    let keys: Vec<&str> = groups.iter().map(|group| group.key.as_str()).collect();
    assert_eq!(keys, vec!["Router", Constants::FALLBACK_GROUP, "Switch"]);

    let router: Vec<&str> = groups[0].devices.iter().map(|d| d.device_id.as_str()).collect();
    assert_eq!(router, vec!["A1", "A2"]);

    let other: Vec<&str> = groups[1].devices.iter().map(|d| d.device_id.as_str()).collect();
    assert_eq!(other, vec!["B1", "C1"]);

    // Every device lands in exactly one group
    let mut all: Vec<&str> = groups
        .iter()
        .flat_map(|group| group.devices.iter().map(|d| d.device_id.as_str()))
        .collect();
    all.sort();
    assert_eq!(all, vec!["A1", "A2", "B1", "C1", "D1"]);
}

#[test]
fn test_group_paging_is_independent() {
    let mut devices = numbered(23, Some("Router"));
    devices.extend(numbered(5, Some("Switch")));

    let mut view = CatalogView::build(&devices, "");
    assert_eq!(view.device_count(), 28);

    let routers = view.group_mut("Router").unwrap();
    assert_eq!(routers.page_count(), 3);
    assert_eq!(routers.prev_page(), 1);
    assert_eq!(routers.next_page(), 2);
    assert_eq!(routers.next_page(), 3);
    assert_eq!(routers.next_page(), 3); // no wrap
    assert_eq!(routers.visible().items.len(), 3);
    assert_eq!(routers.go_to(0), 1);

    let switches = view.group_mut("Switch").unwrap();
    assert_eq!(switches.current_page(), 1);
    assert!(!switches.visible().has_controls());
}

#[test]
fn test_catalog_filter_by_device_id() {
    let devices = vec![
        DeviceBuilder::new("LAB-01").with_type("Router").build(),
        DeviceBuilder::new("LAB-02").with_type("Switch").build(),
        DeviceBuilder::new("OFFICE-01").with_type("Router").build(),
    ];

    let view = CatalogView::build(&devices, "lab");
    assert_eq!(view.device_count(), 2);
    assert_eq!(view.groups().len(), 2);
    assert_eq!(view.filter(), "lab");

    let view = CatalogView::build(&devices, "nothing");
    assert!(view.is_empty());

    let view = CatalogView::build(&devices, "  ");
    assert_eq!(view.device_count(), 3);
}
