use std::ops::Range;

use crate::constants::Constants;
use crate::models::Device;

/// One window of a paginated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub number: usize,     // 1-based
    pub page_count: usize, // ceil(total / page_size)
    pub total: usize,
    pub offset: usize, // index of the first visible item
    pub items: &'a [T],
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl<T> Page<'_, T> {
    /// Whether page controls are worth showing at all
    pub fn has_controls(&self) -> bool {
        self.page_count > 1
    }

    /// Index window of the visible items within the full list
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.items.len()
    }

    /// 1-based `(from, to)` row labels for a "showing X to Y of Z" line.
    pub fn showing(&self) -> (usize, usize) {
        if self.items.is_empty() {
            (0, 0)
        } else {
            (self.offset + 1, self.offset + self.items.len())
        }
    }
}

/// Number of pages for `total` items: `ceil(total / page_size)`.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Index window of page `page` (1-based): `[(page-1)*size, min(page*size, total))`.
pub fn page_range(total: usize, page: usize, page_size: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(total);
    let end = page.saturating_mul(page_size).min(total);
    start..end
}

/// Slice `items` to the requested page.
///
/// The page number is clamped into `1..=max(page_count, 1)`; controls at the
/// first and last page are reported disabled rather than wrapping.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let total = items.len();
    let pages = page_count(total, page_size);
    let number = page.clamp(1, pages.max(1));

    let window = page_range(total, number, page_size);

    Page {
        number,
        page_count: pages,
        total,
        offset: window.start,
        items: &items[window],
        prev_disabled: number <= 1,
        next_disabled: number >= pages,
    }
}

/// Group key for a device: trimmed type, or the fallback label when missing/blank.
pub fn group_key(device: &Device) -> String {
    match device.device_type.as_deref().map(str::trim) {
        Some(kind) if !kind.is_empty() => kind.to_string(),
        _ => Constants::FALLBACK_GROUP.to_string(),
    }
}

/// Devices of one type with their own independent page cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceGroup {
    pub key: String,
    pub devices: Vec<Device>,
    page: usize,
    page_size: usize,
}

impl DeviceGroup {
    fn new(key: String, page_size: usize) -> Self {
        Self {
            key,
            devices: Vec::new(),
            page: 1,
            page_size,
        }
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        page_count(self.devices.len(), self.page_size)
    }

    /// The visible slice for the current page.
    pub fn visible(&self) -> Page<'_, Device> {
        paginate(&self.devices, self.page, self.page_size)
    }

    /// Advance one page; stays put on the last page.
    pub fn next_page(&mut self) -> usize {
        if self.page < self.page_count() {
            self.page += 1;
        }
        self.page
    }

    /// Go back one page; stays put on the first page.
    pub fn prev_page(&mut self) -> usize {
        if self.page > 1 {
            self.page -= 1;
        }
        self.page
    }

    /// Jump to `page`, clamped into the valid range.
    pub fn go_to(&mut self, page: usize) -> usize {
        self.page = page.clamp(1, self.page_count().max(1));
        self.page
    }
}

/// Partition devices by type, preserving first-appearance order of groups and
/// the input order of devices within each group.
pub fn group_by_type(devices: &[Device], page_size: usize) -> Vec<DeviceGroup> {
    let mut groups: Vec<DeviceGroup> = Vec::new();

    for device in devices {
        let key = group_key(device);
        let index = match groups.iter().position(|group| group.key == key) {
            Some(index) => index,
            None => {
                groups.push(DeviceGroup::new(key, page_size));
                groups.len() - 1
            }
        };
        groups[index].devices.push(device.clone());
    }

    groups
}

/// Case-insensitive device id substring match; an empty filter matches all.
pub fn matches_filter(device: &Device, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    needle.is_empty() || device.device_id.to_lowercase().contains(&needle)
}

/// Grouped, filtered and paginated projection of a device catalog snapshot.
///
/// Rebuilding (filter change, new snapshot) resets every group to page 1;
/// page moves never touch the network.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogView {
    filter: String,
    groups: Vec<DeviceGroup>,
}

impl CatalogView {
    pub fn build(devices: &[Device], filter: &str) -> Self {
        let filtered: Vec<Device> = devices
            .iter()
            .filter(|device| matches_filter(device, filter))
            .cloned()
            .collect();

        Self {
            filter: filter.trim().to_string(),
            groups: group_by_type(&filtered, Constants::DEVICES_PER_PAGE),
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn groups(&self) -> &[DeviceGroup] {
        &self.groups
    }

    pub fn group_mut(&mut self, key: &str) -> Option<&mut DeviceGroup> {
        self.groups.iter_mut().find(|group| group.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn device_count(&self) -> usize {
        self.groups.iter().map(|group| group.devices.len()).sum()
    }
}
