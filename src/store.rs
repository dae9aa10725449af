use tracing::{debug, info, warn};

use crate::availability::{apply_local_conflicts, TimeRange};
use crate::catalog::CatalogView;
use crate::constants::Constants;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{BookedDevice, Device, Reservation};
use crate::traits::{Confirm, DashboardApi};

/// Catalog and booking list fetched together for one time range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    pub bookings: Vec<BookedDevice>,
}

/// Issue both fetches concurrently; either failure fails the whole load.
pub async fn fetch_snapshot(api: &dyn DashboardApi, range: &TimeRange) -> DashboardResult<Snapshot> {
    let (devices, bookings) =
        futures::try_join!(api.fetch_availability(range), api.fetch_booked_devices())?;
    Ok(Snapshot { devices, bookings })
}

/// Proof that a load was started; only the newest ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    range: TimeRange,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// A newer load started after this one; the snapshot was dropped.
    Stale,
}

/// Single owner of the reservation page's view state.
#[derive(Debug, Clone)]
pub struct DashboardStore {
    generation: u64,
    range: Option<TimeRange>,
    devices: Vec<Device>,
    bookings: Vec<BookedDevice>,
    selected: Option<String>,
    catalog: CatalogView,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        Self {
            generation: 0,
            range: None,
            devices: Vec::new(),
            bookings: Vec::new(),
            selected: None,
            catalog: CatalogView::build(&[], ""),
        }
    }

    pub fn begin_load(&mut self, range: TimeRange) -> LoadTicket {
        self.generation += 1;
        debug!("Starting catalog load generation {}", self.generation);
        LoadTicket {
            generation: self.generation,
            range,
        }
    }

    /// Apply `snapshot` if `ticket` is still the latest load.
    pub fn commit(&mut self, ticket: LoadTicket, snapshot: Snapshot) -> CommitOutcome {
        if ticket.generation != self.generation {
            debug!(
                "Discarding stale load generation {} (current {})",
                ticket.generation, self.generation
            );
            return CommitOutcome::Stale;
        }

        let Snapshot {
            mut devices,
            bookings,
        } = snapshot;
        let reservations: Vec<Reservation> = bookings.iter().map(Reservation::from).collect();
        apply_local_conflicts(&mut devices, &reservations, &ticket.range);

        // A selection only survives if it is still bookable in the new range.
        if let Some(selected) = &self.selected {
            let still_available = devices
                .iter()
                .any(|device| &device.device_id == selected && device.is_available());
            if !still_available {
                debug!("Clearing selection of {}", selected);
                self.selected = None;
            }
        }

        self.catalog = CatalogView::build(&devices, self.catalog.filter());
        self.range = Some(ticket.range);
        self.devices = devices;
        self.bookings = bookings;

        info!(
            "Loaded {} devices and {} bookings",
            self.devices.len(),
            self.bookings.len()
        );
        CommitOutcome::Applied
    }

    /// Fetch and commit in one step.
    pub async fn load(&mut self, api: &dyn DashboardApi, range: TimeRange) -> DashboardResult<CommitOutcome> {
        let ticket = self.begin_load(range);
        let snapshot = fetch_snapshot(api, ticket.range()).await?;
        Ok(self.commit(ticket, snapshot))
    }

    /// `load`, offering a manual retry through `confirm` while the failure
    /// is one a retry can fix.
    pub async fn load_with_retry(
        &mut self,
        api: &dyn DashboardApi,
        confirm: &dyn Confirm,
        range: TimeRange,
    ) -> DashboardResult<CommitOutcome> {
        loop {
            match self.load(api, range).await {
                Err(err) if err.is_retryable() => {
                    warn!("Loading devices failed: {}", err);
                    if !confirm.confirm(Constants::MSG_RETRY_LOAD) {
                        return Err(err);
                    }
                }
                result => return result,
            }
        }
    }

    /// Select a device for booking. Only devices currently shown as
    /// available can be selected.
    pub fn select_device(&mut self, device_id: &str) -> DashboardResult<&Device> {
        let index = self
            .devices
            .iter()
            .position(|device| device.device_id == device_id)
            .ok_or_else(|| DashboardError::Validation(format!("Unknown device: {}", device_id)))?;

        if !self.devices[index].is_available() {
            return Err(DashboardError::Conflict(
                Constants::MSG_DEVICE_ALREADY_BOOKED.to_string(),
            ));
        }

        self.selected = Some(device_id.to_string());
        Ok(&self.devices[index])
    }

    pub fn selected_device(&self) -> Option<&Device> {
        let selected = self.selected.as_deref()?;
        self.devices.iter().find(|device| device.device_id == selected)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Drop every fetched and derived value. Loads still in flight become stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.range = None;
        self.devices.clear();
        self.bookings.clear();
        self.selected = None;
        self.catalog = CatalogView::build(&[], self.catalog.filter());
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.catalog = CatalogView::build(&self.devices, filter);
    }

    pub fn catalog(&self) -> &CatalogView {
        &self.catalog
    }

    pub fn range(&self) -> Option<&TimeRange> {
        self.range.as_ref()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|device| device.device_id == device_id)
    }

    pub fn bookings(&self) -> &[BookedDevice] {
        &self.bookings
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.bookings.iter().map(Reservation::from).collect()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.range.is_some()
    }
}
