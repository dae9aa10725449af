use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rackdesk::availability::TimeRange;
use rackdesk::models::{
    BookedDevice, BookedDeviceInfo, BookedUser, BookingTime, Device, DeviceDetails, DeviceStatus,
    UsageNetwork, UsageRecord, UsageReservation, UsageStatus, UsageStatusInfo, UsageTiming,
    UsageUser,
};
use rackdesk::store::DashboardStore;
use rackdesk::traits::*;
use std::sync::Arc;

/// Parse an RFC 3339 timestamp for fixtures
pub fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .unwrap()
        .with_timezone(&Utc)
}

/// Fixed "now" used across tests: 2024-01-15 13:00 UTC
pub fn base_time() -> DateTime<Utc> {
    at("2024-01-15T13:00:00Z")
}

/// Range starting `start_min` minutes after `base_time()` and ending at `end_min`
pub fn range(start_min: i64, end_min: i64) -> TimeRange {
    let base = base_time();
    TimeRange::new(base + Duration::minutes(start_min), base + Duration::minutes(end_min)).unwrap()
}

/// Builder for catalog devices
pub struct DeviceBuilder {
    device: Device,
}

impl DeviceBuilder {
    pub fn new(device_id: &str) -> Self {
        Self {
            device: Device {
                device_id: device_id.to_string(),
                name: None,
                device_type: None,
                status: DeviceStatus::Available,
                reservation_start: None,
                reservation_end: None,
                pc_ip: None,
                rutomatrix_ip: None,
                pulse1_ip: None,
                ct1_ip: None,
            },
        }
    }

    pub fn with_type(mut self, device_type: &str) -> Self {
        self.device.device_type = Some(device_type.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.device.name = Some(name.to_string());
        self
    }

    pub fn booked(mut self) -> Self {
        self.device.status = DeviceStatus::Booked;
        self
    }

    pub fn build(self) -> Device {
        self.device
    }
}

/// Builder for booked-device rows
pub struct BookingBuilder {
    booking: BookedDevice,
}

impl BookingBuilder {
    pub fn new(id: i64, device_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            booking: BookedDevice {
                id,
                device: BookedDeviceInfo {
                    id: device_id.to_string(),
                    ct1_ip: None,
                    pulse1_ip: None,
                    pc_ip: None,
                    rutomatrix_ip: None,
                },
                user: BookedUser::default(),
                time: BookingTime {
                    start,
                    end,
                    duration_minutes: Some((end - start).num_minutes()),
                    timezone: Some("Asia/Kolkata".to_string()),
                },
                status: None,
                purpose: None,
            },
        }
    }

    /// Booking covering `[start_min, end_min)` minutes after `base_time()`
    pub fn minutes(id: i64, device_id: &str, start_min: i64, end_min: i64) -> Self {
        let base = base_time();
        Self::new(
            id,
            device_id,
            base + Duration::minutes(start_min),
            base + Duration::minutes(end_min),
        )
    }

    pub fn with_user(mut self, user_id: i64, user_name: &str) -> Self {
        self.booking.user.id = Some(user_id);
        self.booking.user.user_name = Some(user_name.to_string());
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.booking.user.role = Some(role.to_string());
        self
    }

    pub fn with_pc_ip(mut self, ip: &str) -> Self {
        self.booking.device.pc_ip = Some(ip.to_string());
        self
    }

    pub fn with_ct1_ip(mut self, ip: &str) -> Self {
        self.booking.device.ct1_ip = Some(ip.to_string());
        self
    }

    pub fn build(self) -> BookedDevice {
        self.booking
    }
}

/// Builder for usage history records
pub struct UsageRecordBuilder {
    record: UsageRecord,
}

impl UsageRecordBuilder {
    pub fn new(id: i64, device_id: &str) -> Self {
        Self {
            record: UsageRecord {
                id,
                device_id: device_id.to_string(),
                user_info: UsageUser {
                    user_id: 1,
                    user_name: Some("alice".to_string()),
                    user_ip: Some("10.0.0.5".to_string()),
                },
                timing: UsageTiming {
                    start_time: None,
                    end_time: None,
                    duration: None,
                },
                network_info: UsageNetwork::default(),
                status_info: UsageStatusInfo {
                    status: UsageStatus::Completed,
                    termination_reason: None,
                },
                reservation_info: UsageReservation::default(),
            },
        }
    }

    pub fn started_at(mut self, start: DateTime<Utc>, secs: f64) -> Self {
        self.record.timing.start_time = Some(start);
        self.record.timing.end_time = Some(start + Duration::seconds(secs as i64));
        self.record.timing.duration = Some(secs);
        self
    }

    pub fn build(self) -> UsageRecord {
        self.record
    }
}

pub fn device_details(device_id: &str) -> DeviceDetails {
    DeviceDetails {
        device_id: device_id.to_string(),
        pc_ip: Some("192.168.1.10".to_string()),
        rutomatrix_ip: Some("192.168.1.11".to_string()),
        pulse1_ip: None,
        ct1_ip: Some("192.168.1.13".to_string()),
    }
}

/// Test application context with mocked dependencies
pub struct TestContext {
    pub api: Arc<MockDashboardApi>,
    pub clock: Arc<TestClock>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::new_with_time(base_time())
    }

    pub fn new_with_time(initial_time: DateTime<Utc>) -> Self {
        Self {
            api: Arc::new(MockDashboardApi::new()),
            clock: Arc::new(TestClock::new(initial_time)),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    /// Seed the mock backend with devices
    pub async fn with_devices(self, devices: Vec<Device>) -> Self {
        for device in devices {
            self.api.add_device(device).await;
        }
        self
    }

    /// Seed the mock backend with bookings
    pub async fn with_bookings(self, bookings: Vec<BookedDevice>) -> Self {
        for booking in bookings {
            self.api.add_booking(booking).await;
        }
        self
    }

    /// Load a store for `range` against the mock backend
    pub async fn loaded_store(&self, range: TimeRange) -> Result<DashboardStore> {
        let mut store = DashboardStore::new();
        store.load(&*self.api, range).await?;
        Ok(store)
    }
}
