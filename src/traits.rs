use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::availability::{overlaps, TimeRange};
use crate::constants::Constants;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{
    ActionResponse, BookedDevice, BookedDeviceInfo, BookedUser, BookingTime, Device,
    DeviceDetails, DeviceIpUpdate, DeviceStatus, NewUser, ReservationResponse, UsageRecord,
    UserForEdit, UserSummary, UserUpdate,
};

/// Backend operations consumed by the dashboard, abstracted to enable mocking
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// `GET /api/devices/availability` for the given range
    async fn fetch_availability(&self, range: &TimeRange) -> DashboardResult<Vec<Device>>;

    /// `GET /api/booked-devices`
    async fn fetch_booked_devices(&self) -> DashboardResult<Vec<BookedDevice>>;

    /// `POST /api/reservations`
    async fn create_reservation(
        &self,
        device_id: &str,
        range: &TimeRange,
    ) -> DashboardResult<ReservationResponse>;

    /// `POST /reservation/cancel/{id}`
    async fn cancel_reservation(&self, reservation_id: i64) -> DashboardResult<()>;

    /// `GET /api/devices/{id}`
    async fn get_device(&self, device_id: &str) -> DashboardResult<DeviceDetails>;

    /// `GET /edit/{id}`
    async fn device_for_edit(&self, device_id: &str) -> DashboardResult<DeviceDetails>;

    /// `POST /edit/{id}`
    async fn update_device(
        &self,
        device_id: &str,
        update: &DeviceIpUpdate,
    ) -> DashboardResult<ActionResponse>;

    /// `POST /delete/{id}`
    async fn delete_device(&self, device_id: &str) -> DashboardResult<ActionResponse>;

    /// `POST /users/add`
    async fn add_user(&self, user: &NewUser) -> DashboardResult<ActionResponse>;

    /// `GET /users/edit/{id}`
    async fn user_for_edit(&self, user_id: i64) -> DashboardResult<UserForEdit>;

    /// `POST /users/update/{id}`
    async fn update_user(&self, user_id: i64, update: &UserUpdate) -> DashboardResult<ActionResponse>;

    /// `POST /users/delete/{id}`
    async fn delete_user(&self, user_id: i64) -> DashboardResult<ActionResponse>;

    /// `GET /history/get-usage-record/{id}`
    async fn get_usage_record(&self, record_id: i64) -> DashboardResult<UsageRecord>;

    /// `DELETE /history/delete-usage-record/{id}`
    async fn delete_usage_record(&self, record_id: i64) -> DashboardResult<ActionResponse>;

    /// `POST /history/clear-old`
    async fn clear_old_records(&self) -> DashboardResult<ActionResponse>;
}

/// Blocking yes/no prompt shown before destructive actions
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirm implementation with a fixed answer that records every prompt
#[derive(Debug, Clone, Default)]
pub struct MockConfirm {
    answer: bool,
    pub prompts: Arc<std::sync::Mutex<Vec<String>>>,
}

impl MockConfirm {
    pub fn accepting() -> Self {
        Self {
            answer: true,
            ..Self::default()
        }
    }

    pub fn declining() -> Self {
        Self::default()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().map(|prompts| prompts.len()).unwrap_or(0)
    }
}

impl Confirm for MockConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.answer
    }
}

/// Trait for clock operations to enable deterministic testing
#[async_trait]
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now_utc(&self) -> DateTime<Utc>;

    /// Sleep until a specific time
    async fn sleep_until(&self, target: DateTime<Utc>);

    /// Sleep for a duration (convenience method)
    async fn sleep_duration(&self, duration: chrono::Duration) {
        let target = self.now_utc() + duration;
        self.sleep_until(target).await;
    }
}

/// Production implementation using system clock
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, target: DateTime<Utc>) {
        let now = Utc::now();
        if target > now {
            let duration = target - now;
            if let Ok(std_duration) = duration.to_std() {
                tokio::time::sleep(std_duration).await;
            }
        }
    }
}

/// Test clock implementation for deterministic time control
#[derive(Debug, Clone)]
pub struct TestClock {
    current_time: Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(std::sync::Mutex::new(initial_time)),
        }
    }

    /// Advance the clock by a specific duration
    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.lock();
        *time += duration;
    }

    /// Set the clock to a specific time
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        *self.lock() = new_time;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock only means another test thread panicked mid-update.
        self.current_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Clock for TestClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.lock()
    }

    async fn sleep_until(&self, target: DateTime<Utc>) {
        // In test mode, we don't actually sleep, just advance time
        let mut time = self.lock();
        if target > *time {
            *time = target;
        }
    }
}

/// In-memory backend used by tests.
///
/// Behaves like the real server for the reservation endpoints: availability is
/// computed from the stored bookings and creation rejects overlaps with 409.
#[derive(Debug, Clone, Default)]
pub struct MockDashboardApi {
    pub devices: Arc<Mutex<Vec<Device>>>,
    pub bookings: Arc<Mutex<Vec<BookedDevice>>>,
    pub device_details: Arc<Mutex<HashMap<String, DeviceDetails>>>,
    pub users: Arc<Mutex<Vec<UserSummary>>>,
    pub usage_records: Arc<Mutex<Vec<UsageRecord>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub created: Arc<Mutex<Vec<(String, TimeRange)>>>,
    pub cancelled: Arc<Mutex<Vec<i64>>>,
    failures: Arc<Mutex<HashMap<String, (DashboardError, Option<usize>)>>>,
    caller_role: Arc<Mutex<Option<String>>>,
}

impl MockDashboardApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `operation` fail with `error` until cleared
    pub async fn set_failure(&self, operation: &str, error: DashboardError) {
        self.failures
            .lock()
            .await
            .insert(operation.to_string(), (error, None));
    }

    /// Make the next `times` calls to `operation` fail, then succeed again
    pub async fn set_failure_times(&self, operation: &str, error: DashboardError, times: usize) {
        self.failures
            .lock()
            .await
            .insert(operation.to_string(), (error, Some(times)));
    }

    pub async fn clear_failure(&self, operation: &str) {
        self.failures.lock().await.remove(operation);
    }

    /// Role reported in `user.role` of booked-device rows
    pub async fn set_caller_role(&self, role: Option<&str>) {
        *self.caller_role.lock().await = role.map(str::to_string);
    }

    pub async fn add_device(&self, device: Device) {
        self.devices.lock().await.push(device);
    }

    pub async fn add_booking(&self, booking: BookedDevice) {
        self.bookings.lock().await.push(booking);
    }

    /// Get all recorded operation names, in call order
    pub async fn get_calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.as_str() == operation)
            .count()
    }

    /// Clear all recorded interactions
    pub async fn clear(&self) {
        self.calls.lock().await.clear();
        self.created.lock().await.clear();
        self.cancelled.lock().await.clear();
    }

    async fn record(&self, operation: &str) -> DashboardResult<()> {
        self.calls.lock().await.push(operation.to_string());
        let mut failures = self.failures.lock().await;
        let Some((error, remaining)) = failures.get_mut(operation) else {
            return Ok(());
        };
        let error = error.clone();
        let exhausted = match remaining {
            Some(left) => {
                *left = left.saturating_sub(1);
                *left == 0
            }
            None => false,
        };
        if exhausted {
            failures.remove(operation);
        }
        Err(error)
    }

    fn not_found(what: &str) -> DashboardError {
        DashboardError::Server {
            status: 404,
            message: format!("{} not found", what),
        }
    }

    fn ack(message: &str) -> ActionResponse {
        ActionResponse {
            status: Some("success".to_string()),
            message: Some(message.to_string()),
            ..ActionResponse::default()
        }
    }
}

#[async_trait]
impl DashboardApi for MockDashboardApi {
    async fn fetch_availability(&self, range: &TimeRange) -> DashboardResult<Vec<Device>> {
        self.record("fetch_availability").await?;

        let bookings = self.bookings.lock().await;
        let devices = self
            .devices
            .lock()
            .await
            .iter()
            .cloned()
            .map(|mut device| {
                let booked = bookings.iter().any(|booking| {
                    booking.device.id == device.device_id
                        && range.overlaps_with(booking.time.start, booking.time.end)
                });
                device.status = if booked {
                    DeviceStatus::Booked
                } else {
                    DeviceStatus::Available
                };
                device
            })
            .collect();

        Ok(devices)
    }

    async fn fetch_booked_devices(&self) -> DashboardResult<Vec<BookedDevice>> {
        self.record("fetch_booked_devices").await?;

        let role = self.caller_role.lock().await.clone();
        let mut bookings = self.bookings.lock().await.clone();
        for booking in bookings.iter_mut() {
            booking.user.role = role.clone();
        }
        bookings.sort_by_key(|booking| booking.time.start);
        Ok(bookings)
    }

    async fn create_reservation(
        &self,
        device_id: &str,
        range: &TimeRange,
    ) -> DashboardResult<ReservationResponse> {
        self.record("create_reservation").await?;

        if !self
            .devices
            .lock()
            .await
            .iter()
            .any(|device| device.device_id == device_id)
        {
            return Err(Self::not_found("Device"));
        }

        let mut bookings = self.bookings.lock().await;
        let conflict = bookings.iter().any(|booking| {
            booking.device.id == device_id
                && overlaps(range.start(), range.end(), booking.time.start, booking.time.end)
        });
        if conflict {
            return Err(DashboardError::Conflict(
                "Device already reserved for this time period".to_string(),
            ));
        }

        let id = bookings.iter().map(|booking| booking.id).max().unwrap_or(0) + 1;
        let booking = BookedDevice {
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
                start: range.start(),
                end: range.end(),
                duration_minutes: Some(range.duration_minutes()),
                timezone: None,
            },
            status: Some("upcoming".to_string()),
            purpose: None,
        };
        bookings.push(booking.clone());
        self.created
            .lock()
            .await
            .push((device_id.to_string(), *range));

        Ok(ReservationResponse {
            success: true,
            message: Some("Reservation created".to_string()),
            data: Some(booking),
        })
    }

    async fn cancel_reservation(&self, reservation_id: i64) -> DashboardResult<()> {
        self.record("cancel_reservation").await?;

        let mut bookings = self.bookings.lock().await;
        let before = bookings.len();
        bookings.retain(|booking| booking.id != reservation_id);
        if bookings.len() == before {
            return Err(Self::not_found("Reservation"));
        }
        self.cancelled.lock().await.push(reservation_id);
        Ok(())
    }

    async fn get_device(&self, device_id: &str) -> DashboardResult<DeviceDetails> {
        self.record("get_device").await?;
        self.device_details
            .lock()
            .await
            .get(device_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Device"))
    }

    async fn device_for_edit(&self, device_id: &str) -> DashboardResult<DeviceDetails> {
        self.record("device_for_edit").await?;
        self.device_details
            .lock()
            .await
            .get(device_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Device"))
    }

    async fn update_device(
        &self,
        device_id: &str,
        update: &DeviceIpUpdate,
    ) -> DashboardResult<ActionResponse> {
        self.record("update_device").await?;

        let mut details = self.device_details.lock().await;
        let entry = details
            .get_mut(device_id)
            .ok_or_else(|| Self::not_found("Device"))?;
        if let Some(ip) = &update.pc_ip {
            entry.pc_ip = Some(ip.clone());
        }
        if let Some(ip) = &update.rutomatrix_ip {
            entry.rutomatrix_ip = Some(ip.clone());
        }
        if let Some(ip) = &update.pulse1_ip {
            entry.pulse1_ip = Some(ip.clone());
        }
        if let Some(ip) = &update.ct1_ip {
            entry.ct1_ip = Some(ip.clone());
        }
        Ok(Self::ack("Device updated successfully!"))
    }

    async fn delete_device(&self, device_id: &str) -> DashboardResult<ActionResponse> {
        self.record("delete_device").await?;

        if self.device_details.lock().await.remove(device_id).is_none() {
            return Err(Self::not_found("Device"));
        }
        self.devices
            .lock()
            .await
            .retain(|device| device.device_id != device_id);
        Ok(Self::ack("Device deleted successfully!"))
    }

    async fn add_user(&self, user: &NewUser) -> DashboardResult<ActionResponse> {
        self.record("add_user").await?;

        let mut users = self.users.lock().await;
        let id = users.iter().map(|existing| existing.id).max().unwrap_or(0) + 1;
        let summary = UserSummary {
            id,
            user_name: user.user_name.clone(),
            user_ip: Some(user.user_ip.clone()),
            role: user.role,
        };
        users.push(summary.clone());

        Ok(ActionResponse {
            user: Some(summary),
            ..Self::ack("User added successfully!")
        })
    }

    async fn user_for_edit(&self, user_id: i64) -> DashboardResult<UserForEdit> {
        self.record("user_for_edit").await?;

        let is_admin = self.caller_role.lock().await.as_deref() == Some("admin");
        self.users
            .lock()
            .await
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| UserForEdit {
                id: Some(user.id),
                user_name: user.user_name.clone(),
                user_ip: user.user_ip.clone(),
                role: user.role,
                is_admin,
            })
            .ok_or_else(|| Self::not_found("User"))
    }

    async fn update_user(&self, user_id: i64, update: &UserUpdate) -> DashboardResult<ActionResponse> {
        self.record("update_user").await?;

        let mut users = self.users.lock().await;
        let user = users
            .iter_mut()
            .find(|user| user.id == user_id)
            .ok_or_else(|| Self::not_found("User"))?;
        user.user_name = update.user_name.clone();
        user.user_ip = update.user_ip.clone();
        if let Some(role) = update.role {
            user.role = role;
        }

        Ok(ActionResponse {
            user: Some(user.clone()),
            ..Self::ack("User updated successfully!")
        })
    }

    async fn delete_user(&self, user_id: i64) -> DashboardResult<ActionResponse> {
        self.record("delete_user").await?;

        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|user| user.id != user_id);
        if users.len() == before {
            return Err(Self::not_found("User"));
        }
        Ok(Self::ack("User deleted successfully!"))
    }

    async fn get_usage_record(&self, record_id: i64) -> DashboardResult<UsageRecord> {
        self.record("get_usage_record").await?;
        self.usage_records
            .lock()
            .await
            .iter()
            .find(|record| record.id == record_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Record"))
    }

    async fn delete_usage_record(&self, record_id: i64) -> DashboardResult<ActionResponse> {
        self.record("delete_usage_record").await?;

        let mut records = self.usage_records.lock().await;
        let before = records.len();
        records.retain(|record| record.id != record_id);
        if records.len() == before {
            return Err(Self::not_found("Record"));
        }
        Ok(Self::ack("Record deleted successfully"))
    }

    async fn clear_old_records(&self) -> DashboardResult<ActionResponse> {
        self.record("clear_old_records").await?;

        let mut records = self.usage_records.lock().await;
        let cutoff = Utc::now() - chrono::Duration::days(Constants::HISTORY_RETENTION_DAYS);
        let before = records.len();
        records.retain(|record| match record.timing.start_time {
            Some(start) => start >= cutoff,
            None => true,
        });
        let deleted = (before - records.len()) as i64;

        Ok(ActionResponse {
            deleted_count: Some(deleted),
            ..Self::ack(&format!("Deleted {} old records", deleted))
        })
    }
}
