use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::Constants;

/// A device as returned by `GET /api/devices/availability`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub status: DeviceStatus, // derived relative to the queried range
    #[serde(default)]
    pub reservation_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reservation_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pc_ip: Option<String>,
    #[serde(default)]
    pub rutomatrix_ip: Option<String>,
    #[serde(default)]
    pub pulse1_ip: Option<String>,
    #[serde(default)]
    pub ct1_ip: Option<String>,
}

impl Device {
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Device {}", self.device_id),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == DeviceStatus::Available
    }
}

/// Envelope of `GET /api/devices/availability`
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub devices: Option<Vec<Device>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One reservation row of `GET /api/booked-devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedDevice {
    pub id: i64,
    pub device: BookedDeviceInfo,
    #[serde(default)]
    pub user: BookedUser,
    pub time: BookingTime,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedDeviceInfo {
    pub id: String,
    #[serde(default)]
    pub ct1_ip: Option<String>,
    #[serde(default)]
    pub pulse1_ip: Option<String>,
    #[serde(default)]
    pub pc_ip: Option<String>,
    #[serde(default)]
    pub rutomatrix_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookedUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingTime {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Body of `POST /api/reservations`
#[derive(Debug, Clone, Serialize)]
pub struct ReservationRequest {
    pub device_id: String,
    pub start_time: String,
    pub end_time: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<BookedDevice>,
}

/// Client-side read cache of an existing reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: i64,
    pub device_id: String,
    pub user_id: Option<i64>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<&BookedDevice> for Reservation {
    fn from(booking: &BookedDevice) -> Self {
        Self {
            id: booking.id,
            device_id: booking.device.id.clone(),
            user_id: booking.user.id,
            start: booking.time.start,
            end: booking.time.end,
        }
    }
}

/// IP settings of a device (`GET /api/devices/{id}`, `GET /edit/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDetails {
    pub device_id: String,
    #[serde(default, rename = "PC_IP")]
    pub pc_ip: Option<String>,
    #[serde(default, rename = "Rutomatrix_ip")]
    pub rutomatrix_ip: Option<String>,
    #[serde(default, rename = "Pulse1_Ip")]
    pub pulse1_ip: Option<String>,
    #[serde(default, rename = "CT1_ip")]
    pub ct1_ip: Option<String>,
}

/// Form fields accepted by `POST /edit/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceIpUpdate {
    #[serde(rename = "PC_IP", skip_serializing_if = "Option::is_none")]
    pub pc_ip: Option<String>,
    #[serde(rename = "Rutomatrix_ip", skip_serializing_if = "Option::is_none")]
    pub rutomatrix_ip: Option<String>,
    #[serde(rename = "Pulse1_Ip", skip_serializing_if = "Option::is_none")]
    pub pulse1_ip: Option<String>,
    #[serde(rename = "CT1_ip", skip_serializing_if = "Option::is_none")]
    pub ct1_ip: Option<String>,
}

impl DeviceIpUpdate {
    /// Field name paired with its value, in form order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("PC_IP", self.pc_ip.as_deref()),
            ("Rutomatrix_ip", self.rutomatrix_ip.as_deref()),
            ("Pulse1_Ip", self.pulse1_ip.as_deref()),
            ("CT1_ip", self.ct1_ip.as_deref()),
        ]
    }
}

/// Generic `{status?, message?, error?}` acknowledgement used by the CRUD endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub deleted_count: Option<i64>,
    #[serde(default)]
    pub user: Option<UserSummary>,
}

impl ActionResponse {
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub user_name: String,
    #[serde(default)]
    pub user_ip: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

/// Payload of `GET /users/edit/{id}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserForEdit {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_name: String,
    #[serde(default)]
    pub user_ip: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub user_name: String,
    pub user_ip: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Usage history record (`GET /history/get-usage-record/{id}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UsageRecord {
    pub id: i64,
    pub device_id: String,
    pub user_info: UsageUser,
    pub timing: UsageTiming,
    #[serde(default)]
    pub network_info: UsageNetwork,
    pub status_info: UsageStatusInfo,
    #[serde(default)]
    pub reservation_info: UsageReservation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UsageUser {
    pub user_id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UsageTiming {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<f64>, // seconds
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UsageNetwork {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub ip_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UsageStatusInfo {
    pub status: UsageStatus,
    #[serde(default)]
    pub termination_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UsageReservation {
    #[serde(default)]
    pub reservation_id: Option<i64>,
    #[serde(default)]
    pub ip_type: Option<String>,
}

// Enums for better type safety
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceStatus {
    #[default]
    Available,
    Booked,
}

impl From<String> for DeviceStatus {
    fn from(s: String) -> Self {
        // Anything the backend does not call available is not selectable.
        if s.eq_ignore_ascii_case(Constants::DEVICE_AVAILABLE) {
            Self::Available
        } else {
            Self::Booked
        }
    }
}

impl From<DeviceStatus> for String {
    fn from(status: DeviceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => Constants::DEVICE_AVAILABLE,
            Self::Booked => Constants::DEVICE_BOOKED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReservationStatus {
    Active,
    Upcoming,
    Expired,
}

impl ReservationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Upcoming => "Upcoming",
            Self::Expired => "Expired",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case(Constants::ROLE_ADMIN) {
            Self::Admin
        } else {
            Self::User
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Constants::ROLE_ADMIN.to_string(),
            UserRole::User => Constants::ROLE_USER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum UsageStatus {
    Active,
    Completed,
    Terminated,
    Reserved,
    Upcoming,
    Pending,
    Other(String),
}

impl From<String> for UsageStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "completed" => Self::Completed,
            "terminated" => Self::Terminated,
            "reserved" => Self::Reserved,
            "upcoming" => Self::Upcoming,
            "pending" => Self::Pending,
            _ => Self::Other(s),
        }
    }
}

impl UsageStatus {
    pub fn label(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Terminated => "terminated",
            Self::Reserved => "reserved",
            Self::Upcoming => "upcoming",
            Self::Pending => "pending",
            Self::Other(raw) => raw,
        }
    }
}
