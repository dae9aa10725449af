pub struct Constants;

impl Constants {
    // Status indicators
    pub const AVAILABLE_EMOJI: &'static str = "✅";
    pub const BOOKED_EMOJI: &'static str = "🔒";
    pub const ACTIVE_EMOJI: &'static str = "🟢";
    pub const UPCOMING_EMOJI: &'static str = "🕐";
    pub const EXPIRED_EMOJI: &'static str = "⌛";
    pub const SELECTED_EMOJI: &'static str = "👉";
    pub const WARNING_EMOJI: &'static str = "⚠️";
    pub const ERROR_EMOJI: &'static str = "❌";

    // Page sizes and limits
    pub const DEVICES_PER_PAGE: usize = 10;
    pub const BOOKED_ROWS_PER_PAGE: usize = 10;
    pub const HISTORY_RETENTION_DAYS: i64 = 180;

    // Grouping
    pub const FALLBACK_GROUP: &'static str = "Other";

    // Time constants
    pub const DEFAULT_BOOKING_MINUTES: i64 = 60;
    pub const ROW_REMOVAL_DELAY_MS: i64 = 300;
    pub const REFRESH_FALLBACK_SECS: u64 = 30;

    // Device status (wire values)
    pub const DEVICE_AVAILABLE: &'static str = "available";
    pub const DEVICE_BOOKED: &'static str = "booked";

    // User roles
    pub const ROLE_ADMIN: &'static str = "admin";
    pub const ROLE_USER: &'static str = "user";

    // Headers
    pub const CSRF_HEADER: &'static str = "X-CSRFToken";

    // Validation messages
    pub const MSG_SELECT_BOTH_TIMES: &'static str = "Please select both start and end times";
    pub const MSG_PAST_START: &'static str =
        "Cannot book in past time. Please select future time slots.";
    pub const MSG_END_BEFORE_START: &'static str = "End time must be after start time";
    pub const MSG_SELECT_DEVICE: &'static str = "Please select a device first";
    pub const MSG_DEVICE_UNAVAILABLE: &'static str =
        "The selected device is no longer available. Please select another device.";
    pub const MSG_DEVICE_ALREADY_BOOKED: &'static str =
        "This device is already booked for the selected time";
    pub const MSG_RETRY_LOAD: &'static str = "Failed to load devices. Retry?";
    pub const MSG_ADMIN_REQUIRED: &'static str = "Admin privileges required";
    pub const MSG_CANCEL_CONFIRM: &'static str = "Are you sure you want to cancel this reservation?";
    pub const MSG_DELETE_RECORD_CONFIRM: &'static str = "Are you sure you want to delete this record?";
    pub const MSG_CLEAR_HISTORY_CONFIRM: &'static str = "Delete all records older than 6 months?";

    // Success messages
    pub const MSG_BOOKED: &'static str = "Device booked successfully!";
    pub const MSG_CANCELLED: &'static str = "Reservation cancelled successfully!";

    // Failure fallbacks when the backend sends no message
    pub const MSG_BOOKING_FAILED: &'static str = "Failed to create reservation";
    pub const MSG_CANCEL_FAILED: &'static str = "Failed to cancel reservation";

    // Display
    pub const NOT_AVAILABLE: &'static str = "N/A";
    pub const DISPLAY_DATETIME_FORMAT: &'static str = "%Y-%m-%d %H:%M";
    pub const SHORT_DATETIME_FORMAT: &'static str = "%b %d %H:%M";
}
