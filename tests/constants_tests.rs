use rackdesk::constants::Constants;
use rackdesk::models::{DeviceStatus, UserRole};

#[test]
fn test_wire_values_round_trip_through_enums() {
    assert_eq!(
        DeviceStatus::from(Constants::DEVICE_AVAILABLE.to_string()),
        DeviceStatus::Available
    );
    assert_eq!(
        DeviceStatus::from(Constants::DEVICE_BOOKED.to_string()),
        DeviceStatus::Booked
    );
    assert_eq!(String::from(DeviceStatus::Booked), Constants::DEVICE_BOOKED);

    assert_eq!(UserRole::from(Constants::ROLE_ADMIN.to_string()), UserRole::Admin);
    assert_eq!(UserRole::from("ADMIN".to_string()), UserRole::Admin);
    assert_eq!(UserRole::from("guest".to_string()), UserRole::User);
    assert_eq!(String::from(UserRole::User), Constants::ROLE_USER);
}

#[test]
fn test_limits() {
    assert_eq!(Constants::DEVICES_PER_PAGE, 10);
    assert_eq!(Constants::BOOKED_ROWS_PER_PAGE, 10);
    assert_eq!(Constants::HISTORY_RETENTION_DAYS, 180);
    assert_eq!(Constants::ROW_REMOVAL_DELAY_MS, 300);
    assert_eq!(Constants::DEFAULT_BOOKING_MINUTES, 60);
}

#[test]
fn test_user_facing_messages() {
    assert_eq!(Constants::MSG_SELECT_DEVICE, "Please select a device first");
    assert_eq!(Constants::MSG_BOOKED, "Device booked successfully!");
    assert_eq!(
        Constants::MSG_CANCEL_CONFIRM,
        "Are you sure you want to cancel this reservation?"
    );
    assert_eq!(Constants::CSRF_HEADER, "X-CSRFToken");
}
