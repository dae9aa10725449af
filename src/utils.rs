// Utility functions
use crate::models::UserRole;

/// Whether a raw role string from the backend grants admin actions
pub fn is_admin(role: Option<&str>) -> bool {
    role.map(|role| UserRole::from(role.to_string()).is_admin())
        .unwrap_or(false)
}

pub fn format_duration_minutes(minutes: i64) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        let hours = minutes / 60;
        let remaining_minutes = minutes % 60;
        if remaining_minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, remaining_minutes)
        }
    }
}
