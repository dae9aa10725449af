use std::net::Ipv4Addr;
use tracing::info;

use crate::constants::Constants;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{
    ActionResponse, DeviceDetails, DeviceIpUpdate, NewUser, UserForEdit, UserRole, UserUpdate,
};
use crate::traits::DashboardApi;

/// Check that a non-empty IP field holds a dotted IPv4 address.
pub fn validate_ipv4(field: &str, value: &str) -> DashboardResult<()> {
    let value = value.trim();
    if value.is_empty() || value.parse::<Ipv4Addr>().is_ok() {
        Ok(())
    } else {
        Err(DashboardError::Validation(format!(
            "Invalid IP format for {}",
            field
        )))
    }
}

pub fn validate_ip_update(update: &DeviceIpUpdate) -> DashboardResult<()> {
    for (field, value) in update.fields() {
        if let Some(value) = value {
            validate_ipv4(field, value)?;
        }
    }
    Ok(())
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|value| value.trim().to_string())
}

/// Device and user management on behalf of a caller with a known role.
///
/// Mutations are refused locally for non-admins; the backend still performs
/// its own authorization.
pub struct AdminConsole<'a> {
    api: &'a dyn DashboardApi,
    role: UserRole,
}

impl<'a> AdminConsole<'a> {
    pub fn new(api: &'a dyn DashboardApi, role: UserRole) -> Self {
        Self { api, role }
    }

    fn require_admin(&self) -> DashboardResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(DashboardError::Validation(
                Constants::MSG_ADMIN_REQUIRED.to_string(),
            ))
        }
    }

    pub async fn get_device(&self, device_id: &str) -> DashboardResult<DeviceDetails> {
        self.api.get_device(device_id).await
    }

    pub async fn device_for_edit(&self, device_id: &str) -> DashboardResult<DeviceDetails> {
        self.api.device_for_edit(device_id).await
    }

    pub async fn update_device(
        &self,
        device_id: &str,
        update: &DeviceIpUpdate,
    ) -> DashboardResult<ActionResponse> {
        self.require_admin()?;

        let update = DeviceIpUpdate {
            pc_ip: trimmed(&update.pc_ip),
            rutomatrix_ip: trimmed(&update.rutomatrix_ip),
            pulse1_ip: trimmed(&update.pulse1_ip),
            ct1_ip: trimmed(&update.ct1_ip),
        };
        validate_ip_update(&update)?;

        let response = self.api.update_device(device_id, &update).await?;
        info!("Updated device {}", device_id);
        Ok(response)
    }

    pub async fn delete_device(&self, device_id: &str) -> DashboardResult<ActionResponse> {
        self.require_admin()?;
        let response = self.api.delete_device(device_id).await?;
        info!("Deleted device {}", device_id);
        Ok(response)
    }

    pub async fn add_user(&self, user: &NewUser) -> DashboardResult<ActionResponse> {
        self.require_admin()?;

        let user_name = user.user_name.trim();
        if user_name.is_empty() || user.password.is_empty() {
            return Err(DashboardError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        let user_ip = user.user_ip.trim();
        validate_ipv4("user_ip", user_ip)?;

        let user = NewUser {
            user_name: user_name.to_string(),
            user_ip: user_ip.to_string(),
            password: user.password.clone(),
            role: user.role,
        };
        let response = self.api.add_user(&user).await?;
        info!("Added user {}", user.user_name);
        Ok(response)
    }

    pub async fn user_for_edit(&self, user_id: i64) -> DashboardResult<UserForEdit> {
        self.api.user_for_edit(user_id).await
    }

    pub async fn update_user(&self, user_id: i64, update: &UserUpdate) -> DashboardResult<ActionResponse> {
        self.require_admin()?;

        let user_name = update.user_name.trim();
        if user_name.is_empty() {
            return Err(DashboardError::Validation("Username is required".to_string()));
        }
        let user_ip = trimmed(&update.user_ip);
        if let Some(ip) = &user_ip {
            validate_ipv4("user_ip", ip)?;
        }

        // An empty password field means "keep the current one".
        let update = UserUpdate {
            user_name: user_name.to_string(),
            user_ip,
            role: update.role,
            password: update.password.clone().filter(|password| !password.is_empty()),
        };
        let response = self.api.update_user(user_id, &update).await?;
        info!("Updated user {}", user_id);
        Ok(response)
    }

    pub async fn delete_user(&self, user_id: i64) -> DashboardResult<ActionResponse> {
        self.require_admin()?;
        let response = self.api.delete_user(user_id).await?;
        info!("Deleted user {}", user_id);
        Ok(response)
    }
}
