use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::env;

use crate::time;

#[derive(Debug, Clone)]
pub struct Config {
    pub dashboard_url: String,
    pub csrf_token: Option<String>,
    /// Raw `Cookie` header value, e.g. `session=...`
    pub session_cookie: Option<String>,
    pub display_timezone: Tz,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let dashboard_url = env::var("DASHBOARD_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());

        let csrf_token = non_empty_var("CSRF_TOKEN");
        let session_cookie = non_empty_var("SESSION_COOKIE");

        let tz_name = env::var("DISPLAY_TIMEZONE").unwrap_or_else(|_| "Asia/Kolkata".to_string());
        let display_timezone = time::parse_timezone(&tz_name)
            .ok_or_else(|| anyhow!("DISPLAY_TIMEZONE is not a known timezone: {}", tz_name))?;

        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow!("REQUEST_TIMEOUT_SECS must be a positive integer"))?,
            Err(_) => 30,
        };

        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            dashboard_url,
            csrf_token,
            session_cookie,
            display_timezone,
            request_timeout_secs,
            log_level,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
