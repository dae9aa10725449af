use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::info;

use crate::constants::Constants;
use crate::error::DashboardResult;
use crate::models::UsageRecord;
use crate::traits::{Confirm, DashboardApi};

/// Format a duration in seconds as `"{h}h {m}m"`; `"N/A"` when unknown.
pub fn format_duration_secs(duration: Option<f64>) -> String {
    match duration {
        Some(secs) if secs.is_finite() && secs >= 0.0 => {
            let total = secs as i64;
            format!("{}h {}m", total / 3600, (total % 3600) / 60)
        }
        _ => Constants::NOT_AVAILABLE.to_string(),
    }
}

/// Keep records whose start falls on a local calendar day within
/// `[from, to]`. Either bound may be open; records without a start time only
/// pass when both bounds are open.
pub fn filter_by_date<'a>(
    records: &'a [UsageRecord],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    tz: Tz,
) -> Vec<&'a UsageRecord> {
    records
        .iter()
        .filter(|record| {
            if from.is_none() && to.is_none() {
                return true;
            }
            let Some(start) = record.timing.start_time else {
                return false;
            };
            let day = start.with_timezone(&tz).date_naive();
            from.map_or(true, |from| day >= from) && to.map_or(true, |to| day <= to)
        })
        .collect()
}

pub async fn get_usage_record(api: &dyn DashboardApi, record_id: i64) -> DashboardResult<UsageRecord> {
    api.get_usage_record(record_id).await
}

/// Delete one record after confirmation. Returns whether anything was sent.
pub async fn delete_usage_record(
    api: &dyn DashboardApi,
    confirm: &dyn Confirm,
    record_id: i64,
) -> DashboardResult<bool> {
    if !confirm.confirm(Constants::MSG_DELETE_RECORD_CONFIRM) {
        return Ok(false);
    }
    api.delete_usage_record(record_id).await?;
    info!("Deleted usage record {}", record_id);
    Ok(true)
}

/// Purge records past the retention window after confirmation.
/// Returns the deleted count, or `None` if the prompt was declined.
pub async fn clear_old_records(api: &dyn DashboardApi, confirm: &dyn Confirm) -> DashboardResult<Option<i64>> {
    if !confirm.confirm(Constants::MSG_CLEAR_HISTORY_CONFIRM) {
        return Ok(None);
    }
    let response = api.clear_old_records().await?;
    let deleted = response.deleted_count.unwrap_or(0);
    info!("Cleared {} usage records older than {} days", deleted, Constants::HISTORY_RETENTION_DAYS);
    Ok(Some(deleted))
}
