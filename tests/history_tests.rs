use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Asia::Kolkata;
use rackdesk::constants::Constants;
use rackdesk::history::*;
use rackdesk::models::UsageStatus;
use rackdesk::traits::*;
use tokio_test::{assert_err, assert_ok};

mod common;
use common::*;

#[test]
fn test_format_duration_secs() {
    assert_eq!(format_duration_secs(Some(0.0)), "0h 0m");
    assert_eq!(format_duration_secs(Some(59.0)), "0h 0m");
    assert_eq!(format_duration_secs(Some(5400.0)), "1h 30m");
    assert_eq!(format_duration_secs(Some(90061.5)), "25h 1m");
    assert_eq!(format_duration_secs(None), Constants::NOT_AVAILABLE);
    assert_eq!(format_duration_secs(Some(-1.0)), Constants::NOT_AVAILABLE);
    assert_eq!(format_duration_secs(Some(f64::NAN)), Constants::NOT_AVAILABLE);
}

#[test]
fn test_usage_status_parsing() {
    assert_eq!(UsageStatus::from("Active".to_string()), UsageStatus::Active);
    assert_eq!(UsageStatus::from("terminated".to_string()), UsageStatus::Terminated);
    let other = UsageStatus::from("archived".to_string());
    assert_eq!(other, UsageStatus::Other("archived".to_string()));
    assert_eq!(other.label(), "archived");
}

#[test]
fn test_filter_by_date_is_inclusive_in_local_days() {
    let records = vec![
        // 2024-01-14 23:00 IST
        UsageRecordBuilder::new(1, "D1").started_at(at("2024-01-14T17:30:00Z"), 600.0).build(),
        // 2024-01-15 00:30 IST (still the 14th in UTC)
        UsageRecordBuilder::new(2, "D1").started_at(at("2024-01-14T19:00:00Z"), 600.0).build(),
        // 2024-01-16 12:00 IST
        UsageRecordBuilder::new(3, "D2").started_at(at("2024-01-16T06:30:00Z"), 600.0).build(),
        UsageRecordBuilder::new(4, "D2").build(),
    ];

    let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let ids = |found: Vec<&rackdesk::models::UsageRecord>| found.iter().map(|r| r.id).collect::<Vec<_>>();

    assert_eq!(ids(filter_by_date(&records, Some(day), Some(day), Kolkata)), vec![2]);
    assert_eq!(ids(filter_by_date(&records, Some(day), None, Kolkata)), vec![2, 3]);
    assert_eq!(ids(filter_by_date(&records, None, Some(day), Kolkata)), vec![1, 2]);
    assert_eq!(ids(filter_by_date(&records, None, None, Kolkata)), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_get_usage_record() -> Result<()> {
    let ctx = TestContext::new();
    ctx.api
        .usage_records
        .lock()
        .await
        .push(UsageRecordBuilder::new(5, "D1").started_at(base_time(), 3600.0).build());

    let record = assert_ok!(get_usage_record(&*ctx.api, 5).await);
    assert_eq!(record.device_id, "D1");
    assert_eq!(format_duration_secs(record.timing.duration), "1h 0m");

    assert_err!(get_usage_record(&*ctx.api, 6).await);
    Ok(())
}

#[tokio::test]
async fn test_delete_record_requires_confirmation() -> Result<()> {
    let ctx = TestContext::new();
    ctx.api
        .usage_records
        .lock()
        .await
        .push(UsageRecordBuilder::new(5, "D1").build());

    let declined = MockConfirm::declining();
    assert!(!delete_usage_record(&*ctx.api, &declined, 5).await?);
    assert_eq!(ctx.api.usage_records.lock().await.len(), 1);
    assert_eq!(
        declined.prompts.lock().unwrap().as_slice(),
        &[Constants::MSG_DELETE_RECORD_CONFIRM.to_string()]
    );

    let accepted = MockConfirm::accepting();
    assert!(delete_usage_record(&*ctx.api, &accepted, 5).await?);
    assert!(ctx.api.usage_records.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_clear_old_records() -> Result<()> {
    let ctx = TestContext::new();
    let now = Utc::now();
    {
        let mut records = ctx.api.usage_records.lock().await;
        records.push(UsageRecordBuilder::new(1, "D1").started_at(now - Duration::days(200), 60.0).build());
        records.push(UsageRecordBuilder::new(2, "D1").started_at(now - Duration::days(10), 60.0).build());
        records.push(UsageRecordBuilder::new(3, "D1").build());
    }

    assert_eq!(clear_old_records(&*ctx.api, &MockConfirm::declining()).await?, None);
    assert_eq!(ctx.api.call_count("clear_old_records").await, 0);

    let deleted = clear_old_records(&*ctx.api, &MockConfirm::accepting()).await?;
    assert_eq!(deleted, Some(1));
    let remaining: Vec<i64> = ctx.api.usage_records.lock().await.iter().map(|r| r.id).collect();
    assert_eq!(remaining, vec![2, 3]);
    Ok(())
}
