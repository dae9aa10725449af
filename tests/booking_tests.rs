use anyhow::Result;
use rackdesk::booked::{BookedView, RowState};
use rackdesk::booking::*;
use rackdesk::constants::Constants;
use rackdesk::error::DashboardError;
use rackdesk::store::DashboardStore;
use rackdesk::traits::*;

mod common;
use common::*;

async fn seeded() -> TestContext {
    TestContext::new()
        .with_devices(vec![
            DeviceBuilder::new("D1").with_type("Router").build(),
            DeviceBuilder::new("D2").with_type("Router").build(),
        ])
        .await
        .with_bookings(vec![BookingBuilder::minutes(1, "D1", 10, 20)
            .with_user(7, "bob")
            .build()])
        .await
}

#[tokio::test]
async fn test_submit_without_selection_stays_idle() -> Result<()> {
    let ctx = seeded().await;
    let mut store = ctx.loaded_store(range(15, 25)).await?;
    let mut submitter = ReservationSubmitter::new();

    let err = submitter.submit(&*ctx.api, &mut store).await.unwrap_err();

    assert_eq!(err, DashboardError::Validation(Constants::MSG_SELECT_DEVICE.to_string()));
    assert_eq!(submitter.state(), SubmissionState::Idle);
    assert!(submitter.transitions().is_empty());
    assert_eq!(ctx.api.call_count("create_reservation").await, 0);
    Ok(())
}

#[tokio::test]
async fn test_submit_success_invalidates_store() -> Result<()> {
    let ctx = seeded().await;
    let mut store = ctx.loaded_store(range(30, 90)).await?;
    store.select_device("D2")?;

    let mut submitter = ReservationSubmitter::new();
    let response = submitter.submit(&*ctx.api, &mut store).await?;

    assert!(response.success);
    assert_eq!(submitter.state(), SubmissionState::Success);
    assert_eq!(
        submitter.transitions(),
        &[SubmissionState::Submitting, SubmissionState::Success]
    );
    assert!(submitter.last_error().is_none());
    assert!(!store.is_loaded());

    let created = ctx.api.created.lock().await.clone();
    assert_eq!(created, vec![("D2".to_string(), range(30, 90))]);

    submitter.reset();
    assert_eq!(submitter.state(), SubmissionState::Idle);
    Ok(())
}

#[tokio::test]
async fn test_server_conflict_returns_to_idle() -> Result<()> {
    let ctx = seeded().await;
    let mut store = ctx.loaded_store(range(30, 90)).await?;
    store.select_device("D2")?;

    // Another client books D2 after our catalog was loaded
    ctx.api.add_booking(BookingBuilder::minutes(9, "D2", 45, 75).build()).await;

    let mut submitter = ReservationSubmitter::new();
    let err = submitter.submit(&*ctx.api, &mut store).await.unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(submitter.state(), SubmissionState::Idle);
    assert_eq!(
        submitter.transitions(),
        &[
            SubmissionState::Submitting,
            SubmissionState::Failed,
            SubmissionState::Idle
        ]
    );
    assert_eq!(submitter.last_error(), Some(&err));
    // Failed submissions keep the catalog for reselection
    assert!(store.is_loaded());
    Ok(())
}

#[tokio::test]
async fn test_network_failure_is_not_retried() -> Result<()> {
    let ctx = seeded().await;
    let mut store = ctx.loaded_store(range(30, 90)).await?;
    store.select_device("D2")?;
    ctx.api
        .set_failure("create_reservation", DashboardError::Network("timed out".to_string()))
        .await;

    let mut submitter = ReservationSubmitter::new();
    assert!(submitter.submit(&*ctx.api, &mut store).await.is_err());
    assert_eq!(ctx.api.call_count("create_reservation").await, 1);
    Ok(())
}

#[tokio::test]
async fn test_submit_without_range() -> Result<()> {
    let ctx = seeded().await;
    let mut store = DashboardStore::new();
    let mut submitter = ReservationSubmitter::new();

    let err = submitter.submit(&*ctx.api, &mut store).await.unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));
    Ok(())
}

async fn booked_view(ctx: &TestContext) -> Result<BookedView> {
    let bookings = ctx.api.fetch_booked_devices().await?;
    Ok(BookedView::from_bookings(&bookings, ctx.now()))
}

#[tokio::test]
async fn test_cancel_requires_admin_row() -> Result<()> {
    let ctx = seeded().await;
    ctx.api.set_caller_role(Some("user")).await;
    let mut view = booked_view(&ctx).await?;
    let confirm = MockConfirm::accepting();

    let flow = CancellationFlow::new(&*ctx.api, &*ctx.clock, &confirm);
    let err = flow.cancel(&mut view, 1).await.unwrap_err();

    assert_eq!(err, DashboardError::Validation(Constants::MSG_ADMIN_REQUIRED.to_string()));
    assert_eq!(confirm.prompt_count(), 0);
    assert_eq!(ctx.api.call_count("cancel_reservation").await, 0);
    Ok(())
}

#[tokio::test]
async fn test_cancel_declined_sends_nothing() -> Result<()> {
    let ctx = seeded().await;
    ctx.api.set_caller_role(Some("admin")).await;
    let mut view = booked_view(&ctx).await?;
    let confirm = MockConfirm::declining();

    let flow = CancellationFlow::new(&*ctx.api, &*ctx.clock, &confirm);
    let outcome = flow.cancel(&mut view, 1).await?;

    assert_eq!(outcome, CancelOutcome::Declined);
    assert_eq!(confirm.prompt_count(), 1);
    assert_eq!(ctx.api.call_count("cancel_reservation").await, 0);
    assert_eq!(view.row(1).unwrap().state, RowState::Idle);
    Ok(())
}

#[tokio::test]
async fn test_cancel_success_removes_row_after_delay_and_reloads() -> Result<()> {
    let ctx = seeded().await;
    ctx.api.set_caller_role(Some("admin")).await;
    let mut view = booked_view(&ctx).await?;
    let confirm = MockConfirm::accepting();
    let started = ctx.now();

    let flow = CancellationFlow::new(&*ctx.api, &*ctx.clock, &confirm);
    let outcome = flow.cancel(&mut view, 1).await?;

    assert_eq!(outcome, CancelOutcome::Cancelled);
    assert!(view.row(1).is_none());
    assert_eq!(
        ctx.now() - started,
        chrono::Duration::milliseconds(Constants::ROW_REMOVAL_DELAY_MS)
    );
    assert_eq!(*ctx.api.cancelled.lock().await, vec![1]);
    // Reload after cancellation
    assert_eq!(ctx.api.call_count("fetch_booked_devices").await, 2);
    Ok(())
}

#[tokio::test]
async fn test_cancel_failure_reverts_row() -> Result<()> {
    let ctx = seeded().await;
    ctx.api.set_caller_role(Some("admin")).await;
    ctx.api
        .set_failure(
            "cancel_reservation",
            DashboardError::Server {
                status: 500,
                message: "Failed to cancel reservation".to_string(),
            },
        )
        .await;
    let mut view = booked_view(&ctx).await?;
    let confirm = MockConfirm::accepting();

    let flow = CancellationFlow::new(&*ctx.api, &*ctx.clock, &confirm);
    let err = flow.cancel(&mut view, 1).await.unwrap_err();

    assert!(matches!(err, DashboardError::Server { status: 500, .. }));
    let row = view.row(1).unwrap();
    assert_eq!(row.state, RowState::Idle);
    assert_eq!(ctx.api.bookings.lock().await.len(), 1);
    Ok(())
}
