use chrono::Duration;
use tracing::{debug, error, info, warn};

use crate::availability::{precheck, Precheck};
use crate::booked::{BookedView, RowState};
use crate::constants::Constants;
use crate::error::{DashboardError, DashboardResult};
use crate::models::ReservationResponse;
use crate::store::DashboardStore;
use crate::traits::{Clock, Confirm, DashboardApi};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success,
    Failed,
}

/// Drives a single reservation request from the selected device.
///
/// `Failed` is transient: the submitter drops back to `Idle` right away with
/// the error kept in `last_error`. Nothing is retried automatically.
#[derive(Debug, Clone, Default)]
pub struct ReservationSubmitter {
    state: SubmissionState,
    transitions: Vec<SubmissionState>,
    last_error: Option<DashboardError>,
    last_message: Option<String>,
}

impl ReservationSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Every state entered so far, oldest first.
    pub fn transitions(&self) -> &[SubmissionState] {
        &self.transitions
    }

    pub fn last_error(&self) -> Option<&DashboardError> {
        self.last_error.as_ref()
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    fn enter(&mut self, next: SubmissionState) {
        debug!("Submission state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.transitions.push(next);
    }

    /// Reject without ever leaving `Idle`.
    fn reject(&mut self, err: DashboardError) -> DashboardResult<ReservationResponse> {
        if self.state != SubmissionState::Idle {
            self.enter(SubmissionState::Idle);
        }
        self.last_error = Some(err.clone());
        Err(err)
    }

    /// Book the store's selected device for the store's active range.
    ///
    /// The availability check runs against the cached catalog only; the
    /// backend decides. On success the store is invalidated so the caller
    /// reloads from scratch.
    pub async fn submit(
        &mut self,
        api: &dyn DashboardApi,
        store: &mut DashboardStore,
    ) -> DashboardResult<ReservationResponse> {
        self.last_message = None;

        let Some(device_id) = store.selected_id().map(str::to_string) else {
            return self.reject(DashboardError::Validation(
                Constants::MSG_SELECT_DEVICE.to_string(),
            ));
        };
        let Some(range) = store.range().copied() else {
            return self.reject(DashboardError::Validation(
                Constants::MSG_SELECT_BOTH_TIMES.to_string(),
            ));
        };
        if let Precheck::Conflict { message } = precheck(store.selected_device()) {
            return self.reject(DashboardError::Conflict(message));
        }

        self.enter(SubmissionState::Submitting);
        info!(
            "Submitting reservation for device {} ({} minutes)",
            device_id,
            range.duration_minutes()
        );

        match api.create_reservation(&device_id, &range).await {
            Ok(response) => {
                self.enter(SubmissionState::Success);
                self.last_error = None;
                self.last_message = Some(
                    response
                        .message
                        .clone()
                        .unwrap_or_else(|| Constants::MSG_BOOKED.to_string()),
                );
                store.invalidate();
                Ok(response)
            }
            Err(err) => {
                warn!("Reservation for device {} failed: {}", device_id, err);
                self.enter(SubmissionState::Failed);
                self.enter(SubmissionState::Idle);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Leave `Success` after the caller has reloaded.
    pub fn reset(&mut self) {
        if self.state != SubmissionState::Idle {
            self.enter(SubmissionState::Idle);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Declined,
    Cancelled,
}

/// Confirm, cancel, animate out and reload.
pub struct CancellationFlow<'a> {
    api: &'a dyn DashboardApi,
    clock: &'a dyn Clock,
    confirm: &'a dyn Confirm,
}

impl<'a> CancellationFlow<'a> {
    pub fn new(api: &'a dyn DashboardApi, clock: &'a dyn Clock, confirm: &'a dyn Confirm) -> Self {
        Self { api, clock, confirm }
    }

    pub async fn cancel(&self, view: &mut BookedView, reservation_id: i64) -> DashboardResult<CancelOutcome> {
        let row = view.row(reservation_id).ok_or_else(|| {
            DashboardError::Validation(format!("Reservation {} not found", reservation_id))
        })?;
        if !row.can_cancel {
            return Err(DashboardError::Validation(
                Constants::MSG_ADMIN_REQUIRED.to_string(),
            ));
        }

        if !self.confirm.confirm(Constants::MSG_CANCEL_CONFIRM) {
            debug!("Cancellation of reservation {} declined", reservation_id);
            return Ok(CancelOutcome::Declined);
        }

        set_row_state(view, reservation_id, RowState::Cancelling);

        if let Err(err) = self.api.cancel_reservation(reservation_id).await {
            error!("Failed to cancel reservation {}: {}", reservation_id, err);
            set_row_state(view, reservation_id, RowState::Idle);
            return Err(err);
        }

        info!("Cancelled reservation {}", reservation_id);
        set_row_state(view, reservation_id, RowState::Removing);
        self.clock
            .sleep_duration(Duration::milliseconds(Constants::ROW_REMOVAL_DELAY_MS))
            .await;
        view.remove_row(reservation_id);

        match self.api.fetch_booked_devices().await {
            Ok(bookings) => view.reload(&bookings, self.clock.now_utc()),
            // The cancellation itself went through; keep the local removal.
            Err(err) => warn!("Reload after cancellation failed: {}", err),
        }

        Ok(CancelOutcome::Cancelled)
    }
}

fn set_row_state(view: &mut BookedView, reservation_id: i64, state: RowState) {
    if let Some(row) = view.row_mut(reservation_id) {
        row.state = state;
    }
}
