use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::booked::BookedView;
use crate::constants::Constants;
use crate::error::DashboardResult;
use crate::traits::{Clock, DashboardApi};

/// Keeps the booked-devices view in step with the wall clock.
///
/// Sleeps until the next row changes status (or the fallback interval when
/// nothing is pending), then refetches and re-derives.
pub struct RefreshWorker {
    api: Arc<dyn DashboardApi>,
    clock: Arc<dyn Clock>,
    fallback: Duration,
}

impl RefreshWorker {
    pub fn new(api: Arc<dyn DashboardApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            clock,
            fallback: Duration::seconds(Constants::REFRESH_FALLBACK_SECS as i64),
        }
    }

    pub fn with_fallback(mut self, fallback: Duration) -> Self {
        self.fallback = fallback;
        self
    }

    pub async fn run<F>(&self, view: &mut BookedView, mut on_refresh: F) -> Result<()>
    where
        F: FnMut(&BookedView) + Send,
    {
        info!("Starting refresh worker");

        loop {
            self.run_once(view).await;
            on_refresh(view);
        }
    }

    /// When the next refresh is due.
    pub fn next_wake(&self, view: &BookedView, now: DateTime<Utc>) -> DateTime<Utc> {
        view.next_refresh_at(now)
            .unwrap_or_else(|| now + self.fallback)
    }

    /// Sleep until the next wake-up and refresh once. Returns the wake instant.
    pub async fn run_once(&self, view: &mut BookedView) -> DateTime<Utc> {
        let wake = self.next_wake(view, self.clock.now_utc());
        debug!("Next booked-devices refresh at {}", wake);
        self.clock.sleep_until(wake).await;

        if let Err(e) = self.tick(view).await {
            error!("Error refreshing booked devices: {}", e);
            // Statuses still move with the clock even without fresh data.
            view.refresh(self.clock.now_utc());
        }
        wake
    }

    pub async fn tick(&self, view: &mut BookedView) -> DashboardResult<()> {
        let bookings = self.api.fetch_booked_devices().await?;
        view.reload(&bookings, self.clock.now_utc());
        Ok(())
    }
}
