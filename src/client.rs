use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::availability::TimeRange;
use crate::config::Config;
use crate::constants::Constants;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{
    ActionResponse, AvailabilityResponse, BookedDevice, Device, DeviceDetails, DeviceIpUpdate,
    NewUser, ReservationRequest, ReservationResponse, UsageRecord, UserForEdit, UserUpdate,
};
use crate::time;
use crate::traits::DashboardApi;

/// `DashboardApi` backed by the dashboard's HTTP endpoints.
pub struct HttpDashboardApi {
    http: reqwest::Client,
    base_url: String,
    csrf_token: String,
    session_cookie: Option<String>,
}

impl HttpDashboardApi {
    pub fn new(
        base_url: impl Into<String>,
        csrf_token: Option<String>,
        session_cookie: Option<String>,
        timeout: Duration,
    ) -> DashboardResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashboardError::Network(format!("client setup: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_token: csrf_token.unwrap_or_default(),
            session_cookie,
        })
    }

    pub fn from_config(config: &Config) -> DashboardResult<Self> {
        Self::new(
            config.dashboard_url.clone(),
            config.csrf_token.clone(),
            config.session_cookie.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the session cookie, if any.
    fn session(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    /// Session plus the CSRF header required on every state-changing request.
    fn mutating(&self, builder: RequestBuilder) -> RequestBuilder {
        self.session(builder)
            .header(Constants::CSRF_HEADER, self.csrf_token.as_str())
    }

    async fn send(&self, builder: RequestBuilder) -> DashboardResult<Response> {
        let request = builder.build()?;
        debug!("{} {}", request.method(), request.url());
        Ok(self.http.execute(request).await?)
    }

    /// Parse a JSON response, mapping non-2xx statuses to errors.
    async fn parse<R: DeserializeOwned>(resp: Response) -> DashboardResult<R> {
        let resp = Self::check(resp).await?;
        resp.json::<R>()
            .await
            .map_err(|e| DashboardError::Decode(format!("response body: {}", e)))
    }

    /// Pass 2xx responses through; turn anything else into a typed error.
    async fn check(resp: Response) -> DashboardResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }

    /// CRUD acknowledgements: tolerate non-JSON bodies (form posts may be
    /// answered with a redirect page) but honour an embedded `error` key.
    async fn parse_action(resp: Response) -> DashboardResult<ActionResponse> {
        let resp = Self::check(resp).await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let action: ActionResponse = serde_json::from_str(&body).unwrap_or_default();
        match action.error {
            Some(error) => Err(DashboardError::Server {
                status: status.as_u16(),
                message: error,
            }),
            None => Ok(action),
        }
    }
}

/// Build an error from a failed response, preferring the JSON `error` or
/// `message` field over the raw body.
pub fn error_from_body(status: StatusCode, body: &str) -> DashboardError {
    let message = extract_message(body)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && !trimmed.starts_with('<')).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    if status == StatusCode::CONFLICT {
        DashboardError::Conflict(message)
    } else {
        DashboardError::Server {
            status: status.as_u16(),
            message,
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Pull `data.booked_devices` out of the envelope, skipping rows that do not
/// carry the fields every view depends on.
pub fn parse_booked_devices(body: &Value) -> DashboardResult<Vec<BookedDevice>> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = extract_message(&body.to_string())
            .unwrap_or_else(|| "Failed to load booked devices".to_string());
        return Err(DashboardError::Server {
            status: 200,
            message,
        });
    }

    let rows = body
        .get("data")
        .and_then(|data| data.get("booked_devices"))
        .and_then(Value::as_array)
        .ok_or_else(|| DashboardError::Decode("missing data.booked_devices".to_string()))?;

    let mut bookings = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<BookedDevice>(row.clone()) {
            Ok(booking) if !booking.device.id.trim().is_empty() => bookings.push(booking),
            Ok(booking) => warn!("Skipping booking {} without a device id", booking.id),
            Err(e) => warn!("Skipping invalid booking record: {}", e),
        }
    }
    Ok(bookings)
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn fetch_availability(&self, range: &TimeRange) -> DashboardResult<Vec<Device>> {
        let req = self
            .session(self.http.get(self.url("/api/devices/availability")))
            .query(&[
                ("start_time", time::to_wire(range.start())),
                ("end_time", time::to_wire(range.end())),
            ]);
        let resp = self.send(req).await?;
        let body: AvailabilityResponse = Self::parse(resp).await?;

        if body.success == Some(false) {
            return Err(DashboardError::Server {
                status: 200,
                message: body
                    .message
                    .unwrap_or_else(|| "Failed to load devices".to_string()),
            });
        }
        body.devices
            .ok_or_else(|| DashboardError::Decode("missing devices".to_string()))
    }

    async fn fetch_booked_devices(&self) -> DashboardResult<Vec<BookedDevice>> {
        let req = self.session(self.http.get(self.url("/api/booked-devices")));
        let resp = self.send(req).await?;
        let body: Value = Self::parse(resp).await?;
        parse_booked_devices(&body)
    }

    async fn create_reservation(
        &self,
        device_id: &str,
        range: &TimeRange,
    ) -> DashboardResult<ReservationResponse> {
        let payload = ReservationRequest {
            device_id: device_id.to_string(),
            start_time: time::to_wire(range.start()),
            end_time: time::to_wire(range.end()),
            csrf_token: self.csrf_token.clone(),
        };
        let req = self
            .mutating(self.http.post(self.url("/api/reservations")))
            .json(&payload);
        let resp = self.send(req).await?;
        let status = resp.status();
        let body: ReservationResponse = Self::parse(resp).await?;

        if !body.success {
            return Err(DashboardError::Server {
                status: status.as_u16(),
                message: body
                    .message
                    .unwrap_or_else(|| Constants::MSG_BOOKING_FAILED.to_string()),
            });
        }
        Ok(body)
    }

    async fn cancel_reservation(&self, reservation_id: i64) -> DashboardResult<()> {
        let req = self
            .mutating(
                self.http
                    .post(self.url(&format!("/reservation/cancel/{}", reservation_id))),
            )
            .json(&json!({ "csrf_token": self.csrf_token }));
        let resp = self.send(req).await?;
        let resp = Self::check(resp).await?;
        let status = resp.status();

        // No structured body is guaranteed; only an explicit `success: false` fails.
        let body = resp.text().await.unwrap_or_default();
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            if value.get("success").and_then(Value::as_bool) == Some(false) {
                return Err(DashboardError::Server {
                    status: status.as_u16(),
                    message: extract_message(&body)
                        .unwrap_or_else(|| Constants::MSG_CANCEL_FAILED.to_string()),
                });
            }
        }
        Ok(())
    }

    async fn get_device(&self, device_id: &str) -> DashboardResult<DeviceDetails> {
        let req = self.session(self.http.get(self.url(&format!("/api/devices/{}", device_id))));
        let resp = self.send(req).await?;
        Self::parse(resp).await
    }

    async fn device_for_edit(&self, device_id: &str) -> DashboardResult<DeviceDetails> {
        let req = self.session(self.http.get(self.url(&format!("/edit/{}", device_id))));
        let resp = self.send(req).await?;
        Self::parse(resp).await
    }

    async fn update_device(
        &self,
        device_id: &str,
        update: &DeviceIpUpdate,
    ) -> DashboardResult<ActionResponse> {
        let mut form: Vec<(&str, &str)> = update
            .fields()
            .iter()
            .filter_map(|(name, value)| value.map(|value| (*name, value)))
            .collect();
        form.push(("csrf_token", self.csrf_token.as_str()));

        let req = self
            .mutating(self.http.post(self.url(&format!("/edit/{}", device_id))))
            .form(&form);
        let resp = self.send(req).await?;
        Self::parse_action(resp).await
    }

    async fn delete_device(&self, device_id: &str) -> DashboardResult<ActionResponse> {
        let req = self
            .mutating(self.http.post(self.url(&format!("/delete/{}", device_id))))
            .json(&json!({ "csrf_token": self.csrf_token }));
        let resp = self.send(req).await?;
        Self::parse_action(resp).await
    }

    async fn add_user(&self, user: &NewUser) -> DashboardResult<ActionResponse> {
        let req = self
            .mutating(self.http.post(self.url("/users/add")))
            .json(user);
        let resp = self.send(req).await?;
        Self::parse_action(resp).await
    }

    async fn user_for_edit(&self, user_id: i64) -> DashboardResult<UserForEdit> {
        let req = self.session(self.http.get(self.url(&format!("/users/edit/{}", user_id))));
        let resp = self.send(req).await?;
        Self::parse(resp).await
    }

    async fn update_user(&self, user_id: i64, update: &UserUpdate) -> DashboardResult<ActionResponse> {
        let req = self
            .mutating(self.http.post(self.url(&format!("/users/update/{}", user_id))))
            .json(update);
        let resp = self.send(req).await?;
        Self::parse_action(resp).await
    }

    async fn delete_user(&self, user_id: i64) -> DashboardResult<ActionResponse> {
        let req = self
            .mutating(self.http.post(self.url(&format!("/users/delete/{}", user_id))))
            .json(&json!({ "csrf_token": self.csrf_token }));
        let resp = self.send(req).await?;
        Self::parse_action(resp).await
    }

    async fn get_usage_record(&self, record_id: i64) -> DashboardResult<UsageRecord> {
        let req = self.session(
            self.http
                .get(self.url(&format!("/history/get-usage-record/{}", record_id))),
        );
        let resp = self.send(req).await?;
        Self::parse(resp).await
    }

    async fn delete_usage_record(&self, record_id: i64) -> DashboardResult<ActionResponse> {
        let req = self.mutating(
            self.http
                .delete(self.url(&format!("/history/delete-usage-record/{}", record_id))),
        );
        let resp = self.send(req).await?;
        Self::parse_action(resp).await
    }

    async fn clear_old_records(&self) -> DashboardResult<ActionResponse> {
        let req = self
            .mutating(self.http.post(self.url("/history/clear-old")))
            .json(&json!({ "csrf_token": self.csrf_token }));
        let resp = self.send(req).await?;
        Self::parse_action(resp).await
    }
}
