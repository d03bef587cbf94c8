use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tokio::time::{Duration, sleep};
use tracing::warn;

use crate::error::BotError;

pub const CAL_API_VERSION: &str = "2024-08-13";
const MAX_SEND_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub name: String,
    pub email: String,
    pub time_zone: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingBody {
    pub attendee: Attendee,
    pub start: String,
    pub event_type_id: u64,
}

// Filters for GET /bookings. Status is always "upcoming"; the API ignores
// filters it does not know, so only set fields become query parameters.
#[derive(Debug, Clone)]
pub struct BookingQuery {
    pub attendee_email: String,
    pub after_start: Option<String>,
    pub take: Option<u32>,
}

impl BookingQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("status", "upcoming".to_string()),
            ("attendeeEmail", self.attendee_email.clone()),
        ];
        if let Some(after) = &self.after_start {
            params.push(("afterStart", after.clone()));
        }
        if let Some(take) = self.take {
            params.push(("take", take.to_string()));
        }
        params
    }
}

// Raw Cal.com v2 endpoints. The booking operations sit on top of this seam,
// so tests can count and script outbound calls.
#[async_trait]
pub trait CalApi: Send + Sync {
    async fn get_bookings(&self, query: &BookingQuery) -> Result<String, BotError>;
    async fn create_booking(&self, body: &CreateBookingBody) -> Result<String, BotError>;
    async fn cancel_booking(&self, uid: &str, reason: &str) -> Result<String, BotError>;
    async fn reschedule_booking(
        &self,
        uid: &str,
        start: &str,
        reason: &str,
    ) -> Result<String, BotError>;
}

pub struct CalClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl CalClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("cal-api-version", CAL_API_VERSION)
            .header("Content-Type", "application/json")
    }

    // 4xx/5xx bodies are returned like success bodies; only failures to reach
    // the API at all are retried, with capped exponential backoff.
    async fn send_with_retry<F>(&self, build: F) -> Result<String, BotError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.auth(build()).send().await {
                Ok(response) => {
                    return response
                        .text()
                        .await
                        .map_err(|e| BotError::Booking(e.to_string()));
                }
                Err(err) if attempt < MAX_SEND_ATTEMPTS => {
                    let delay_ms = 2_u64.pow(attempt - 1) * 500;
                    warn!(attempt, delay_ms, error = %err, "Cal API send failed, retrying");
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(err) => return Err(BotError::Booking(err.to_string())),
            }
        }
    }
}

#[async_trait]
impl CalApi for CalClient {
    async fn get_bookings(&self, query: &BookingQuery) -> Result<String, BotError> {
        let url = format!("{}/bookings", self.base_url);
        let params = query.to_params();
        self.send_with_retry(|| self.http.get(&url).query(&params))
            .await
    }

    async fn create_booking(&self, body: &CreateBookingBody) -> Result<String, BotError> {
        let url = format!("{}/bookings", self.base_url);
        self.send_with_retry(|| self.http.post(&url).json(body))
            .await
    }

    async fn cancel_booking(&self, uid: &str, reason: &str) -> Result<String, BotError> {
        let url = format!("{}/bookings/{}/cancel", self.base_url, uid);
        let body = json!({ "cancellationReason": reason });
        self.send_with_retry(|| self.http.post(&url).json(&body))
            .await
    }

    async fn reschedule_booking(
        &self,
        uid: &str,
        start: &str,
        reason: &str,
    ) -> Result<String, BotError> {
        let url = format!("{}/bookings/{}/reschedule", self.base_url, uid);
        let body = json!({ "start": start, "reschedulingReason": reason });
        self.send_with_retry(|| self.http.post(&url).json(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_has_no_pagination_params() {
        let query = BookingQuery {
            attendee_email: "a@b.c".to_string(),
            after_start: None,
            take: None,
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("status", "upcoming".to_string()),
                ("attendeeEmail", "a@b.c".to_string()),
            ]
        );
    }

    #[test]
    fn lookup_query_bounds_results_to_one() {
        let query = BookingQuery {
            attendee_email: "a@b.c".to_string(),
            after_start: Some("2025-01-10T15:00:00Z".to_string()),
            take: Some(1),
        };
        let params = query.to_params();
        assert!(params.contains(&("afterStart", "2025-01-10T15:00:00Z".to_string())));
        assert!(params.contains(&("take", "1".to_string())));
    }

    #[test]
    fn create_body_serializes_null_phone_number() {
        let body = CreateBookingBody {
            attendee: Attendee {
                name: "Ada".to_string(),
                email: "a@b.c".to_string(),
                time_zone: "America/New_York".to_string(),
                phone_number: None,
            },
            start: "2025-02-01T15:00:00Z".to_string(),
            event_type_id: 3666489,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["attendee"]["timeZone"], "America/New_York");
        assert!(value["attendee"]["phoneNumber"].is_null());
        assert_eq!(value["eventTypeId"], 3666489);
    }
}
