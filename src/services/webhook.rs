//! Attendance spreadsheet webhook
//!
//! Check-ins are forwarded as one JSON POST each. Delivery is best effort:
//! failures are logged and never reach the check-in caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::WebhookConfig;
use crate::models::AttendanceRecord;
use crate::utils::errors::{HostelError, Result, WebhookError};
use crate::utils::logging::log_api_error;

/// Body posted for every check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendancePayload {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub room_number: String,
    pub date: String,
    pub time: String,
}

impl From<&AttendanceRecord> for AttendancePayload {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            name: record.user_name.clone(),
            timestamp: record.timestamp,
            latitude: record.latitude,
            longitude: record.longitude,
            room_number: record.room_number.clone(),
            date: record.timestamp.format("%Y-%m-%d").to_string(),
            time: record.timestamp.format("%H:%M:%S").to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WebhookRelay {
    url: Option<String>,
    http_client: reqwest::Client,
}

impl WebhookRelay {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("HostelFlow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HostelError::Http)?;

        let url = if config.enabled { config.url.clone() } else { None };
        Ok(Self { url, http_client })
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Post one payload, treating any non-2xx status as a rejection
    pub async fn forward(&self, payload: &AttendancePayload) -> std::result::Result<(), WebhookError> {
        let url = self.url.as_deref().ok_or(WebhookError::NotConfigured)?;
        debug!(name = %payload.name, "Forwarding attendance to webhook");

        let response = self
            .http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| WebhookError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Rejected { status: status.as_u16(), body });
        }

        info!(name = %payload.name, status = status.as_u16(), "Attendance forwarded to webhook");
        Ok(())
    }

    /// Forward in the background. The handle resolves to whether delivery succeeded.
    pub fn dispatch(&self, payload: AttendancePayload) -> JoinHandle<bool> {
        let relay = self.clone();
        tokio::spawn(async move {
            if !relay.is_enabled() {
                debug!("Webhook disabled, skipping attendance forward");
                return false;
            }
            match relay.forward(&payload).await {
                Ok(()) => true,
                Err(e) => {
                    log_api_error("attendance_webhook", &e.to_string(), Some(&payload.name));
                    false
                }
            }
        })
    }
}
