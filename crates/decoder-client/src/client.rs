//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "HTTP client for the DECODER API contract."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::Context;
use decoder_common::config::ApiConfig;
use decoder_logging::{decoder_debug, decoder_warn, LogContext};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::credential::Credential;
use crate::errors::{ApiError, Result};
use crate::models::{ForecastResponse, ReadingRecord, SensorReading};

/// Thin async client over the DECODER API. Every call is awaited to
/// completion by the caller; the client never issues requests concurrently.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    health_timeout: Duration,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(base: Url, health_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base: with_trailing_slash(base),
            health_timeout,
            request_timeout,
        })
    }

    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let base = config.url()?;
        Self::new(base, config.health_timeout, config.request_timeout)
            .context("failed to build http client")
    }

    /// Base URL as shown to operators, without the trailing slash.
    pub fn display_base(&self) -> String {
        self.base.as_str().trim_end_matches('/').to_owned()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// Probe `GET /actuator/health`. Any HTTP answer, whatever its status,
    /// means the API is reachable.
    pub async fn health(&self) -> Result<StatusCode> {
        let url = self.endpoint("actuator/health")?;
        let response = self
            .http
            .get(url)
            .timeout(self.health_timeout)
            .send()
            .await?;
        debug!(status = %response.status(), "health probe answered");
        Ok(response.status())
    }

    pub async fn is_available(&self) -> bool {
        match self.health().await {
            Ok(_) => true,
            Err(err) => {
                decoder_warn!("health probe failed: {}", err);
                false
            }
        }
    }

    /// `POST /ingest`. Only `201 Created` counts as success.
    pub async fn ingest(&self, reading: &SensorReading) -> Result<()> {
        let url = self.endpoint("ingest")?;
        let ctx = LogContext::new()
            .with_building(reading.building_id)
            .with_sensor(&reading.sensor_id);
        let response = self
            .http
            .post(url)
            .json(reading)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::CREATED {
            decoder_debug!(context = ctx, "reading ingested value={}", reading.value);
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        decoder_warn!(context = ctx, "ingest rejected with status {}", status);
        Err(ApiError::UnexpectedStatus { status, body })
    }

    /// `GET /buildings/{id}/last-readings?minutes={n}`. `None` sends no
    /// Authorization header at all.
    pub async fn last_readings(
        &self,
        building_id: i64,
        minutes: u32,
        credential: Option<&Credential>,
    ) -> Result<Vec<ReadingRecord>> {
        let url = self.endpoint(&format!("buildings/{}/last-readings", building_id))?;
        self.authorized_get(url, building_id, minutes, credential).await
    }

    /// `GET /buildings/{id}/forecast?minutes={n}`.
    pub async fn forecast(
        &self,
        building_id: i64,
        minutes: u32,
        credential: Option<&Credential>,
    ) -> Result<ForecastResponse> {
        let url = self.endpoint(&format!("buildings/{}/forecast", building_id))?;
        self.authorized_get(url, building_id, minutes, credential).await
    }

    async fn authorized_get<T: DeserializeOwned>(
        &self,
        url: Url,
        building_id: i64,
        minutes: u32,
        credential: Option<&Credential>,
    ) -> Result<T> {
        let token = credential.map(Credential::token);
        let mut ctx = LogContext::new().with_building(building_id);
        if let Some(token) = token.as_deref() {
            ctx = ctx.with_principal(token);
        }

        let mut request = self
            .http
            .get(url)
            .query(&[("minutes", minutes)])
            .timeout(self.request_timeout);
        if let Some(token) = token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        decoder_debug!(context = ctx, "api answered with status {}", status);
        match status {
            StatusCode::OK => {
                let body = response.text().await?;
                serde_json::from_str(&body).map_err(|err| ApiError::UnexpectedShape(err.to_string()))
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::UnexpectedStatus { status, body })
            }
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
