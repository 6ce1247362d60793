use crate::domain::model::GeoResponse;
use crate::domain::ports::{ConfigProvider, Geocoder};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Client for a Google style geocoding endpoint (`?address=...&key=...`).
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| EtlError::InvalidConfigValueError {
            field: "api_endpoint".to_string(),
            value: endpoint.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        // 預設不設定逾時
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.api_endpoint(),
            config.api_key().map(str::to_owned),
            config.request_timeout(),
        )
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn lookup(&self, address: &str) -> Result<GeoResponse> {
        let mut query = vec![("address", address)];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }

        tracing::debug!("Requesting {}?address={}", self.endpoint, address);
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await?
            .error_for_status()?;

        let body: GeoResponse = response.json().await?;
        tracing::debug!(
            "Geocoder status {} with {} results",
            body.status,
            body.results.len()
        );
        Ok(body)
    }
}
