// src/fetch/esri.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use super::{BoundingBox, FetchResult, ImageSource};
use crate::config::Config;

/// Spatial reference of both the bbox and the returned image (WGS84).
const WGS84: &str = "4326";

/// Client for an ArcGIS MapServer `export` endpoint.
#[derive(Clone, Debug)]
pub struct EsriImageClient {
    client: Client,
    endpoint: Url,
    image_size: u32,
    delta: f64,
}

impl EsriImageClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("building HTTP client")?;
        Self::with_client(client, config)
    }

    /// Use a caller-built client; the config timeout is not applied.
    pub fn with_client(client: Client, config: &Config) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: config.endpoint_url()?,
            image_size: config.image_size,
            delta: config.delta,
        })
    }

    /// Query parameters for the image centred on `(lat, lon)`.
    pub fn query(&self, lat: f64, lon: f64) -> Vec<(&'static str, String)> {
        let bbox = BoundingBox::around(lat, lon, self.delta);
        vec![
            ("bbox", bbox.to_query()),
            ("bboxSR", WGS84.to_string()),
            ("imageSR", WGS84.to_string()),
            ("size", format!("{},{}", self.image_size, self.image_size)),
            ("format", "png".to_string()),
            ("f", "image".to_string()),
        ]
    }
}

#[async_trait]
impl ImageSource for EsriImageClient {
    async fn fetch(&self, lat: f64, lon: f64) -> FetchResult {
        let resp = match self
            .client
            .get(self.endpoint.clone())
            .query(&self.query(lat, lon))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                debug!(lat, lon, error = %err, "request failed");
                return FetchResult::Transport(err.to_string());
            }
        };

        let status = resp.status();
        if status != StatusCode::OK {
            debug!(lat, lon, status = status.as_u16(), "non-200 response");
            return FetchResult::HttpStatus(status.as_u16());
        }

        match resp.bytes().await {
            Ok(bytes) => FetchResult::Image(bytes.to_vec()),
            Err(err) => {
                debug!(lat, lon, error = %err, "reading body failed");
                FetchResult::Transport(err.to_string())
            }
        }
    }
}
