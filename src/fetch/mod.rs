// src/fetch/mod.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

pub mod bbox;
pub mod esri;

pub use bbox::BoundingBox;
pub use esri::EsriImageClient;

/// What a single imagery request came back with. Failures are values
/// so the caller decides whether to stop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchResult {
    /// HTTP 200 and its body.
    Image(Vec<u8>),
    /// Any other HTTP status.
    HttpStatus(u16),
    /// No HTTP answer: timeout, DNS, connection reset, body read error.
    Transport(String),
}

/// Something that can turn a coordinate into image bytes.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, lat: f64, lon: f64) -> FetchResult;
}

/// Write an image payload verbatim.
pub async fn save_image(bytes: &[u8], dest: impl AsRef<Path>) -> Result<()> {
    let dest = dest.as_ref();
    fs::write(dest, bytes)
        .await
        .with_context(|| format!("writing {}", dest.display()))
}
