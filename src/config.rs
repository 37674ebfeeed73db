// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

/// ESRI World Imagery export endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://services.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/export";
pub const DEFAULT_IMAGE_SIZE: u32 = 256;
/// Half-width of the bounding box in degrees (~200m).
pub const DEFAULT_DELTA: f64 = 0.002;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_IMAGES_DIR: &str = "data/images";

/// What the download loop does when a request never gets an HTTP answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportPolicy {
    /// Log the failure, skip the record and keep going.
    #[default]
    Skip,
    /// Stop the run at the first transport failure.
    Abort,
}

/// One input table and the folder its images land in.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Split {
    pub name: String,
    pub table: PathBuf,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Split {
    pub fn new(name: impl Into<String>, table: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            limit: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub endpoint: String,
    pub image_size: u32,
    pub delta: f64,
    pub timeout_secs: u64,
    pub images_dir: PathBuf,
    pub splits: Vec<Split>,
    pub on_transport_error: TransportPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            image_size: DEFAULT_IMAGE_SIZE,
            delta: DEFAULT_DELTA,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            splits: vec![
                Split::new("train", "data/raw/train.xlsx"),
                Split::new("test", "data/raw/test.xlsx"),
            ],
            on_transport_error: TransportPolicy::Skip,
        }
    }
}

impl Config {
    /// Parse a YAML document; absent keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(yaml).context("parsing config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.endpoint_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("endpoint must be http(s), got `{}`", self.endpoint);
        }
        if self.image_size == 0 {
            bail!("image_size must be positive");
        }
        if !self.delta.is_finite() || self.delta <= 0.0 {
            bail!("delta must be a positive number, got {}", self.delta);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }

        let mut seen = HashSet::new();
        for split in &self.splits {
            if split.name.trim().is_empty() {
                bail!("split name must not be empty");
            }
            if !seen.insert(split.name.as_str()) {
                bail!("duplicate split `{}`", split.name);
            }
        }
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint).with_context(|| format!("parsing endpoint `{}`", self.endpoint))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Output folder for a split: `<images_dir>/<name>`.
    pub fn split_dir(&self, name: &str) -> PathBuf {
        self.images_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_esri_export_settings() {
        let cfg = Config::default();
        assert_eq!(cfg.image_size, 256);
        assert_eq!(cfg.delta, 0.002);
        assert_eq!(cfg.timeout(), Duration::from_secs(20));
        assert_eq!(cfg.split_dir("train"), PathBuf::from("data/images/train"));
        assert_eq!(cfg.splits[0].table, PathBuf::from("data/raw/train.xlsx"));
        assert_eq!(cfg.splits[1].name, "test");
        assert_eq!(cfg.on_transport_error, TransportPolicy::Skip);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let cfg = Config::from_yaml_str(
            r#"
image_size: 512
on_transport_error: abort
splits:
  - name: train
    table: raw/train.csv
    limit: 10
"#,
        )?;
        assert_eq!(cfg.image_size, 512);
        assert_eq!(cfg.delta, DEFAULT_DELTA);
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.on_transport_error, TransportPolicy::Abort);
        assert_eq!(cfg.splits.len(), 1);
        assert_eq!(cfg.splits[0].limit, Some(10));
        Ok(())
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_yaml_str("delta: -1.0").is_err());
        assert!(Config::from_yaml_str("image_size: 0").is_err());
        assert!(Config::from_yaml_str("endpoint: not a url").is_err());
        assert!(Config::from_yaml_str("endpoint: ftp://example.com/x").is_err());
        assert!(Config::from_yaml_str("bogus_key: 1").is_err());
        assert!(Config::from_yaml_str(
            "splits: [{name: a, table: x.csv}, {name: a, table: y.csv}]"
        )
        .is_err());
    }

    #[test]
    fn load_from_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "images_dir: /tmp/out\ntimeout_secs: 5")?;
        let cfg = Config::load(tmp.path())?;
        assert_eq!(cfg.images_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.timeout_secs, 5);
        Ok(())
    }

    #[test]
    fn load_validates_file_contents() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "timeout_secs: 0")?;
        let err = Config::load(tmp.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("timeout_secs must be positive"));
        Ok(())
    }
}
