//! Configuration management for folio-iiif

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::iiif::IiifVersion;
use crate::ocr::Granularity;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub iiif: IiifConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IiifConfig {
    /// Host used to mint annotation list and canvas URIs
    pub base_url: String,
    /// Base of canvas resource ids (IIIF image service)
    pub image_server: String,
    /// Manifest the CLI registers its canvases under
    pub manifest: String,
    /// Output version for the CLI
    pub version: IiifVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Root directory of the local OCR source
    pub root: PathBuf,
    /// Seconds allowed for fetching one OCR file
    pub fetch_timeout: u64,
    pub granularity: Granularity,
    pub language: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            iiif: IiifConfig {
                base_url: "http://localhost:8000".to_string(),
                image_server: "http://localhost:8182/iiif/2".to_string(),
                manifest: "volume".to_string(),
                version: IiifVersion::V2,
            },
            ocr: OcrConfig {
                root: PathBuf::from("./ocr"),
                fetch_timeout: 30,
                granularity: Granularity::Word,
                language: "en".to_string(),
            },
        }
    }
}

fn parse_enum<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = String>,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|message| ConfigError::InvalidValue { name, message }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Config {
            iiif: IiifConfig {
                base_url: env::var("FOLIO_BASE_URL").unwrap_or(defaults.iiif.base_url),
                image_server: env::var("FOLIO_IMAGE_SERVER").unwrap_or(defaults.iiif.image_server),
                manifest: env::var("FOLIO_MANIFEST").unwrap_or(defaults.iiif.manifest),
                version: parse_enum("FOLIO_IIIF_VERSION", defaults.iiif.version)?,
            },
            ocr: OcrConfig {
                root: env::var("FOLIO_OCR_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ocr.root),
                fetch_timeout: env::var("FOLIO_FETCH_TIMEOUT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.ocr.fetch_timeout),
                granularity: parse_enum("FOLIO_GRANULARITY", defaults.ocr.granularity)?,
                language: env::var("FOLIO_LANGUAGE").unwrap_or(defaults.ocr.language),
            },
        })
    }

    /// Resource id of a canvas served by the image server
    pub fn resource_id(&self, canvas_pid: &str) -> String {
        format!("{}/{}", self.iiif.image_server.trim_end_matches('/'), canvas_pid)
    }
}
