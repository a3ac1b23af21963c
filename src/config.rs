use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::common::VisError;

pub const DEFAULT_CDN_BASE_URL: &str = "https://unpkg.com/circuitsvis";
/// Version of the published rendering bundle the generated HTML imports.
pub const DEFAULT_BUNDLE_VERSION: &str = "1.35.0";
pub const DEFAULT_ELEMENT_ID_PREFIX: &str = "circuits-vis-";
pub const DEFAULT_CONTAINER_STYLE: &str = "margin: 15px 0;";

pub const ENV_BUNDLE_VERSION: &str = "CIRCUITSVIS_BUNDLE_VERSION";
pub const ENV_CDN_BASE_URL: &str = "CIRCUITSVIS_CDN_BASE_URL";
pub const ENV_LOCAL_BUNDLE: &str = "CIRCUITSVIS_LOCAL_BUNDLE";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    #[serde(alias = "cdn_url")]
    pub cdn_base_url: String,
    #[serde(alias = "version")]
    pub bundle_version: String,
    /// Built `iife.js` bundle to inline instead of importing from the CDN.
    pub local_bundle_path: Option<PathBuf>,
    pub element_id_prefix: String,
    pub container_style: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            cdn_base_url: DEFAULT_CDN_BASE_URL.to_string(),
            bundle_version: DEFAULT_BUNDLE_VERSION.to_string(),
            local_bundle_path: None,
            element_id_prefix: DEFAULT_ELEMENT_ID_PREFIX.to_string(),
            container_style: DEFAULT_CONTAINER_STYLE.to_string(),
        }
    }
}

impl RenderConfig {
    pub fn load(config_path: &str) -> Result<Self, VisError> {
        if !Path::new(config_path).exists() {
            return Err(VisError::Config(format!("Config file not found at: {}", config_path)));
        }

        let mut file = File::open(config_path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: RenderConfig = serde_json::from_str(&contents)
            .map_err(|e| {
                VisError::Config(format!("Failed to deserialize JSON from {}: {}", config_path, e))
            })?;
        config.validate()?;

        Ok(config)
    }

    /// Applies `CIRCUITSVIS_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(version) = lookup(ENV_BUNDLE_VERSION).filter(|v| !v.is_empty()) {
            self.bundle_version = version;
        }
        if let Some(url) = lookup(ENV_CDN_BASE_URL).filter(|v| !v.is_empty()) {
            self.cdn_base_url = url;
        }
        if let Some(path) = lookup(ENV_LOCAL_BUNDLE).filter(|v| !v.is_empty()) {
            self.local_bundle_path = Some(PathBuf::from(path));
        }
        self
    }

    pub fn validate(&self) -> Result<(), VisError> {
        if self.bundle_version.trim().is_empty() {
            return Err(VisError::Config("bundle_version must not be empty".to_string()));
        }
        if self.cdn_base_url.trim().is_empty() {
            return Err(VisError::Config("cdn_base_url must not be empty".to_string()));
        }
        if self.cdn_base_url.contains('"') || self.bundle_version.contains('"') {
            return Err(VisError::Config(
                "cdn_base_url and bundle_version must not contain quotes".to_string(),
            ));
        }
        Ok(())
    }

    /// ES module entry point of the pinned bundle.
    pub fn cdn_module_url(&self) -> String {
        format!(
            "{}@{}/dist/cdn/esm.js",
            self.cdn_base_url.trim_end_matches('/'),
            self.bundle_version
        )
    }
}
