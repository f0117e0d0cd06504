//! Host configuration.
//!
//! Read from a YAML (or JSON) file. Every field has a default, so an empty
//! file is a valid configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::DEFAULT_SCHEMA_URI;

/// Default API document and web root when none are configured.
const DEFAULT_API_PATH: &str = "api.json";

/// Default basename of the downloadable descriptors.
const DEFAULT_BASENAME: &str = "api";

/// Sub-directories pages are generated into, below the web root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageDirs {
    pub resource: String,
    pub security: String,
    pub overview: String,
}

impl Default for PageDirs {
    fn default() -> Self {
        Self {
            resource: "resource".into(),
            security: "security".into(),
            overview: "overview".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `$schema` URI written into synthesized schemas.
    pub json_schema_schema_uri: String,
    /// API document path → web root. A null or empty web root means `/`.
    pub ramler_api_paths: BTreeMap<String, Option<String>>,
    pub page_dirs: PageDirs,
    /// API document path → basename of its downloadable descriptors.
    pub ramler_downloadable_descriptor_basenames: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            json_schema_schema_uri: DEFAULT_SCHEMA_URI.into(),
            ramler_api_paths: BTreeMap::from([(DEFAULT_API_PATH.to_string(), Some("/".into()))]),
            page_dirs: PageDirs::default(),
            ramler_downloadable_descriptor_basenames: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` / `ConfigError::Parse` for unreadable or
    /// malformed files and `ConfigError::MissingTrailingSeparator` for an
    /// invalid web root.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validated()
    }

    /// Parse a configuration without validating it. An empty document yields
    /// the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Check that every configured web root ends with `/`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (api_path, web_root) in &self.ramler_api_paths {
            let web_root = normalize_web_root(web_root.as_deref());
            if !web_root.ends_with('/') {
                return Err(ConfigError::MissingTrailingSeparator {
                    api_path: api_path.clone(),
                    web_root: web_root.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate, returning the configuration on success.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Configured API documents with their web roots, in path order.
    pub fn api_paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ramler_api_paths
            .iter()
            .map(|(path, web_root)| (path.as_str(), normalize_web_root(web_root.as_deref())))
    }

    /// Basename for the downloadable descriptors of `api_path`.
    pub fn descriptor_basename(&self, api_path: &str) -> &str {
        self.ramler_downloadable_descriptor_basenames
            .get(api_path)
            .map(String::as_str)
            .unwrap_or(DEFAULT_BASENAME)
    }
}

fn normalize_web_root(web_root: Option<&str>) -> &str {
    match web_root {
        None | Some("") => "/",
        Some(web_root) => web_root,
    }
}
