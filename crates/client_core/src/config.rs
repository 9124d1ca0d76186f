use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "blog.toml";
const CONFIG_DIR_NAME: &str = "megablog";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub bucket_id: String,
    pub api_key: Option<String>,
    pub jwt: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://cloud.appwrite.io/v1".into(),
            project_id: String::new(),
            database_id: String::new(),
            collection_id: String::new(),
            bucket_id: String::new(),
            api_key: None,
            jwt: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    endpoint: Option<String>,
    project_id: Option<String>,
    database_id: Option<String>,
    collection_id: Option<String>,
    bucket_id: Option<String>,
    api_key: Option<String>,
    jwt: Option<String>,
    timeout_secs: Option<u64>,
}

/// Defaults, then the config file (if any), then the environment.
pub fn load_config(explicit_path: Option<&Path>) -> Result<BlogConfig, ConfigError> {
    let mut config = BlogConfig::default();

    if let Some(path) = resolve_config_path(explicit_path)? {
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        config
            .apply_toml(&raw)
            .map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "config: loaded file");
    }

    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// An explicit path must exist; otherwise `./blog.toml`, then the per-user
/// config directory, are tried in turn.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit_path {
        if !path.is_file() {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(Some(local));
    }

    let user = dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    match user {
        Some(path) if path.is_file() => Ok(Some(path)),
        _ => {
            debug!("config: no config file found, using defaults and environment");
            Ok(None)
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BlogConfig {
    pub fn apply_toml(&mut self, raw: &str) -> Result<(), toml::de::Error> {
        let file: FileConfig = toml::from_str(raw)?;

        if let Some(v) = non_empty(file.endpoint) {
            self.endpoint = v;
        }
        if let Some(v) = non_empty(file.project_id) {
            self.project_id = v;
        }
        if let Some(v) = non_empty(file.database_id) {
            self.database_id = v;
        }
        if let Some(v) = non_empty(file.collection_id) {
            self.collection_id = v;
        }
        if let Some(v) = non_empty(file.bucket_id) {
            self.bucket_id = v;
        }
        if let Some(v) = non_empty(file.api_key) {
            self.api_key = Some(v);
        }
        if let Some(v) = non_empty(file.jwt) {
            self.jwt = Some(v);
        }
        if let Some(v) = file.timeout_secs {
            self.timeout_secs = v;
        }
        Ok(())
    }

    /// Each setting has a plain name and a `BLOG__` name; the latter wins.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let read = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| non_empty(lookup(name)))
                .last()
        };

        if let Some(v) = read(&["APPWRITE_URL", "BLOG__ENDPOINT"]) {
            self.endpoint = v;
        }
        if let Some(v) = read(&["APPWRITE_PROJECT_ID", "BLOG__PROJECT_ID"]) {
            self.project_id = v;
        }
        if let Some(v) = read(&["APPWRITE_DATABASE_ID", "BLOG__DATABASE_ID"]) {
            self.database_id = v;
        }
        if let Some(v) = read(&["APPWRITE_COLLECTION_ID", "BLOG__COLLECTION_ID"]) {
            self.collection_id = v;
        }
        if let Some(v) = read(&["APPWRITE_BUCKET_ID", "BLOG__BUCKET_ID"]) {
            self.bucket_id = v;
        }
        if let Some(v) = read(&["APPWRITE_API_KEY", "BLOG__API_KEY"]) {
            self.api_key = Some(v);
        }
        if let Some(v) = read(&["APPWRITE_JWT", "BLOG__JWT"]) {
            self.jwt = Some(v);
        }
        if let Some(v) = read(&["BLOG__TIMEOUT_SECS"]) {
            self.timeout_secs = v.trim().parse::<u64>().map_err(|e| {
                ConfigError::Invalid(format!(
                    "BLOG__TIMEOUT_SECS '{v}' is not a number of seconds: {e}"
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Invalid(format!("endpoint '{}': {e}", self.endpoint)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "endpoint '{}' must use http or https",
                self.endpoint
            )));
        }

        for (name, value) in [
            ("project_id", &self.project_id),
            ("database_id", &self.database_id),
            ("collection_id", &self.collection_id),
            ("bucket_id", &self.bucket_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must be set")));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
