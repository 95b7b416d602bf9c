use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;

use backend_domain::{RuntimeConfig, StoreBackend, StoreConfig};

use super::validation::{validate_collection_name, validate_url};

pub const CONFIG_ENV: &str = "CHECKIN_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub store_backend: StoreBackend,
    pub roster_path: String,
    pub firestore_project_id: Option<String>,
    pub firestore_database: String,
    pub firestore_base_url: String,
    pub firestore_access_token: Option<String>,
    pub attendees_collection: String,
    pub stats_collection: String,
    pub stats_document: String,
    pub debounce_millis: u64,
    pub history_limit: usize,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            store_backend: StoreBackend::Memory,
            roster_path: "./attendees.yaml".to_string(),
            firestore_project_id: None,
            firestore_database: "(default)".to_string(),
            firestore_base_url: "https://firestore.googleapis.com/v1".to_string(),
            firestore_access_token: None,
            attendees_collection: "hackers".to_string(),
            stats_collection: "scannerStats".to_string(),
            stats_document: "global".to_string(),
            debounce_millis: 1500,
            history_limit: 100,
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 15,
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> String {
        env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Missing file means defaults; a file that exists but does not parse is an error.
    pub async fn load() -> Result<Self> {
        let path = Self::config_path();
        let file_path = Path::new(&path);
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(file_path.parent());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = non_blank(self.api_token.take());
        self.firestore_project_id = non_blank(self.firestore_project_id.take());
        self.firestore_access_token = non_blank(self.firestore_access_token.take());
        self.log_dir = non_blank(self.log_dir.take());
        self.firestore_base_url = self.firestore_base_url.trim().trim_end_matches('/').to_string();
        self.attendees_collection = self.attendees_collection.trim().to_string();
        self.stats_collection = self.stats_collection.trim().to_string();
        self.stats_document = self.stats_document.trim().to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.roster_path = resolve_path(base, &self.roster_path);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        if self.history_limit == 0 {
            return Err(anyhow!("history_limit must be greater than 0"));
        }
        match self.store_backend {
            StoreBackend::Memory => {
                if self.roster_path.trim().is_empty() {
                    return Err(anyhow!("roster_path must not be empty for the memory store"));
                }
            }
            StoreBackend::Firestore => {
                if self.firestore_project_id.is_none() {
                    return Err(anyhow!("firestore_project_id is required for the firestore store"));
                }
                validate_url(&self.firestore_base_url)?;
                validate_collection_name("attendees_collection", &self.attendees_collection)?;
                validate_collection_name("stats_collection", &self.stats_collection)?;
                validate_collection_name("stats_document", &self.stats_document)?;
            }
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            debounce_millis: self.debounce_millis,
            history_limit: self.history_limit,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.store_backend,
            roster_path: self.roster_path.clone(),
            firestore_project_id: self.firestore_project_id.clone(),
            firestore_database: self.firestore_database.clone(),
            firestore_base_url: self.firestore_base_url.clone(),
            firestore_access_token: self.firestore_access_token.clone(),
            attendees_collection: self.attendees_collection.clone(),
            stats_collection: self.stats_collection.clone(),
            stats_document: self.stats_document.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("CHECKIN_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("CHECKIN_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("CHECKIN_STORE_BACKEND") {
            match value.trim().to_lowercase().as_str() {
                "memory" => self.store_backend = StoreBackend::Memory,
                "firestore" => self.store_backend = StoreBackend::Firestore,
                _ => {}
            }
        }
        if let Some(value) = lookup("CHECKIN_ROSTER_PATH") {
            self.roster_path = value;
        }
        if let Some(value) = lookup("CHECKIN_FIRESTORE_PROJECT_ID") {
            self.firestore_project_id = Some(value);
        }
        if let Some(value) = lookup("CHECKIN_FIRESTORE_DATABASE") {
            self.firestore_database = value;
        }
        if let Some(value) = lookup("CHECKIN_FIRESTORE_BASE_URL") {
            self.firestore_base_url = value;
        }
        if let Some(value) = lookup("CHECKIN_FIRESTORE_ACCESS_TOKEN") {
            self.firestore_access_token = Some(value);
        }
        if let Some(value) = lookup("CHECKIN_ATTENDEES_COLLECTION") {
            self.attendees_collection = value;
        }
        if let Some(value) = lookup("CHECKIN_STATS_COLLECTION") {
            self.stats_collection = value;
        }
        if let Some(value) = lookup("CHECKIN_STATS_DOCUMENT") {
            self.stats_document = value;
        }
        if let Some(value) = lookup("CHECKIN_DEBOUNCE_MILLIS") {
            self.debounce_millis = value.parse().unwrap_or(self.debounce_millis);
        }
        if let Some(value) = lookup("CHECKIN_HISTORY_LIMIT") {
            self.history_limit = value.parse().unwrap_or(self.history_limit);
        }
        if let Some(value) = lookup("CHECKIN_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Some(value) = lookup("CHECKIN_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Some(value) = lookup("CHECKIN_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3240");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.debounce_millis, 1500);
        assert_eq!(config.attendees_collection, "hackers");
        config.validate().unwrap();
    }

    #[test]
    fn toml_keys_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            store_backend = "firestore"
            firestore_project_id = "hackai-prod"
            attendees_collection = "testHackers"
            debounce_millis = 900
            "#,
        )
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Firestore);
        assert_eq!(config.to_store_config().attendees_collection, "testHackers");
        assert_eq!(config.to_runtime_config().debounce_millis, 900);
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_win_and_bad_numbers_are_ignored() {
        let vars = HashMap::from([
            ("CHECKIN_API_TOKEN", "secret"),
            ("CHECKIN_STORE_BACKEND", "FIRESTORE"),
            ("CHECKIN_HISTORY_LIMIT", "not-a-number"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.store_backend, StoreBackend::Firestore);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn blank_optionals_normalize_to_none() {
        let mut config = AppConfig {
            api_token: Some("  ".to_string()),
            firestore_base_url: "http://localhost:8080/v1/".to_string(),
            ..AppConfig::default()
        };
        config.normalize();
        assert_eq!(config.api_token, None);
        assert_eq!(config.firestore_base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn firestore_requires_project_id() {
        let config = AppConfig {
            store_backend: StoreBackend::Firestore,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let config = AppConfig {
            bind_addr: "localhost".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let mut config = AppConfig {
            log_dir: Some("logs".to_string()),
            ..AppConfig::default()
        };
        config.resolve_paths(Some(Path::new("/etc/checkin")));
        assert_eq!(config.roster_path, "/etc/checkin/./attendees.yaml");
        assert_eq!(config.log_dir.as_deref(), Some("/etc/checkin/logs"));
    }
}
