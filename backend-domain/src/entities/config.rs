// Runtime configuration handed to the application layer

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub debounce_millis: u64,
    pub history_limit: usize,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            debounce_millis: 1500,
            history_limit: 100,
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Firestore,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub roster_path: String,
    pub firestore_project_id: Option<String>,
    pub firestore_database: String,
    pub firestore_base_url: String,
    pub firestore_access_token: Option<String>,
    pub attendees_collection: String,
    pub stats_collection: String,
    pub stats_document: String,
}
