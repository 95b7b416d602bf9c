use std::collections::HashMap;
use std::path::Path;

use anyhow::anyhow;
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{display_name, Attendee, AttendeeId, EligibilityFlags};

/// One attendee as listed in a roster file used to seed the memory store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "hasLoggedin")]
    pub has_logged_in: bool,
    #[serde(default)]
    pub scan_count: u64,
    /// Registration form fields, used for the display name.
    #[serde(default)]
    pub profile: HashMap<String, String>,
    /// Flag fields by document name, aliases included (`isCheckedIn`, `lunch1`, ...).
    #[serde(default)]
    pub flags: HashMap<String, bool>,
}

impl RosterEntry {
    pub fn into_attendee(self) -> Attendee {
        let id = self.id.trim().to_string();
        let mut fields = self.profile;
        if let Some(email) = &self.email {
            fields.entry("email".to_string()).or_insert_with(|| email.clone());
        }
        let flags = EligibilityFlags::from_lookup(|field| self.flags.get(field).copied().unwrap_or(false));
        Attendee {
            display_name: display_name(&id, &fields),
            id: AttendeeId(id),
            email: self.email,
            has_logged_in: self.has_logged_in,
            flags,
            scan_count: self.scan_count,
            last_scanned_at: None,
            revision: None,
        }
    }
}

pub struct RosterFileRepository;

impl RosterFileRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn load_roster(&self, path: &str) -> anyhow::Result<Vec<RosterEntry>> {
        if !Path::new(path).exists() {
            warn!(path = %path, "roster file not found, starting with an empty attendee list");
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path).await?;
        parse_roster(path, &content)
    }
}

impl Default for RosterFileRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_roster(path: &str, content: &str) -> anyhow::Result<Vec<RosterEntry>> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();
    let entries: Vec<RosterEntry> = match extension.as_str() {
        "json" => serde_json::from_str(content)?,
        "yaml" | "yml" => serde_yaml::from_str(content)?,
        other => return Err(anyhow!("unsupported roster format '{}' for {}", other, path)),
    };
    Ok(entries
        .into_iter()
        .filter(|entry| !entry.id.trim().is_empty())
        .collect())
}
