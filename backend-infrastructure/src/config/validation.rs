use anyhow::{anyhow, Result};

pub fn validate_url(value: &str) -> Result<()> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(anyhow!("firestore_base_url must be an http(s) url"));
    }
    Ok(())
}

/// Collection and document ids become URL path segments.
pub fn validate_collection_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(anyhow!("{} must not be empty", field));
    }
    if value.contains('/') {
        return Err(anyhow!("{} must be a single path segment", field));
    }
    Ok(())
}
