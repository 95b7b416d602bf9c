use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use backend_domain::{AttendeeId, AttendeeRepository, ScanError};

/// Memo of token -> attendee id, keyed by the lower-cased token.
/// Entries are never evicted: identifiers do not change once assigned.
#[derive(Debug, Default)]
pub struct ResolverCache {
    entries: RwLock<HashMap<String, AttendeeId>>,
}

impl ResolverCache {
    pub async fn get(&self, key: &str) -> Option<AttendeeId> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: String, id: AttendeeId) {
        self.entries.write().await.insert(key, id);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

pub struct AttendeeResolver {
    repo: Arc<dyn AttendeeRepository>,
    cache: Arc<ResolverCache>,
}

impl AttendeeResolver {
    pub fn new(repo: Arc<dyn AttendeeRepository>, cache: Arc<ResolverCache>) -> Self {
        Self { repo, cache }
    }

    pub fn cache(&self) -> &Arc<ResolverCache> {
        &self.cache
    }

    /// Maps a scanned token (an email or a raw attendee id) to one attendee.
    ///
    /// Order: email equal to the lower-cased token, then email equal to the
    /// token as typed (only when it has upper-case letters), then the token as
    /// an id. Each path is a single lookup; store errors are not retried.
    pub async fn resolve(&self, raw_token: &str) -> Result<AttendeeId, ScanError> {
        let token = raw_token.trim();
        if token.is_empty() {
            return Err(ScanError::InvalidToken);
        }

        let key = token.to_lowercase();
        if let Some(id) = self.cache.get(&key).await {
            return Ok(id);
        }

        let resolved = match self.lookup(token, &key).await? {
            Some(id) => id,
            None => return Err(ScanError::AttendeeNotFound(token.to_string())),
        };
        debug!(token = %token, attendee = %resolved, "resolved scan token");
        self.cache.insert(key, resolved.clone()).await;
        Ok(resolved)
    }

    async fn lookup(&self, token: &str, lower: &str) -> Result<Option<AttendeeId>, ScanError> {
        if let Some(id) = self
            .repo
            .find_id_by_email(lower)
            .await
            .map_err(ScanError::lookup)?
        {
            return Ok(Some(id));
        }

        if token != lower {
            if let Some(id) = self
                .repo
                .find_id_by_email(token)
                .await
                .map_err(ScanError::lookup)?
            {
                return Ok(Some(id));
            }
        }

        let by_id = self
            .repo
            .find_by_id(&AttendeeId::from(token))
            .await
            .map_err(ScanError::lookup)?;
        Ok(by_id.map(|attendee| attendee.id))
    }
}
