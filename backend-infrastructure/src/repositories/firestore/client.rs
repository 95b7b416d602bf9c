use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::value::Document;

const CONFLICT_STATUSES: &[&str] = &["FAILED_PRECONDITION", "ALREADY_EXISTS", "ABORTED"];

#[derive(Debug, Error)]
pub enum CommitError {
    /// A precondition did not hold; nothing was written.
    #[error("commit conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Thin client for the Firestore REST API, one database per client.
pub struct FirestoreClient {
    http: Client,
    base_url: Url,
    project_id: String,
    database: String,
    access_token: Option<String>,
}

impl FirestoreClient {
    pub fn new(
        base_url: &str,
        project_id: &str,
        database: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid firestore url {}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("firestore url {} cannot be a base", base_url));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            project_id: project_id.to_string(),
            database: database.to_string(),
            access_token,
        })
    }

    /// Full resource name, as used inside request bodies.
    pub fn document_name(&self, path: &[&str]) -> String {
        let mut name = format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        );
        for segment in path {
            name.push('/');
            name.push_str(segment);
        }
        name
    }

    /// `path` is appended below `documents`; `action` (e.g. `runQuery`) is
    /// joined to the last segment with a colon.
    pub fn url(&self, path: &[&str], action: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        let mut segments = vec![
            "projects".to_string(),
            self.project_id.clone(),
            "databases".to_string(),
            self.database.clone(),
            "documents".to_string(),
        ];
        segments.extend(path.iter().map(|segment| segment.to_string()));
        if let (Some(action), Some(last)) = (action, segments.last_mut()) {
            last.push(':');
            last.push_str(action);
        }
        if let Ok(mut parts) = url.path_segments_mut() {
            parts.pop_if_empty().extend(segments.iter());
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.access_token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    pub async fn get_document(&self, path: &[&str]) -> Result<Option<Document>> {
        let response = self.request(Method::GET, self.url(path, None)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        Ok(Some(response.json().await?))
    }

    pub async fn list_documents(
        &self,
        collection: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> Result<ListDocumentsResponse> {
        let mut url = self.url(&[collection], None);
        url.query_pairs_mut()
            .append_pair("pageSize", &page_size.to_string());
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }
        let response = self.request(Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ListDocumentsResponse::default());
        }
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Runs a structured query under `parent` (empty for the database root).
    pub async fn run_query(&self, parent: &[&str], structured_query: Value) -> Result<Vec<Document>> {
        let url = if parent.is_empty() {
            self.url(&[], Some("runQuery"))
        } else {
            self.url(parent, Some("runQuery"))
        };
        let response = self
            .request(Method::POST, url)
            .json(&json!({ "structuredQuery": structured_query }))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let items: Vec<RunQueryItem> = response.json().await?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    /// Applies all writes atomically, or none of them.
    pub async fn commit(&self, writes: Vec<Value>) -> Result<(), CommitError> {
        let response = self
            .request(Method::POST, self.url(&[], Some("commit")))
            .json(&json!({ "writes": writes }))
            .send()
            .await
            .map_err(anyhow::Error::from)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let (grpc_status, message) = parse_error(&body);
        if status == StatusCode::CONFLICT || CONFLICT_STATUSES.contains(&grpc_status.as_str()) {
            return Err(CommitError::Conflict(message));
        }
        Err(CommitError::Failed(anyhow!(
            "firestore commit responded {}: {}",
            status,
            message
        )))
    }
}

fn parse_error(body: &str) -> (String, String) {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.status, envelope.error.message),
        Err(_) => (String::new(), body.trim().to_string()),
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let (_, message) = parse_error(&body);
    Err(anyhow!("firestore responded {}: {}", status, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FirestoreClient {
        FirestoreClient::new(
            "http://localhost:8080/v1",
            "hackai",
            "(default)",
            None,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn builds_document_urls() {
        let client = client();
        assert_eq!(
            client.url(&["hackers", "A1"], None).as_str(),
            "http://localhost:8080/v1/projects/hackai/databases/(default)/documents/hackers/A1"
        );
        assert_eq!(
            client.url(&[], Some("commit")).as_str(),
            "http://localhost:8080/v1/projects/hackai/databases/(default)/documents:commit"
        );
        assert_eq!(
            client.url(&["hackers", "A1"], Some("runQuery")).as_str(),
            "http://localhost:8080/v1/projects/hackai/databases/(default)/documents/hackers/A1:runQuery"
        );
    }

    #[test]
    fn path_segments_are_escaped() {
        let url = client().url(&["hackers", "a b?c"], None);
        assert!(url.as_str().ends_with("/hackers/a%20b%3Fc"));
    }

    #[test]
    fn document_names_are_relative_to_the_database() {
        assert_eq!(
            client().document_name(&["hackers", "A1", "scans", "e1"]),
            "projects/hackai/databases/(default)/documents/hackers/A1/scans/e1"
        );
    }

    #[test]
    fn parses_error_envelopes() {
        let (status, message) = parse_error(
            r#"{"error": {"code": 400, "message": "update time mismatch", "status": "FAILED_PRECONDITION"}}"#,
        );
        assert_eq!(status, "FAILED_PRECONDITION");
        assert_eq!(message, "update time mismatch");

        let (status, message) = parse_error("bad gateway");
        assert!(status.is_empty());
        assert_eq!(message, "bad gateway");
    }
}
