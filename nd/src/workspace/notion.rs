//! Notion REST API client
//!
//! Implements [`WorkspaceStore`] over the public Notion API with bearer-token
//! auth, cursor pagination for list endpoints, and retries for transient
//! failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pagetext::ContentNode;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{
    DatabaseMeta, Entry, PageMeta, PageSpec, SearchHit, User, WorkspaceConnector, WorkspaceError, WorkspaceStore,
};
use crate::config::NotionConfig;

/// The API rejects append and create requests with more children than this
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 500;

/// Page size requested from list endpoints
const PAGE_SIZE: usize = 100;

/// Which failures a request may be resent after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    /// Reads and idempotent updates: any transient failure
    Transient,
    /// Writes that add content: only a 429, which the API never applied
    RateLimitOnly,
}

impl Retry {
    fn allows(self, err: &WorkspaceError) -> bool {
        match self {
            Retry::Transient => err.is_retryable(),
            Retry::RateLimitOnly => err.is_rate_limit(),
        }
    }
}

/// Notion API client bound to one integration token
pub struct NotionClient {
    base_url: String,
    api_version: String,
    token: String,
    http: Client,
    initial_backoff: Duration,
}

impl NotionClient {
    /// Create a client for `token`
    pub fn new(config: &NotionConfig, token: &str) -> Result<Self, WorkspaceError> {
        debug!(base_url = %config.base_url, "NotionClient::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(WorkspaceError::Network)?;
        Self::with_http(config, token, http)
    }

    /// Create a client using the token from the configured environment variable
    pub fn from_config(config: &NotionConfig) -> Result<Self, WorkspaceError> {
        debug!(token_env = %config.token_env, "NotionClient::from_config: called");
        let token = config.token().ok_or(WorkspaceError::MissingToken)?;
        Self::new(config, &token)
    }

    fn with_http(config: &NotionConfig, token: &str, http: Client) -> Result<Self, WorkspaceError> {
        if token.trim().is_empty() {
            debug!("NotionClient::with_http: empty token");
            return Err(WorkspaceError::MissingToken);
        }
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            token: token.to_string(),
            http,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first retry delay (later retries double it)
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Send one request, resending it on failures `retry` allows
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        retry: Retry,
    ) -> Result<Value, WorkspaceError> {
        debug!(%method, %path, ?retry, "send: called");
        let url = format!("{}/v1/{}", self.base_url, path);

        let mut attempt = 0;
        loop {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.token)
                .header("Notion-Version", &self.api_version);
            if let Some(body) = body {
                request = request.json(body);
            }

            let err = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(status = response.status().as_u16(), "send: success");
                    let text = response.text().await?;
                    return Ok(serde_json::from_str(&text)?);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    debug!(attempt, status, "send: API error");
                    WorkspaceError::Remote {
                        status,
                        message: error_message(&text),
                    }
                }
                Err(e) => {
                    debug!(attempt, error = %e, "send: network error");
                    WorkspaceError::Network(e)
                }
            };

            if attempt >= MAX_RETRIES || !retry.allows(&err) {
                return Err(err);
            }

            attempt += 1;
            let backoff = self.initial_backoff * 2u32.pow(attempt - 1);
            warn!(attempt, backoff_ms = backoff.as_millis() as u64, %path, error = %err, "send: retrying");
            tokio::time::sleep(backoff).await;
        }
    }

    /// Follow `has_more`/`next_cursor` until the list is exhausted
    ///
    /// GET endpoints take the cursor as a query parameter, POST endpoints in
    /// the body.
    async fn collect(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<Value>, WorkspaceError> {
        debug!(%method, %path, "collect: called");
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = if method == Method::GET {
                let sep = if path.contains('?') { '&' } else { '?' };
                let mut paged = format!("{}{}page_size={}", path, sep, PAGE_SIZE);
                if let Some(c) = &cursor {
                    paged.push_str(&format!("&start_cursor={}", c));
                }
                self.send(Method::GET, &paged, None, Retry::Transient).await?
            } else {
                let mut body = body.clone().unwrap_or_else(|| json!({}));
                if let Some(obj) = body.as_object_mut() {
                    obj.insert("page_size".to_string(), json!(PAGE_SIZE));
                    if let Some(c) = &cursor {
                        obj.insert("start_cursor".to_string(), json!(c));
                    }
                }
                self.send(method.clone(), path, Some(&body), Retry::Transient).await?
            };

            match page.get("results").and_then(Value::as_array) {
                Some(items) => results.extend(items.iter().cloned()),
                None => {
                    return Err(WorkspaceError::InvalidResponse(format!(
                        "list response for {} has no results",
                        path
                    )));
                }
            }

            let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            cursor = page.get("next_cursor").and_then(Value::as_str).map(str::to_string);
            if !has_more || cursor.is_none() {
                break;
            }
            debug!(?cursor, "collect: fetching next page");
        }

        debug!(count = results.len(), "collect: done");
        Ok(results)
    }
}

/// Pull the API's `message` field out of an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl WorkspaceStore for NotionClient {
    async fn get_page(&self, page_id: &str) -> Result<PageMeta, WorkspaceError> {
        debug!(%page_id, "get_page: called");
        let raw = self
            .send(Method::GET, &format!("pages/{}", page_id), None, Retry::Transient)
            .await?;
        PageMeta::from_value(raw)
    }

    async fn get_page_content(&self, page_id: &str) -> Result<Vec<ContentNode>, WorkspaceError> {
        debug!(%page_id, "get_page_content: called");
        let blocks = self
            .collect(Method::GET, &format!("blocks/{}/children", page_id), None)
            .await?;
        Ok(blocks.iter().map(ContentNode::from_block).collect())
    }

    async fn get_database(&self, database_id: &str) -> Result<DatabaseMeta, WorkspaceError> {
        debug!(%database_id, "get_database: called");
        let raw = self
            .send(Method::GET, &format!("databases/{}", database_id), None, Retry::Transient)
            .await?;
        DatabaseMeta::from_value(raw)
    }

    async fn query_database(&self, database_id: &str, query: Option<Value>) -> Result<Vec<Entry>, WorkspaceError> {
        debug!(%database_id, has_query = query.is_some(), "query_database: called");
        let rows = self
            .collect(Method::POST, &format!("databases/{}/query", database_id), query)
            .await?;
        rows.into_iter().map(Entry::from_value).collect()
    }

    async fn create_page(&self, spec: PageSpec) -> Result<PageMeta, WorkspaceError> {
        debug!(title = %spec.title, child_count = spec.children.len(), "create_page: called");
        let body = spec.to_body(MAX_CHILDREN_PER_REQUEST);
        let raw = self
            .send(Method::POST, "pages", Some(&body), Retry::RateLimitOnly)
            .await?;
        let page = PageMeta::from_value(raw)?;

        if spec.children.len() > MAX_CHILDREN_PER_REQUEST {
            debug!("create_page: appending remaining children");
            self.append_blocks(&page.id, &spec.children[MAX_CHILDREN_PER_REQUEST..])
                .await?;
        }

        info!("Created page {} ({})", page.title, page.id);
        Ok(page)
    }

    async fn update_page(&self, page_id: &str, patch: Value) -> Result<PageMeta, WorkspaceError> {
        debug!(%page_id, "update_page: called");
        let raw = self
            .send(Method::PATCH, &format!("pages/{}", page_id), Some(&patch), Retry::Transient)
            .await?;
        PageMeta::from_value(raw)
    }

    async fn append_blocks(&self, parent_id: &str, nodes: &[ContentNode]) -> Result<(), WorkspaceError> {
        debug!(%parent_id, node_count = nodes.len(), "append_blocks: called");
        for batch in nodes.chunks(MAX_CHILDREN_PER_REQUEST) {
            let children: Vec<Value> = batch.iter().map(ContentNode::to_block).collect();
            self.send(
                Method::PATCH,
                &format!("blocks/{}/children", parent_id),
                Some(&json!({ "children": children })),
                Retry::RateLimitOnly,
            )
            .await?;
        }
        info!("Appended {} blocks to {}", nodes.len(), parent_id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, WorkspaceError> {
        debug!(%query, "search: called");
        let body = json!({ "query": query, "page_size": PAGE_SIZE });
        let response = self
            .send(Method::POST, "search", Some(&body), Retry::Transient)
            .await?;
        let hits = response
            .get("results")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(SearchHit::from_value).collect())
            .unwrap_or_default();
        Ok(hits)
    }

    async fn list_users(&self) -> Result<Vec<User>, WorkspaceError> {
        debug!("list_users: called");
        let users = self.collect(Method::GET, "users", None).await?;
        Ok(users.iter().map(User::from_value).collect())
    }
}

/// Makes a [`NotionClient`] per token, sharing one connection pool
pub struct NotionConnector {
    config: NotionConfig,
    http: Client,
}

impl NotionConnector {
    pub fn new(config: NotionConfig) -> Result<Self, WorkspaceError> {
        debug!(base_url = %config.base_url, "NotionConnector::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(WorkspaceError::Network)?;
        Ok(Self { config, http })
    }
}

impl WorkspaceConnector for NotionConnector {
    fn connect(&self, token: &str) -> Result<Arc<dyn WorkspaceStore>, WorkspaceError> {
        debug!("NotionConnector::connect: called");
        let client = NotionClient::with_http(&self.config, token, self.http.clone())?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_api_message() {
        let body = r#"{"object":"error","status":404,"code":"object_not_found","message":"Could not find page"}"#;
        assert_eq!(error_message(body), "Could not find page");
        assert_eq!(error_message("upstream connect error"), "upstream connect error");
    }

    #[test]
    fn test_retry_policy() {
        let bad_gateway = WorkspaceError::Remote {
            status: 502,
            message: "bad gateway".to_string(),
        };
        let rate_limited = WorkspaceError::Remote {
            status: 429,
            message: "rate_limited".to_string(),
        };
        assert!(Retry::Transient.allows(&bad_gateway));
        assert!(Retry::Transient.allows(&rate_limited));
        assert!(!Retry::RateLimitOnly.allows(&bad_gateway));
        assert!(Retry::RateLimitOnly.allows(&rate_limited));
    }

    #[test]
    fn test_blank_token_rejected() {
        let config = NotionConfig::default();
        assert!(matches!(NotionClient::new(&config, "  "), Err(WorkspaceError::MissingToken)));

        let connector = NotionConnector::new(config).unwrap();
        assert!(connector.connect("").is_err());
        assert!(connector.connect("secret_token").is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = NotionConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        };
        let client = NotionClient::new(&config, "t").unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
