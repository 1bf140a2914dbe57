//! Workspace store module for notiond
//!
//! Page, block and database access behind the [`WorkspaceStore`] trait, with
//! the Notion REST adapter as the production implementation.

use std::sync::Arc;

use async_trait::async_trait;
use pagetext::ContentNode;
use serde_json::Value;

mod error;
mod notion;
mod types;

pub use error::WorkspaceError;
pub use notion::{MAX_CHILDREN_PER_REQUEST, NotionClient, NotionConnector};
pub use types::{
    DatabaseMeta, Entry, ObjectKind, PageMeta, PageSpec, Parent, SearchHit, UNTITLED, User, first_run_text,
    title_from_properties,
};

/// Read-write access to one workspace
///
/// Every call is independent; implementations hold no per-request state.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn get_page(&self, page_id: &str) -> Result<PageMeta, WorkspaceError>;

    /// All top-level blocks of a page, in reading order
    async fn get_page_content(&self, page_id: &str) -> Result<Vec<ContentNode>, WorkspaceError>;

    async fn get_database(&self, database_id: &str) -> Result<DatabaseMeta, WorkspaceError>;

    /// Query a database; `query` (filter, sorts) is forwarded verbatim
    async fn query_database(&self, database_id: &str, query: Option<Value>) -> Result<Vec<Entry>, WorkspaceError>;

    async fn create_page(&self, spec: PageSpec) -> Result<PageMeta, WorkspaceError>;

    /// Patch a page; `patch` is forwarded verbatim
    async fn update_page(&self, page_id: &str, patch: Value) -> Result<PageMeta, WorkspaceError>;

    /// Append nodes after the last child of `parent_id`
    async fn append_blocks(&self, parent_id: &str, nodes: &[ContentNode]) -> Result<(), WorkspaceError>;

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, WorkspaceError>;

    async fn list_users(&self) -> Result<Vec<User>, WorkspaceError>;
}

/// Builds a store bound to a caller's token
///
/// The HTTP layer forwards each request's bearer token, so stores are made
/// per request rather than shared.
pub trait WorkspaceConnector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Arc<dyn WorkspaceStore>, WorkspaceError>;
}
