//! Assistant operations
//!
//! Glue between the workspace and the generator: fetch page content, flatten
//! it, render the task prompt, and hand back the model's text. Page helpers
//! never call the generator for a page with no text; they return a fixed
//! sentinel instead.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use pagetext::ChunkError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm::{LlmError, TextGenerator};
use crate::prompts::{Prompt, PromptLoader};
use crate::workspace::{DatabaseMeta, Entry, ObjectKind, SearchHit, WorkspaceError, WorkspaceStore};

pub const EMPTY_PAGE: &str = "This page appears to be empty or contains no text content.";
pub const EMPTY_PAGE_IMPROVE: &str = "This page appears to be empty or contains no text content to improve.";
pub const EMPTY_PAGE_QUESTIONS: &str =
    "This page appears to be empty or contains no text content to generate questions from.";
pub const EMPTY_PAGE_KEY_INFO: &str =
    "This page appears to be empty or contains no text content to extract information from.";
pub const NO_SEARCH_RESULTS: &str = "No content found matching your search query.";

/// Word ceiling asked of the model for summaries
pub const DEFAULT_SUMMARY_WORDS: u32 = 100;

/// Database entries listed in an analysis prompt
const SAMPLE_ENTRIES: usize = 5;

/// Search hits listed in an analysis prompt
const SAMPLE_HITS: usize = 10;

/// Errors surfaced by assistant operations
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error(transparent)]
    Chunk(#[from] ChunkError),
}

/// What an improvement pass should focus on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementType {
    #[default]
    Clarity,
    Grammar,
    Style,
    Conciseness,
}

impl ImprovementType {
    pub const ALL: [ImprovementType; 4] = [Self::Clarity, Self::Grammar, Self::Style, Self::Conciseness];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clarity => "clarity",
            Self::Grammar => "grammar",
            Self::Style => "style",
            Self::Conciseness => "conciseness",
        }
    }
}

impl fmt::Display for ImprovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImprovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid improvement type '{}'. Supported: clarity, grammar, style, conciseness", s))
    }
}

/// Flavor of generated questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Review,
    Discussion,
    Analysis,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [Self::Review, Self::Discussion, Self::Analysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Discussion => "discussion",
            Self::Analysis => "analysis",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid question type '{}'. Supported: review, discussion, analysis", s))
    }
}

/// Workspace-aware text assistant
#[derive(Clone)]
pub struct Assistant {
    store: Arc<dyn WorkspaceStore>,
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptLoader>,
}

impl Assistant {
    pub fn new(store: Arc<dyn WorkspaceStore>, generator: Arc<dyn TextGenerator>, prompts: Arc<PromptLoader>) -> Self {
        Self {
            store,
            generator,
            prompts,
        }
    }

    pub fn store(&self) -> &Arc<dyn WorkspaceStore> {
        &self.store
    }

    /// Render `prompt` and send it to the generator
    pub async fn ask(&self, prompt: Prompt<'_>) -> Result<String, AssistantError> {
        debug!(template = prompt.template_name(), "ask: called");
        let text = self
            .prompts
            .render(&prompt)
            .map_err(|e| AssistantError::Prompt(e.to_string()))?;
        Ok(self.generator.generate(&text).await?)
    }

    // ---------------------------------------------------------------------
    // Text helpers
    // ---------------------------------------------------------------------

    pub async fn summarize_text(&self, content: &str) -> Result<String, AssistantError> {
        debug!(content_len = content.len(), "summarize_text: called");
        self.ask(Prompt::Summarize {
            content,
            max_words: DEFAULT_SUMMARY_WORDS,
        })
        .await
    }

    pub async fn analyze_text(&self, content: &str, context: Option<&str>) -> Result<String, AssistantError> {
        debug!(content_len = content.len(), has_context = context.is_some(), "analyze_text: called");
        self.ask(Prompt::Analyze { content, context }).await
    }

    pub async fn content_suggestions(&self, topic: &str, requirements: &str) -> Result<String, AssistantError> {
        debug!(%topic, "content_suggestions: called");
        self.ask(Prompt::Suggestions { topic, requirements }).await
    }

    pub async fn improve_text(&self, content: &str, improvement: ImprovementType) -> Result<String, AssistantError> {
        debug!(%improvement, "improve_text: called");
        self.ask(Prompt::Improve { content, improvement }).await
    }

    pub async fn questions_for_text(&self, content: &str, question: QuestionType) -> Result<String, AssistantError> {
        debug!(%question, "questions_for_text: called");
        self.ask(Prompt::Questions { content, question }).await
    }

    pub async fn key_info_for_text(&self, content: &str) -> Result<String, AssistantError> {
        debug!(content_len = content.len(), "key_info_for_text: called");
        self.ask(Prompt::KeyInfo { content }).await
    }

    /// Caller-supplied instruction applied to `content`
    pub async fn custom(&self, prompt: &str, content: &str) -> Result<String, AssistantError> {
        debug!(prompt_len = prompt.len(), "custom: called");
        self.ask(Prompt::Custom { prompt, content }).await
    }

    // ---------------------------------------------------------------------
    // Page helpers
    // ---------------------------------------------------------------------

    /// Fetch a page's blocks and flatten them to text
    pub async fn page_text(&self, page_id: &str) -> Result<String, AssistantError> {
        debug!(%page_id, "page_text: called");
        let nodes = self.store.get_page_content(page_id).await?;
        Ok(pagetext::extract(&nodes))
    }

    /// Page text, or `None` when there is nothing worth sending to the model
    async fn non_empty_page_text(&self, page_id: &str) -> Result<Option<String>, AssistantError> {
        let text = self.page_text(page_id).await?;
        if text.trim().is_empty() {
            debug!(%page_id, "non_empty_page_text: page has no text");
            return Ok(None);
        }
        Ok(Some(text))
    }

    pub async fn summarize_page(&self, page_id: &str) -> Result<String, AssistantError> {
        debug!(%page_id, "summarize_page: called");
        match self.non_empty_page_text(page_id).await? {
            Some(text) => self.summarize_text(&text).await,
            None => Ok(EMPTY_PAGE.to_string()),
        }
    }

    pub async fn improve_page(&self, page_id: &str, improvement: ImprovementType) -> Result<String, AssistantError> {
        debug!(%page_id, %improvement, "improve_page: called");
        match self.non_empty_page_text(page_id).await? {
            Some(text) => self.improve_text(&text, improvement).await,
            None => Ok(EMPTY_PAGE_IMPROVE.to_string()),
        }
    }

    pub async fn questions_for_page(&self, page_id: &str, question: QuestionType) -> Result<String, AssistantError> {
        debug!(%page_id, %question, "questions_for_page: called");
        match self.non_empty_page_text(page_id).await? {
            Some(text) => self.questions_for_text(&text, question).await,
            None => Ok(EMPTY_PAGE_QUESTIONS.to_string()),
        }
    }

    pub async fn key_info_for_page(&self, page_id: &str) -> Result<String, AssistantError> {
        debug!(%page_id, "key_info_for_page: called");
        match self.non_empty_page_text(page_id).await? {
            Some(text) => self.key_info_for_text(&text).await,
            None => Ok(EMPTY_PAGE_KEY_INFO.to_string()),
        }
    }

    pub async fn analyze_database(&self, database_id: &str) -> Result<String, AssistantError> {
        debug!(%database_id, "analyze_database: called");
        let database = self.store.get_database(database_id).await?;
        let entries = self.store.query_database(database_id, None).await?;
        let info = format_database_info(&database, &entries);
        self.analyze_text(&info, Some("This is a Notion database analysis")).await
    }

    pub async fn search_and_analyze(&self, query: &str) -> Result<String, AssistantError> {
        debug!(%query, "search_and_analyze: called");
        let hits = self.store.search(query).await?;
        if hits.is_empty() {
            debug!("search_and_analyze: no hits");
            return Ok(NO_SEARCH_RESULTS.to_string());
        }
        let summary = format_search_results(&hits);
        let context = format!("Search results for: \"{}\"", query);
        self.analyze_text(&summary, Some(&context)).await
    }
}

/// Describe a database for an analysis prompt
pub fn format_database_info(database: &DatabaseMeta, entries: &[Entry]) -> String {
    let mut info = format!("Database: {}\n\nProperties:\n", database.title);
    for (name, kind) in &database.properties {
        info.push_str(&format!("- {}: {}\n", name, kind));
    }

    info.push_str(&format!("\nTotal entries: {}\n\nSample entries:\n", entries.len()));
    for entry in entries.iter().take(SAMPLE_ENTRIES) {
        info.push_str(&format!("- {}\n", entry.title));
    }
    info
}

/// Describe search hits for an analysis prompt
pub fn format_search_results(hits: &[SearchHit]) -> String {
    let mut summary = format!("Found {} items:\n\n", hits.len());
    for hit in hits.iter().take(SAMPLE_HITS) {
        match hit.object {
            ObjectKind::Page => {
                summary.push_str(&format!("Page: {}\n", hit.title.as_deref().unwrap_or("Untitled Page")));
            }
            ObjectKind::Database => {
                summary.push_str(&format!(
                    "Database: {}\n",
                    hit.title.as_deref().unwrap_or("Untitled Database")
                ));
            }
            ObjectKind::Other => {}
        }
    }
    summary
}
