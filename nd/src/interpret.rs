//! Model-output interpretation and page control
//!
//! Free-form commands ("rename this page to 'Q3 Plan'") are classified by
//! the model into a [`CommandPlan`], then dispatched against the workspace.
//! Model output that isn't the JSON we asked for never errors: it comes back
//! as [`ModelOutput::Freeform`] and the controller falls back to general
//! assistance.

use std::sync::LazyLock;

use pagetext::{ContentNode, NodeKind};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assistant::{Assistant, AssistantError, QuestionType};
use crate::prompts::Prompt;
use crate::workspace::{PageSpec, Parent, WorkspaceError};

static RE_TITLE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"title to ['"](.*?)['"]"#,
        r#"title: ['"](.*?)['"]"#,
        r#"called ['"](.*?)['"]"#,
        r#"named ['"](.*?)['"]"#,
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Drop a surrounding markdown code fence, if any
pub fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Result of reading structured data out of model text
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput<T> {
    Parsed(T),
    /// The text wasn't the JSON shape we asked for
    Freeform(String),
}

/// Parse model text as JSON, tolerating code fences
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> ModelOutput<T> {
    debug!(text_len = text.len(), "parse_model_json: called");
    match serde_json::from_str(strip_fences(text)) {
        Ok(value) => ModelOutput::Parsed(value),
        Err(e) => {
            warn!(error = %e, "parse_model_json: model output is not the expected JSON");
            ModelOutput::Freeform(text.to_string())
        }
    }
}

/// What the model decided a command should do
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PlanAction {
    Read,
    Create,
    Update,
    Search,
    Analyze,
    Generate,
    Other(String),
}

impl From<String> for PlanAction {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "read" => Self::Read,
            "create" => Self::Create,
            "update" => Self::Update,
            "search" => Self::Search,
            "analyze" => Self::Analyze,
            "generate" => Self::Generate,
            _ => Self::Other(s),
        }
    }
}

/// The model's classification of a page command
#[derive(Debug, Clone, Deserialize)]
pub struct CommandPlan {
    pub action: PlanAction,
    /// `page`, `database` or `content`
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub details: String,
    /// `text`, `title`, `property` or `blocks`
    #[serde(default)]
    pub content_type: String,
}

/// Pull a quoted title out of phrases like `title to 'X'` or `named "X"`
pub fn extract_title(details: &str) -> Option<String> {
    debug!(%details, "extract_title: called");
    RE_TITLE
        .iter()
        .find_map(|re| re.captures(details))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// One block as the model describes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl GeneratedBlock {
    /// Kinds we don't model become paragraphs. Text longer than a block
    /// may hold is split into consecutive blocks of the same kind.
    pub fn to_nodes(&self) -> Vec<ContentNode> {
        let kind = NodeKind::from_wire(&self.kind).unwrap_or(NodeKind::Paragraph);
        if kind == NodeKind::Divider {
            return vec![ContentNode::divider()];
        }
        let pieces = match pagetext::chunk(&self.text, pagetext::DEFAULT_MAX_LENGTH) {
            Ok(pieces) if !pieces.is_empty() => pieces,
            _ => vec![self.text.clone()],
        };
        pieces
            .into_iter()
            .map(|piece| ContentNode::of_kind(kind, piece))
            .collect()
    }
}

/// A page as the model describes it
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedPage {
    pub title: String,
    #[serde(default)]
    pub content: Vec<GeneratedBlock>,
}

impl GeneratedPage {
    pub fn nodes(&self) -> Vec<ContentNode> {
        self.content.iter().flat_map(GeneratedBlock::to_nodes).collect()
    }
}

/// A command plus the ids it may act on
#[derive(Debug, Clone, Default)]
pub struct PageCommand<'a> {
    pub command: &'a str,
    pub page_id: Option<&'a str>,
    pub database_id: Option<&'a str>,
    pub context: Option<&'a str>,
}

impl PageCommand<'_> {
    /// Which ids the caller supplied, for the fallback prompt
    fn available(&self) -> Option<String> {
        let ids: Vec<&str> = [
            self.page_id.map(|_| "Page ID"),
            self.database_id.map(|_| "Database ID"),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!ids.is_empty()).then(|| ids.join(" "))
    }
}

/// The raw classification and what executing it produced
#[derive(Debug, Clone, Serialize)]
pub struct ControlOutcome {
    pub interpreted_action: String,
    pub result: Value,
}

#[derive(Debug, Error)]
pub enum ControlError {
    /// The command needs an id the caller didn't send
    #[error("{0}")]
    MissingTarget(&'static str),

    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

impl From<WorkspaceError> for ControlError {
    fn from(e: WorkspaceError) -> Self {
        Self::Assistant(e.into())
    }
}

/// Executes free-form page commands
pub struct PageController {
    assistant: Assistant,
}

impl PageController {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    /// Classify `cmd` with the model, then carry it out
    pub async fn execute(&self, cmd: &PageCommand<'_>) -> Result<ControlOutcome, ControlError> {
        debug!(command = %cmd.command, page_id = ?cmd.page_id, database_id = ?cmd.database_id, "execute: called");
        let interpreted_action = self
            .assistant
            .ask(Prompt::InterpretCommand {
                command: cmd.command,
                page_id: cmd.page_id,
                database_id: cmd.database_id,
                context: cmd.context,
            })
            .await?;

        let result = match parse_model_json::<CommandPlan>(&interpreted_action) {
            ModelOutput::Parsed(plan) => {
                info!(action = ?plan.action, target = %plan.target, "Command interpreted");
                self.dispatch(&plan, cmd).await?
            }
            ModelOutput::Freeform(_) => self.fallback(cmd).await?,
        };

        Ok(ControlOutcome {
            interpreted_action,
            result,
        })
    }

    async fn dispatch(&self, plan: &CommandPlan, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!(action = ?plan.action, "dispatch: called");
        match &plan.action {
            PlanAction::Read => self.read(plan, cmd).await,
            PlanAction::Create => self.create(plan, cmd).await,
            PlanAction::Update => self.update(plan, cmd).await,
            PlanAction::Search => self.search(cmd).await,
            PlanAction::Analyze => self.analyze(cmd).await,
            PlanAction::Generate => self.generate(plan, cmd).await,
            PlanAction::Other(action) => {
                debug!(%action, "dispatch: unrecognized action");
                self.general(cmd).await
            }
        }
    }

    async fn read(&self, plan: &CommandPlan, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!(target = %plan.target, "read: called");
        let store = self.assistant.store();
        let wants_database = plan.target == "database" && cmd.database_id.is_some();

        match (cmd.page_id, cmd.database_id) {
            (Some(page_id), _) if !wants_database => {
                let page = store.get_page(page_id).await?;
                let nodes = store.get_page_content(page_id).await?;
                let summary = self.assistant.summarize_page(page_id).await?;
                let content: Vec<Value> = nodes.iter().map(ContentNode::to_block).collect();
                Ok(json!({
                    "action": "read_page",
                    "page_info": page.raw,
                    "content": content,
                    "summary": summary,
                }))
            }
            (_, Some(database_id)) => {
                let database = store.get_database(database_id).await?;
                let entries = store.query_database(database_id, None).await?;
                let analysis = self.assistant.analyze_database(database_id).await?;
                let entries: Vec<Value> = entries.into_iter().map(|e| e.raw).collect();
                Ok(json!({
                    "action": "read_database",
                    "database_info": database.raw,
                    "entries": entries,
                    "analysis": analysis,
                }))
            }
            _ => Err(ControlError::MissingTarget(
                "Page ID or Database ID required for read operations",
            )),
        }
    }

    async fn create(&self, plan: &CommandPlan, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!(details = %plan.details, "create: called");
        let store = self.assistant.store();

        // Resolve the parent before spending a generation on content
        let (parent, title_property) = match (cmd.database_id, cmd.page_id) {
            (Some(database_id), _) => {
                let database = store.get_database(database_id).await?;
                let title_property = database.title_property().unwrap_or("title").to_string();
                (Parent::Database(database_id.to_string()), title_property)
            }
            (None, Some(page_id)) => (Parent::Page(page_id.to_string()), "title".to_string()),
            (None, None) => {
                return Err(ControlError::MissingTarget(
                    "Page ID or Database ID required to create a page",
                ));
            }
        };

        let response = self
            .assistant
            .ask(Prompt::CreatePage {
                details: &plan.details,
            })
            .await?;
        let generated = match parse_model_json::<GeneratedPage>(&response) {
            ModelOutput::Parsed(page) => page,
            ModelOutput::Freeform(_) => return self.fallback(cmd).await,
        };

        let spec = PageSpec::new(parent, generated.title.as_str())
            .with_title_property(title_property)
            .with_children(generated.nodes());
        let page = store.create_page(spec).await?;
        info!(page_id = %page.id, title = %generated.title, "Page created from command");

        Ok(json!({
            "action": "created_page",
            "page": page,
            "message": format!("Successfully created page: \"{}\"", generated.title),
        }))
    }

    async fn update(&self, plan: &CommandPlan, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!(content_type = %plan.content_type, "update: called");
        let Some(page_id) = cmd.page_id else {
            return Err(ControlError::MissingTarget("Page ID required for update operations"));
        };
        let store = self.assistant.store();

        match plan.content_type.as_str() {
            "title" => {
                let Some(title) = extract_title(&plan.details) else {
                    return Ok(json!({ "error": "Could not extract new title from command" }));
                };
                let patch = json!({
                    "properties": {
                        "title": { "title": [{ "text": { "content": title } }] }
                    }
                });
                let page = store.update_page(page_id, patch).await?;
                Ok(json!({
                    "action": "updated_title",
                    "page": page,
                    "message": format!("Updated page title to: \"{}\"", title),
                }))
            }
            "blocks" => {
                let response = self
                    .assistant
                    .ask(Prompt::AddBlocks {
                        details: &plan.details,
                    })
                    .await?;
                let blocks = match parse_model_json::<Vec<GeneratedBlock>>(&response) {
                    ModelOutput::Parsed(blocks) => blocks,
                    ModelOutput::Freeform(_) => return self.fallback(cmd).await,
                };
                let nodes: Vec<ContentNode> = blocks.iter().flat_map(GeneratedBlock::to_nodes).collect();
                store.append_blocks(page_id, &nodes).await?;
                info!(%page_id, block_count = nodes.len(), "Generated blocks appended");

                Ok(json!({
                    "action": "generated_content",
                    "content": blocks,
                    "message": format!("Added {} blocks to the page", nodes.len()),
                }))
            }
            other => {
                debug!(content_type = %other, "update: unsupported content type");
                self.general(cmd).await
            }
        }
    }

    async fn search(&self, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!(command = %cmd.command, "search: called");
        let hits = self.assistant.store().search(cmd.command).await?;
        Ok(json!({
            "action": "search_results",
            "message": format!("Found {} results for: \"{}\"", hits.len(), cmd.command),
            "results": hits,
        }))
    }

    async fn analyze(&self, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!(page_id = ?cmd.page_id, "analyze: called");
        let Some(page_id) = cmd.page_id else {
            return Ok(json!({ "error": "Page ID required for analysis" }));
        };
        let analysis = self.assistant.key_info_for_page(page_id).await?;
        let questions = self.assistant.questions_for_page(page_id, QuestionType::Analysis).await?;
        Ok(json!({
            "action": "page_analysis",
            "analysis": analysis,
            "questions": questions,
            "message": "Complete page analysis generated",
        }))
    }

    async fn generate(&self, plan: &CommandPlan, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!(details = %plan.details, "generate: called");
        let content = self
            .assistant
            .ask(Prompt::Generate {
                details: &plan.details,
                context: cmd.context,
            })
            .await?;
        Ok(json!({
            "action": "generated_content",
            "content": content,
            "message": "Content generated successfully",
        }))
    }

    /// Recognized command that we have no dedicated handler for
    async fn general(&self, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!("general: called");
        let response = self
            .assistant
            .ask(Prompt::General {
                command: cmd.command,
                available: None,
                context: cmd.context,
            })
            .await?;
        Ok(json!({
            "action": "ai_response",
            "response": response,
            "message": "AI assistance provided",
        }))
    }

    /// Model output we couldn't read
    async fn fallback(&self, cmd: &PageCommand<'_>) -> Result<Value, ControlError> {
        debug!("fallback: called");
        let available = cmd.available();
        let response = self
            .assistant
            .ask(Prompt::General {
                command: cmd.command,
                available: available.as_deref(),
                context: cmd.context,
            })
            .await?;
        Ok(json!({
            "action": "ai_response",
            "response": response,
            "message": "General AI assistance provided",
        }))
    }
}
