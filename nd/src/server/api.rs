//! Dashboard API handlers

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{ApiError, ApiResult, AppState, timestamp};
use crate::assistant::{ImprovementType, QuestionType};
use crate::interpret::PageCommand;
use crate::page_id;

/// Supported `/api/ai-actions` actions, as listed in the 400 message
const SUPPORTED_ACTIONS: &str = "summarize, questions, analyze, improve, custom";

const ANALYSIS_CONTEXT: &str = "Provide a detailed analysis including key themes, insights, and recommendations";

/// Field values that are absent or blank are treated as missing
fn required<'a>(value: &'a Option<String>, message: &str) -> ApiResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn improvement_type(value: &Option<String>) -> ApiResult<ImprovementType> {
    match present(value) {
        Some(v) => v.parse().map_err(ApiError::bad_request),
        None => Ok(ImprovementType::default()),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    page_id: Option<String>,
    improvement_type: Option<String>,
    question_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseRequest {
    database_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestionsRequest {
    topic: Option<String>,
    requirements: Option<String>,
    /// Also file the suggestions as a new entry in this database
    database_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageIdRequest {
    notion_url: Option<String>,
}

pub async fn summarize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PageRequest>,
) -> ApiResult<Json<Value>> {
    debug!(?req, "summarize: called");
    let assistant = state.assistant(&headers)?;
    let page_id = required(&req.page_id, "Page ID is required")?;
    let summary = assistant
        .summarize_page(page_id)
        .await
        .map_err(|e| ApiError::failed("Failed to summarize page", e))?;
    Ok(Json(json!({ "success": true, "summary": summary })))
}

pub async fn analyze_database(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DatabaseRequest>,
) -> ApiResult<Json<Value>> {
    debug!(?req, "analyze_database: called");
    let assistant = state.assistant(&headers)?;
    let database_id = required(&req.database_id, "Database ID is required")?;
    let analysis = assistant
        .analyze_database(database_id)
        .await
        .map_err(|e| ApiError::failed("Failed to analyze database", e))?;
    Ok(Json(json!({ "success": true, "analysis": analysis })))
}

pub async fn content_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SuggestionsRequest>,
) -> ApiResult<Json<Value>> {
    debug!(?req, "content_suggestions: called");
    let integration = state.integration(&headers)?;
    let (Some(topic), Some(requirements)) = (present(&req.topic), present(&req.requirements)) else {
        return Err(ApiError::bad_request("Topic and requirements are required"));
    };

    if let Some(database_id) = present(&req.database_id) {
        let entry = integration
            .add_suggestions_to_database(database_id, topic, requirements)
            .await
            .map_err(|e| ApiError::failed("Failed to add suggestions to database", e))?;
        info!(%database_id, entry_id = %entry.id, "Suggestions filed in database");
        return Ok(Json(json!({ "success": true, "pageId": entry.id, "url": entry.url })));
    }

    let suggestions = integration
        .assistant()
        .content_suggestions(topic, requirements)
        .await
        .map_err(|e| ApiError::failed("Failed to generate content suggestions", e))?;
    Ok(Json(json!({ "success": true, "suggestions": suggestions })))
}

pub async fn improve_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PageRequest>,
) -> ApiResult<Json<Value>> {
    debug!(?req, "improve_content: called");
    let assistant = state.assistant(&headers)?;
    let page_id = required(&req.page_id, "Page ID is required")?;
    let improvement = improvement_type(&req.improvement_type)?;
    let improved = assistant
        .improve_page(page_id, improvement)
        .await
        .map_err(|e| ApiError::failed("Failed to improve content", e))?;
    Ok(Json(json!({ "success": true, "improvedContent": improved })))
}

pub async fn generate_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PageRequest>,
) -> ApiResult<Json<Value>> {
    debug!(?req, "generate_questions: called");
    let assistant = state.assistant(&headers)?;
    let page_id = required(&req.page_id, "Page ID is required")?;
    let question = match present(&req.question_type) {
        Some(v) => v.parse::<QuestionType>().map_err(ApiError::bad_request)?,
        None => QuestionType::default(),
    };
    let questions = assistant
        .questions_for_page(page_id, question)
        .await
        .map_err(|e| ApiError::failed("Failed to generate questions", e))?;
    Ok(Json(json!({ "success": true, "questions": questions })))
}

pub async fn extract_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PageRequest>,
) -> ApiResult<Json<Value>> {
    debug!(?req, "extract_info: called");
    let assistant = state.assistant(&headers)?;
    let page_id = required(&req.page_id, "Page ID is required")?;
    let key_info = assistant
        .key_info_for_page(page_id)
        .await
        .map_err(|e| ApiError::failed("Failed to extract key information", e))?;
    Ok(Json(json!({ "success": true, "keyInfo": key_info })))
}

pub async fn search_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SearchRequest>,
) -> ApiResult<Json<Value>> {
    debug!(?req, "search_analyze: called");
    let assistant = state.assistant(&headers)?;
    let query = required(&req.query, "Search query is required")?;
    let analysis = assistant
        .search_and_analyze(query)
        .await
        .map_err(|e| ApiError::failed("Failed to search and analyze", e))?;
    Ok(Json(json!({ "success": true, "analysis": analysis })))
}

pub async fn extract_page_id(Json(req): Json<PageIdRequest>) -> ApiResult<Json<Value>> {
    debug!(?req, "extract_page_id: called");
    let url = required(&req.notion_url, "Notion URL is required")?;
    let page_id = page_id::extract_page_id(url).ok_or_else(|| ApiError::bad_request("Invalid Notion URL format"))?;
    Ok(Json(json!({ "success": true, "pageId": page_id })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiActionRequest {
    action: Option<String>,
    page_id: Option<String>,
    content: Option<String>,
    prompt: Option<String>,
    improvement_type: Option<String>,
}

/// One endpoint, several actions; each takes a page or inline content
pub async fn ai_actions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AiActionRequest>,
) -> ApiResult<Json<Value>> {
    debug!(action = ?req.action, page_id = ?req.page_id, "ai_actions: called");
    let assistant = state.assistant(&headers)?;
    let action = present(&req.action).unwrap_or_default();
    let page_id = present(&req.page_id);
    let content = present(&req.content);

    let result = match action {
        "summarize" => match (page_id, content) {
            (Some(id), _) => assistant.summarize_page(id).await,
            (None, Some(text)) => assistant.summarize_text(text).await,
            _ => return Err(ApiError::bad_request("Page ID or content required for summarization")),
        },
        "questions" => match (page_id, content) {
            (Some(id), _) => assistant.questions_for_page(id, QuestionType::Discussion).await,
            (None, Some(text)) => assistant.questions_for_text(text, QuestionType::Discussion).await,
            _ => return Err(ApiError::bad_request("Page ID or content required for question generation")),
        },
        "analyze" => match (page_id, content) {
            (Some(id), _) => assistant.key_info_for_page(id).await,
            (None, Some(text)) => assistant.analyze_text(text, Some(ANALYSIS_CONTEXT)).await,
            _ => return Err(ApiError::bad_request("Page ID or content required for analysis")),
        },
        "improve" => {
            let Some(id) = page_id else {
                return Err(ApiError::bad_request("Page ID required for content improvement"));
            };
            let improvement = improvement_type(&req.improvement_type)?;
            assistant.improve_page(id, improvement).await
        }
        "custom" => {
            let Some(prompt) = present(&req.prompt) else {
                return Err(ApiError::bad_request("Prompt required for custom analysis"));
            };
            match (page_id, content) {
                (Some(id), _) => match assistant.page_text(id).await {
                    Ok(text) => assistant.custom(prompt, &text).await,
                    Err(e) => Err(e),
                },
                (None, Some(text)) => assistant.custom(prompt, text).await,
                _ => return Err(ApiError::bad_request("Page ID or content required for custom analysis")),
            }
        }
        _ => {
            return Err(ApiError::bad_request(format!(
                "Invalid action. Supported actions: {}",
                SUPPORTED_ACTIONS
            )));
        }
    }
    .map_err(|e| ApiError::failed("Failed to process AI action", e))?;

    info!(%action, "AI action completed");
    Ok(Json(json!({
        "success": true,
        "action": action,
        "result": result,
        "timestamp": timestamp(),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageControlRequest {
    command: Option<String>,
    page_id: Option<String>,
    database_id: Option<String>,
    context: Option<String>,
}

pub async fn page_control(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PageControlRequest>,
) -> ApiResult<Json<Value>> {
    debug!(command = ?req.command, "page_control: called");
    let controller = state.controller(&headers)?;
    let command = required(&req.command, "Command is required")?;

    let cmd = PageCommand {
        command,
        page_id: present(&req.page_id),
        database_id: present(&req.database_id),
        context: present(&req.context),
    };
    let outcome = controller.execute(&cmd).await?;

    Ok(Json(json!({
        "success": true,
        "command": command,
        "interpreted_action": outcome.interpreted_action,
        "result": outcome.result,
        "timestamp": timestamp(),
    })))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::workspace::mock::MemoryWorkspace;
    use crate::workspace::{DatabaseMeta, ObjectKind, SearchHit};
    use axum::http::StatusCode;
    use pagetext::ContentNode;
    use serde_json::json;

    fn notes() -> MemoryWorkspace {
        MemoryWorkspace::new().with_page("p1", "Notes", vec![ContentNode::paragraph("Quarterly goals.")])
    }

    #[tokio::test]
    async fn test_summarize() {
        let h = harness(notes(), vec!["Goals for the quarter."], Some("t"));
        let (status, body) = post_json(&h.router, "/api/summarize", json!({"pageId": "p1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "summary": "Goals for the quarter."}));
    }

    #[tokio::test]
    async fn test_summarize_requires_page_id() {
        let h = harness(notes(), vec![], Some("t"));
        let (status, body) = post_json(&h.router, "/api/summarize", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Page ID is required");
    }

    #[tokio::test]
    async fn test_summarize_missing_page_is_404() {
        let h = harness(notes(), vec![], Some("t"));
        let (status, body) = post_json(&h.router, "/api/summarize", json!({"pageId": "nope"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Failed to summarize page");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_generation_failure_is_500() {
        // No scripted responses: the generator fails
        let h = harness(notes(), vec![], Some("t"));
        let (status, body) = post_json(&h.router, "/api/extract-info", json!({"pageId": "p1"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to extract key information");
    }

    #[tokio::test]
    async fn test_improve_content_default_and_invalid_type() {
        let h = harness(notes(), vec!["Better."], Some("t"));
        let (status, body) = post_json(&h.router, "/api/improve-content", json!({"pageId": "p1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["improvedContent"], "Better.");
        assert!(h.generator.prompts()[0].contains("for clarity"));

        let (status, _) = post_json(
            &h.router,
            "/api/improve-content",
            json!({"pageId": "p1", "improvementType": "louder"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_questions_type() {
        let h = harness(notes(), vec!["Q?"], Some("t"));
        let (status, body) = post_json(
            &h.router,
            "/api/generate-questions",
            json!({"pageId": "p1", "questionType": "analysis"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"], "Q?");
        assert!(h.generator.prompts()[0].contains("analysis questions"));
    }

    #[tokio::test]
    async fn test_content_suggestions_requires_both_fields() {
        let h = harness(notes(), vec!["Ideas."], Some("t"));
        let (status, body) = post_json(&h.router, "/api/content-suggestions", json!({"topic": "Docs"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Topic and requirements are required");

        let (status, body) = post_json(
            &h.router,
            "/api/content-suggestions",
            json!({"topic": "Docs", "requirements": "short"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"], "Ideas.");
    }

    #[tokio::test]
    async fn test_content_suggestions_into_database() {
        let db = DatabaseMeta {
            id: "db1".to_string(),
            title: "Backlog".to_string(),
            properties: vec![
                ("Name".to_string(), "title".to_string()),
                ("Status".to_string(), "select".to_string()),
            ],
            raw: json!({}),
        };
        let h = harness(MemoryWorkspace::new().with_database(db, vec![]), vec!["Ideas."], Some("t"));
        let (status, body) = post_json(
            &h.router,
            "/api/content-suggestions",
            json!({"topic": "Docs", "requirements": "short", "databaseId": "db1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pageId"], "created-1");

        let created = h.workspace.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].title, "AI Suggestions: Docs");
        assert_eq!(created[0].title_property, "Name");
    }

    #[tokio::test]
    async fn test_analyze_database() {
        let db = DatabaseMeta {
            id: "db1".to_string(),
            title: "Tasks".to_string(),
            properties: vec![],
            raw: json!({}),
        };
        let h = harness(MemoryWorkspace::new().with_database(db, vec![]), vec!["Few tasks."], Some("t"));
        let (status, body) = post_json(&h.router, "/api/analyze-database", json!({"databaseId": "db1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"], "Few tasks.");
    }

    #[tokio::test]
    async fn test_search_analyze() {
        let hits = vec![SearchHit {
            id: "p1".to_string(),
            object: ObjectKind::Page,
            title: Some("Notes".to_string()),
            url: None,
        }];
        let h = harness(notes().with_hits(hits), vec!["One page."], Some("t"));
        let (status, body) = post_json(&h.router, "/api/search-analyze", json!({"query": "notes"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"], "One page.");
        assert!(h.generator.prompts()[0].contains("Search results for: \"notes\""));
    }

    #[tokio::test]
    async fn test_extract_page_id() {
        let h = harness(MemoryWorkspace::new(), vec![], None);
        let (status, body) = post_json(
            &h.router,
            "/api/extract-page-id",
            json!({"notionUrl": "https://www.notion.so/Plan-598337872cf94fdf8782e53db20768a5"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pageId"], "598337872cf94fdf8782e53db20768a5");

        let (status, body) = post_json(
            &h.router,
            "/api/extract-page-id",
            json!({"notionUrl": "https://www.notion.so/"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid Notion URL format");
    }

    #[tokio::test]
    async fn test_ai_actions_invalid_action() {
        let h = harness(notes(), vec![], Some("t"));
        let (status, body) = post_json(&h.router, "/api/ai-actions", json!({"action": "dance"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid action. Supported actions: summarize, questions, analyze, improve, custom"
        );
    }

    #[tokio::test]
    async fn test_ai_actions_summarize_content() {
        let h = harness(notes(), vec!["Short."], Some("t"));
        let (status, body) = post_json(
            &h.router,
            "/api/ai-actions",
            json!({"action": "summarize", "content": "A long text."}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "summarize");
        assert_eq!(body["result"], "Short.");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_ai_actions_custom_uses_page_text() {
        let h = harness(notes(), vec!["Translated."], Some("t"));
        let (status, body) = post_json(
            &h.router,
            "/api/ai-actions",
            json!({"action": "custom", "pageId": "p1", "prompt": "Translate to French"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "Translated.");
        let prompt = &h.generator.prompts()[0];
        assert!(prompt.contains("Translate to French"));
        assert!(prompt.contains("Quarterly goals."));
        assert!(!prompt.contains("rich_text"));
    }

    #[tokio::test]
    async fn test_ai_actions_missing_inputs() {
        let h = harness(notes(), vec![], Some("t"));
        let (status, _) = post_json(&h.router, "/api/ai-actions", json!({"action": "improve"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = post_json(&h.router, "/api/ai-actions", json!({"action": "custom", "content": "x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Prompt required for custom analysis");
    }

    #[tokio::test]
    async fn test_page_control_requires_command() {
        let h = harness(notes(), vec![], Some("t"));
        let (status, body) = post_json(&h.router, "/api/page-control", json!({"pageId": "p1"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Command is required");
    }

    #[tokio::test]
    async fn test_page_control_update_title() {
        let h = harness(
            notes(),
            vec![r#"{"action": "update", "target": "page", "details": "change title to 'Q3'", "content_type": "title"}"#],
            Some("t"),
        );
        let (status, body) = post_json(
            &h.router,
            "/api/page-control",
            json!({"command": "Rename to Q3", "pageId": "p1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["command"], "Rename to Q3");
        assert_eq!(body["result"]["action"], "updated_title");
        assert!(body["interpreted_action"].as_str().unwrap().contains("\"update\""));
        assert_eq!(h.workspace.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_page_control_generation_failure() {
        let h = harness(notes(), vec![], Some("t"));
        let (status, body) = post_json(&h.router, "/api/page-control", json!({"command": "Read"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to process page control command");
    }
}
