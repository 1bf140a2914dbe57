//! Tool surface for model-context-protocol clients
//!
//! Tools are plain JSON over HTTP. A failing tool still answers 200 with
//! `isError: true` so clients can show the message to the model.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{ApiError, ApiResult, AppState, SERVICE_NAME};
use crate::assistant::{ImprovementType, QuestionType};

fn page_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "pageId": { "type": "string", "description": description }
        },
        "required": ["pageId"]
    })
}

/// Tool definitions with their input schemas
pub fn tool_definitions() -> Value {
    json!({
        "tools": [
            {
                "name": "summarize_notion_page",
                "description": "Generate an AI summary of a Notion page using Google Gemini",
                "inputSchema": page_schema("The Notion page ID to summarize"),
            },
            {
                "name": "generate_discussion_questions",
                "description": "Generate discussion questions for a Notion page",
                "inputSchema": page_schema("The Notion page ID to generate questions for"),
            },
            {
                "name": "analyze_database",
                "description": "Perform AI analysis of a Notion database",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "databaseId": { "type": "string", "description": "The Notion database ID to analyze" }
                    },
                    "required": ["databaseId"]
                },
            },
            {
                "name": "extract_key_information",
                "description": "Extract key information from a Notion page",
                "inputSchema": page_schema("The Notion page ID to extract information from"),
            },
            {
                "name": "improve_page_content",
                "description": "Generate suggestions to improve Notion page content",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "pageId": { "type": "string", "description": "The Notion page ID to improve" },
                        "improvementType": {
                            "type": "string",
                            "enum": ["clarity", "grammar", "style", "conciseness"],
                            "description": "Type of improvement to focus on",
                            "default": "clarity"
                        }
                    },
                    "required": ["pageId"]
                },
            },
            {
                "name": "add_ai_summary_block",
                "description": "Add an AI summary directly to a Notion page as a native block",
                "inputSchema": page_schema("The Notion page ID to add summary to"),
            },
            {
                "name": "search_and_analyze",
                "description": "Search Notion workspace and analyze results",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Search query for Notion content" }
                    },
                    "required": ["query"]
                },
            },
        ]
    })
}

fn text_result(text: String) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

fn error_result(message: impl std::fmt::Display) -> Value {
    json!({
        "content": [{ "type": "text", "text": format!("Error: {}", message) }],
        "isError": true,
    })
}

fn arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("Missing required argument: {}", name))
}

/// Run one tool; failures come back as an error result, never an `Err`
pub async fn run_tool(state: &AppState, headers: &HeaderMap, name: &str, args: &Value) -> Value {
    debug!(%name, "run_tool: called");
    match dispatch(state, headers, name, args).await {
        Ok(text) => {
            info!(tool = %name, "Tool completed");
            text_result(text)
        }
        Err(message) => {
            warn!(tool = %name, error = %message, "Tool failed");
            error_result(message)
        }
    }
}

async fn dispatch(state: &AppState, headers: &HeaderMap, name: &str, args: &Value) -> Result<String, String> {
    let integration = state.integration(headers).map_err(|e| e.to_string())?;
    let assistant = integration.assistant();

    match name {
        "summarize_notion_page" => {
            let page_id = arg(args, "pageId")?;
            let summary = assistant.summarize_page(page_id).await.map_err(|e| e.to_string())?;
            Ok(format!("AI Summary:\n\n{}", summary))
        }
        "generate_discussion_questions" => {
            let page_id = arg(args, "pageId")?;
            let questions = assistant
                .questions_for_page(page_id, QuestionType::default())
                .await
                .map_err(|e| e.to_string())?;
            Ok(format!("Discussion Questions:\n\n{}", questions))
        }
        "analyze_database" => {
            let database_id = arg(args, "databaseId")?;
            let analysis = assistant.analyze_database(database_id).await.map_err(|e| e.to_string())?;
            Ok(format!("Database Analysis:\n\n{}", analysis))
        }
        "extract_key_information" => {
            let page_id = arg(args, "pageId")?;
            let key_info = assistant.key_info_for_page(page_id).await.map_err(|e| e.to_string())?;
            Ok(format!("Key Information:\n\n{}", key_info))
        }
        "improve_page_content" => {
            let page_id = arg(args, "pageId")?;
            let improvement = match args.get("improvementType").and_then(Value::as_str) {
                Some(v) => v.parse::<ImprovementType>()?,
                None => ImprovementType::default(),
            };
            let suggestions = assistant
                .improve_page(page_id, improvement)
                .await
                .map_err(|e| e.to_string())?;
            Ok(format!("Content Improvement Suggestions:\n\n{}", suggestions))
        }
        "add_ai_summary_block" => {
            let page_id = arg(args, "pageId")?;
            integration.add_summary_to_page(page_id).await.map_err(|e| e.to_string())?;
            Ok("AI summary has been added directly to your Notion page as a native block!".to_string())
        }
        "search_and_analyze" => {
            let query = arg(args, "query")?;
            let results = assistant.search_and_analyze(query).await.map_err(|e| e.to_string())?;
            Ok(format!("Search & Analysis Results:\n\n{}", results))
        }
        _ => Err(format!("Unknown tool: {}", name)),
    }
}

pub async fn capabilities() -> Json<Value> {
    Json(json!({
        "capabilities": { "tools": true, "prompts": false, "resources": false },
        "implementation": { "name": SERVICE_NAME, "version": env!("CARGO_PKG_VERSION") },
    }))
}

pub async fn list_tools() -> Json<Value> {
    Json(tool_definitions())
}

pub async fn call_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    body: Bytes,
) -> Json<Value> {
    // An empty body means no arguments
    let args = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
    Json(run_tool(&state, &headers, &name, &args).await)
}

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    method: String,
    #[serde(default)]
    params: CallParams,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallParams {
    name: Option<String>,
    arguments: Option<Value>,
}

/// JSON-RPC style entry point: `tools/list` and `tools/call`
pub async fn call(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CallRequest>,
) -> ApiResult<Json<Value>> {
    debug!(method = %req.method, "call: called");
    match req.method.as_str() {
        "tools/list" => Ok(Json(json!({ "result": tool_definitions() }))),
        "tools/call" => {
            let name = req
                .params
                .name
                .as_deref()
                .ok_or_else(|| ApiError::bad_request("Tool name is required"))?;
            let args = req.params.arguments.unwrap_or_else(|| json!({}));
            let result = run_tool(&state, &headers, name, &args).await;
            Ok(Json(json!({ "result": result })))
        }
        _ => Err(ApiError::bad_request("Unknown method")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::workspace::mock::MemoryWorkspace;
    use axum::http::StatusCode;
    use pagetext::ContentNode;

    fn notes() -> MemoryWorkspace {
        MemoryWorkspace::new().with_page("p1", "Notes", vec![ContentNode::paragraph("Quarterly goals.")])
    }

    #[test]
    fn test_tool_definitions() {
        let defs = tool_definitions();
        let tools = defs["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        let improve = tools.iter().find(|t| t["name"] == "improve_page_content").unwrap();
        assert_eq!(improve["inputSchema"]["properties"]["improvementType"]["default"], "clarity");
        assert_eq!(improve["inputSchema"]["required"], json!(["pageId"]));
    }

    #[tokio::test]
    async fn test_capabilities() {
        let h = harness(notes(), vec![], None);
        let (status, body) = get(&h.router, "/mcp/capabilities").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["capabilities"]["tools"], true);
        assert_eq!(body["capabilities"]["resources"], false);
        assert_eq!(body["implementation"]["name"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn test_execute_tool() {
        let h = harness(notes(), vec!["Goals."], Some("t"));
        let (status, body) = post_json(&h.router, "/mcp/tools/summarize_notion_page", json!({"pageId": "p1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"][0]["text"], "AI Summary:\n\nGoals.");
        assert!(body.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let h = harness(notes(), vec![], Some("t"));
        let (status, body) = post_json(&h.router, "/mcp/tools/delete_everything", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isError"], true);
        assert_eq!(body["content"][0]["text"], "Error: Unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn test_missing_argument_is_error_result() {
        let h = harness(notes(), vec![], Some("t"));
        let (_, body) = post_json(&h.router, "/mcp/tools/extract_key_information", json!({})).await;
        assert_eq!(body["isError"], true);
        assert_eq!(body["content"][0]["text"], "Error: Missing required argument: pageId");
    }

    #[tokio::test]
    async fn test_add_summary_block_tool() {
        let h = harness(notes(), vec!["Goals."], Some("t"));
        let (_, body) = post_json(&h.router, "/mcp/tools/add_ai_summary_block", json!({"pageId": "p1"})).await;
        assert_eq!(
            body["content"][0]["text"],
            "AI summary has been added directly to your Notion page as a native block!"
        );
        assert_eq!(h.workspace.appended().len(), 1);
    }

    #[tokio::test]
    async fn test_call_methods() {
        let h = harness(notes(), vec!["Better."], Some("t"));

        let (status, body) = post_json(&h.router, "/mcp/call", json!({"method": "tools/list"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 7);

        let (status, body) = post_json(
            &h.router,
            "/mcp/call",
            json!({
                "method": "tools/call",
                "params": {"name": "improve_page_content", "arguments": {"pageId": "p1", "improvementType": "grammar"}}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["content"][0]["text"], "Content Improvement Suggestions:\n\nBetter.");
        assert!(h.generator.prompts()[0].contains("for grammar"));

        let (status, body) = post_json(&h.router, "/mcp/call", json!({"method": "resources/list"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown method");
    }
}
