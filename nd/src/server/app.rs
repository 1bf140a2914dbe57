//! Workspace UI extension callbacks
//!
//! Button clicks and slash commands from inside the workspace, plus webhook
//! verification. Verification challenges are echoed straight back; nothing
//! about them is kept between requests.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{ApiError, ApiResult, AppState, timestamp};

fn challenge(body: &Value) -> Option<&Value> {
    body.get("challenge").filter(|c| !c.is_null())
}

fn str_at<'a>(body: &'a Value, pointer: &str) -> Option<&'a str> {
    body.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub async fn actions_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Actions endpoint is working",
        "timestamp": timestamp(),
    }))
}

/// A user clicked one of the AI buttons
pub async fn actions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    if let Some(challenge) = challenge(&body) {
        info!("Actions verification challenge received");
        return Ok(Json(json!({ "challenge": challenge })));
    }

    let action_id = str_at(&body, "/action_id").unwrap_or_default();
    debug!(%action_id, "actions: called");
    let page_id = str_at(&body, "/context/page_id")
        .or_else(|| str_at(&body, "/context/block_id"))
        .ok_or_else(|| ApiError::bad_request("Page or block ID is required"))?;

    let integration = state.integration(&headers)?;
    let failed = "Failed to process AI action";

    match action_id {
        "ai_summarize" => {
            integration
                .add_summary_to_page(page_id)
                .await
                .map_err(|e| ApiError::failed(failed, e))?;
            Ok(Json(json!({ "success": true, "message": "AI summary added to your page" })))
        }
        "ai_questions" => {
            integration
                .add_questions_to_page(page_id)
                .await
                .map_err(|e| ApiError::failed(failed, e))?;
            Ok(Json(json!({ "success": true, "message": "AI questions added to your page" })))
        }
        "ai_analysis" => {
            let page = integration
                .create_analysis_page(page_id, None)
                .await
                .map_err(|e| ApiError::failed(failed, e))?;
            Ok(Json(json!({
                "success": true,
                "message": "AI analysis sub-page created",
                "analysis_page_id": page.id,
            })))
        }
        _ => Err(ApiError::bad_request("Unknown action")),
    }
}

/// `/gemini_ai` opens a menu of the AI actions
pub async fn slash_commands(Json(body): Json<Value>) -> ApiResult<Json<Value>> {
    let command_id = str_at(&body, "/command_id").unwrap_or_default();
    debug!(%command_id, "slash_commands: called");

    if command_id != "gemini_ai" {
        return Err(ApiError::bad_request("Unknown command"));
    }

    Ok(Json(json!({
        "success": true,
        "response_type": "modal",
        "modal": {
            "title": "Gemini AI Assistant",
            "blocks": [
                { "type": "section", "text": "Choose an AI action for this content:" },
                {
                    "type": "actions",
                    "elements": [
                        { "type": "button", "text": "Summarize", "action_id": "ai_summarize" },
                        { "type": "button", "text": "Generate Questions", "action_id": "ai_questions" },
                        { "type": "button", "text": "Full Analysis", "action_id": "ai_analysis" }
                    ]
                }
            ]
        }
    })))
}

/// Workspace events; only verification needs an answer
pub async fn webhook(Json(body): Json<Value>) -> Json<Value> {
    if let Some(challenge) = challenge(&body) {
        info!("Webhook verification challenge received");
        return Json(json!({ "challenge": challenge }));
    }
    info!(event = ?body.get("type"), "Webhook event received");
    Json(json!({ "success": true }))
}

pub async fn webhook_verify(Json(body): Json<Value>) -> ApiResult<Json<Value>> {
    debug!("webhook_verify: called");
    match challenge(&body) {
        Some(challenge) => Ok(Json(json!({ "challenge": challenge }))),
        None => Err(ApiError::bad_request("No challenge provided")),
    }
}

pub async fn auth_callback(Json(body): Json<Value>) -> Json<Value> {
    info!(has_code = body.get("code").is_some(), "OAuth callback received");
    Json(json!({ "success": true }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::workspace::mock::MemoryWorkspace;
    use axum::http::StatusCode;
    use pagetext::ContentNode;
    use serde_json::json;

    fn notes() -> MemoryWorkspace {
        MemoryWorkspace::new().with_page("p1", "Notes", vec![ContentNode::paragraph("Quarterly goals.")])
    }

    #[tokio::test]
    async fn test_actions_challenge_echo() {
        // No token needed to verify
        let h = harness(notes(), vec![], None);
        let (status, body) = post_json(&h.router, "/actions", json!({"challenge": "abc123"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"challenge": "abc123"}));
    }

    #[tokio::test]
    async fn test_actions_summarize_appends() {
        let h = harness(notes(), vec!["Goals."], Some("t"));
        let (status, body) = post_json(
            &h.router,
            "/actions",
            json!({"action_id": "ai_summarize", "context": {"page_id": "p1"}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "AI summary added to your page");
        assert_eq!(h.workspace.appended().len(), 1);
    }

    #[tokio::test]
    async fn test_actions_block_id_and_analysis() {
        let h = harness(notes(), vec!["s", "k", "q"], Some("t"));
        let (status, body) = post_json(
            &h.router,
            "/actions",
            json!({"action_id": "ai_analysis", "context": {"block_id": "p1"}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis_page_id"], "created-1");
    }

    #[tokio::test]
    async fn test_actions_unknown() {
        let h = harness(notes(), vec![], Some("t"));
        let (status, body) = post_json(
            &h.router,
            "/actions",
            json!({"action_id": "ai_dance", "context": {"page_id": "p1"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown action");
    }

    #[tokio::test]
    async fn test_actions_status() {
        let h = harness(notes(), vec![], None);
        let (status, body) = get(&h.router, "/actions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Actions endpoint is working");
    }

    #[tokio::test]
    async fn test_slash_command_modal() {
        let h = harness(notes(), vec![], None);
        let (status, body) = post_json(
            &h.router,
            "/slash-commands",
            json!({"command_id": "gemini_ai", "context": {"page_id": "p1"}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response_type"], "modal");
        assert_eq!(body["modal"]["blocks"][1]["elements"][2]["action_id"], "ai_analysis");

        let (status, _) = post_json(&h.router, "/slash-commands", json!({"command_id": "other"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_and_verify() {
        let h = harness(notes(), vec![], None);
        let (_, body) = post_json(&h.router, "/webhook", json!({"challenge": "c1"})).await;
        assert_eq!(body, json!({"challenge": "c1"}));

        let (_, body) = post_json(&h.router, "/webhook", json!({"type": "page.updated"})).await;
        assert_eq!(body, json!({"success": true}));

        let (status, body) = post_json(&h.router, "/webhook/verify", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No challenge provided");

        // Each verification stands alone
        let (_, body) = post_json(&h.router, "/webhook/verify", json!({"challenge": "c2"})).await;
        assert_eq!(body, json!({"challenge": "c2"}));
    }

    #[tokio::test]
    async fn test_auth_callback() {
        let h = harness(notes(), vec![], None);
        let (status, body) = post_json(&h.router, "/auth/callback", json!({"code": "x"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}
