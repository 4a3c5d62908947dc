use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::Value;

use crate::mcp::auth::AuthError;
use crate::mcp::orchestrator::{DispatchError, FinalizeError};
use crate::models::ToolCallResponse;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/mcp")
            .route("/dispatch", web::post().to(dispatch))
            .route("/tool-call/{tool_call_id}", web::get().to(poll_tool_call))
            .route(
                "/tool-call/{tool_call_id}/record",
                web::get().to(get_tool_call),
            )
            .route(
                "/tool-call/{tool_call_id}/finalize",
                web::post().to(finalize_tool_call),
            ),
    );
}

/// JSON-RPC-shaped envelope: method + params + correlation id. No protocol
/// version negotiation.
#[derive(Deserialize)]
struct DispatchRequest {
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Value,
}

/// Extract the bearer credential. Anything other than a `Bearer ` scheme is
/// treated as absent, not as a token value.
fn bearer_from_request(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn dispatch_error_response(err: DispatchError, id: &Value) -> HttpResponse {
    let body = serde_json::json!({
        "error": err.to_string(),
        "id": id,
    });
    match err {
        DispatchError::Auth(AuthError::Missing) => HttpResponse::Unauthorized().json(body),
        DispatchError::Auth(AuthError::InvalidOrExpired) => {
            HttpResponse::Unauthorized().json(body)
        }
        DispatchError::Auth(AuthError::AgentInactive) => HttpResponse::Forbidden().json(body),
        DispatchError::Auth(AuthError::ToolNotFound(_)) => HttpResponse::NotFound().json(body),
        DispatchError::Auth(AuthError::Storage(e)) => {
            log::error!("Token lookup failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error",
                "id": id,
            }))
        }
        DispatchError::NotFound => HttpResponse::NotFound().json(body),
        DispatchError::AlreadyCompleted => HttpResponse::Conflict().json(body),
        DispatchError::Storage(e) => {
            log::error!("Dispatch storage error: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error",
                "id": id,
            }))
        }
    }
}

async fn dispatch(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<DispatchRequest>,
) -> impl Responder {
    let bearer = bearer_from_request(&req);
    let DispatchRequest { method, params, id } = body.into_inner();

    match data
        .orchestrator
        .dispatch(bearer.as_deref(), &method, params)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(serde_json::json!({
            "result": outcome,
            "id": id,
        })),
        Err(err) => dispatch_error_response(err, &id),
    }
}

async fn poll_tool_call(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let tool_call_id = path.into_inner();
    match data.orchestrator.poll(&tool_call_id) {
        Ok(Some(status)) => HttpResponse::Ok().json(status),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Tool call not found"
        })),
        Err(e) => {
            log::error!("Failed to poll tool call {}: {}", tool_call_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

/// Full record for monitoring, including parameters and cost.
async fn get_tool_call(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let tool_call_id = path.into_inner();
    match data.db.get_tool_call(&tool_call_id) {
        Ok(Some(tool_call)) => HttpResponse::Ok().json(ToolCallResponse::from(tool_call)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Tool call not found"
        })),
        Err(e) => {
            log::error!("Failed to get tool call {}: {}", tool_call_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

#[derive(Deserialize)]
struct FinalizeRequest {
    result: Value,
}

/// Attach an externally produced result to a pending tool call. Conflicts
/// instead of overwriting an already-completed record.
async fn finalize_tool_call(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<FinalizeRequest>,
) -> impl Responder {
    let tool_call_id = path.into_inner();
    match data.orchestrator.finalize(&tool_call_id, &body.result) {
        Ok(tool_call) => HttpResponse::Ok().json(ToolCallResponse::from(tool_call)),
        Err(FinalizeError::NotFound) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Tool call not found"
        })),
        Err(FinalizeError::AlreadyCompleted) => HttpResponse::Conflict().json(serde_json::json!({
            "error": "Tool call already completed"
        })),
        Err(FinalizeError::Storage(e)) => {
            log::error!("Failed to finalize tool call {}: {}", tool_call_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::bearer_from_request;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_extraction_requires_scheme() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer tok_abc"))
            .to_http_request();
        assert_eq!(bearer_from_request(&req).as_deref(), Some("tok_abc"));

        // A bare token without the scheme is not a credential
        let req = TestRequest::default()
            .insert_header(("Authorization", "tok_abc"))
            .to_http_request();
        assert!(bearer_from_request(&req).is_none());

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwdw=="))
            .to_http_request();
        assert!(bearer_from_request(&req).is_none());

        let req = TestRequest::default().to_http_request();
        assert!(bearer_from_request(&req).is_none());
    }
}
