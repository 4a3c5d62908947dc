use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::{CreateTokenRequest, MaskedTokenResponse, TokenListResponse, TokenResponse};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/tokens")
            .route("/create", web::post().to(create_token))
            .route("", web::get().to(list_tokens))
            .route("/{token_id}/revoke", web::post().to(revoke_token)),
    );
}

async fn create_token(
    data: web::Data<AppState>,
    body: web::Json<CreateTokenRequest>,
) -> impl Responder {
    match data
        .authenticator
        .issue_token(&body.agent_id, &body.user_id, body.expires_in_days)
    {
        Ok(Some(token)) => {
            log::info!(
                "Issued token {} for agent {} / user {}",
                token.id,
                token.agent_id,
                token.user_id
            );
            HttpResponse::Ok().json(TokenResponse::from(token))
        }
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Agent not found"
        })),
        Err(e) => {
            log::error!("Failed to create token: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

#[derive(Deserialize)]
struct ListTokensQuery {
    user_id: String,
}

/// Active tokens owned by one user, with values masked.
async fn list_tokens(
    data: web::Data<AppState>,
    query: web::Query<ListTokensQuery>,
) -> impl Responder {
    match data.db.list_access_tokens_for_user(&query.user_id) {
        Ok(tokens) => {
            let tokens: Vec<MaskedTokenResponse> =
                tokens.into_iter().map(MaskedTokenResponse::from).collect();
            HttpResponse::Ok().json(TokenListResponse {
                total: tokens.len(),
                tokens,
                user_id: query.user_id.clone(),
            })
        }
        Err(e) => {
            log::error!("Failed to list tokens for {}: {}", query.user_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

async fn revoke_token(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let token_id = path.into_inner();
    match data.db.revoke_access_token(&token_id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "token_id": token_id,
            "message": "Token revoked"
        })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Token not found"
        })),
        Err(e) => {
            log::error!("Failed to revoke token {}: {}", token_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}
