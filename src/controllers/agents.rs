use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::{AgentListResponse, AgentResponse, RegisterAgentRequest, UpdateAgentRequest};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/agents")
            .route("/register", web::post().to(register_agent))
            .route("", web::get().to(list_agents))
            .route("/{agent_id}", web::get().to(get_agent))
            .route("/{agent_id}", web::put().to(update_agent))
            .route("/{agent_id}", web::delete().to(delete_agent)),
    );
}

/// Owner identifiers are 42-character 0x-prefixed hex addresses.
fn is_valid_owner_address(addr: &str) -> bool {
    addr.len() == 42
        && addr.starts_with("0x")
        && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
}

async fn register_agent(
    data: web::Data<AppState>,
    body: web::Json<RegisterAgentRequest>,
) -> impl Responder {
    if body.name.is_empty()
        || body.image_url.is_empty()
        || body.webhook_url.is_empty()
        || body.owner.is_empty()
    {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Missing required fields"
        }));
    }
    if body.price <= 0 {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Price must be greater than 0"
        }));
    }
    if !is_valid_owner_address(&body.owner) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Invalid owner address format"
        }));
    }

    let schema_text = body.tool_schema.to_string();
    match data.db.create_agent(
        &body.name,
        &body.image_url,
        body.price,
        &body.api_key,
        &body.webhook_url,
        &schema_text,
        &body.owner,
    ) {
        Ok(agent) => {
            log::info!("Registered agent {} ({})", agent.id, agent.name);
            HttpResponse::Ok().json(serde_json::json!({
                "agent_id": agent.id,
                "message": "Agent registered successfully",
                "status": "active"
            }))
        }
        Err(e) => {
            log::error!("Failed to register agent: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

#[derive(Deserialize)]
struct ListAgentsQuery {
    owner: Option<String>,
    page: Option<i64>,
    per_page: Option<i64>,
}

async fn list_agents(
    data: web::Data<AppState>,
    query: web::Query<ListAgentsQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    match data
        .db
        .list_active_agents(query.owner.as_deref(), page, per_page)
    {
        Ok((agents, total)) => HttpResponse::Ok().json(AgentListResponse {
            agents: agents.into_iter().map(AgentResponse::from).collect(),
            total,
            page,
            per_page,
        }),
        Err(e) => {
            log::error!("Failed to list agents: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

async fn get_agent(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let agent_id = path.into_inner();
    match data.db.get_active_agent(&agent_id) {
        Ok(Some(agent)) => HttpResponse::Ok().json(AgentResponse::from(agent)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Agent not found"
        })),
        Err(e) => {
            log::error!("Failed to get agent {}: {}", agent_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

async fn update_agent(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateAgentRequest>,
) -> impl Responder {
    let agent_id = path.into_inner();
    let mut agent = match data.db.get_agent(&agent_id) {
        Ok(Some(agent)) => agent,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Agent not found"
            }));
        }
        Err(e) => {
            log::error!("Failed to fetch agent {}: {}", agent_id, e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }));
        }
    };

    if let Some(price) = body.price {
        if price <= 0 {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Price must be greater than 0"
            }));
        }
        agent.price = price;
    }
    if let Some(name) = &body.name {
        agent.name = name.clone();
    }
    if let Some(image_url) = &body.image_url {
        agent.image_url = image_url.clone();
    }
    if let Some(webhook_url) = &body.webhook_url {
        agent.webhook_url = webhook_url.clone();
    }
    if let Some(schema) = &body.tool_schema {
        agent.tool_schema = schema.to_string();
    }

    match data.db.update_agent(&agent) {
        Ok(_) => {
            data.agent_cache.invalidate(&agent_id);
            HttpResponse::Ok().json(serde_json::json!({
                "agent_id": agent_id,
                "message": "Agent updated successfully"
            }))
        }
        Err(e) => {
            log::error!("Failed to update agent {}: {}", agent_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

async fn delete_agent(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let agent_id = path.into_inner();
    match data.db.deactivate_agent(&agent_id) {
        Ok(true) => {
            data.agent_cache.invalidate(&agent_id);
            HttpResponse::Ok().json(serde_json::json!({
                "agent_id": agent_id,
                "message": "Agent deleted successfully"
            }))
        }
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Agent not found"
        })),
        Err(e) => {
            log::error!("Failed to delete agent {}: {}", agent_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid_owner_address;

    #[test]
    fn test_owner_address_validation() {
        assert!(is_valid_owner_address(
            "0x1111111111111111111111111111111111111111"
        ));
        assert!(is_valid_owner_address(
            "0xAbCdEf0123456789abcdef0123456789ABCDEF01"
        ));
        // Wrong length
        assert!(!is_valid_owner_address("0x1111"));
        // Missing prefix
        assert!(!is_valid_owner_address(
            "111111111111111111111111111111111111111111"
        ));
        // Non-hex payload
        assert!(!is_valid_owner_address(
            "0xzz11111111111111111111111111111111111111"
        ));
        assert!(!is_valid_owner_address(""));
    }
}
