use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod db;
mod mcp;
mod models;
mod payments;

use config::Config;
use db::Database;
use mcp::{AgentCache, TokenAuthenticator, ToolCallOrchestrator, WebhookDispatcher};
use payments::PaymentTracker;

/// Shared request context, constructed once at startup and handed to every
/// handler. No module-level singletons.
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub agent_cache: Arc<AgentCache>,
    pub authenticator: Arc<TokenAuthenticator>,
    pub orchestrator: Arc<ToolCallOrchestrator>,
    pub payments: Arc<PaymentTracker>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    let agent_cache = Arc::new(AgentCache::new(db.clone()));
    let authenticator = Arc::new(TokenAuthenticator::new(db.clone(), agent_cache.clone()));
    let orchestrator = Arc::new(ToolCallOrchestrator::new(
        db.clone(),
        authenticator.clone(),
        WebhookDispatcher::new(config.webhook_timeout_secs),
    ));

    let checkout_provider = payments::provider_from_config(&config);
    let payment_tracker = Arc::new(PaymentTracker::new(db.clone(), checkout_provider));

    log::info!("Starting agent gateway on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                agent_cache: Arc::clone(&agent_cache),
                authenticator: Arc::clone(&authenticator),
                orchestrator: Arc::clone(&orchestrator),
                payments: Arc::clone(&payment_tracker),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::agents::config)
            .configure(controllers::tokens::config)
            .configure(controllers::mcp::config)
            .configure(controllers::payments::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
