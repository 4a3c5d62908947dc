use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::{PaymentResponse, SettlementStatus};
use crate::payments::PaymentError;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/payments")
            .route("/create", web::post().to(create_payment))
            .route("/webhook", web::post().to(settlement_webhook))
            .route("/{identifier}", web::get().to(get_payment)),
    );
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Deserialize)]
struct CreatePaymentRequest {
    tool_call_id: String,
    amount: f64,
    #[serde(default = "default_currency")]
    currency: String,
}

async fn create_payment(
    data: web::Data<AppState>,
    body: web::Json<CreatePaymentRequest>,
) -> impl Responder {
    match data
        .payments
        .create_payment(&body.tool_call_id, body.amount, &body.currency)
        .await
    {
        Ok(payment) => HttpResponse::Ok().json(PaymentResponse::from(payment)),
        Err(PaymentError::NotFound) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Tool call not found"
        })),
        Err(PaymentError::Checkout(e)) => {
            log::error!("Checkout provider error: {}", e);
            HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Checkout session creation failed"
            }))
        }
        Err(PaymentError::Storage(e)) => {
            log::error!("Failed to create payment: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

/// Settlement notification from the external payment provider. Signature
/// verification happens upstream of this service. The acknowledgement body is
/// fixed; business errors surface only through the HTTP status.
#[derive(Deserialize)]
struct SettlementWebhook {
    checkout_id: Option<String>,
    status: Option<String>,
}

async fn settlement_webhook(
    data: web::Data<AppState>,
    body: web::Json<SettlementWebhook>,
) -> impl Responder {
    let (checkout_id, status) = match (&body.checkout_id, &body.status) {
        (Some(c), Some(s)) if !c.is_empty() => (c, s),
        _ => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid webhook data"
            }));
        }
    };

    let status = match SettlementStatus::parse(status) {
        Some(s) => s,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid webhook data"
            }));
        }
    };

    match data.payments.handle_settlement(checkout_id, status) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "webhook processed"
        })),
        Err(PaymentError::NotFound) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Payment not found"
        })),
        Err(e) => {
            log::error!("Failed to process settlement webhook: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}

/// Lookup by tool call id or checkout reference.
async fn get_payment(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let identifier = path.into_inner();
    match data.payments.find_payment(&identifier) {
        Ok(Some(payment)) => HttpResponse::Ok().json(PaymentResponse::from(payment)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Payment not found"
        })),
        Err(e) => {
            log::error!("Failed to look up payment {}: {}", identifier, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Server error"
            }))
        }
    }
}
