use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::modules::notifications::NotificationController;

/// Health check response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// Gateways whose notification routes are live
    pub gateways: Vec<String>,
}

/// GET /health - Liveness probe
/// Returns 200 while the receiver can answer; gateways are not contacted
pub async fn health_check(controller: web::Data<NotificationController>) -> impl Responder {
    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        gateways: controller
            .gateways()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    HttpResponse::Ok().json(response)
}

/// Configure health check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
