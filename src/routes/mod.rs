use actix_web::{web, HttpResponse, Responder};

use crate::services::ShortenerService;
use crate::types::{AppState, HealthStatus, ResponsePayload};

mod shortcode;

pub(crate) const API_SEGMENT: &str = "api";
pub(crate) const HEALTH_SEGMENT: &str = "health";

/// First path segments owned by fixed routes, so never reachable as shortcodes
pub const RESERVED_SEGMENTS: &[&str] = &[API_SEGMENT, HEALTH_SEGMENT];

// Handler function for the root route "/"
async fn index() -> impl Responder {
    let welcome_message = ResponsePayload {
        status: 200,
        message: String::from("Welcome! POST your URLs to /api/shorten/batch"),
    };

    // Return the struct as JSON
    HttpResponse::Ok().json(welcome_message)
}

// Handler function for the health check endpoint
async fn health_check(
    data: web::Data<AppState>,
    service: web::Data<ShortenerService>,
) -> impl Responder {
    let status = HealthStatus {
        status: String::from("OK"),
        version: data.version.clone(),
        registered_shortcodes: service.registered_count(),
        uptime_seconds: data.start_time.elapsed().as_secs(),
    };

    HttpResponse::Ok().json(status)
}

// Configure all routes function
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index));
    cfg.route(&format!("/{}", HEALTH_SEGMENT), web::get().to(health_check));
    shortcode::configure_routes(cfg);
    shortcode::configure_redirect(cfg);
}
