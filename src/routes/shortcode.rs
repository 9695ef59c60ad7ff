use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::errors::AppError;
use crate::handlers::{batch_handler, get_record_handler, redirect_handler, shorten_handler};

// Malformed bodies get the same JSON error shape as every other failure
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        AppError::Validation(format!("Invalid request body ({})", err)).into()
    })
}

// Configure the shortening API
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(&format!("/{}", super::API_SEGMENT))
            .app_data(json_config())
            .route("/shorten", web::post().to(shorten_handler))
            .route("/shorten/batch", web::post().to(batch_handler))
            .route("/shortcodes/{code}", web::get().to(get_record_handler)),
    );
}

// Must be registered after every other route, it matches any single segment
pub fn configure_redirect(cfg: &mut web::ServiceConfig) {
    cfg.route("/{code}", web::get().to(redirect_handler));
}
