use actix_web::web;

mod shortcode_registry;
mod shortener;

pub use shortcode_registry::{
    RandomShortcodeGenerator, RegistrySettings, ShortcodeGenerator, ShortcodeRegistry,
    DEFAULT_CODE_LENGTH, DEFAULT_MAX_GENERATION_ATTEMPTS,
};
pub use shortener::ShortenerService;

/// Service Register
///
/// The service is built once and handed in already wrapped, so that every
/// worker shares the same registry.
pub fn register(service: web::Data<ShortenerService>, cfg: &mut web::ServiceConfig) {
    cfg.app_data(service);
}
