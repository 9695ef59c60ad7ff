use std::{sync::Arc, time::Instant};

use actix_cors::Cors;
use actix_web::{
    http::header,
    middleware::Logger,
    web, App, HttpServer,
};
use env_logger::Env;
use log::{debug, info, warn};

use crate::{
    clients::{LogEvent, LogSink, NoopLogSink, RemoteLogSink},
    config::{Config, Environment, LogSinkConfig},
    errors::AppError,
    middleware::RequestLogger,
    routes,
    services::{self, ShortenerService},
    types::AppState,
};

// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

// Setup logging with custom format and configuration
fn setup_logging(config: &Config) -> AppResult<()> {
    // Configure log level based on environment and config
    let log_level = match config.app.environment {
        Environment::Development => config.app.log_level.clone(),
        Environment::Testing => "debug,actix_web=info".to_string(),
        Environment::Production => "info,actix_web=warn".to_string(),
    };

    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "always");

    env_logger::try_init_from_env(env)
        .map_err(|e| AppError::Logger(format!("Failed to initialize logger: {}", e)))
}

/// Builds the collector sink, or a no-op one when shipping is disabled
pub fn build_log_sink(config: &LogSinkConfig) -> AppResult<Arc<dyn LogSink>> {
    if !config.enabled {
        debug!("Remote log sink disabled");
        return Ok(Arc::new(NoopLogSink));
    }

    let sink = RemoteLogSink::new(config.endpoint.clone(), config.stack, config.timeout)?;
    info!("Shipping {} logs to {}", config.stack, sink.endpoint());
    Ok(Arc::new(sink))
}

fn build_cors(allowed_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(allowed_origin)
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

pub async fn server() -> AppResult<()> {
    // Load .env before reading the environment, report it once logging is up
    let dotenv_result = dotenvy::dotenv();

    // Load application configuration
    let config = Config::load()?;

    // Setup enhanced logging based on configuration
    setup_logging(&config)?;

    match dotenv_result {
        Ok(path) => debug!(".env file loaded from {}", path.display()),
        Err(e) => warn!("Could not load .env file: {}", e),
    }
    info!("Configuration loaded successfully");

    // Capture start time for uptime calculation
    let start_time = Instant::now();

    // Log startup information
    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {:?}", config.app.environment);
    info!(
        "Binding to {}:{} with {} workers",
        config.server.host, config.server.port, config.server.workers
    );

    if config.app.environment == Environment::Development {
        debug!("Debug logging enabled");
        debug!("Full configuration: {:?}", config);
    }

    let log_sink = build_log_sink(&config.log_sink)?;

    // One registry shared by every worker
    let service = web::Data::new(ShortenerService::from_config(
        &config.shortener,
        log_sink.clone(),
    ));

    // Determine if we should enable more verbose logging
    let enable_debug_logging = config.app.environment != Environment::Production;

    // Create a cloned config for the closure
    let app_config = config.clone();

    // Determine log format based on environment
    let log_format = if enable_debug_logging {
        // Detailed format for development/testing
        "%a \"%r\" %s %b %T \"%{Referer}i\" \"%{User-Agent}i\" %{X-Request-ID}i"
    } else {
        // Simple format for production
        "%a \"%r\" %s %b %T"
    };

    // Start the HTTP server
    let server = HttpServer::new(move || {
        let service = service.clone();

        App::new()
            .app_data(web::Data::new(AppState {
                start_time,
                version: app_config.app.version.clone(),
            }))
            .configure(move |cfg| services::register(service, cfg))
            .wrap(build_cors(&app_config.server.cors_allowed_origin))
            .wrap(Logger::new(log_format))
            // Outermost, so the access log already sees the request id
            .wrap(RequestLogger::new(enable_debug_logging))
            .configure(routes::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.to_string(), config.server.port))?
    .run();

    log_sink.send(LogEvent::info("app", "Server started"));
    server.await?;

    Ok(())
}
