use actix_web::{http::header::LOCATION, web, HttpResponse, Responder};
use chrono::Utc;
use log::{debug, info};
use serde_json::json;
use url::Url;

use crate::{
    models::{BatchRequest, ShortenRequest, ShortenResponse, UrlEntry},
    services::ShortenerService,
    types::Result,
};

/// Shorten a single URL, the contract used by the remote client
pub async fn shorten_handler(
    request: web::Json<ShortenRequest>,
    service: web::Data<ShortenerService>,
) -> Result<impl Responder> {
    let entry = UrlEntry::from(request.into_inner());
    let shortened = service.shorten(&entry, Utc::now())?;

    Ok(HttpResponse::Created().json(ShortenResponse {
        short_url: shortened.short_url,
        expiry: shortened.expires_at,
    }))
}

/// Shorten a whole form submission
pub async fn batch_handler(
    request: web::Json<BatchRequest>,
    service: web::Data<ShortenerService>,
) -> Result<impl Responder> {
    let entries = request.into_inner().entries;
    let outcomes = service.submit(&entries, Utc::now())?;
    let registered = outcomes.iter().filter(|o| o.is_registered()).count();

    Ok(HttpResponse::Ok().json(json!({
        "data": outcomes,
        "message": format!("Shortened {} of {} URLs", registered, entries.len()),
    })))
}

/// Get the record behind a shortcode
pub async fn get_record_handler(
    path: web::Path<String>,
    service: web::Data<ShortenerService>,
) -> Result<impl Responder> {
    let record = service.lookup(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "data": record,
        "message": "Successfully retrieved shortcode",
    })))
}

/// Redirect route handler
pub async fn redirect_handler(
    path: web::Path<String>,
    service: web::Data<ShortenerService>,
) -> Result<impl Responder> {
    let shortcode = path.into_inner();
    debug!("Redirect requested for code: {}", shortcode);

    let original_url = service.resolve(&shortcode, Utc::now())?;
    // Serialized form is pure ASCII, so it always fits in a header
    let location = Url::parse(&original_url)
        .map(String::from)
        .unwrap_or(original_url);

    info!("Redirecting '{}' to '{}'", shortcode, location);
    Ok(HttpResponse::TemporaryRedirect()
        .insert_header((LOCATION, location))
        .finish())
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Instant};

    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};

    use crate::{
        clients::NoopLogSink, config::ShortenerConfig, routes, services::ShortenerService,
        types::AppState,
    };

    macro_rules! test_app {
        () => {{
            let service =
                ShortenerService::from_config(&ShortenerConfig::default(), Arc::new(NoopLogSink));
            let state = AppState {
                start_time: Instant::now(),
                version: "test".to_string(),
            };
            test::init_service(
                App::new()
                    .app_data(web::Data::new(service))
                    .app_data(web::Data::new(state))
                    .configure(routes::configure_routes),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn test_shorten_returns_short_url_and_expiry() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/shorten")
            .set_json(json!({ "url": "https://example.com", "validity": 10, "shortcode": "docs" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["shortUrl"], "http://localhost:5000/docs");
        assert!(body["expiry"].is_string());
    }

    #[actix_web::test]
    async fn test_shorten_rejects_invalid_and_duplicate() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/shorten")
            .set_json(json!({ "url": "not-a-url" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "url: Invalid URL format");
        assert_eq!(body["status_code"], 400);

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let req = test::TestRequest::post()
                .uri("/api/shorten")
                .set_json(json!({ "url": "https://example.com", "shortcode": "twice" }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), expected);
        }
    }

    #[actix_web::test]
    async fn test_batch_reports_each_entry() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/shorten/batch")
            .set_json(json!({
                "entries": [
                    { "url": "https://example.com", "validity": "", "shortcode": "" },
                    { "url": "not-a-url", "validity": "10", "shortcode": "abc" },
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let data = body["data"].as_array().unwrap();
        assert_eq!(data[0]["status"], "registered");
        assert_eq!(data[0]["shortcode"].as_str().unwrap().len(), 6);
        assert_eq!(data[1]["status"], "rejected");
        assert_eq!(data[1]["errors"], json!({ "url": "Invalid URL format" }));
        assert_eq!(body["message"], "Shortened 1 of 2 URLs");
    }

    #[actix_web::test]
    async fn test_batch_rejects_oversized_submission() {
        let app = test_app!();
        let entries: Vec<Value> = (0..6)
            .map(|i| json!({ "url": format!("https://{}.example", i) }))
            .collect();

        let req = test::TestRequest::post()
            .uri("/api/shorten/batch")
            .set_json(json!({ "entries": entries }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_redirect_and_record_lookup() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/shorten")
            .set_json(json!({ "url": "https://example.com/page", "shortcode": "page1" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/page1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            resp.headers().get("location").unwrap(),
            "https://example.com/page"
        );

        let req = test::TestRequest::get().uri("/api/shortcodes/page1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["original_url"], "https://example.com/page");
        assert_eq!(body["data"]["clicks"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/missing").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_health_reports_registered_count() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/shorten")
            .set_json(json!({ "url": "https://example.com" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["registered_shortcodes"], 1);
    }

    #[actix_web::test]
    async fn test_route_segments_cannot_be_claimed() {
        let app = test_app!();

        for code in ["health", "api"] {
            let req = test::TestRequest::post()
                .uri("/api/shorten")
                .set_json(json!({ "url": "https://example.com", "shortcode": code }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(
                body["message"],
                format!("shortcode: Shortcode '{}' is reserved", code)
            );
        }

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["registered_shortcodes"], 0);
    }

    #[actix_web::test]
    async fn test_accepted_urls_always_redirect() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/shorten")
            .set_json(json!({ "url": "https://example.com/a\nb", "shortcode": "nl123" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/shorten")
            .set_json(json!({ "url": "https://example.com/a%0Ab?q=ü", "shortcode": "enc123" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/nl123").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/enc123").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            resp.headers().get("location").unwrap(),
            "https://example.com/a%0Ab?q=%C3%BC"
        );
    }

    #[actix_web::test]
    async fn test_malformed_bodies_get_json_errors() {
        let app = test_app!();

        let cases = [
            ("/api/shorten", json!({ "url": "https://example.com", "validity": -5 })),
            ("/api/shorten", json!({ "url": "https://example.com", "validity": "10" })),
            ("/api/shorten/batch", json!({ "entries": [{ "validity": "10" }] })),
        ];

        for (uri, payload) in cases {
            let req = test::TestRequest::post().uri(uri).set_json(payload).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["status_code"], 400);
            assert!(body["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request body"));
        }
    }
}
