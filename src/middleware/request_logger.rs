use std::rc::Rc;
use std::time::Instant;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::Error;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::debug;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Tags every request with an `X-Request-ID` and echoes it on the response.
///
/// A usable id sent by the client is kept, otherwise a fresh UUID is set on
/// the request before inner services see it. Debug-level request/response
/// tracing is added when `enabled`.
pub struct RequestLogger {
    enabled: bool,
}

impl RequestLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
            enabled: self.enabled,
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
    enabled: bool,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let enabled = self.enabled;
        let header_name = HeaderName::from_static("x-request-id");

        let existing = req
            .headers()
            .get(&header_name)
            .filter(|value| !value.is_empty() && value.to_str().is_ok())
            .cloned();
        let request_id = match existing {
            Some(value) => value,
            None => {
                let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                    .unwrap_or_else(|_| HeaderValue::from_static("-"));
                req.headers_mut().insert(header_name.clone(), generated.clone());
                generated
            }
        };

        let path = req.path().to_owned();
        let method = req.method().clone();
        let started = Instant::now();
        let id = request_id.to_str().unwrap_or("-").to_owned();

        if enabled {
            debug!("[{}] Processing request: {} {}", id, method, path);
        }

        Box::pin(async move {
            let mut res = service.call(req).await?;
            res.headers_mut().insert(header_name, request_id);

            if enabled {
                debug!(
                    "[{}] Response: {} {} - status: {} in {}ms",
                    id,
                    method,
                    path,
                    res.status(),
                    started.elapsed().as_millis()
                );
            }
            Ok(res)
        })
    }
}
