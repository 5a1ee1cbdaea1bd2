//! HTTP request/response logging middleware.
//!
//! One event per request, emitted when the response body completes so the
//! streamed size and payload are known.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use opscope_core::{CallContext, Field, Logger, ResponseCapture};
use serde_json::{Map, Value as JsonValue};

use super::body::{CaptureBody, Completion};
use super::error::{BodyReadError, RecordedError};
use super::HttpLogging;

/// Scene tag of HTTP server events.
pub const SCENE: &str = "http_server_request";

const EXCHANGE_MESSAGE: &str = "http request and response";
const READ_ERROR_MESSAGE: &str = "http request read error";

/// Headers that should be redacted
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

const REDACTED: &str = "[REDACTED]";

/// Logging middleware for requests and responses.
///
/// Install with `axum::middleware::from_fn_with_state` or
/// [`HttpLogging::apply`].
pub async fn http_logging_middleware(
    State(logging): State<HttpLogging>,
    mut request: Request,
    next: Next,
) -> Response {
    if logging.config().should_skip(&request) {
        return next.run(request).await;
    }

    let started = Instant::now();
    let ctx = match request.extensions().get::<CallContext>() {
        Some(ctx) => ctx.clone(),
        None => {
            let ctx = CallContext::new();
            request.extensions_mut().insert(ctx.clone());
            ctx
        }
    };

    let head = request.method() == Method::HEAD;
    let mut fields = request_fields(&request);

    if logging.config().enable_request_body {
        let (parts, body) = request.into_parts();
        match body.collect().await {
            Ok(collected) => {
                let bytes = collected.to_bytes();
                fields.push(Field::raw("request_body", bytes.to_vec()));
                request = Request::from_parts(parts, Body::from(bytes));
            }
            Err(err) => {
                let err = BodyReadError::from(err);
                logging.logger().error(
                    Some(&ctx),
                    READ_ERROR_MESSAGE,
                    vec![Field::any("scene", SCENE), Field::err(&err)],
                );
                return next.run(Request::from_parts(parts, Body::empty())).await;
            }
        }
    }

    let response = next.run(request).await;

    let exchange = Exchange {
        ctx,
        fields,
        recorded: RecordedError::from_response(&response).cloned(),
        status: response.status(),
        head,
        started,
    };
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let capture = ResponseCapture::for_response(content_type, logging.config().enable_response_body);
    let logger = logging.logger().clone();

    let (parts, body) = response.into_parts();
    let body = CaptureBody::new(body, capture, move |capture, completion| {
        exchange.finish(logger.as_ref(), capture, completion)
    });
    Response::from_parts(parts, Body::new(body))
}

/// Request-side state carried until the response body completes.
struct Exchange {
    ctx: CallContext,
    fields: Vec<Field>,
    recorded: Option<RecordedError>,
    status: StatusCode,
    /// HEAD responses never have their body polled.
    head: bool,
    started: Instant,
}

impl Exchange {
    fn finish(self, logger: &dyn Logger, capture: ResponseCapture, completion: Completion) {
        let Exchange {
            ctx,
            mut fields,
            recorded,
            status,
            head,
            started,
        } = self;

        if let Some(err) = &recorded {
            fields.push(Field::err(err));
        }
        fields.push(Field::any("status_code", status.as_u16()));
        fields.push(Field::any("response_size", capture.size()));
        fields.push(Field::any(
            "latency_in_milliseconds",
            started.elapsed().as_millis() as u64,
        ));
        if capture.is_enabled() {
            fields.push(Field::raw("response_body", capture.into_bytes()));
        }

        let stream_failed = match completion {
            Completion::Finished => false,
            Completion::Aborted if head => false,
            Completion::Failed(reason) => {
                fields.push(Field::any("stream_error", reason));
                true
            }
            Completion::Aborted => {
                fields.push(Field::any("aborted", true));
                false
            }
        };

        if recorded.is_some() || stream_failed {
            logger.error(Some(&ctx), EXCHANGE_MESSAGE, fields);
        } else {
            logger.info(Some(&ctx), EXCHANGE_MESSAGE, fields);
        }
    }
}

fn request_fields(request: &Request) -> Vec<Field> {
    let uri = request.uri();
    vec![
        Field::any("scene", SCENE),
        Field::any("method", request.method().as_str()),
        Field::any("path", uri.path()),
        Field::any("full_uri", uri.to_string()),
        Field::any("client_ip", client_ip(request)),
        Field::any("headers", redact_headers(request.headers())),
    ]
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// peer address when the server was started with connect info.
pub fn client_ip(request: &Request) -> String {
    let headers = request.headers();
    let forwarded = header_str(headers, "x-forwarded-for").and_then(|v| v.split(',').next());
    let real = header_str(headers, "x-real-ip");

    if let Some(ip) = forwarded.into_iter().chain(real).map(str::trim).find(|ip| !ip.is_empty()) {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Header name to value list, sensitive values replaced.
fn redact_headers(headers: &HeaderMap) -> JsonValue {
    let mut map = Map::new();
    for name in headers.keys() {
        let sensitive = SENSITIVE_HEADERS.contains(&name.as_str());
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| {
                if sensitive {
                    JsonValue::from(REDACTED)
                } else {
                    JsonValue::from(String::from_utf8_lossy(value.as_bytes()).into_owned())
                }
            })
            .collect();
        map.insert(name.as_str().to_string(), JsonValue::Array(values));
    }
    JsonValue::Object(map)
}
