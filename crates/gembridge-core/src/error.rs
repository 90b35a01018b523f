use axum::body::Body;
use axum::response::Response;
use gembridge_common::GatewayError;
use http::HeaderValue;
use http::header::CONTENT_TYPE;

/// Render a gateway error as a plain-text response carrying the error's status.
pub fn error_response(err: &GatewayError) -> Response {
    let mut resp = Response::new(Body::from(err.to_string()));
    *resp.status_mut() = err.status();
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}
