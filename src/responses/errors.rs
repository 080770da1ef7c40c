// responses/errors.rs
use crate::errors::ServerError;
use crate::responses::json::json_error_response;
use crate::templates::components::error::error_page;
use astra::{Body, Response, ResponseBuilder};
use tracing::{error, warn};

pub type ResultResp = Result<Response, ServerError>;

/// Render `err` as JSON for API paths and as an HTML page otherwise.
pub fn error_to_response(path: &str, err: ServerError) -> Response {
    match err.status() {
        500.. => error!(path, error = %err, "request failed"),
        _ => warn!(path, error = %err, "request rejected"),
    }

    if path.starts_with("/api/") {
        json_error_response(&err)
    } else {
        html_error_response(&err)
    }
}

pub fn html_error_response(err: &ServerError) -> Response {
    let status = err.status();
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(error_page(status, &err.public_message()).into_string()))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
