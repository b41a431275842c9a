use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{info, warn};

use crate::handlers;
use crate::state::AppContext;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn with_content_type(status: u16, content_type: &str, body: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = body.len();
    Response::new(
        StatusCode(status),
        Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
            .ok()
            .into_iter()
            .collect(),
        Cursor::new(body),
        Some(len),
        None,
    )
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    with_content_type(200, "text/html; charset=utf-8", body.into_bytes())
}

pub fn png_response(bytes: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    with_content_type(200, "image/png", bytes)
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    with_content_type(404, "text/plain", b"404 Not Found".to_vec())
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes one request and sends the response. Runs on the accept thread, so
/// requests are served strictly one after another.
pub fn dispatch(mut request: Request, ctx: &AppContext) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("").to_owned();

    let response = match (&method, path.as_str()) {
        (Method::Get, "/") => handlers::predict::handle_get(ctx),
        (Method::Post, "/predict") => handlers::predict::handle_post(&mut request, ctx),
        (Method::Get, "/loss_curve.png") => handlers::assets::handle_loss_curve(ctx),
        _ => not_found(),
    };

    info!(method = %method, path = %path, status = response.status_code().0, "request served");
    if let Err(e) = request.respond(response) {
        warn!(path = %path, error = %e, "failed to send response");
    }
}
