use std::io::Cursor;
use tiny_http::Response;
use tracing::warn;

use crate::routes::{not_found, png_response};
use crate::state::AppContext;

/// GET /loss_curve.png
pub fn handle_loss_curve(ctx: &AppContext) -> Response<Cursor<Vec<u8>>> {
    match std::fs::read(&ctx.loss_curve_path) {
        Ok(bytes) => png_response(bytes),
        Err(e) => {
            warn!(path = %ctx.loss_curve_path.display(), error = %e, "loss curve image unavailable");
            not_found()
        }
    }
}
