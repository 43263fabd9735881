//! Page handler: `/{id}`
//!
//! Wraps the rewritten entry document in a full-viewport frame. Every
//! failure becomes the same 404.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::router::RequestContext;
use crate::bundle::{PageError, RewrittenDocument};
use crate::config::AppState;
use crate::http;
use crate::logger;
use crate::store::error_chain;

pub async fn serve_page(
    ctx: &RequestContext<'_>,
    state: &AppState,
    id: &str,
) -> Response<Full<Bytes>> {
    match state.resolver.resolve(id).await {
        Ok(document) => http::build_html_response(render_frame(&document), ctx.is_head),
        Err(err) => {
            match &err {
                PageError::InvalidIdentifier(_) | PageError::BundleNotFound(_) => {
                    logger::log_page_miss(id, &err.to_string());
                }
                PageError::Store(_) => logger::log_page_failure(id, &error_chain(&err)),
            }
            http::build_404_response("404 Not Found")
        }
    }
}

/// Host page embedding `document` through `srcdoc`
///
/// The frame document inherits this page's URL as its base, so the injected
/// absolute-path `<base>` resolves against the shim's own origin.
pub fn render_frame(document: &RewrittenDocument) -> String {
    let id_text = html_escape::encode_text(&document.id);
    let id_attr = html_escape::encode_double_quoted_attribute(&document.id);
    let srcdoc = html_escape::encode_double_quoted_attribute(&document.html);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{id_text}</title>
    <style>html, body {{ margin: 0; padding: 0; height: 100%; }}</style>
</head>
<body>
    <div style="width: 100%; height: 100vh; margin: 0; padding: 0;">
        <iframe srcdoc="{srcdoc}" style="width: 100%; height: 100%; border: none; margin: 0; padding: 0;" title="Content for {id_attr}"></iframe>
    </div>
</body>
</html>
"#
    )
}
