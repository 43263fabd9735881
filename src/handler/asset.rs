//! Asset handler: `/api/assets/{id}/{asset}`

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::router::RequestContext;
use crate::bundle::AssetError;
use crate::config::AppState;
use crate::http;
use crate::http::cache::check_etag_match;
use crate::logger;
use crate::store::error_chain;

pub async fn serve_asset(
    ctx: &RequestContext<'_>,
    state: &AppState,
    id: &str,
    asset: &str,
) -> Response<Full<Bytes>> {
    match state.relay.relay(id, asset).await {
        Ok(relayed) => {
            logger::log_debug(&format!(
                "[Asset] {} ({} bytes, {})",
                relayed.key,
                relayed.body.len(),
                relayed.content_type
            ));
            if let Some(etag) = relayed.etag.as_deref() {
                if check_etag_match(ctx.if_none_match.as_deref(), etag) {
                    return http::build_304_response(etag, relayed.cache);
                }
            }
            http::build_asset_response(
                relayed.body,
                &relayed.content_type,
                relayed.etag.as_deref(),
                relayed.cache,
                ctx.is_head,
            )
        }
        Err(AssetError::MissingParameter) => {
            http::build_400_response("Missing id or asset parameter")
        }
        Err(err) => {
            logger::log_asset_failure(id, asset, &error_chain(&err));
            http::build_404_response("Asset not found")
        }
    }
}
