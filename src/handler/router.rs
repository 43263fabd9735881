//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route
//! matching, dispatch and access logging.

use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_LENGTH, IF_NONE_MATCH, REFERER, SERVER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::{asset, landing, page};
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// What a request path points at
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Landing,
    Page(String),
    Asset { id: String, asset: String },
    Unknown,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // Only GET and HEAD are served, the body is never read
    let (req, _) = req.into_parts();
    let http_config = &state.config.http;

    let mut response = if let Some(resp) = check_http_method(&req.method, http_config.enable_cors) {
        resp
    } else if let Some(resp) = check_body_size(&req, http_config.max_body_size) {
        resp
    } else {
        logger::log_headers_count(req.headers.len(), state.config.logging.show_headers);

        let ctx = RequestContext {
            path: req.uri.path(),
            is_head: req.method == Method::HEAD,
            if_none_match: header_string(&req, IF_NONE_MATCH),
        };
        route_request(&ctx, &state).await
    };

    if let Ok(server) = HeaderValue::from_str(&http_config.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if state.config.logging.access_log {
        log_access(&req, &response, peer_addr, started, &state);
    }

    Ok(response)
}

fn header_string(req: &Parts, name: hyper::header::HeaderName) -> Option<String> {
    req.headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(req: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size_str = req.headers.get(CONTENT_LENGTH)?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
    }
}

/// Route request based on path and configuration
pub async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    // Health endpoints never touch the store
    let health = &state.config.routes.health;
    if health.enabled && (ctx.path == health.liveness_path || ctx.path == health.readiness_path) {
        return http::build_health_response("ok");
    }

    match parse_route(ctx.path, &state.config.routes.assets_prefix) {
        Route::Landing => landing::serve_landing(ctx),
        Route::Page(id) => page::serve_page(ctx, state, &id).await,
        Route::Asset { id, asset } => asset::serve_asset(ctx, state, &id, &asset).await,
        Route::Unknown => http::build_404_response("404 Not Found"),
    }
}

/// Map a request path to a route
///
/// The asset path after the identifier may span several segments. Page
/// identifiers are a single segment; anything deeper is unknown.
fn parse_route(path: &str, assets_prefix: &str) -> Route {
    let assets_prefix = assets_prefix.trim_end_matches('/');

    if let Some(rest) = path.strip_prefix(assets_prefix) {
        if rest.is_empty() || rest.starts_with('/') {
            let rest = rest.strip_prefix('/').unwrap_or(rest);
            let (id, asset) = rest.split_once('/').unwrap_or((rest, ""));
            return match (decode(id), decode(asset)) {
                (Some(id), Some(asset)) if !id.contains('/') => Route::Asset { id, asset },
                _ => Route::Unknown,
            };
        }
    }

    let id = path.trim_matches('/');
    if id.is_empty() {
        return Route::Landing;
    }
    if id.contains('/') {
        return Route::Unknown;
    }
    match decode(id) {
        Some(id) if !id.contains('/') => Route::Page(id),
        _ => Route::Unknown,
    }
}

/// Percent-decode one path piece; `None` when the result is not UTF-8
fn decode(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

fn log_access(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = version_label(req.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_string(req, REFERER);
    entry.user_agent = header_string(req, USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
