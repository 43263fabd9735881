//! Landing page served at `/`
//!
//! Visitors reaching the bare root forgot the short identifier; the page
//! says so. It is always a 200.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::router::RequestContext;
use crate::http;

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Invalid address</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            min-height: 100vh;
            display: flex;
            flex-direction: column;
            align-items: center;
            justify-content: center;
            background: linear-gradient(180deg, #f9fafb 0%, #f3f4f6 100%);
            color: #1f2937;
            padding: 0 16px;
            text-align: center;
        }
        h1 {
            font-size: 8rem;
            font-weight: 800;
            color: #374151;
        }
        h2 {
            font-size: 1.875rem;
            font-weight: 600;
            margin: 16px 0 8px;
        }
        p {
            font-size: 1.25rem;
            color: #4b5563;
        }
    </style>
</head>
<body>
    <h1>Err</h1>
    <h2>This address is not valid.</h2>
    <p>The short identifier is missing after the URL.</p>
</body>
</html>
"#;

pub fn serve_landing(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    http::build_html_response(LANDING_PAGE.to_string(), ctx.is_head)
}
