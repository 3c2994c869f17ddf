use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// 未设置 ALLOWED_ORIGINS 时放行本机前端开发服务器
const DEV_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid origin in ALLOWED_ORIGINS: {}", o);
                None
            }
        })
        .collect()
}

/// 接口只读，只需放行 GET 与 POST
pub fn cors_layer() -> CorsLayer {
    let mut origins = parse_origins(&std::env::var("ALLOWED_ORIGINS").unwrap_or_default());
    if origins.is_empty() {
        origins = DEV_ORIGINS.into_iter().map(HeaderValue::from_static).collect();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
