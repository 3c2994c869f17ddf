use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    NotFound,
    BadRequest(String),
    /// 拿不到连接池中的连接
    DatabaseUnavailable,
    /// SQL 执行失败
    QueryFailed,
}

impl AppError {
    pub fn db_unavailable(e: impl Display) -> Self {
        tracing::error!("Failed to get DB connection: {}", e);
        AppError::DatabaseUnavailable
    }

    pub fn query_failed(context: &str, e: impl Display) -> Self {
        tracing::error!("{} failed: {}", context, e);
        AppError::QueryFailed
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response(),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "bad request", "message": msg})),
            )
                .into_response(),
            AppError::DatabaseUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "database unavailable", "message": "資料庫連線失敗，請稍後再試"})),
            )
                .into_response(),
            AppError::QueryFailed => (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "query failed", "message": "資料查詢失敗"})),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_error_maps_to_its_status() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BadRequest("year".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::db_unavailable("timed out").into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::query_failed("Heatmap query", "syntax error").into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
