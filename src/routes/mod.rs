use axum::Router;

use crate::app::AppState;

mod heatmap;
mod market;
mod probability;
mod root;
mod timing;

pub fn build_routes() -> Router<AppState> {
    Router::new()
        // 根路径与健康检查
        .merge(root::router())
        // 业务 API 统一挂在 /api 前缀下
        .nest(
            "/api",
            heatmap::router()
                .merge(probability::router())
                .merge(timing::router())
                .merge(market::router()),
        )
}
