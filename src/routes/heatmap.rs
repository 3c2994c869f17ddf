use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;
use crate::handler::heatmap::{heatmap_prompt, heatmap_svg, query_heatmap, query_leaders, query_summary};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/heatmap", post(query_heatmap))
        .route("/heatmap.svg", get(heatmap_svg))
        .route("/heatmap/summary", post(query_summary))
        .route("/heatmap/leaders", post(query_leaders))
        .route("/heatmap/prompt", post(heatmap_prompt))
}
