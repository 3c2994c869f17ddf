use axum::{routing::post, Router};

use crate::app::AppState;
use crate::handler::timing::{query_outliers, query_timing, timing_prompt};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/timing", post(query_timing))
        .route("/timing/outliers", post(query_outliers))
        .route("/timing/prompt", post(timing_prompt))
}
