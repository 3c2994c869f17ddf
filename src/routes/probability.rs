use axum::{routing::post, Router};

use crate::app::AppState;
use crate::handler::probability::{probability_prompt, query_detail, query_multi_year, query_probability};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/probability", post(query_probability))
        .route("/probability/detail", post(query_detail))
        .route("/probability/multi-year", post(query_multi_year))
        .route("/probability/prompt", post(probability_prompt))
}
