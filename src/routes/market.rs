use axum::{routing::get, Router};

use crate::app::AppState;
use crate::handler::market::{latest_date, options, stock_revenue};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/meta/latest-date", get(latest_date))
        .route("/options", get(options))
        .route("/stocks/:stock_id/revenue", get(stock_revenue))
}
