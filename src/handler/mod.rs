pub mod error;
pub mod heatmap;
pub mod market;
pub mod probability;
pub mod timing;

use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Taipei;

use crate::app::AppState;
use crate::handler::error::AppError;
use crate::models::research::ResearchWindow;
use crate::repositories::revenue_heatmap::PgPoolConn;

/// 从连接池取连接，失败时返回 503
pub(crate) fn connection(state: &AppState) -> Result<PgPoolConn, AppError> {
    state.db_pool.get().map_err(AppError::db_unavailable)
}

pub(crate) fn research_window(year: i32) -> Result<ResearchWindow, AppError> {
    ResearchWindow::checked(year).map_err(AppError::BadRequest)
}

/// 空白关键字视为未筛选
pub(crate) fn normalize_keyword(keyword: Option<&str>) -> Option<String> {
    keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

/// 台北时区的今天
pub(crate) fn today_taipei() -> NaiveDate {
    Utc::now().with_timezone(&Taipei).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keyword_means_no_filter() {
        assert_eq!(normalize_keyword(None), None);
        assert_eq!(normalize_keyword(Some("   ")), None);
        assert_eq!(normalize_keyword(Some(" AI ")), Some("AI".to_string()));
    }

    #[test]
    fn unsupported_year_is_bad_request() {
        assert!(matches!(research_window(1999), Err(AppError::BadRequest(_))));
        assert!(research_window(2024).is_ok());
    }
}
