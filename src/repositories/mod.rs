use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::Text;

use crate::models::research::ResearchWindow;

pub mod announcement_timing;
pub mod burst_probability;
pub mod market_data;
pub mod revenue_heatmap;

/// 绑定年度与观察期的四个参数 $1..$4
pub fn bind_window<'f>(sql: String, window: &ResearchWindow) -> BoxedSqlQuery<'f, Pg, SqlQuery> {
    diesel::sql_query(sql)
        .into_boxed()
        .bind::<Text, _>(window.year.to_string())
        .bind::<Text, _>(window.previous_december())
        .bind::<Text, _>(window.year_pattern())
        .bind::<Text, _>(window.current_december())
}

/// `%keyword%`，关键字中的通配符按字面匹配
pub fn like_contains(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_contains("CoWoS"), "%CoWoS%");
        assert_eq!(like_contains("50%_x"), "%50\\%\\_x%");
    }
}
