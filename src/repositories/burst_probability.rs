use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::{Array, BigInt, Double, Integer, Nullable, Text};

use crate::models::research::{Metric, PriceBasis, ResearchWindow};
use crate::repositories::bind_window;
use crate::services::bucketing::sql_annual_return;
use crate::services::probability::{DOUBLE_THRESHOLD, WIN_THRESHOLD};

pub type PgPoolConn = PooledConnection<ConnectionManager<PgConnection>>;

/// 明细名单最多返回的股票数
pub const DETAIL_LIMIT: i64 = 100;
/// 多年度对照最多取的股票数
pub const MULTI_YEAR_STOCK_LIMIT: i64 = 100;

/// 爆发次数分组统计
#[derive(Debug, QueryableByName)]
pub struct BurstGroupResult {
    #[diesel(sql_type = BigInt)]
    pub hits: i64,
    #[diesel(sql_type = BigInt)]
    pub stock_count: i64,
    #[diesel(sql_type = Double)]
    pub avg_return: f64,
    #[diesel(sql_type = Double)]
    pub median_return: f64,
    #[diesel(sql_type = Double)]
    pub win_rate: f64,
    #[diesel(sql_type = Double)]
    pub double_rate: f64,
    #[diesel(sql_type = Double)]
    pub min_return: f64,
    #[diesel(sql_type = Double)]
    pub max_return: f64,
    #[diesel(sql_type = Double)]
    pub std_dev: f64,
}

#[derive(Debug, QueryableByName)]
pub struct BurstRawResult {
    #[diesel(sql_type = BigInt)]
    pub hits: i64,
    #[diesel(sql_type = Double)]
    pub ret: f64,
}

/// 某个爆发次数下的个股
#[derive(Debug, QueryableByName)]
pub struct BurstDetailResult {
    #[diesel(sql_type = Text)]
    pub stock_id: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub stock_name: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub hits: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub annual_return: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_growth: Option<f64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub remarks: Option<String>,
}

#[derive(Debug, QueryableByName)]
pub struct BurstStockResult {
    #[diesel(sql_type = Text)]
    pub stock_id: String,
    #[diesel(sql_type = BigInt)]
    pub hits: i64,
}

#[derive(Debug, QueryableByName)]
pub struct YearReturnResult {
    #[diesel(sql_type = Text)]
    pub stock_id: String,
    #[diesel(sql_type = Integer)]
    pub year: i32,
    #[diesel(sql_type = Double)]
    pub annual_return: f64,
}

/// 观察期内指标落在 [$5, $6) 的次数；占用 $1..$6
fn hit_table_cte(metric: Metric, window: &ResearchWindow) -> String {
    let metric_col = metric.column();
    format!(
        r#"
        hit_table AS (
            SELECT stock_id, COUNT(*) AS hits
            FROM monthly_revenue
            WHERE {window_clause}
              AND {metric_col} >= $5
              AND {metric_col} < $6
            GROUP BY stock_id
        )
        "#,
        window_clause = window.sql_predicate("report_month", 2),
    )
}

fn perf_table_cte(basis: PriceBasis) -> String {
    let price = basis.column();
    format!(
        r#"
        perf_table AS (
            SELECT SPLIT_PART(symbol, '.', 1) AS stock_id,
                   {ret} AS ret
            FROM stock_annual_k
            WHERE year = $1
              AND year_open > 0
              AND {price} IS NOT NULL
        )
        "#,
        ret = sql_annual_return(price),
    )
}

/// 按爆发次数分组统计年度报酬，依赖 percentile_cont
pub fn query_burst_groups(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    basis: PriceBasis,
    low: i32,
    high: i32,
) -> Result<Vec<BurstGroupResult>, diesel::result::Error> {
    let query = format!(
        r#"
        WITH {hits},
        {perf},
        joined AS (
            SELECT h.hits, p.ret
            FROM hit_table h
            JOIN perf_table p ON h.stock_id = p.stock_id
        )
        SELECT hits,
               COUNT(*) AS stock_count,
               AVG(ret) AS avg_return,
               percentile_cont(0.5) WITHIN GROUP (ORDER BY ret) AS median_return,
               (COUNT(*) FILTER (WHERE ret > {WIN_THRESHOLD}) * 100.0 / COUNT(*))::float8 AS win_rate,
               (COUNT(*) FILTER (WHERE ret > {DOUBLE_THRESHOLD}) * 100.0 / COUNT(*))::float8 AS double_rate,
               MIN(ret) AS min_return,
               MAX(ret) AS max_return,
               COALESCE(STDDEV(ret), 0) AS std_dev
        FROM joined
        GROUP BY hits
        ORDER BY hits DESC
        "#,
        hits = hit_table_cte(metric, window),
        perf = perf_table_cte(basis),
    );

    bind_window(query, window)
        .bind::<Integer, _>(low)
        .bind::<Integer, _>(high)
        .load::<BurstGroupResult>(conn)
}

/// 未分组的 (hits, ret)，供替代计算使用
pub fn query_burst_raw(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    basis: PriceBasis,
    low: i32,
    high: i32,
) -> Result<Vec<BurstRawResult>, diesel::result::Error> {
    let query = format!(
        r#"
        WITH {hits},
        {perf}
        SELECT h.hits, p.ret
        FROM hit_table h
        JOIN perf_table p ON h.stock_id = p.stock_id
        "#,
        hits = hit_table_cte(metric, window),
        perf = perf_table_cte(basis),
    );

    bind_window(query, window)
        .bind::<Integer, _>(low)
        .bind::<Integer, _>(high)
        .load::<BurstRawResult>(conn)
}

/// 某个爆发次数的股票名单，按年度涨幅降序
#[allow(clippy::too_many_arguments)]
pub fn query_burst_detail(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    basis: PriceBasis,
    low: i32,
    high: i32,
    hits: i64,
) -> Result<Vec<BurstDetailResult>, diesel::result::Error> {
    let price = basis.column();
    let metric_col = metric.column();
    let query = format!(
        r#"
        WITH {hit_cte},
        year_k AS (
            SELECT SPLIT_PART(symbol, '.', 1) AS stock_id,
                   CASE WHEN year_open > 0 THEN {ret} END AS annual_return
            FROM stock_annual_k
            WHERE year = $1
        )
        SELECT h.stock_id,
               MAX(m.stock_name) AS stock_name,
               h.hits,
               MAX(k.annual_return) AS annual_return,
               AVG(m.{metric_col}::float8) AS avg_growth,
               STRING_AGG(DISTINCT CASE WHEN m.remark <> '-' AND m.remark <> '' THEN m.remark END, ' | ') AS remarks
        FROM hit_table h
        LEFT JOIN year_k k ON h.stock_id = k.stock_id
        LEFT JOIN monthly_revenue m
               ON h.stock_id = m.stock_id AND {month_window}
        WHERE h.hits = $7
        GROUP BY h.stock_id, h.hits
        ORDER BY annual_return DESC NULLS LAST
        LIMIT $8
        "#,
        hit_cte = hit_table_cte(metric, window),
        ret = sql_annual_return(price),
        month_window = window.sql_predicate("m.report_month", 2),
    );

    bind_window(query, window)
        .bind::<Integer, _>(low)
        .bind::<Integer, _>(high)
        .bind::<BigInt, _>(hits)
        .bind::<BigInt, _>(DETAIL_LIMIT)
        .load::<BurstDetailResult>(conn)
}

/// 当年有年K资料、且有爆发纪录的股票，按代号取前 100 档
pub fn query_burst_stocks(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    low: i32,
    high: i32,
) -> Result<Vec<BurstStockResult>, diesel::result::Error> {
    let query = format!(
        r#"
        WITH {hits}
        SELECT h.stock_id, h.hits
        FROM hit_table h
        WHERE EXISTS (
            SELECT 1 FROM stock_annual_k k
            WHERE SPLIT_PART(k.symbol, '.', 1) = h.stock_id
              AND k.year = $1
        )
        ORDER BY h.stock_id
        LIMIT $7
        "#,
        hits = hit_table_cte(metric, window),
    );

    bind_window(query, window)
        .bind::<Integer, _>(low)
        .bind::<Integer, _>(high)
        .bind::<BigInt, _>(MULTI_YEAR_STOCK_LIMIT)
        .load::<BurstStockResult>(conn)
}

/// 指定股票在 [from_year, to_year] 的年度报酬
pub fn query_year_returns(
    conn: &mut PgPoolConn,
    stock_ids: &[String],
    basis: PriceBasis,
    from_year: i32,
    to_year: i32,
) -> Result<Vec<YearReturnResult>, diesel::result::Error> {
    let price = basis.column();
    let query = format!(
        r#"
        SELECT SPLIT_PART(symbol, '.', 1) AS stock_id,
               year::int AS year,
               {ret} AS annual_return
        FROM stock_annual_k
        WHERE SPLIT_PART(symbol, '.', 1) = ANY($1)
          AND year::int BETWEEN $2 AND $3
          AND year_open > 0
          AND {price} IS NOT NULL
        ORDER BY stock_id, year
        "#,
        ret = sql_annual_return(price),
    );

    diesel::sql_query(query)
        .bind::<Array<Text>, _>(stock_ids.to_vec())
        .bind::<Integer, _>(from_year)
        .bind::<Integer, _>(to_year)
        .load::<YearReturnResult>(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_table_binds_range_after_window() {
        let sql = hit_table_cte(Metric::Yoy, &ResearchWindow::new(2024));
        assert!(sql.contains("yoy_pct >= $5"));
        assert!(sql.contains("yoy_pct < $6"));
        assert!(sql.contains("report_month LIKE $3"));
    }

    #[test]
    fn perf_table_uses_price_basis() {
        let sql = perf_table_cte(PriceBasis::High);
        assert!(sql.contains("(year_high::float8 - year_open::float8)"));
        assert!(sql.contains("year_high IS NOT NULL"));
    }
}
