use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::{BigInt, Double, Integer, Nullable, Text};

use crate::models::research::{LeaderSort, Metric, PriceBasis, ResearchWindow};
use crate::repositories::{bind_window, like_contains};
use crate::services::bucketing::{sql_annual_return, BinScheme};
use crate::services::statistic::StatMethod;

pub type PgPoolConn = PooledConnection<ConnectionManager<PgConnection>>;

/// 热力图单元格查询结果
#[derive(Debug, QueryableByName)]
pub struct HeatmapCellResult {
    #[diesel(sql_type = Integer)]
    pub bin_order: i32,
    #[diesel(sql_type = Text)]
    pub bin_label: String,
    #[diesel(sql_type = Text)]
    pub report_month: String,
    #[diesel(sql_type = Nullable<Double>)]
    pub value: Option<f64>,
    #[diesel(sql_type = BigInt)]
    pub stock_count: i64,
    #[diesel(sql_type = BigInt)]
    pub data_points: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_return: Option<f64>,
}

/// 未聚合的（区间, 月份, 股票）数值，用于内存计算
#[derive(Debug, Clone, QueryableByName)]
pub struct HeatmapRawResult {
    #[diesel(sql_type = Integer)]
    pub bin_order: i32,
    #[diesel(sql_type = Text)]
    pub bin_label: String,
    #[diesel(sql_type = Text)]
    pub report_month: String,
    #[diesel(sql_type = Text)]
    pub stock_id: String,
    #[diesel(sql_type = Double)]
    pub val: f64,
    #[diesel(sql_type = Double)]
    pub annual_return: f64,
}

/// 区间摘要查询结果
#[derive(Debug, QueryableByName)]
pub struct BinSummaryResult {
    #[diesel(sql_type = Integer)]
    pub bin_order: i32,
    #[diesel(sql_type = Text)]
    pub bin_label: String,
    #[diesel(sql_type = BigInt)]
    pub stock_count: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_return: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub mean_val: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub median_val: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub std_val: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub min_val: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub max_val: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub cv_val: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub iqr_val: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub positive_rate: Option<f64>,
}

/// 区间内个股明细
#[derive(Debug, QueryableByName)]
pub struct BinLeaderResult {
    #[diesel(sql_type = Text)]
    pub stock_id: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub stock_name: Option<String>,
    #[diesel(sql_type = Double)]
    pub annual_return: f64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_yoy: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_mom: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub std_yoy: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub std_mom: Option<f64>,
    #[diesel(sql_type = Nullable<Text>)]
    pub latest_remark: Option<String>,
}

pub fn scheme_for(basis: PriceBasis) -> BinScheme {
    match basis {
        PriceBasis::Close => BinScheme::CloseGradient,
        PriceBasis::High => BinScheme::HighPotential,
    }
}

/// 年度涨幅分组与观察期月营收两个 CTE，占用 $1..$4
fn binned_monthly_ctes(metric: Metric, basis: PriceBasis, window: &ResearchWindow) -> String {
    let scheme = scheme_for(basis);
    let price = basis.column();
    let ret = sql_annual_return(price);
    let metric_col = metric.column();
    format!(
        r#"
        WITH annual AS (
            SELECT SPLIT_PART(symbol, '.', 1) AS stock_id,
                   {ret} AS annual_return
            FROM stock_annual_k
            WHERE year = $1
              AND year_open > 0
              AND {price} IS NOT NULL
        ),
        binned AS (
            SELECT stock_id,
                   annual_return,
                   {order_case} AS bin_order,
                   {label_case} AS bin_label
            FROM annual
        ),
        monthly AS (
            SELECT stock_id, report_month, {metric_col}::float8 AS val
            FROM monthly_revenue
            WHERE {window_clause}
              AND {metric_col} IS NOT NULL
        )
        "#,
        order_case = scheme.sql_order_case("annual_return"),
        label_case = scheme.sql_label_case("annual_return"),
        window_clause = window.sql_predicate("report_month", 2),
    )
}

/// 按（涨幅区间, 报表月份）聚合营收指标
pub fn query_heatmap_cells(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    method: StatMethod,
    basis: PriceBasis,
) -> Result<Vec<HeatmapCellResult>, diesel::result::Error> {
    let query = format!(
        r#"
        {ctes}
        SELECT b.bin_order,
               b.bin_label,
               m.report_month,
               ({agg})::float8 AS value,
               COUNT(DISTINCT b.stock_id) AS stock_count,
               COUNT(m.val) AS data_points,
               AVG(b.annual_return) AS avg_return
        FROM binned b
        JOIN monthly m ON m.stock_id = b.stock_id
        GROUP BY b.bin_order, b.bin_label, m.report_month
        ORDER BY b.bin_order, m.report_month
        "#,
        ctes = binned_monthly_ctes(metric, basis, window),
        agg = method.sql_aggregate("m.val"),
    );

    bind_window(query, window).load::<HeatmapCellResult>(conn)
}

/// 读取未聚合的数值，供 percentile_cont 失败时在内存中计算
pub fn query_heatmap_raw(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    basis: PriceBasis,
) -> Result<Vec<HeatmapRawResult>, diesel::result::Error> {
    let query = format!(
        r#"
        {ctes}
        SELECT b.bin_order,
               b.bin_label,
               m.report_month,
               b.stock_id,
               m.val,
               b.annual_return
        FROM binned b
        JOIN monthly m ON m.stock_id = b.stock_id
        ORDER BY b.bin_order, m.report_month
        "#,
        ctes = binned_monthly_ctes(metric, basis, window),
    );

    bind_window(query, window).load::<HeatmapRawResult>(conn)
}

/// 每个涨幅区间的营收全维度统计
fn bin_summary_sql(metric: Metric, basis: PriceBasis, window: &ResearchWindow) -> String {
    let x = "m.val";
    format!(
        r#"
        {ctes}
        SELECT b.bin_order,
               b.bin_label,
               COUNT(DISTINCT b.stock_id) AS stock_count,
               AVG(b.annual_return) AS avg_return,
               ({mean})::float8 AS mean_val,
               ({median})::float8 AS median_val,
               ({std})::float8 AS std_val,
               MIN({x})::float8 AS min_val,
               MAX({x})::float8 AS max_val,
               ({cv})::float8 AS cv_val,
               ({iqr})::float8 AS iqr_val,
               ({positive})::float8 AS positive_rate
        FROM binned b
        JOIN monthly m ON m.stock_id = b.stock_id
        GROUP BY b.bin_order, b.bin_label
        ORDER BY b.bin_order
        "#,
        ctes = binned_monthly_ctes(metric, basis, window),
        mean = StatMethod::Mean.sql_aggregate(x),
        median = StatMethod::Median.sql_aggregate(x),
        std = StatMethod::StdDev.sql_aggregate(x),
        cv = StatMethod::CoefficientOfVariation.sql_aggregate(x),
        iqr = StatMethod::Iqr.sql_aggregate(x),
        positive = StatMethod::PositiveRate.sql_aggregate(x),
    )
}

pub fn query_bin_summary(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    basis: PriceBasis,
) -> Result<Vec<BinSummaryResult>, diesel::result::Error> {
    bind_window(bin_summary_sql(metric, basis, window), window).load::<BinSummaryResult>(conn)
}

/// 查询某个涨幅区间内的个股，可按名称或最新备注筛选
pub fn query_bin_leaders(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    basis: PriceBasis,
    bin_order: i32,
    keyword: Option<&str>,
    sort: LeaderSort,
    limit: i64,
) -> Result<Vec<BinLeaderResult>, diesel::result::Error> {
    let scheme = scheme_for(basis);
    let price = basis.column();

    // 关键字以绑定参数传入，只有是否筛选决定 SQL 形状
    let keyword_clause = if keyword.is_some() {
        "AND (m.stock_name LIKE $7 OR (r.remark IS NOT NULL AND r.remark LIKE $7))"
    } else {
        ""
    };

    let query = format!(
        r#"
        WITH target AS (
            SELECT SPLIT_PART(symbol, '.', 1) AS stock_id,
                   {ret} AS annual_return
            FROM stock_annual_k
            WHERE year = $1
              AND year_open > 0
              AND {price} IS NOT NULL
        ),
        in_bin AS (
            SELECT stock_id, annual_return
            FROM target
            WHERE {order_case} = $5
        ),
        latest_remarks AS (
            SELECT DISTINCT ON (stock_id) stock_id, remark
            FROM monthly_revenue
            WHERE {remark_window}
              AND remark IS NOT NULL AND remark <> '-' AND remark <> ''
            ORDER BY stock_id, report_month DESC
        )
        SELECT m.stock_id,
               MAX(m.stock_name) AS stock_name,
               t.annual_return,
               AVG(m.yoy_pct::float8) AS avg_yoy,
               AVG(m.mom_pct::float8) AS avg_mom,
               STDDEV(m.yoy_pct::float8) AS std_yoy,
               STDDEV(m.mom_pct::float8) AS std_mom,
               r.remark AS latest_remark
        FROM monthly_revenue m
        JOIN in_bin t ON m.stock_id = t.stock_id
        LEFT JOIN latest_remarks r ON m.stock_id = r.stock_id
        WHERE {month_window}
          {keyword_clause}
        GROUP BY m.stock_id, t.annual_return, r.remark
        ORDER BY {sort_col} DESC NULLS LAST
        LIMIT $6
        "#,
        ret = sql_annual_return(price),
        order_case = scheme.sql_order_case("annual_return"),
        remark_window = window.sql_predicate("report_month", 2),
        month_window = window.sql_predicate("m.report_month", 2),
        sort_col = sort.column(),
    );

    let bound = bind_window(query, window)
        .bind::<Integer, _>(bin_order)
        .bind::<BigInt, _>(limit);

    match keyword {
        Some(k) => bound
            .bind::<Text, _>(like_contains(k))
            .load::<BinLeaderResult>(conn),
        None => bound.load::<BinLeaderResult>(conn),
    }
}
