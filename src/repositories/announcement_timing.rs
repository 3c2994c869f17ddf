use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::{Double, Integer, Nullable, Text};

use crate::models::research::{Metric, ResearchWindow};
use crate::repositories::like_contains;
use crate::services::timing::{sql_base_date, Stage, StockLinks, TimingEvent};

pub type PgPoolConn = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Debug, QueryableByName)]
pub struct TimingEventResult {
    #[diesel(sql_type = Text)]
    pub stock_id: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub stock_name: Option<String>,
    #[diesel(sql_type = Text)]
    pub report_month: String,
    #[diesel(sql_type = Double)]
    pub growth: f64,
    #[diesel(sql_type = Nullable<Text>)]
    pub remark: Option<String>,
    #[diesel(sql_type = Nullable<Double>)]
    pub pre_month: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub pre_week: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub announce_week: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub after_week_1: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub after_month: Option<f64>,
}

impl From<TimingEventResult> for TimingEvent {
    fn from(r: TimingEventResult) -> Self {
        TimingEvent {
            base_date: TimingEvent::base_date_of(&r.report_month),
            links: StockLinks::for_stock(&r.stock_id),
            stock_id: r.stock_id,
            stock_name: r.stock_name,
            report_month: r.report_month,
            growth: r.growth,
            remark: r.remark.filter(|s| !s.is_empty() && s != "-"),
            pre_month: r.pre_month,
            pre_week: r.pre_week,
            announce_week: r.announce_week,
            after_week_1: r.after_week_1,
            after_month: r.after_month,
        }
    }
}

fn timing_sql(metric: Metric, window: &ResearchWindow, with_keyword: bool) -> String {
    let metric_col = metric.column();
    let keyword_clause = if with_keyword {
        "AND (stock_name LIKE $4 OR (remark IS NOT NULL AND remark LIKE $4))"
    } else {
        ""
    };
    let stage_columns = Stage::ALL
        .iter()
        .map(|s| {
            format!(
                "{} AS {}",
                s.sql_average("e.base_date", "c.date", "c.weekly_ret"),
                s.column()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n               ");

    format!(
        r#"
        WITH raw_events AS (
            SELECT stock_id, stock_name, report_month, remark,
                   {metric_col}::float8 AS growth,
                   LAG({metric_col}::float8) OVER (PARTITION BY stock_id ORDER BY report_month) AS prev_growth
            FROM monthly_revenue
            WHERE {window_clause}
        ),
        spark AS (
            SELECT stock_id, stock_name, report_month, remark, growth,
                   {base_date} AS base_date
            FROM raw_events
            WHERE report_month LIKE $2
              AND growth >= $3
              AND (prev_growth IS NULL OR prev_growth < $3)
              {keyword_clause}
        ),
        weekly AS (
            SELECT SPLIT_PART(symbol, '.', 1) AS stock_id,
                   date,
                   (w_close::float8 / NULLIF(LAG(w_close::float8) OVER (PARTITION BY symbol ORDER BY date), 0) - 1) * 100 AS weekly_ret
            FROM stock_weekly_k
            WHERE SPLIT_PART(symbol, '.', 1) IN (SELECT stock_id FROM spark)
        )
        SELECT e.stock_id,
               e.stock_name,
               e.report_month,
               e.growth,
               e.remark,
               {stage_columns}
        FROM spark e
        JOIN weekly c
          ON c.stock_id = e.stock_id
         AND c.date >= e.base_date - interval '38 days'
         AND c.date <= e.base_date + interval '30 days'
        GROUP BY e.stock_id, e.stock_name, e.report_month, e.growth, e.remark, e.base_date
        HAVING {pre_week} IS NOT NULL
        ORDER BY pre_month DESC NULLS LAST
        "#,
        window_clause = window.sql_predicate_through_december("report_month", 1),
        base_date = sql_base_date("report_month"),
        pre_week = Stage::PreWeek.sql_average("e.base_date", "c.date", "c.weekly_ret"),
    )
}

/// 首度爆发事件与公告前后各阶段的周报酬
pub fn query_timing_events(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    threshold: i32,
    keyword: Option<&str>,
) -> Result<Vec<TimingEvent>, diesel::result::Error> {
    let query = timing_sql(metric, window, keyword.is_some());
    let bound = diesel::sql_query(query)
        .into_boxed()
        .bind::<Text, _>(window.previous_december())
        .bind::<Text, _>(window.year_pattern())
        .bind::<Integer, _>(threshold);

    let rows = match keyword {
        Some(k) => bound
            .bind::<Text, _>(like_contains(k))
            .load::<TimingEventResult>(conn)?,
        None => bound.load::<TimingEventResult>(conn)?,
    };
    Ok(rows.into_iter().map(TimingEvent::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_clause_only_when_requested() {
        let window = ResearchWindow::new(2024);
        assert!(!timing_sql(Metric::Yoy, &window, false).contains("$4"));
        assert!(timing_sql(Metric::Yoy, &window, true).contains("remark LIKE $4"));
    }

    #[test]
    fn every_stage_becomes_a_column() {
        let sql = timing_sql(Metric::Mom, &ResearchWindow::new(2024), false);
        for stage in Stage::ALL {
            assert!(sql.contains(&format!("AS {}", stage.column())));
        }
        assert!(sql.contains("LAG(mom_pct::float8)"));
        assert!(sql.contains("report_month = $1"));
    }

    #[test]
    fn events_include_current_december_report() {
        let sql = timing_sql(Metric::Yoy, &ResearchWindow::new(2024), false);
        assert!(sql.contains("report_month LIKE $2 AND LENGTH(report_month) <= 7"));
        assert!(!sql.contains("report_month < $"));
        assert!(sql.contains("growth >= $3"));
    }

    #[test]
    fn placeholder_remark_is_dropped() {
        let event = TimingEvent::from(TimingEventResult {
            stock_id: "2330".into(),
            stock_name: None,
            report_month: "113_03".into(),
            growth: 55.0,
            remark: Some("-".into()),
            pre_month: None,
            pre_week: Some(1.0),
            announce_week: None,
            after_week_1: None,
            after_month: None,
        });
        assert_eq!(event.remark, None);
        assert_eq!(event.base_date, chrono::NaiveDate::from_ymd_opt(2024, 4, 10));
        assert!(event.links.chart.contains("/2330/"));
    }
}
