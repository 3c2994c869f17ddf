use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::research::{ReportMonth, MINGUO_OFFSET};
use crate::services::descriptive::{
    distribution_summary, histogram, iqr_outliers, percentile_cont, round_to, DescriptiveStats,
    HistogramBin,
};

pub const THRESHOLD_MIN: i32 = 30;
pub const THRESHOLD_MAX: i32 = 300;
pub const HISTOGRAM_BINS: usize = 25;
pub const OUTLIER_K: f64 = 1.5;

/// 公告日前后的观察阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PreMonth,
    PreWeek,
    AnnounceWeek,
    AfterWeek1,
    AfterMonth,
}

/// 相对基准日的天数区间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageWindow {
    pub from_days: i64,
    pub from_inclusive: bool,
    pub to_days: i64,
    pub to_inclusive: bool,
    /// 周报酬平均后乘上的倍数，T-1 月折算为月报酬
    pub scale: f64,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::PreMonth,
        Stage::PreWeek,
        Stage::AnnounceWeek,
        Stage::AfterWeek1,
        Stage::AfterMonth,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Stage::PreMonth => "pre_month",
            Stage::PreWeek => "pre_week",
            Stage::AnnounceWeek => "announce_week",
            Stage::AfterWeek1 => "after_week_1",
            Stage::AfterMonth => "after_month",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::PreMonth => "T-1月",
            Stage::PreWeek => "T-1周",
            Stage::AnnounceWeek => "T周公告",
            Stage::AfterWeek1 => "T+1周",
            Stage::AfterMonth => "T+1月",
        }
    }

    pub fn window(self) -> StageWindow {
        let w = |from_days, from_inclusive, to_days, to_inclusive, scale| StageWindow {
            from_days,
            from_inclusive,
            to_days,
            to_inclusive,
            scale,
        };
        match self {
            Stage::PreMonth => w(-38, true, -9, false, 4.0),
            Stage::PreWeek => w(-9, true, -3, true, 1.0),
            Stage::AnnounceWeek => w(-3, false, 4, true, 1.0),
            Stage::AfterWeek1 => w(4, false, 11, true, 1.0),
            Stage::AfterMonth => w(11, false, 30, true, 1.0),
        }
    }

    /// 该阶段的 SQL 聚合，落在区间内的周报酬取平均
    pub fn sql_average(self, base: &str, date: &str, ret: &str) -> String {
        let w = self.window();
        let bound = |days: i64| {
            if days < 0 {
                format!("{base} - interval '{} days'", -days)
            } else {
                format!("{base} + interval '{days} days'")
            }
        };
        let from_op = if w.from_inclusive { ">=" } else { ">" };
        let to_op = if w.to_inclusive { "<=" } else { "<" };
        let avg = format!(
            "AVG(CASE WHEN {date} {from_op} {} AND {date} {to_op} {} THEN {ret} END)",
            bound(w.from_days),
            bound(w.to_days)
        );
        if w.scale == 1.0 {
            avg
        } else {
            format!("{avg} * {}", w.scale)
        }
    }
}

/// 营收公告基准日：报表月份的次月 10 日
pub fn announcement_base_date(month: &ReportMonth) -> Option<NaiveDate> {
    let (year, next) = if month.month == 12 {
        (month.gregorian_year() + 1, 1)
    } else {
        (month.gregorian_year(), month.month + 1)
    };
    NaiveDate::from_ymd_opt(year, next, 10)
}

/// SQL 版本的基准日表达式，`col` 为 report_month 列
pub fn sql_base_date(col: &str) -> String {
    format!(
        "(CASE WHEN RIGHT({col}, 2) = '12' \
         THEN (SPLIT_PART({col}, '_', 1)::int + 1 + {MINGUO_OFFSET})::text || '-01-10' \
         ELSE (SPLIT_PART({col}, '_', 1)::int + {MINGUO_OFFSET})::text || '-' \
         || LPAD((RIGHT({col}, 2)::int + 1)::text, 2, '0') || '-10' END)::date"
    )
}

/// 个股的技术线图与财报页面
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockLinks {
    pub chart: String,
    pub statement: String,
}

impl StockLinks {
    pub fn for_stock(stock_id: &str) -> Self {
        Self {
            chart: format!("https://www.wantgoo.com/stock/{stock_id}/technical-chart"),
            statement: format!("https://statementdog.com/analysis/{stock_id}"),
        }
    }
}

/// 一次首度爆发事件及其各阶段报酬
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingEvent {
    pub stock_id: String,
    pub stock_name: Option<String>,
    pub report_month: String,
    /// 营收公告基准日，报表月份无法解析时为空
    pub base_date: Option<NaiveDate>,
    pub growth: f64,
    pub remark: Option<String>,
    pub links: StockLinks,
    pub pre_month: Option<f64>,
    pub pre_week: Option<f64>,
    pub announce_week: Option<f64>,
    pub after_week_1: Option<f64>,
    pub after_month: Option<f64>,
}

impl TimingEvent {
    pub fn base_date_of(report_month: &str) -> Option<NaiveDate> {
        ReportMonth::parse(report_month)
            .as_ref()
            .and_then(announcement_base_date)
    }

    pub fn stage(&self, stage: Stage) -> Option<f64> {
        match stage {
            Stage::PreMonth => self.pre_month,
            Stage::PreWeek => self.pre_week,
            Stage::AnnounceWeek => self.announce_week,
            Stage::AfterWeek1 => self.after_week_1,
            Stage::AfterMonth => self.after_month,
        }
    }
}

fn stage_values(events: &[TimingEvent], stage: Stage) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| e.stage(stage))
        .filter(|v| v.is_finite())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub label: &'static str,
    pub mean: f64,
    pub median: f64,
    pub count: usize,
    pub stats: Option<DescriptiveStats>,
    pub histogram: Vec<HistogramBin>,
}

impl StageSummary {
    /// 无数据时平均与中位数记为 0
    pub fn from_events(events: &[TimingEvent], stage: Stage) -> Self {
        let values = stage_values(events, stage);
        let (mean, median) = if values.is_empty() {
            (0.0, 0.0)
        } else {
            (
                round_to(values.iter().sum::<f64>() / values.len() as f64, 2),
                round_to(percentile_cont(&values, 0.5).unwrap_or(0.0), 2),
            )
        };
        Self {
            stage,
            label: stage.label(),
            mean,
            median,
            count: values.len(),
            stats: DescriptiveStats::from_values(&values),
            histogram: histogram(&values, HISTOGRAM_BINS),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimingReport {
    pub total: usize,
    pub stages: Vec<StageSummary>,
    pub pre_month_distribution: String,
    pub after_month_distribution: String,
}

impl TimingReport {
    pub fn from_events(events: &[TimingEvent]) -> Self {
        Self {
            total: events.len(),
            stages: Stage::ALL
                .iter()
                .map(|s| StageSummary::from_events(events, *s))
                .collect(),
            pre_month_distribution: distribution_summary(&stage_values(events, Stage::PreMonth)),
            after_month_distribution: distribution_summary(&stage_values(
                events,
                Stage::AfterMonth,
            )),
        }
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// 某阶段报酬超出 IQR 范围的事件
pub fn stage_outliers(events: &[TimingEvent], stage: Stage) -> Vec<TimingEvent> {
    let values: Vec<Option<f64>> = events.iter().map(|e| e.stage(stage)).collect();
    iqr_outliers(&values, OUTLIER_K)
        .into_iter()
        .filter_map(|i| events.get(i).cloned())
        .collect()
}

pub fn validate_threshold(threshold: i32) -> Result<(), String> {
    if (THRESHOLD_MIN..=THRESHOLD_MAX).contains(&threshold) {
        Ok(())
    } else {
        Err(format!(
            "threshold must be between {THRESHOLD_MIN} and {THRESHOLD_MAX}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: &str, pre_month: Option<f64>, after_month: Option<f64>) -> TimingEvent {
        TimingEvent {
            stock_id: id.to_string(),
            stock_name: None,
            report_month: "113_03".to_string(),
            base_date: TimingEvent::base_date_of("113_03"),
            growth: 120.0,
            remark: None,
            links: StockLinks::for_stock(id),
            pre_month,
            pre_week: Some(1.0),
            announce_week: None,
            after_week_1: None,
            after_month,
        }
    }

    #[test]
    fn base_date_is_tenth_of_following_month() {
        let m = ReportMonth::parse("113_03").unwrap();
        assert_eq!(announcement_base_date(&m), Some(date(2024, 4, 10)));
        let dec = ReportMonth::parse("112_12").unwrap();
        assert_eq!(announcement_base_date(&dec), Some(date(2024, 1, 10)));
    }

    #[test]
    fn base_date_rolls_over_every_month() {
        for month in 1..=12 {
            let code = format!("113_{month:02}");
            let base = TimingEvent::base_date_of(&code).unwrap();
            let (year, next) = if month == 12 { (2025, 1) } else { (2024, month + 1) };
            assert_eq!(base, date(year, next, 10), "{code}");
        }
        assert_eq!(TimingEvent::base_date_of("113-03"), None);
        let sql = sql_base_date("report_month");
        assert!(sql.contains("RIGHT(report_month, 2) = '12'"));
        assert!(sql.contains(&format!("+ 1 + {MINGUO_OFFSET})::text || '-01-10'")));
    }

    fn in_window(stage: Stage, base: NaiveDate, d: NaiveDate) -> bool {
        let w = stage.window();
        let from = base + Duration::days(w.from_days);
        let to = base + Duration::days(w.to_days);
        let after_from = if w.from_inclusive { d >= from } else { d > from };
        let before_to = if w.to_inclusive { d <= to } else { d < to };
        after_from && before_to
    }

    #[test]
    fn stage_windows_do_not_overlap() {
        let base = date(2024, 4, 10);
        for offset in -38..=30 {
            let d = base + Duration::days(offset);
            let hits = Stage::ALL.iter().filter(|s| in_window(**s, base, d)).count();
            assert_eq!(hits, 1, "offset {offset}");
        }
        assert!(in_window(Stage::PreWeek, base, base - Duration::days(9)));
        assert!(!in_window(Stage::PreMonth, base, base - Duration::days(9)));
        assert!(in_window(Stage::PreWeek, base, base - Duration::days(3)));
        assert!(in_window(Stage::AnnounceWeek, base, base + Duration::days(4)));
        assert!(!in_window(Stage::AfterMonth, base, base + Duration::days(31)));
    }

    #[test]
    fn links_point_at_chart_and_statement_pages() {
        let links = StockLinks::for_stock("2330");
        assert_eq!(links.chart, "https://www.wantgoo.com/stock/2330/technical-chart");
        assert_eq!(links.statement, "https://statementdog.com/analysis/2330");
    }

    #[test]
    fn sql_average_mirrors_window() {
        let sql = Stage::PreMonth.sql_average("e.base_date", "c.date", "c.weekly_ret");
        assert_eq!(
            sql,
            "AVG(CASE WHEN c.date >= e.base_date - interval '38 days' \
             AND c.date < e.base_date - interval '9 days' THEN c.weekly_ret END) * 4"
        );
        let after = Stage::AfterWeek1.sql_average("b", "d", "r");
        assert!(after.contains("d > b + interval '4 days' AND d <= b + interval '11 days'"));
        assert!(sql_base_date("report_month").ends_with("::date"));
    }

    #[test]
    fn report_summarises_each_stage() {
        let events = vec![
            event("1101", Some(10.0), Some(-8.0)),
            event("1102", Some(-2.0), None),
            event("1103", Some(0.5), Some(3.0)),
        ];
        let report = TimingReport::from_events(&events);
        assert_eq!(report.total, 3);
        assert_eq!(report.stages.len(), 5);

        let pre = report.stage(Stage::PreMonth).unwrap();
        assert_eq!(pre.count, 3);
        assert_eq!(pre.mean, 2.83);
        assert_eq!(pre.median, 0.5);
        assert_eq!(pre.histogram.len(), HISTOGRAM_BINS);

        let announce = report.stage(Stage::AnnounceWeek).unwrap();
        assert_eq!(announce.count, 0);
        assert_eq!(announce.mean, 0.0);
        assert!(announce.stats.is_none());

        assert!(report.pre_month_distribution.contains("大漲(>5%):1檔"));
        assert!(report.after_month_distribution.contains("大跌(<-5%):1檔(50.0%)"));
    }

    #[test]
    fn outliers_are_reported_per_stage() {
        let mut events: Vec<_> = (0..6)
            .map(|i| event(&format!("{i}"), Some(i as f64), None))
            .collect();
        events.push(event("9999", Some(80.0), None));
        let out = stage_outliers(&events, Stage::PreMonth);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].stock_id, "9999");
        assert!(stage_outliers(&events, Stage::AfterMonth).is_empty());
    }

    #[test]
    fn threshold_range() {
        assert!(validate_threshold(30).is_ok());
        assert!(validate_threshold(300).is_ok());
        assert!(validate_threshold(29).is_err());
        assert!(validate_threshold(301).is_err());
    }
}
