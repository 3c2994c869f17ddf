use chrono::NaiveDate;
use serde::Serialize;

use crate::models::research::{Metric, PriceBasis};
use crate::services::statistic::StatMethod;
use crate::services::timing::Stage;

#[derive(Debug, Serialize)]
pub struct LatestDateResponse {
    pub latest_date: Option<NaiveDate>,
}

/// 个股某一月的营收成长
#[derive(Debug, Serialize)]
pub struct RevenuePoint {
    pub report_month: String,
    /// 公历年月，如 `2024-07`
    pub month: Option<String>,
    pub yoy_pct: Option<f64>,
    pub mom_pct: Option<f64>,
    pub remark: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnnualReturnPoint {
    pub year: String,
    pub close_return: Option<f64>,
    pub high_return: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StockRevenueResponse {
    pub stock_id: String,
    pub stock_name: Option<String>,
    pub revenue: Vec<RevenuePoint>,
    pub annual: Vec<AnnualReturnPoint>,
}

#[derive(Debug, Serialize)]
pub struct LabeledOption<T> {
    pub value: T,
    pub label: &'static str,
}

/// 前端下拉选单的可选值
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub years: Vec<i32>,
    pub default_year: i32,
    pub metrics: Vec<LabeledOption<Metric>>,
    pub methods: Vec<LabeledOption<StatMethod>>,
    pub price_bases: Vec<LabeledOption<PriceBasis>>,
    pub growth_options: Vec<i32>,
    pub threshold_range: (i32, i32),
    pub stages: Vec<LabeledOption<Stage>>,
    pub leader_limits: Vec<i64>,
}
