use serde::{Deserialize, Serialize};

use crate::api_models::heatmap::default_year;
use crate::models::research::{Metric, PriceBasis};
use crate::services::probability::{
    BurstGroupStats, DetailSummary, ExpectedValueScore, RightSkewShare, YearPivot,
    YearReturnStat,
};

fn default_low() -> i32 {
    100
}

fn default_high() -> i32 {
    1000
}

/// 爆发机率查询请求，成长率区间为 [low, high)
#[derive(Debug, Clone, Deserialize)]
pub struct ProbabilityRequest {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub price_basis: PriceBasis,
    #[serde(default = "default_low")]
    pub low: i32,
    #[serde(default = "default_high")]
    pub high: i32,
}

#[derive(Debug, Serialize)]
pub struct ProbabilityResponse {
    pub year: i32,
    pub metric: Metric,
    pub price_basis: PriceBasis,
    pub low: i32,
    pub high: i32,
    /// 所有分组的股票总数
    pub total_stocks: i64,
    pub groups: Vec<BurstGroupStats>,
    pub scores: Vec<ExpectedValueScore>,
    pub best: Option<ExpectedValueScore>,
    pub right_skew: RightSkewShare,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailRequest {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub price_basis: PriceBasis,
    #[serde(default = "default_low")]
    pub low: i32,
    #[serde(default = "default_high")]
    pub high: i32,
    pub hits: i64,
}

#[derive(Debug, Serialize)]
pub struct DetailItem {
    pub stock_id: String,
    pub stock_name: Option<String>,
    pub hits: i64,
    pub annual_return: Option<f64>,
    pub avg_growth: Option<f64>,
    /// 观察期内不重复的备注，以 ` | ` 连接
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub hits: i64,
    pub summary: DetailSummary,
    pub items: Vec<DetailItem>,
}

#[derive(Debug, Serialize)]
pub struct MultiYearResponse {
    pub year: i32,
    pub from_year: i32,
    pub to_year: i32,
    pub stock_count: usize,
    pub stats: Vec<YearReturnStat>,
    pub mean_pivot: YearPivot,
    pub median_pivot: YearPivot,
}
