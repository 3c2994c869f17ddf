use serde::{Deserialize, Serialize};

use crate::models::research::{LeaderSort, Metric, PriceBasis, DEFAULT_YEAR};
use crate::services::heatmap::{BinSummary, HeatmapGrid, HeatmapOverview};
use crate::services::statistic::StatMethod;

pub(crate) fn default_year() -> i32 {
    DEFAULT_YEAR
}

fn default_leader_limit() -> i64 {
    20
}

/// 明细名单允许的笔数
pub const LEADER_LIMITS: [i64; 4] = [10, 20, 50, 100];

/// 热力图查询请求，SVG 接口以 query string 传入同样的字段
#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapRequest {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub method: StatMethod,
    #[serde(default)]
    pub price_basis: PriceBasis,
}

#[derive(Debug, Serialize)]
pub struct HeatmapResponse {
    pub year: i32,
    pub metric: Metric,
    pub method: StatMethod,
    pub method_title: &'static str,
    pub price_basis: PriceBasis,
    /// 数值小数位数
    pub precision: usize,
    pub overview: HeatmapOverview,
    pub grid: HeatmapGrid,
    /// 色阶的最小值与最大值，没有数据时为空
    pub value_range: Option<(f64, f64)>,
}

/// 区间摘要请求
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub price_basis: PriceBasis,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub year: i32,
    pub metric: Metric,
    pub price_basis: PriceBasis,
    pub bins: Vec<BinSummary>,
    /// 下跌区间中平均涨幅最低者
    pub worst_decline: Option<BinSummary>,
    /// 上涨区间中平均涨幅最高者
    pub best_rise: Option<BinSummary>,
}

/// 单一涨幅区间的个股明细请求
#[derive(Debug, Clone, Deserialize)]
pub struct LeadersRequest {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub price_basis: PriceBasis,
    pub bin_order: i32,
    /// 股票名称或最新备注的关键字
    pub keyword: Option<String>,
    #[serde(default)]
    pub sort: LeaderSort,
    #[serde(default = "default_leader_limit")]
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct LeaderItem {
    pub stock_id: String,
    pub stock_name: Option<String>,
    pub annual_return: f64,
    pub avg_yoy: Option<f64>,
    pub avg_mom: Option<f64>,
    pub std_yoy: Option<f64>,
    pub std_mom: Option<f64>,
    pub latest_remark: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeadersResponse {
    pub bin_order: i32,
    pub bin_label: String,
    pub items: Vec<LeaderItem>,
}
