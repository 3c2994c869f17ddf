use serde::{Deserialize, Serialize};

use crate::api_models::heatmap::default_year;
use crate::models::research::Metric;
use crate::services::timing::{Stage, TimingEvent, TimingReport};

fn default_threshold() -> i32 {
    100
}

/// 公告时间差查询请求
#[derive(Debug, Clone, Deserialize)]
pub struct TimingRequest {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub metric: Metric,
    /// 首度爆发的成长率门槛
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TimingResponse {
    pub year: i32,
    pub metric: Metric,
    pub threshold: i32,
    pub report: TimingReport,
    pub events: Vec<TimingEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutlierRequest {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    pub keyword: Option<String>,
    pub stage: Stage,
}

#[derive(Debug, Serialize)]
pub struct OutlierResponse {
    pub stage: Stage,
    pub label: &'static str,
    pub events: Vec<TimingEvent>,
}
