use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::services::descriptive::{percentile_cont, round_to, sample_std_dev};

/// 可选的成长率区间端点
pub const GROWTH_OPTIONS: [i32; 10] = [-50, 0, 20, 50, 100, 150, 200, 300, 500, 1000];

/// 胜率门槛：年度涨幅超过 20%
pub const WIN_THRESHOLD: f64 = 20.0;
/// 翻倍门槛
pub const DOUBLE_THRESHOLD: f64 = 100.0;

pub fn validate_growth_range(low: i32, high: i32) -> Result<(), String> {
    if !GROWTH_OPTIONS.contains(&low) || !GROWTH_OPTIONS.contains(&high) {
        return Err(format!(
            "growth range bounds must be one of {:?}",
            GROWTH_OPTIONS
        ));
    }
    if low >= high {
        return Err("growth range lower bound must be below the upper bound".to_string());
    }
    Ok(())
}

/// 同一爆发次数下所有股票的年度报酬统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurstGroupStats {
    pub hits: i64,
    pub stock_count: i64,
    pub avg_return: f64,
    pub median_return: f64,
    pub win_rate: f64,
    pub double_rate: f64,
    pub min_return: f64,
    pub max_return: f64,
    pub std_dev: f64,
}

impl BurstGroupStats {
    /// 数值统一保留一位小数
    pub fn rounded(self) -> Self {
        Self {
            avg_return: round_to(self.avg_return, 1),
            median_return: round_to(self.median_return, 1),
            win_rate: round_to(self.win_rate, 1),
            double_rate: round_to(self.double_rate, 1),
            min_return: round_to(self.min_return, 1),
            max_return: round_to(self.max_return, 1),
            std_dev: round_to(self.std_dev, 1),
            ..self
        }
    }
}

/// 由 `(hits, ret)` 原始行计算分组统计，按爆发次数降序
///
/// 单一股票的分组标准差记为 0
pub fn aggregate_raw(rows: impl IntoIterator<Item = (i64, f64)>) -> Vec<BurstGroupStats> {
    let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (hits, ret) in rows {
        if ret.is_finite() {
            groups.entry(hits).or_default().push(ret);
        }
    }

    groups
        .into_iter()
        .rev()
        .map(|(hits, rets)| {
            let n = rets.len() as f64;
            let share = |threshold: f64| {
                rets.iter().filter(|r| **r > threshold).count() as f64 * 100.0 / n
            };
            BurstGroupStats {
                hits,
                stock_count: rets.len() as i64,
                avg_return: rets.iter().sum::<f64>() / n,
                median_return: percentile_cont(&rets, 0.5).unwrap_or(0.0),
                win_rate: share(WIN_THRESHOLD),
                double_rate: share(DOUBLE_THRESHOLD),
                min_return: rets.iter().copied().fold(f64::INFINITY, f64::min),
                max_return: rets.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                std_dev: sample_std_dev(&rets).unwrap_or(0.0),
            }
            .rounded()
        })
        .collect()
}

/// 期望值评分
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedValueScore {
    pub hits: i64,
    pub stock_count: i64,
    pub avg_return: f64,
    pub median_return: f64,
    pub mean_median_diff: f64,
    pub win_rate: f64,
    pub double_rate: f64,
    pub ev_score: f64,
    pub risk_adjusted: f64,
    pub success_score: f64,
    pub composite: f64,
}

impl ExpectedValueScore {
    pub fn from_group(g: &BurstGroupStats) -> Self {
        let ev = g.avg_return * g.stock_count as f64;
        let risk_adjusted = g.avg_return / g.std_dev.max(1.0);
        let success = g.avg_return * g.win_rate / 100.0;
        let (ev_score, composite) = if ev == 0.0 {
            (0.0, 0.0)
        } else {
            (
                round_to(ev / 100.0, 2),
                round_to((ev / 100.0 + risk_adjusted + success) / 3.0, 2),
            )
        };
        Self {
            hits: g.hits,
            stock_count: g.stock_count,
            avg_return: g.avg_return,
            median_return: g.median_return,
            mean_median_diff: round_to(g.avg_return - g.median_return, 1),
            win_rate: g.win_rate,
            double_rate: g.double_rate,
            ev_score,
            risk_adjusted: round_to(risk_adjusted, 2),
            success_score: round_to(success, 2),
            composite,
        }
    }
}

pub fn score_groups(groups: &[BurstGroupStats]) -> Vec<ExpectedValueScore> {
    groups.iter().map(ExpectedValueScore::from_group).collect()
}

/// 综合评分最高的分组；并列时取排在前面的
pub fn best_group(scores: &[ExpectedValueScore]) -> Option<&ExpectedValueScore> {
    scores.iter().fold(None, |best, s| match best {
        Some(b) if b.composite >= s.composite => Some(b),
        _ => Some(s),
    })
}

/// 平均数高于中位数的分组占比，反映右偏程度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RightSkewShare {
    pub above: usize,
    pub total: usize,
    pub rate: f64,
}

impl RightSkewShare {
    pub fn from_scores(scores: &[ExpectedValueScore]) -> Self {
        let above = scores.iter().filter(|s| s.mean_median_diff > 0.0).count();
        let rate = if scores.is_empty() {
            0.0
        } else {
            round_to(above as f64 / scores.len() as f64 * 100.0, 1)
        };
        Self {
            above,
            total: scores.len(),
            rate,
        }
    }
}

/// 明细名单的摘要
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetailSummary {
    pub stock_count: usize,
    pub avg_return: Option<f64>,
    pub median_return: Option<f64>,
    pub positive_count: usize,
    pub positive_rate: f64,
}

impl DetailSummary {
    pub fn from_returns(returns: &[Option<f64>]) -> Self {
        let values: Vec<f64> = returns.iter().flatten().copied().collect();
        let positive_count = values.iter().filter(|r| **r > 0.0).count();
        let positive_rate = if returns.is_empty() {
            0.0
        } else {
            round_to(positive_count as f64 * 100.0 / returns.len() as f64, 1)
        };
        Self {
            stock_count: returns.len(),
            avg_return: crate::services::descriptive::mean(&values).map(|v| round_to(v, 1)),
            median_return: percentile_cont(&values, 0.5).map(|v| round_to(v, 1)),
            positive_count,
            positive_rate,
        }
    }
}

/// 多年度对照中一个（爆发次数, 年度）的统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearReturnStat {
    pub hits: i64,
    pub year: i32,
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearPivotRow {
    pub hits: i64,
    pub values: Vec<Option<f64>>,
}

/// 行为爆发次数、列为年度的透视表
#[derive(Debug, Clone, Serialize)]
pub struct YearPivot {
    pub years: Vec<i32>,
    pub rows: Vec<YearPivotRow>,
}

/// `hits_by_stock` 与 `(stock_id, year, annual_return)` 合并后分组
pub fn multi_year_stats(
    hits_by_stock: &BTreeMap<String, i64>,
    returns: impl IntoIterator<Item = (String, i32, f64)>,
) -> Vec<YearReturnStat> {
    let mut groups: BTreeMap<(i64, i32), Vec<f64>> = BTreeMap::new();
    for (stock_id, year, ret) in returns {
        if let Some(&hits) = hits_by_stock.get(&stock_id) {
            if ret.is_finite() {
                groups.entry((hits, year)).or_default().push(ret);
            }
        }
    }
    groups
        .into_iter()
        .map(|((hits, year), rets)| YearReturnStat {
            hits,
            year,
            mean: round_to(rets.iter().sum::<f64>() / rets.len() as f64, 1),
            median: round_to(percentile_cont(&rets, 0.5).unwrap_or(0.0), 1),
            count: rets.len(),
        })
        .collect()
}

pub fn pivot_years(stats: &[YearReturnStat], pick: impl Fn(&YearReturnStat) -> f64) -> YearPivot {
    let years: Vec<i32> = stats
        .iter()
        .map(|s| s.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut rows: BTreeMap<i64, Vec<Option<f64>>> = BTreeMap::new();
    for s in stats {
        let row = rows.entry(s.hits).or_insert_with(|| vec![None; years.len()]);
        if let Ok(i) = years.binary_search(&s.year) {
            row[i] = Some(pick(s));
        }
    }
    YearPivot {
        years,
        rows: rows
            .into_iter()
            .map(|(hits, values)| YearPivotRow { hits, values })
            .collect(),
    }
}
