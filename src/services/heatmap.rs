use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::research::ReportMonth;
use crate::services::bucketing::BinScheme;
use crate::services::color_scale::{text_color_for, ColorScale, EMPTY_CELL};
use crate::services::statistic::StatMethod;

/// 一个（区间, 月份）单元格的聚合结果
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapCell {
    pub bin_order: i32,
    pub bin_label: String,
    pub report_month: String,
    pub value: Option<f64>,
    pub stock_count: i64,
    pub data_points: i64,
    pub avg_return: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapRow {
    pub bin_order: i32,
    pub bin_label: String,
    pub values: Vec<Option<f64>>,
    pub stock_counts: Vec<Option<i64>>,
}

/// 行为涨幅区间、列为报表月份的透视表
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapGrid {
    pub months: Vec<String>,
    pub month_labels: Vec<String>,
    pub rows: Vec<HeatmapRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapOverview {
    pub total_samples: i64,
    pub months: usize,
    pub data_points: i64,
    pub completeness: f64,
}

impl HeatmapGrid {
    pub fn pivot(cells: &[HeatmapCell]) -> Self {
        let months: Vec<String> = cells
            .iter()
            .map(|c| c.report_month.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let column: BTreeMap<&str, usize> = months
            .iter()
            .enumerate()
            .map(|(i, m)| (m.as_str(), i))
            .collect();

        let mut rows: BTreeMap<i32, HeatmapRow> = BTreeMap::new();
        for cell in cells {
            let row = rows.entry(cell.bin_order).or_insert_with(|| HeatmapRow {
                bin_order: cell.bin_order,
                bin_label: cell.bin_label.clone(),
                values: vec![None; months.len()],
                stock_counts: vec![None; months.len()],
            });
            if let Some(&i) = column.get(cell.report_month.as_str()) {
                row.values[i] = cell.value.filter(|v| v.is_finite());
                row.stock_counts[i] = Some(cell.stock_count);
            }
        }

        let month_labels = months
            .iter()
            .map(|m| ReportMonth::parse(m).map(|r| r.display()).unwrap_or_else(|| m.clone()))
            .collect();

        Self {
            months,
            month_labels,
            rows: rows.into_values().collect(),
        }
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .flat_map(|r| r.values.iter().flatten().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn filled_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.values.iter().filter(|v| v.is_some()).count())
            .sum()
    }

    /// 绘制热力图。单元格颜色按网格内的最小值到最大值映射
    pub fn render_svg(&self, method: StatMethod, title: &str) -> String {
        const CELL_W: usize = 64;
        const CELL_H: usize = 26;
        const LABEL_W: usize = 170;
        const HEADER_H: usize = 56;

        let scale = method.color_scale();
        let range = self.value_range();
        let width = LABEL_W + CELL_W * self.months.len().max(1) + 10;
        let height = HEADER_H + CELL_H * self.rows.len().max(1) + 10;

        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" font-family="sans-serif" font-size="11">"#
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="18" font-size="14" font-weight="bold">{}</text>"#,
            LABEL_W,
            escape(title)
        ));

        for (i, label) in self.month_labels.iter().enumerate() {
            let x = LABEL_W + i * CELL_W + CELL_W / 2;
            svg.push_str(&format!(
                r#"<text x="{x}" y="{}" text-anchor="middle">{}</text>"#,
                HEADER_H - 8,
                escape(label)
            ));
        }

        for (r, row) in self.rows.iter().enumerate() {
            let y = HEADER_H + r * CELL_H;
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="end">{}</text>"#,
                LABEL_W - 6,
                y + CELL_H / 2 + 4,
                escape(&row.bin_label)
            ));
            for (c, value) in row.values.iter().enumerate() {
                let x = LABEL_W + c * CELL_W;
                let Some(v) = value else {
                    svg.push_str(&format!(
                        r##"<g class="empty"><rect x="{x}" y="{y}" width="{CELL_W}" height="{CELL_H}" fill="{EMPTY_CELL}" stroke="#ffffff"/></g>"##
                    ));
                    continue;
                };
                let fill = scale.hex_at(normalize(*v, range));
                svg.push_str(&format!(
                    r##"<rect x="{x}" y="{y}" width="{CELL_W}" height="{CELL_H}" fill="{fill}" stroke="#ffffff"/>"##
                ));
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" text-anchor="middle" fill="{}">{:.*}</text>"#,
                    x + CELL_W / 2,
                    y + CELL_H / 2 + 4,
                    text_color_for(&fill),
                    method.precision(),
                    v
                ));
            }
        }

        svg.push_str("</svg>");
        svg
    }
}

fn normalize(v: f64, range: Option<(f64, f64)>) -> f64 {
    match range {
        Some((lo, hi)) if hi > lo => (v - lo) / (hi - lo),
        _ => 0.5,
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl HeatmapOverview {
    /// 样本数取每个区间各月份股票数的最大值再加总
    pub fn from_cells(cells: &[HeatmapCell]) -> Self {
        let mut per_bin: BTreeMap<i32, i64> = BTreeMap::new();
        let mut months = BTreeSet::new();
        let mut data_points = 0;
        for c in cells {
            let max = per_bin.entry(c.bin_order).or_insert(0);
            *max = (*max).max(c.stock_count);
            months.insert(c.report_month.as_str());
            data_points += c.data_points;
        }
        let total_samples: i64 = per_bin.values().sum();
        let months = months.len();
        let expected = total_samples * months as i64;
        let completeness = if expected > 0 {
            data_points as f64 / expected as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_samples,
            months,
            data_points,
            completeness,
        }
    }
}

/// 每个涨幅区间的营收全维度摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinSummary {
    pub bin_order: i32,
    pub bin_label: String,
    pub decline: bool,
    pub stock_count: i64,
    pub avg_return: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub cv: Option<f64>,
    pub iqr: Option<f64>,
    pub positive_rate: Option<f64>,
}

/// 下跌区间中平均涨幅最低的一档
pub fn worst_decline(summary: &[BinSummary]) -> Option<&BinSummary> {
    summary
        .iter()
        .filter(|b| b.decline)
        .filter_map(|b| b.avg_return.map(|r| (b, r)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(b, _)| b)
}

/// 上涨区间中平均涨幅最高的一档
pub fn best_rise(summary: &[BinSummary]) -> Option<&BinSummary> {
    summary
        .iter()
        .filter(|b| !b.decline)
        .filter_map(|b| b.avg_return.map(|r| (b, r)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(b, _)| b)
}

/// 读取原始数值后在内存中分组求统计值，percentile_cont 不可用时使用
pub fn aggregate_raw(
    rows: impl IntoIterator<Item = (i32, String, String, String, f64, f64)>,
    method: StatMethod,
) -> Vec<HeatmapCell> {
    struct Acc {
        label: String,
        values: Vec<f64>,
        returns: Vec<f64>,
        stocks: BTreeSet<String>,
    }

    let mut groups: BTreeMap<(i32, String), Acc> = BTreeMap::new();
    for (order, label, month, stock_id, value, ret) in rows {
        let acc = groups.entry((order, month)).or_insert_with(|| Acc {
            label,
            values: Vec::new(),
            returns: Vec::new(),
            stocks: BTreeSet::new(),
        });
        acc.values.push(value);
        acc.returns.push(ret);
        acc.stocks.insert(stock_id);
    }

    groups
        .into_iter()
        .map(|((bin_order, report_month), acc)| HeatmapCell {
            bin_order,
            bin_label: acc.label,
            report_month,
            value: method.evaluate(&acc.values),
            stock_count: acc.stocks.len() as i64,
            data_points: acc.values.len() as i64,
            avg_return: StatMethod::Mean.evaluate(&acc.returns),
        })
        .collect()
}

fn extreme(values: &[f64], pick: fn(f64, f64) -> f64) -> Option<f64> {
    values.iter().copied().filter(|v| v.is_finite()).reduce(pick)
}

/// 由原始数值计算区间摘要，与 `aggregate_raw` 使用同样的行
pub fn summarize_raw(
    rows: impl IntoIterator<Item = (i32, String, String, String, f64, f64)>,
    scheme: BinScheme,
) -> Vec<BinSummary> {
    struct Acc {
        label: String,
        values: Vec<f64>,
        returns: Vec<f64>,
        stocks: BTreeSet<String>,
    }

    let mut groups: BTreeMap<i32, Acc> = BTreeMap::new();
    for (order, label, _month, stock_id, value, ret) in rows {
        let acc = groups.entry(order).or_insert_with(|| Acc {
            label,
            values: Vec::new(),
            returns: Vec::new(),
            stocks: BTreeSet::new(),
        });
        acc.values.push(value);
        acc.returns.push(ret);
        acc.stocks.insert(stock_id);
    }

    groups
        .into_iter()
        .map(|(bin_order, acc)| BinSummary {
            bin_order,
            decline: scheme.find(bin_order).map(|b| b.decline).unwrap_or(false),
            bin_label: acc.label,
            stock_count: acc.stocks.len() as i64,
            avg_return: StatMethod::Mean.evaluate(&acc.returns),
            mean: StatMethod::Mean.evaluate(&acc.values),
            median: StatMethod::Median.evaluate(&acc.values),
            std_dev: StatMethod::StdDev.evaluate(&acc.values),
            min: extreme(&acc.values, f64::min),
            max: extreme(&acc.values, f64::max),
            cv: StatMethod::CoefficientOfVariation.evaluate(&acc.values),
            iqr: StatMethod::Iqr.evaluate(&acc.values),
            positive_rate: StatMethod::PositiveRate.evaluate(&acc.values),
        })
        .collect()
}
