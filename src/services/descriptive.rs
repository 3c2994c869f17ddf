use serde::Serialize;
use statrs::statistics::Statistics;

/// 线性插值分位数，与 Postgres `percentile_cont` 和 pandas `quantile` 一致
pub fn percentile_cont(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// 样本标准差 (n - 1)，少于两个值时为 None
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// 一组报酬率的进阶统计
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub skew: f64,
    pub kurtosis: f64,
    /// 平均值为 0 时没有意义
    pub cv: Option<f64>,
    pub q25: f64,
    pub q75: f64,
    pub iqr: f64,
    pub min: f64,
    pub max: f64,
    pub win_rate: f64,
    pub left_tail: usize,
    pub right_tail: usize,
    /// 没有左尾样本时为 None
    pub tail_ratio: Option<f64>,
    pub skew_significance: &'static str,
    pub kurtosis_significance: &'static str,
    pub mean_median_diff: f64,
    pub data_points: usize,
}

/// 左右尾的门槛 (%)
const TAIL_THRESHOLD: f64 = 5.0;

impl DescriptiveStats {
    /// 少于两个有效值时返回 None
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if data.len() < 2 {
            return None;
        }

        let mean = data.iter().mean();
        let median = percentile_cont(&data, 0.5)?;
        let std = data.iter().std_dev();
        let q25 = percentile_cont(&data, 0.25)?;
        let q75 = percentile_cont(&data, 0.75)?;
        let skew = round_to(adjusted_skew(&data, mean), 3);
        let kurtosis = round_to(adjusted_excess_kurtosis(&data, mean), 3);

        let cv = if mean != 0.0 {
            Some(round_to(std / mean.abs() * 100.0, 2))
        } else {
            None
        };

        let positive = data.iter().filter(|v| **v > 0.0).count();
        let left_tail = data.iter().filter(|v| **v < -TAIL_THRESHOLD).count();
        let right_tail = data.iter().filter(|v| **v > TAIL_THRESHOLD).count();
        let tail_ratio = if left_tail > 0 {
            Some(round_to(right_tail as f64 / left_tail as f64, 2))
        } else {
            None
        };

        let skew_significance = if skew > 0.5 {
            "顯著右偏"
        } else if skew < -0.5 {
            "顯著左偏"
        } else {
            "接近對稱"
        };
        let kurtosis_significance = if kurtosis > 2.0 {
            "高峰態"
        } else if kurtosis < -2.0 {
            "低峰態"
        } else {
            "常態峰態"
        };

        Some(Self {
            mean: round_to(mean, 2),
            median: round_to(median, 2),
            std: round_to(std, 2),
            skew,
            kurtosis,
            cv,
            q25: round_to(q25, 2),
            q75: round_to(q75, 2),
            iqr: round_to(q75 - q25, 2),
            min: min_of(&data),
            max: max_of(&data),
            win_rate: round_to(positive as f64 / data.len() as f64 * 100.0, 1),
            left_tail,
            right_tail,
            tail_ratio,
            skew_significance,
            kurtosis_significance,
            mean_median_diff: round_to(mean - median, 2),
            data_points: data.len(),
        })
    }
}

// pandas Series.skew：调整后的 Fisher-Pearson 系数
fn adjusted_skew(data: &[f64], mean: f64) -> f64 {
    let n = data.len() as f64;
    if n < 3.0 {
        return 0.0;
    }
    let m2 = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m3 = data.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    let g1 = m3 / m2.powf(1.5);
    (n * (n - 1.0)).sqrt() / (n - 2.0) * g1
}

// pandas Series.kurt：无偏的超额峰度
fn adjusted_excess_kurtosis(data: &[f64], mean: f64) -> f64 {
    let n = data.len() as f64;
    if n < 4.0 {
        return 0.0;
    }
    let m2 = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = data.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;
    let g2 = m4 / (m2 * m2) - 3.0;
    (n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0)
}

fn min_of(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max_of(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// 直方图的一个桶
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    pub count: usize,
}

/// 等宽直方图，最后一个桶包含上界
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if data.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = min_of(&data);
    let mut hi = max_of(&data);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &data {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = lo + width * i as f64;
            let upper = lower + width;
            HistogramBin {
                lower,
                upper,
                center: (lower + upper) / 2.0,
                count,
            }
        })
        .collect()
}

/// 分布摘要使用的区间
const DISTRIBUTION_BUCKETS: [(&str, f64, f64); 5] = [
    ("大跌(<-5%)", f64::NEG_INFINITY, -5.0),
    ("小跌", -5.0, -1.0),
    ("持平", -1.0, 1.0),
    ("小漲", 1.0, 5.0),
    ("大漲(>5%)", 5.0, f64::INFINITY),
];

/// 文字版的分布摘要，例如 `大跌(<-5%):3檔(30.0%) / 持平:7檔(70.0%)`
pub fn distribution_summary(values: &[f64]) -> String {
    let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if data.is_empty() {
        return "無數據".to_string();
    }
    let total = data.len() as f64;
    DISTRIBUTION_BUCKETS
        .iter()
        .filter_map(|(label, lo, hi)| {
            let count = data.iter().filter(|v| **v >= *lo && **v < *hi).count();
            (count > 0).then(|| format!("{label}:{count}檔({:.1}%)", count as f64 / total * 100.0))
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

/// 落在 `[q1 - k*IQR, q3 + k*IQR]` 之外的下标；少于 4 个值时不检测
pub fn iqr_outliers(values: &[Option<f64>], k: f64) -> Vec<usize> {
    let data: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if data.len() < 4 {
        return Vec::new();
    }
    let (Some(q1), Some(q3)) = (percentile_cont(&data, 0.25), percentile_cont(&data, 0.75)) else {
        return Vec::new();
    };
    let iqr = q3 - q1;
    let (lower, upper) = (q1 - k * iqr, q3 + k * iqr);
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| match v {
            Some(v) if *v < lower || *v > upper => Some(i),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn percentile_cont_interpolates_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(percentile_cont(&v, 0.5).unwrap(), 2.5);
        assert_relative_eq!(percentile_cont(&v, 0.25).unwrap(), 1.75);
        assert_relative_eq!(percentile_cont(&v, 0.75).unwrap(), 3.25);
        assert_eq!(percentile_cont(&v, 1.0), Some(4.0));
        assert_eq!(percentile_cont(&[], 0.5), None);
    }

    #[test]
    fn stats_match_pandas_reference() {
        // pandas: s = pd.Series([-10, -2, 0, 1, 3, 4, 8, 25])
        let v = [-10.0, -2.0, 0.0, 1.0, 3.0, 4.0, 8.0, 25.0];
        let s = DescriptiveStats::from_values(&v).unwrap();
        assert_relative_eq!(s.mean, 3.63, epsilon = 1e-9);
        assert_relative_eq!(s.median, 2.0, epsilon = 1e-9);
        assert_relative_eq!(s.std, 10.1, epsilon = 1e-9);
        assert_relative_eq!(s.skew, 1.309, epsilon = 1e-9);
        assert_relative_eq!(s.kurtosis, 3.17, epsilon = 1e-9);
        assert_relative_eq!(s.q25, -0.5, epsilon = 1e-9);
        assert_relative_eq!(s.q75, 5.0, epsilon = 1e-9);
        assert_relative_eq!(s.iqr, 5.5, epsilon = 1e-9);
        assert_eq!(s.left_tail, 1);
        assert_eq!(s.right_tail, 2);
        assert_eq!(s.tail_ratio, Some(2.0));
        assert_relative_eq!(s.win_rate, 62.5);
        assert_eq!(s.skew_significance, "顯著右偏");
        assert_eq!(s.kurtosis_significance, "高峰態");
        assert_eq!(s.data_points, 8);
    }

    #[test]
    fn stats_need_two_values_and_flag_zero_mean() {
        assert!(DescriptiveStats::from_values(&[1.0]).is_none());
        assert!(DescriptiveStats::from_values(&[f64::NAN, 1.0]).is_none());

        let s = DescriptiveStats::from_values(&[-1.0, 1.0]).unwrap();
        assert_eq!(s.cv, None);
        assert_eq!(s.tail_ratio, None);
        assert_eq!(s.skew, 0.0);
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let v = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let h = histogram(&v, 5);
        assert_eq!(h.len(), 5);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), v.len());
        assert_eq!(h[4].count, 1);
        assert_relative_eq!(h[0].center, 1.0);
        assert!(histogram(&[], 25).is_empty());
        assert_eq!(histogram(&[3.0, 3.0], 4).iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn distribution_summary_skips_empty_buckets() {
        let text = distribution_summary(&[-10.0, 0.0, 0.5, 7.0]);
        assert_eq!(text, "大跌(<-5%):1檔(25.0%) / 持平:2檔(50.0%) / 大漲(>5%):1檔(25.0%)");
        assert_eq!(distribution_summary(&[]), "無數據");
    }

    #[test]
    fn iqr_outliers_flag_far_values() {
        let v = [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0), Some(100.0)];
        assert_eq!(iqr_outliers(&v, 1.5), vec![5]);
        assert!(iqr_outliers(&[Some(1.0), Some(50.0)], 1.5).is_empty());
    }
}
