use serde::{Deserialize, Serialize};

use crate::services::color_scale::ColorScale;
use crate::services::descriptive::{percentile_cont, sample_std_dev};

/// 每个涨幅区间内营收指标的统计方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatMethod {
    #[default]
    Median,
    Mean,
    StdDev,
    CoefficientOfVariation,
    Skewness,
    Kurtosis,
    Iqr,
    PositiveRate,
}

impl StatMethod {
    pub const ALL: [StatMethod; 8] = [
        StatMethod::Median,
        StatMethod::Mean,
        StatMethod::StdDev,
        StatMethod::CoefficientOfVariation,
        StatMethod::Skewness,
        StatMethod::Kurtosis,
        StatMethod::Iqr,
        StatMethod::PositiveRate,
    ];

    /// 下拉选单上的完整名称
    pub fn title(self) -> &'static str {
        match self {
            StatMethod::Median => "中位數 (排除極端值)",
            StatMethod::Mean => "平均值 (含極端值)",
            StatMethod::StdDev => "標準差 (波動程度)",
            StatMethod::CoefficientOfVariation => "變異係數 (相對波動)",
            StatMethod::Skewness => "偏度 (分佈形狀)",
            StatMethod::Kurtosis => "峰度 (尾部厚度)",
            StatMethod::Iqr => "四分位距 (離散程度)",
            StatMethod::PositiveRate => "正樣本比例",
        }
    }

    /// 色条上的简短名称
    pub fn label(self) -> &'static str {
        match self {
            StatMethod::Median => "中位數",
            StatMethod::Mean => "平均值",
            StatMethod::StdDev => "標準差",
            StatMethod::CoefficientOfVariation => "變異係數%",
            StatMethod::Skewness => "偏度",
            StatMethod::Kurtosis => "峰度",
            StatMethod::Iqr => "四分位距",
            StatMethod::PositiveRate => "正增長比例%",
        }
    }

    pub fn color_scale(self) -> ColorScale {
        match self {
            StatMethod::StdDev | StatMethod::CoefficientOfVariation | StatMethod::Iqr => {
                ColorScale::Blues
            }
            StatMethod::Skewness => ColorScale::RdBu,
            StatMethod::Kurtosis => ColorScale::Viridis,
            StatMethod::PositiveRate => ColorScale::Greens,
            StatMethod::Median | StatMethod::Mean => ColorScale::RdYlGn,
        }
    }

    /// 热力图上显示的小数位数
    pub fn precision(self) -> usize {
        match self {
            StatMethod::CoefficientOfVariation | StatMethod::Skewness | StatMethod::Kurtosis => 2,
            _ => 1,
        }
    }

    /// 是否依赖 percentile_cont
    pub fn needs_percentile(self) -> bool {
        matches!(self, StatMethod::Median | StatMethod::Iqr)
    }

    /// Postgres 聚合表达式。`x` 必须是 float8 表达式
    ///
    /// 偏度与峰度用原点矩展开，因为 Postgres 不允许聚合嵌套
    pub fn sql_aggregate(self, x: &str) -> String {
        let mean = format!("AVG({x})");
        let sd = format!("STDDEV({x})");
        match self {
            StatMethod::Median => format!("percentile_cont(0.5) WITHIN GROUP (ORDER BY {x})"),
            StatMethod::Mean => mean,
            StatMethod::StdDev => sd,
            StatMethod::CoefficientOfVariation => format!(
                "CASE WHEN {mean} = 0 THEN 0 ELSE ({sd} / ABS({mean})) * 100 END"
            ),
            StatMethod::Skewness => {
                // E[(x-m)^3] = E[x^3] - 3m E[x^2] + 2m^3
                let m3 = format!(
                    "(AVG(POWER({x}, 3)) - 3 * {mean} * AVG(POWER({x}, 2)) + 2 * POWER({mean}, 3))"
                );
                format!(
                    "CASE WHEN COALESCE({sd}, 0) = 0 THEN 0 ELSE {m3} / POWER({sd}, 3) END"
                )
            }
            StatMethod::Kurtosis => {
                // E[(x-m)^4] = E[x^4] - 4m E[x^3] + 6m^2 E[x^2] - 3m^4
                let m4 = format!(
                    "(AVG(POWER({x}, 4)) - 4 * {mean} * AVG(POWER({x}, 3)) \
                     + 6 * POWER({mean}, 2) * AVG(POWER({x}, 2)) - 3 * POWER({mean}, 4))"
                );
                format!(
                    "CASE WHEN COALESCE({sd}, 0) = 0 THEN 0 ELSE {m4} / POWER({sd}, 4) - 3 END"
                )
            }
            StatMethod::Iqr => format!(
                "percentile_cont(0.75) WITHIN GROUP (ORDER BY {x}) \
                 - percentile_cont(0.25) WITHIN GROUP (ORDER BY {x})"
            ),
            StatMethod::PositiveRate => {
                format!("SUM(CASE WHEN {x} > 0 THEN 1 ELSE 0 END) * 100.0 / COUNT(*)")
            }
        }
    }

    /// 与 `sql_aggregate` 同口径的内存计算，percentile_cont 不可用时使用
    pub fn evaluate(self, values: &[f64]) -> Option<f64> {
        let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let sd = sample_std_dev(&values);
        let central = |k: i32| values.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / n;

        match self {
            StatMethod::Median => percentile_cont(&values, 0.5),
            StatMethod::Mean => Some(mean),
            StatMethod::StdDev => sd,
            StatMethod::CoefficientOfVariation => {
                if mean == 0.0 {
                    Some(0.0)
                } else {
                    sd.map(|s| s / mean.abs() * 100.0)
                }
            }
            StatMethod::Skewness => match sd {
                Some(s) if s != 0.0 => Some(central(3) / s.powi(3)),
                _ => Some(0.0),
            },
            StatMethod::Kurtosis => match sd {
                Some(s) if s != 0.0 => Some(central(4) / s.powi(4) - 3.0),
                _ => Some(0.0),
            },
            StatMethod::Iqr => {
                Some(percentile_cont(&values, 0.75)? - percentile_cont(&values, 0.25)?)
            }
            StatMethod::PositiveRate => {
                let positive = values.iter().filter(|v| **v > 0.0).count() as f64;
                Some(positive * 100.0 / n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_median_agree_on_symmetric_data() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(StatMethod::Mean.evaluate(&v).unwrap(), 3.0);
        assert_relative_eq!(StatMethod::Median.evaluate(&v).unwrap(), 3.0);
        assert_relative_eq!(StatMethod::Skewness.evaluate(&v).unwrap(), 0.0);
    }

    #[test]
    fn median_resists_outlier_while_mean_moves() {
        let v = [1.0, 2.0, 3.0, 4.0, 1000.0];
        assert_relative_eq!(StatMethod::Median.evaluate(&v).unwrap(), 3.0);
        assert!(StatMethod::Mean.evaluate(&v).unwrap() > 200.0);
        assert!(StatMethod::Skewness.evaluate(&v).unwrap() > 0.0);
    }

    #[test]
    fn coefficient_of_variation_is_zero_for_zero_mean() {
        let v = [-2.0, 2.0];
        assert_eq!(StatMethod::CoefficientOfVariation.evaluate(&v), Some(0.0));

        let w = [10.0, 20.0, 30.0];
        assert_relative_eq!(
            StatMethod::CoefficientOfVariation.evaluate(&w).unwrap(),
            50.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn single_value_has_no_std_dev() {
        assert_eq!(StatMethod::StdDev.evaluate(&[4.0]), None);
        assert_eq!(StatMethod::Kurtosis.evaluate(&[4.0]), Some(0.0));
        assert_eq!(StatMethod::Mean.evaluate(&[]), None);
    }

    #[test]
    fn iqr_and_positive_rate() {
        let v = [-1.0, 0.0, 1.0, 2.0, 3.0];
        assert_relative_eq!(StatMethod::Iqr.evaluate(&v).unwrap(), 2.0);
        assert_relative_eq!(StatMethod::PositiveRate.evaluate(&v).unwrap(), 60.0);
    }

    #[test]
    fn kurtosis_of_two_point_distribution() {
        // population m4/m2^2 = 1, scaled by the sample sd
        let v = [-1.0, 1.0, -1.0, 1.0];
        let sd = (4.0_f64 / 3.0).sqrt();
        let expected = 1.0 / sd.powi(4) - 3.0;
        assert_relative_eq!(StatMethod::Kurtosis.evaluate(&v).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn sql_aggregate_selects_formula_by_method() {
        assert_eq!(StatMethod::Mean.sql_aggregate("x"), "AVG(x)");
        assert!(StatMethod::Median.sql_aggregate("x").contains("percentile_cont(0.5)"));
        assert!(StatMethod::Iqr.sql_aggregate("x").contains("percentile_cont(0.75)"));
        assert!(StatMethod::Kurtosis.sql_aggregate("x").ends_with("- 3 END"));
        assert!(!StatMethod::Skewness.sql_aggregate("x").contains("AVG(POWER((x - AVG"));
        assert!(StatMethod::Median.needs_percentile());
        assert!(!StatMethod::Mean.needs_percentile());
    }

    #[test]
    fn presentation_follows_method() {
        assert_eq!(StatMethod::Skewness.color_scale(), ColorScale::RdBu);
        assert_eq!(StatMethod::Iqr.color_scale(), ColorScale::Blues);
        assert_eq!(StatMethod::Median.color_scale(), ColorScale::RdYlGn);
        assert_eq!(StatMethod::Kurtosis.precision(), 2);
        assert_eq!(StatMethod::Mean.precision(), 1);
        assert_eq!(StatMethod::ALL.len(), 8);
    }
}
