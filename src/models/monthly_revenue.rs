use bigdecimal::BigDecimal;
use diesel::prelude::*;

use crate::models::research::{Metric, ReportMonth};
use crate::utils::decimal::to_f64;

/// monthly_revenue 的一行
#[derive(Queryable, Debug, Clone)]
pub struct MonthlyRevenue {
    pub stock_id: String,
    pub stock_name: Option<String>,
    pub report_month: String,
    pub yoy_pct: Option<BigDecimal>,
    pub mom_pct: Option<BigDecimal>,
    pub remark: Option<String>,
}

impl MonthlyRevenue {
    pub fn report(&self) -> Option<ReportMonth> {
        ReportMonth::parse(&self.report_month)
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Yoy => to_f64(self.yoy_pct.as_ref()),
            Metric::Mom => to_f64(self.mom_pct.as_ref()),
        }
    }

    /// `-` 与空字符串视为没有备注
    pub fn meaningful_remark(&self) -> Option<&str> {
        self.remark
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty() && *r != "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn row(remark: Option<&str>) -> MonthlyRevenue {
        MonthlyRevenue {
            stock_id: "2330".to_string(),
            stock_name: Some("台積電".to_string()),
            report_month: "113_07".to_string(),
            yoy_pct: Some(BigDecimal::from_str("44.7").unwrap()),
            mom_pct: None,
            remark: remark.map(str::to_string),
        }
    }

    #[test]
    fn remark_placeholders_are_dropped() {
        assert_eq!(row(Some("-")).meaningful_remark(), None);
        assert_eq!(row(Some("  ")).meaningful_remark(), None);
        assert_eq!(row(None).meaningful_remark(), None);
        assert_eq!(row(Some("AI 訂單")).meaningful_remark(), Some("AI 訂單"));
    }

    #[test]
    fn metric_reads_matching_column() {
        let r = row(None);
        assert_eq!(r.metric(Metric::Yoy), Some(44.7));
        assert_eq!(r.metric(Metric::Mom), None);
        assert_eq!(r.report().map(|m| m.gregorian_year()), Some(2024));
    }
}
