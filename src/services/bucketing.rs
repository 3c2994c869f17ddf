use serde::{Deserialize, Serialize};

/// 年度涨幅分组方案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinScheme {
    /// 收盘价版：下跌每 10% 一档，上涨每 100% 一档，共 22 档
    CloseGradient,
    /// 最高价版：只有上涨区间，每 100% 一档，共 11 档
    HighPotential,
}

/// 一个涨幅区间。`upper` 为开区间上界，`None` 表示无上界
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnBin {
    pub order: i32,
    pub label: &'static str,
    pub upper: Option<f64>,
    /// 第 0 档 (`<= -100%`) 的上界是闭区间
    #[serde(skip)]
    pub upper_inclusive: bool,
    pub decline: bool,
}

const fn bin(order: i32, label: &'static str, upper: f64, decline: bool) -> ReturnBin {
    ReturnBin {
        order,
        label,
        upper: Some(upper),
        upper_inclusive: false,
        decline,
    }
}

static CLOSE_BINS: [ReturnBin; 22] = [
    ReturnBin {
        order: 0,
        label: "00. 下跌-100%以下",
        upper: Some(-100.0),
        upper_inclusive: true,
        decline: true,
    },
    bin(1, "01. 下跌-100%至-90%", -90.0, true),
    bin(2, "02. 下跌-90%至-80%", -80.0, true),
    bin(3, "03. 下跌-80%至-70%", -70.0, true),
    bin(4, "04. 下跌-70%至-60%", -60.0, true),
    bin(5, "05. 下跌-60%至-50%", -50.0, true),
    bin(6, "06. 下跌-50%至-40%", -40.0, true),
    bin(7, "07. 下跌-40%至-30%", -30.0, true),
    bin(8, "08. 下跌-30%至-20%", -20.0, true),
    bin(9, "09. 下跌-20%至-10%", -10.0, true),
    bin(10, "10. 下跌-10%至0%", 0.0, true),
    bin(11, "11. 上漲0-100%", 100.0, false),
    bin(12, "12. 上漲100-200%", 200.0, false),
    bin(13, "13. 上漲200-300%", 300.0, false),
    bin(14, "14. 上漲300-400%", 400.0, false),
    bin(15, "15. 上漲400-500%", 500.0, false),
    bin(16, "16. 上漲500-600%", 600.0, false),
    bin(17, "17. 上漲600-700%", 700.0, false),
    bin(18, "18. 上漲700-800%", 800.0, false),
    bin(19, "19. 上漲800-900%", 900.0, false),
    bin(20, "20. 上漲900-1000%", 1000.0, false),
    ReturnBin {
        order: 21,
        label: "21. 上漲1000%以上",
        upper: None,
        upper_inclusive: false,
        decline: false,
    },
];

static HIGH_BINS: [ReturnBin; 11] = [
    bin(1, "01. 上漲0-100%", 100.0, false),
    bin(2, "02. 上漲100-200%", 200.0, false),
    bin(3, "03. 上漲200-300%", 300.0, false),
    bin(4, "04. 上漲300-400%", 400.0, false),
    bin(5, "05. 上漲400-500%", 500.0, false),
    bin(6, "06. 上漲500-600%", 600.0, false),
    bin(7, "07. 上漲600-700%", 700.0, false),
    bin(8, "08. 上漲700-800%", 800.0, false),
    bin(9, "09. 上漲800-900%", 900.0, false),
    bin(10, "10. 上漲900-1000%", 1000.0, false),
    ReturnBin {
        order: 11,
        label: "11. 上漲1000%以上",
        upper: None,
        upper_inclusive: false,
        decline: false,
    },
];

impl BinScheme {
    pub fn bins(self) -> &'static [ReturnBin] {
        match self {
            BinScheme::CloseGradient => &CLOSE_BINS,
            BinScheme::HighPotential => &HIGH_BINS,
        }
    }

    pub fn find(self, order: i32) -> Option<&'static ReturnBin> {
        self.bins().iter().find(|b| b.order == order)
    }

    /// 按表顺序取第一个满足上界条件的区间，最后一档兜底
    pub fn assign(self, annual_return: f64) -> &'static ReturnBin {
        let bins = self.bins();
        bins.iter()
            .find(|b| match b.upper {
                Some(upper) if b.upper_inclusive => annual_return <= upper,
                Some(upper) => annual_return < upper,
                None => true,
            })
            .unwrap_or(&bins[bins.len() - 1])
    }

    /// 生成区间标签的 CASE 表达式
    pub fn sql_label_case(self, expr: &str) -> String {
        self.sql_case(expr, |b| format!("'{}'", b.label.replace('\'', "''")))
    }

    /// 生成区间序号的 CASE 表达式，用于排序与筛选
    pub fn sql_order_case(self, expr: &str) -> String {
        self.sql_case(expr, |b| b.order.to_string())
    }

    fn sql_case(self, expr: &str, value: impl Fn(&ReturnBin) -> String) -> String {
        let mut sql = String::from("CASE");
        let mut fallback = None;
        for b in self.bins() {
            match b.upper {
                Some(upper) => {
                    let op = if b.upper_inclusive { "<=" } else { "<" };
                    sql.push_str(&format!(" WHEN {expr} {op} {upper} THEN {}", value(b)));
                }
                None => fallback = Some(value(b)),
            }
        }
        if let Some(v) = fallback {
            sql.push_str(&format!(" ELSE {v}"));
        }
        sql.push_str(" END");
        sql
    }
}

/// 年度涨幅百分比；开盘价无效时返回 None
pub fn annual_return(year_open: f64, price: f64) -> Option<f64> {
    if !year_open.is_finite() || !price.is_finite() || year_open <= 0.0 {
        return None;
    }
    Some((price - year_open) / year_open * 100.0)
}

/// SQL 版本的年度涨幅表达式
pub fn sql_annual_return(price_column: &str) -> String {
    format!("(({price_column}::float8 - year_open::float8) / year_open::float8) * 100")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annual_return_uses_open_as_base() {
        assert_eq!(annual_return(100.0, 150.0), Some(50.0));
        assert_eq!(annual_return(50.0, 25.0), Some(-50.0));
        assert_eq!(annual_return(0.0, 10.0), None);
        assert_eq!(annual_return(-1.0, 10.0), None);
    }

    #[test]
    fn close_scheme_boundaries() {
        let s = BinScheme::CloseGradient;
        assert_eq!(s.assign(-100.0).order, 0);
        assert_eq!(s.assign(-150.0).order, 0);
        assert_eq!(s.assign(-99.9).order, 1);
        assert_eq!(s.assign(-90.0).order, 2);
        assert_eq!(s.assign(-0.0001).order, 10);
        assert_eq!(s.assign(0.0).order, 11);
        assert_eq!(s.assign(99.99).order, 11);
        assert_eq!(s.assign(100.0).order, 12);
        assert_eq!(s.assign(999.99).order, 20);
        assert_eq!(s.assign(1000.0).order, 21);
        assert_eq!(s.assign(5000.0).order, 21);
    }

    #[test]
    fn high_scheme_boundaries() {
        let s = BinScheme::HighPotential;
        assert_eq!(s.assign(0.0).order, 1);
        assert_eq!(s.assign(-3.0).order, 1);
        assert_eq!(s.assign(100.0).order, 2);
        assert_eq!(s.assign(1000.0).order, 11);
        assert!(s.bins().iter().all(|b| !b.decline));
    }

    #[test]
    fn labels_sort_in_bin_order() {
        for scheme in [BinScheme::CloseGradient, BinScheme::HighPotential] {
            let labels: Vec<_> = scheme.bins().iter().map(|b| b.label).collect();
            let mut sorted = labels.clone();
            sorted.sort();
            assert_eq!(labels, sorted);
        }
    }

    #[test]
    fn decline_flag_splits_close_scheme_at_zero() {
        let s = BinScheme::CloseGradient;
        assert_eq!(s.bins().iter().filter(|b| b.decline).count(), 11);
        assert!(s.find(10).unwrap().decline);
        assert!(!s.find(11).unwrap().decline);
        assert!(s.find(22).is_none());
    }

    #[test]
    fn sql_case_mirrors_lookup_table() {
        let sql = BinScheme::CloseGradient.sql_order_case("r");
        assert!(sql.starts_with("CASE WHEN r <= -100 THEN 0 WHEN r < -90 THEN 1"));
        assert!(sql.ends_with("WHEN r < 1000 THEN 20 ELSE 21 END"));

        let labels = BinScheme::HighPotential.sql_label_case("r");
        assert!(labels.contains("WHEN r < 100 THEN '01. 上漲0-100%'"));
        assert!(labels.ends_with("ELSE '11. 上漲1000%以上' END"));
    }
}
