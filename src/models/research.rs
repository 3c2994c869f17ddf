use serde::{Deserialize, Serialize};

/// 民国纪年与公历的差值，`report_month` 使用民国年
pub const MINGUO_OFFSET: i32 = 1911;

pub const DEFAULT_YEAR: i32 = 2024;

/// 可查询的分析年度
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 2020..=2025;

/// 营收成长指标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Yoy,
    Mom,
}

impl Metric {
    /// 对应 monthly_revenue 的列名
    pub fn column(self) -> &'static str {
        match self {
            Metric::Yoy => "yoy_pct",
            Metric::Mom => "mom_pct",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Yoy => "年增率 (YoY)",
            Metric::Mom => "月增率 (MoM)",
        }
    }
}

/// 计算年度涨幅时使用的价格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    /// 年收盘价：实际可实现的报酬
    #[default]
    Close,
    /// 年最高价：理论最大涨幅
    High,
}

impl PriceBasis {
    /// 对应 stock_annual_k 的列名
    pub fn column(self) -> &'static str {
        match self {
            PriceBasis::Close => "year_close",
            PriceBasis::High => "year_high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceBasis::Close => "收盤價",
            PriceBasis::High => "最高價",
        }
    }

    pub fn edition(self) -> &'static str {
        match self {
            PriceBasis::Close => "收盤價 (實戰版)",
            PriceBasis::High => "最高價 (極限版)",
        }
    }
}

/// 区间明细的排序字段，SQL 只会拼进这里列出的列名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderSort {
    #[default]
    AnnualReturn,
    AvgYoy,
    AvgMom,
    StdYoy,
    StdMom,
}

impl LeaderSort {
    pub fn column(self) -> &'static str {
        match self {
            LeaderSort::AnnualReturn => "annual_return",
            LeaderSort::AvgYoy => "avg_yoy",
            LeaderSort::AvgMom => "avg_mom",
            LeaderSort::StdYoy => "std_yoy",
            LeaderSort::StdMom => "std_mom",
        }
    }
}

/// `report_month` 的解析结果，格式为 `<民国年>_<两位月份>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportMonth {
    pub minguo_year: i32,
    pub month: u32,
}

impl ReportMonth {
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('_')?;
        let minguo_year = year.parse::<i32>().ok()?;
        let month = month.parse::<u32>().ok()?;
        if !(1..=12).contains(&month) || month_digits(raw) != 2 {
            return None;
        }
        Some(Self { minguo_year, month })
    }

    pub fn gregorian_year(&self) -> i32 {
        self.minguo_year + MINGUO_OFFSET
    }

    /// 数据库中的原始写法，例如 `113_07`
    pub fn code(&self) -> String {
        format!("{}_{:02}", self.minguo_year, self.month)
    }

    /// 公历写法，例如 `2024-07`
    pub fn display(&self) -> String {
        format!("{}-{:02}", self.gregorian_year(), self.month)
    }
}

fn month_digits(raw: &str) -> usize {
    raw.trim().rsplit('_').next().map(str::len).unwrap_or(0)
}

/// 一个分析年度对应的营收观察期：去年 12 月到当年 11 月，共 12 份报表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResearchWindow {
    pub year: i32,
}

impl ResearchWindow {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    /// 年度不在 `SUPPORTED_YEARS` 内时返回错误信息
    pub fn checked(year: i32) -> Result<Self, String> {
        if SUPPORTED_YEARS.contains(&year) {
            Ok(Self::new(year))
        } else {
            Err(format!(
                "year must be between {} and {}",
                SUPPORTED_YEARS.start(),
                SUPPORTED_YEARS.end()
            ))
        }
    }

    pub fn minguo_year(&self) -> i32 {
        self.year - MINGUO_OFFSET
    }

    /// 去年 12 月的报表
    pub fn previous_december(&self) -> String {
        format!("{}_12", self.minguo_year() - 1)
    }

    /// 当年 12 月的报表（不在观察期内）
    pub fn current_december(&self) -> String {
        format!("{}_12", self.minguo_year())
    }

    /// 当年报表的 LIKE 模式，下划线已转义
    pub fn year_pattern(&self) -> String {
        format!("{}\\_%", self.minguo_year())
    }

    /// 观察期 WHERE 条件，依次占用三个绑定参数：
    /// 去年 12 月、当年 LIKE 模式、当年 12 月
    pub fn sql_predicate(&self, column: &str, first_param: usize) -> String {
        let p = first_param;
        format!(
            "({column} = ${p} OR ({column} LIKE ${} AND {column} < ${} AND LENGTH({column}) <= 7))",
            p + 1,
            p + 2,
        )
    }

    /// 时机研究的月份条件：去年 12 月加上当年全部月份（含当年 12 月），
    /// 依次占用两个绑定参数：去年 12 月、当年 LIKE 模式
    pub fn sql_predicate_through_december(&self, column: &str, first_param: usize) -> String {
        let p = first_param;
        format!(
            "({column} = ${p} OR ({column} LIKE ${} AND LENGTH({column}) <= 7))",
            p + 1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_month_roundtrips_database_code() {
        let m = ReportMonth::parse("113_07").unwrap();
        assert_eq!(m.minguo_year, 113);
        assert_eq!(m.month, 7);
        assert_eq!(m.gregorian_year(), 2024);
        assert_eq!(m.code(), "113_07");
        assert_eq!(m.display(), "2024-07");
    }

    #[test]
    fn report_month_rejects_malformed_codes() {
        assert!(ReportMonth::parse("113_7").is_none());
        assert!(ReportMonth::parse("113_13").is_none());
        assert!(ReportMonth::parse("113-07").is_none());
        assert!(ReportMonth::parse("abc_01").is_none());
    }

    #[test]
    fn window_spans_previous_december_to_november() {
        let w = ResearchWindow::new(2024);
        assert_eq!(w.minguo_year(), 113);
        assert_eq!(w.previous_december(), "112_12");
        assert_eq!(w.current_december(), "113_12");
        assert_eq!(w.year_pattern(), "113\\_%");
    }

    #[test]
    fn only_supported_years_are_accepted() {
        assert!(ResearchWindow::checked(2020).is_ok());
        assert!(ResearchWindow::checked(2025).is_ok());
        assert!(ResearchWindow::checked(2019).is_err());
        assert!(ResearchWindow::checked(2026).is_err());
    }

    #[test]
    fn window_predicate_numbers_placeholders_from_offset() {
        let sql = ResearchWindow::new(2024).sql_predicate("m.report_month", 2);
        assert!(sql.contains("m.report_month = $2"));
        assert!(sql.contains("LIKE $3"));
        assert!(sql.contains("< $4"));
    }

    #[test]
    fn timing_predicate_keeps_current_december() {
        let sql = ResearchWindow::new(2024).sql_predicate_through_december("report_month", 1);
        assert_eq!(
            sql,
            "(report_month = $1 OR (report_month LIKE $2 AND LENGTH(report_month) <= 7))"
        );
        assert!(!sql.contains('<'));
        assert!(!sql.contains("$3"));
    }

    #[test]
    fn metric_and_price_basis_map_to_fixed_columns() {
        assert_eq!(Metric::Yoy.column(), "yoy_pct");
        assert_eq!(Metric::Mom.column(), "mom_pct");
        assert_eq!(PriceBasis::Close.column(), "year_close");
        assert_eq!(PriceBasis::High.column(), "year_high");
        let m: Metric = serde_json::from_str("\"mom\"").unwrap();
        assert_eq!(m, Metric::Mom);
        let sort: LeaderSort = serde_json::from_str("\"std_yoy\"").unwrap();
        assert_eq!(sort.column(), "std_yoy");
        assert_eq!(LeaderSort::default().column(), "annual_return");
    }
}
