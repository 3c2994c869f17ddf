use bigdecimal::BigDecimal;
use diesel::prelude::*;

use crate::models::research::PriceBasis;
use crate::services::bucketing::annual_return;
use crate::utils::decimal::to_f64;

/// stock_annual_k 的一行，`year` 为公历年字符串
#[derive(Queryable, Debug, Clone)]
pub struct AnnualPrice {
    pub symbol: String,
    pub year: String,
    pub year_open: Option<BigDecimal>,
    pub year_high: Option<BigDecimal>,
    pub year_close: Option<BigDecimal>,
}

impl AnnualPrice {
    /// `2330.TW` -> `2330`
    pub fn stock_id(&self) -> &str {
        self.symbol.split('.').next().unwrap_or(&self.symbol)
    }

    pub fn annual_return(&self, basis: PriceBasis) -> Option<f64> {
        let open = to_f64(self.year_open.as_ref())?;
        let price = match basis {
            PriceBasis::Close => to_f64(self.year_close.as_ref())?,
            PriceBasis::High => to_f64(self.year_high.as_ref())?,
        };
        annual_return(open, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Option<BigDecimal> {
        Some(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn returns_follow_price_basis() {
        let p = AnnualPrice {
            symbol: "2330.TW".to_string(),
            year: "2024".to_string(),
            year_open: dec("100"),
            year_high: dec("250"),
            year_close: dec("180"),
        };
        assert_eq!(p.stock_id(), "2330");
        assert_eq!(p.annual_return(PriceBasis::Close), Some(80.0));
        assert_eq!(p.annual_return(PriceBasis::High), Some(150.0));
    }

    #[test]
    fn missing_or_zero_open_has_no_return() {
        let p = AnnualPrice {
            symbol: "1101".to_string(),
            year: "2024".to_string(),
            year_open: dec("0"),
            year_high: None,
            year_close: dec("10"),
        };
        assert_eq!(p.stock_id(), "1101");
        assert_eq!(p.annual_return(PriceBasis::Close), None);
        assert_eq!(p.annual_return(PriceBasis::High), None);
    }
}
