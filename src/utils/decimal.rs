use bigdecimal::{BigDecimal, ToPrimitive};

/// 将 Numeric 列转为 f64
///
/// - NULL 或无法表示为有限 f64 时返回 None
pub fn to_f64(v: Option<&BigDecimal>) -> Option<f64> {
    v.and_then(|d| d.to_f64()).filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn converts_numeric_values() {
        let d = BigDecimal::from_str("123.45").unwrap();
        assert_eq!(to_f64(Some(&d)), Some(123.45));
        assert_eq!(to_f64(None), None);
        let neg = BigDecimal::from_str("-0.5").unwrap();
        assert_eq!(to_f64(Some(&neg)), Some(-0.5));
    }
}
