use axum::{
    extract::{Path, State},
    Json,
};

use crate::api_models::heatmap::LEADER_LIMITS;
use crate::api_models::market::{
    AnnualReturnPoint, LabeledOption, LatestDateResponse, OptionsResponse, RevenuePoint,
    StockRevenueResponse,
};
use crate::app::AppState;
use crate::handler::connection;
use crate::handler::error::AppError;
use crate::models::research::{Metric, PriceBasis, DEFAULT_YEAR, SUPPORTED_YEARS};
use crate::repositories::market_data;
use crate::services::probability::GROWTH_OPTIONS;
use crate::services::statistic::StatMethod;
use crate::services::timing::{Stage, THRESHOLD_MAX, THRESHOLD_MIN};

/// 行情资料的最新日期；查询失败时返回 null 而不是错误
pub async fn latest_date(State(state): State<AppState>) -> Json<LatestDateResponse> {
    let latest_date = match connection(&state) {
        Ok(mut conn) => market_data::latest_price_date(&mut conn).unwrap_or_else(|e| {
            tracing::warn!("Failed to read latest price date: {}", e);
            None
        }),
        Err(_) => None,
    };
    Json(LatestDateResponse { latest_date })
}

fn valid_stock_id(stock_id: &str) -> bool {
    !stock_id.is_empty()
        && stock_id.len() <= 10
        && stock_id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// 个股的月营收成长与历年报酬
pub async fn stock_revenue(
    State(state): State<AppState>,
    Path(stock_id): Path<String>,
) -> Result<Json<StockRevenueResponse>, AppError> {
    if !valid_stock_id(&stock_id) {
        return Err(AppError::BadRequest("invalid stock id".to_string()));
    }

    let mut conn = connection(&state)?;
    let revenue_rows = market_data::revenue_history(&mut conn, &stock_id)
        .map_err(|e| AppError::query_failed("Revenue history query", e))?;
    let annual_rows = market_data::annual_history(&mut conn, &stock_id)
        .map_err(|e| AppError::query_failed("Annual history query", e))?;

    if revenue_rows.is_empty() && annual_rows.is_empty() {
        return Err(AppError::NotFound);
    }

    let stock_name = revenue_rows.iter().rev().find_map(|r| r.stock_name.clone());
    let revenue = revenue_rows
        .iter()
        .map(|r| RevenuePoint {
            report_month: r.report_month.clone(),
            month: r.report().map(|m| m.display()),
            yoy_pct: r.metric(Metric::Yoy),
            mom_pct: r.metric(Metric::Mom),
            remark: r.meaningful_remark().map(str::to_string),
        })
        .collect();
    let annual = annual_rows
        .iter()
        .map(|a| AnnualReturnPoint {
            year: a.year.clone(),
            close_return: a.annual_return(PriceBasis::Close),
            high_return: a.annual_return(PriceBasis::High),
        })
        .collect();

    Ok(Json(StockRevenueResponse {
        stock_id,
        stock_name,
        revenue,
        annual,
    }))
}

/// 各页面下拉选单的可选值
pub async fn options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        years: SUPPORTED_YEARS.collect(),
        default_year: DEFAULT_YEAR,
        metrics: [Metric::Yoy, Metric::Mom]
            .into_iter()
            .map(|m| LabeledOption { value: m, label: m.label() })
            .collect(),
        methods: StatMethod::ALL
            .into_iter()
            .map(|m| LabeledOption { value: m, label: m.title() })
            .collect(),
        price_bases: [PriceBasis::Close, PriceBasis::High]
            .into_iter()
            .map(|b| LabeledOption { value: b, label: b.edition() })
            .collect(),
        growth_options: GROWTH_OPTIONS.to_vec(),
        threshold_range: (THRESHOLD_MIN, THRESHOLD_MAX),
        stages: Stage::ALL
            .into_iter()
            .map(|s| LabeledOption { value: s, label: s.label() })
            .collect(),
        leader_limits: LEADER_LIMITS.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_id_must_be_short_alphanumeric() {
        assert!(valid_stock_id("2330"));
        assert!(valid_stock_id("00878"));
        assert!(!valid_stock_id(""));
        assert!(!valid_stock_id("23_0"));
        assert!(!valid_stock_id("2330%"));
    }
}
