use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};

use crate::api_models::probability::{
    DetailItem, DetailRequest, DetailResponse, MultiYearResponse, ProbabilityRequest,
    ProbabilityResponse,
};
use crate::app::AppState;
use crate::handler::error::AppError;
use crate::handler::{connection, research_window};
use crate::models::research::ResearchWindow;
use crate::repositories::burst_probability::{self, PgPoolConn};
use crate::services::probability::{
    aggregate_raw, best_group, multi_year_stats, pivot_years, score_groups,
    validate_growth_range, BurstGroupStats, DetailSummary, RightSkewShare,
};
use crate::services::prompt::{ProbabilityBrief, PromptResponse};

/// 多年度对照取分析年度前两年到后一年
const YEARS_BEFORE: i32 = 2;
const YEARS_AFTER: i32 = 1;

fn validated(year: i32, low: i32, high: i32) -> Result<ResearchWindow, AppError> {
    let window = research_window(year)?;
    validate_growth_range(low, high).map_err(AppError::BadRequest)?;
    Ok(window)
}

fn load_groups(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    payload: &ProbabilityRequest,
) -> Result<Vec<BurstGroupStats>, AppError> {
    let groups = match burst_probability::query_burst_groups(
        conn,
        window,
        payload.metric,
        payload.price_basis,
        payload.low,
        payload.high,
    ) {
        Ok(rows) => rows
            .into_iter()
            .map(|r| BurstGroupStats {
                hits: r.hits,
                stock_count: r.stock_count,
                avg_return: r.avg_return,
                median_return: r.median_return,
                win_rate: r.win_rate,
                double_rate: r.double_rate,
                min_return: r.min_return,
                max_return: r.max_return,
                std_dev: r.std_dev,
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Burst group query failed, computing in memory: {}", e);
            let rows = burst_probability::query_burst_raw(
                conn,
                window,
                payload.metric,
                payload.price_basis,
                payload.low,
                payload.high,
            )
            .map_err(|e| AppError::query_failed("Burst raw query", e))?;
            aggregate_raw(rows.into_iter().map(|r| (r.hits, r.ret)))
        }
    };
    Ok(groups.into_iter().map(BurstGroupStats::rounded).collect())
}

fn cached_groups(
    state: &AppState,
    payload: &ProbabilityRequest,
) -> Result<Arc<Vec<BurstGroupStats>>, AppError> {
    let window = validated(payload.year, payload.low, payload.high)?;
    let key = (
        payload.year,
        payload.metric,
        payload.price_basis,
        payload.low,
        payload.high,
    );
    state.caches.probability.get_or_try_insert_with(&key, || {
        let mut conn = connection(state)?;
        load_groups(&mut conn, &window, payload)
    })
}

/// 按爆发次数分组的年度报酬与期望值评分
pub async fn query_probability(
    State(state): State<AppState>,
    Json(payload): Json<ProbabilityRequest>,
) -> Result<Json<ProbabilityResponse>, AppError> {
    let groups = cached_groups(&state, &payload)?;
    let scores = score_groups(&groups);
    let best = best_group(&scores).cloned();
    let right_skew = RightSkewShare::from_scores(&scores);

    Ok(Json(ProbabilityResponse {
        year: payload.year,
        metric: payload.metric,
        price_basis: payload.price_basis,
        low: payload.low,
        high: payload.high,
        total_stocks: groups.iter().map(|g| g.stock_count).sum(),
        groups: groups.to_vec(),
        scores,
        best,
        right_skew,
    }))
}

/// 某个爆发次数的股票名单
pub async fn query_detail(
    State(state): State<AppState>,
    Json(payload): Json<DetailRequest>,
) -> Result<Json<DetailResponse>, AppError> {
    let window = validated(payload.year, payload.low, payload.high)?;
    if payload.hits < 1 {
        return Err(AppError::BadRequest("hits must be at least 1".to_string()));
    }

    let mut conn = connection(&state)?;
    let rows = burst_probability::query_burst_detail(
        &mut conn,
        &window,
        payload.metric,
        payload.price_basis,
        payload.low,
        payload.high,
        payload.hits,
    )
    .map_err(|e| AppError::query_failed("Burst detail query", e))?;

    let returns: Vec<Option<f64>> = rows.iter().map(|r| r.annual_return).collect();
    let items = rows
        .into_iter()
        .map(|r| DetailItem {
            stock_id: r.stock_id,
            stock_name: r.stock_name,
            hits: r.hits,
            annual_return: r.annual_return,
            avg_growth: r.avg_growth,
            remarks: r.remarks,
        })
        .collect();

    Ok(Json(DetailResponse {
        hits: payload.hits,
        summary: DetailSummary::from_returns(&returns),
        items,
    }))
}

/// 爆发股票在前后几个年度的报酬对照
pub async fn query_multi_year(
    State(state): State<AppState>,
    Json(payload): Json<ProbabilityRequest>,
) -> Result<Json<MultiYearResponse>, AppError> {
    let window = validated(payload.year, payload.low, payload.high)?;
    let from_year = payload.year - YEARS_BEFORE;
    let to_year = payload.year + YEARS_AFTER;

    let mut conn = connection(&state)?;
    let stocks = burst_probability::query_burst_stocks(
        &mut conn,
        &window,
        payload.metric,
        payload.low,
        payload.high,
    )
    .map_err(|e| AppError::query_failed("Burst stock list query", e))?;

    let hits_by_stock: BTreeMap<String, i64> =
        stocks.into_iter().map(|s| (s.stock_id, s.hits)).collect();
    let stats = if hits_by_stock.is_empty() {
        Vec::new()
    } else {
        let ids: Vec<String> = hits_by_stock.keys().cloned().collect();
        let rows = burst_probability::query_year_returns(
            &mut conn,
            &ids,
            payload.price_basis,
            from_year,
            to_year,
        )
        .map_err(|e| AppError::query_failed("Multi-year return query", e))?;
        multi_year_stats(
            &hits_by_stock,
            rows.into_iter().map(|r| (r.stock_id, r.year, r.annual_return)),
        )
    };

    Ok(Json(MultiYearResponse {
        year: payload.year,
        from_year,
        to_year,
        stock_count: hits_by_stock.len(),
        mean_pivot: pivot_years(&stats, |s| s.mean),
        median_pivot: pivot_years(&stats, |s| s.median),
        stats,
    }))
}

pub async fn probability_prompt(
    State(state): State<AppState>,
    Json(payload): Json<ProbabilityRequest>,
) -> Result<Json<PromptResponse>, AppError> {
    let groups = cached_groups(&state, &payload)?;
    let prompt = ProbabilityBrief {
        year: payload.year,
        metric: payload.metric,
        basis: payload.price_basis,
        low: payload.low,
        high: payload.high,
        groups: &groups,
    }
    .render();

    Ok(Json(PromptResponse::new(prompt)))
}
