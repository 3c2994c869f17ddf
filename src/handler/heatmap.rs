use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::api_models::heatmap::{
    HeatmapRequest, HeatmapResponse, LeaderItem, LeadersRequest, LeadersResponse, SummaryRequest,
    SummaryResponse, LEADER_LIMITS,
};
use crate::app::AppState;
use crate::handler::error::AppError;
use crate::handler::{connection, normalize_keyword, research_window, today_taipei};
use crate::models::research::{Metric, PriceBasis, ResearchWindow};
use crate::repositories::revenue_heatmap::{self, scheme_for, HeatmapRawResult, PgPoolConn};
use crate::services::heatmap::{
    aggregate_raw, best_rise, summarize_raw, worst_decline, BinSummary, HeatmapCell, HeatmapGrid,
    HeatmapOverview,
};
use crate::services::prompt::{HeatmapBrief, PromptResponse};
use crate::services::statistic::StatMethod;

fn raw_tuples(
    rows: Vec<HeatmapRawResult>,
) -> impl Iterator<Item = (i32, String, String, String, f64, f64)> {
    rows.into_iter().map(|r| {
        (
            r.bin_order,
            r.bin_label,
            r.report_month,
            r.stock_id,
            r.val,
            r.annual_return,
        )
    })
}

/// 先在数据库聚合，失败时读原始数值在内存中计算
fn load_cells(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    method: StatMethod,
    basis: PriceBasis,
) -> Result<Vec<HeatmapCell>, AppError> {
    match revenue_heatmap::query_heatmap_cells(conn, window, metric, method, basis) {
        Ok(rows) => Ok(rows
            .into_iter()
            .map(|r| HeatmapCell {
                bin_order: r.bin_order,
                bin_label: r.bin_label,
                report_month: r.report_month,
                value: r.value,
                stock_count: r.stock_count,
                data_points: r.data_points,
                avg_return: r.avg_return,
            })
            .collect()),
        Err(e) => {
            tracing::warn!("Heatmap aggregate query failed, computing in memory: {}", e);
            let rows = revenue_heatmap::query_heatmap_raw(conn, window, metric, basis)
                .map_err(|e| AppError::query_failed("Heatmap raw query", e))?;
            Ok(aggregate_raw(raw_tuples(rows), method))
        }
    }
}

fn load_summary(
    conn: &mut PgPoolConn,
    window: &ResearchWindow,
    metric: Metric,
    basis: PriceBasis,
) -> Result<Vec<BinSummary>, AppError> {
    let scheme = scheme_for(basis);
    match revenue_heatmap::query_bin_summary(conn, window, metric, basis) {
        Ok(rows) => Ok(rows
            .into_iter()
            .map(|r| BinSummary {
                bin_order: r.bin_order,
                decline: scheme.find(r.bin_order).map(|b| b.decline).unwrap_or(false),
                bin_label: r.bin_label,
                stock_count: r.stock_count,
                avg_return: r.avg_return,
                mean: r.mean_val,
                median: r.median_val,
                std_dev: r.std_val,
                min: r.min_val,
                max: r.max_val,
                cv: r.cv_val,
                iqr: r.iqr_val,
                positive_rate: r.positive_rate,
            })
            .collect()),
        Err(e) => {
            tracing::warn!("Bin summary query failed, computing in memory: {}", e);
            let rows = revenue_heatmap::query_heatmap_raw(conn, window, metric, basis)
                .map_err(|e| AppError::query_failed("Bin summary raw query", e))?;
            Ok(summarize_raw(raw_tuples(rows), scheme))
        }
    }
}

fn cached_cells(
    state: &AppState,
    payload: &HeatmapRequest,
) -> Result<std::sync::Arc<Vec<HeatmapCell>>, AppError> {
    let window = research_window(payload.year)?;
    let key = (payload.year, payload.metric, payload.method, payload.price_basis);
    state.caches.heatmap.get_or_try_insert_with(&key, || {
        let mut conn = connection(state)?;
        load_cells(
            &mut conn,
            &window,
            payload.metric,
            payload.method,
            payload.price_basis,
        )
    })
}

fn cached_summary(
    state: &AppState,
    year: i32,
    metric: Metric,
    basis: PriceBasis,
) -> Result<std::sync::Arc<Vec<BinSummary>>, AppError> {
    let window = research_window(year)?;
    state
        .caches
        .summary
        .get_or_try_insert_with(&(year, metric, basis), || {
            let mut conn = connection(state)?;
            load_summary(&mut conn, &window, metric, basis)
        })
}

/// 涨幅区间 x 报表月份的热力图
pub async fn query_heatmap(
    State(state): State<AppState>,
    Json(payload): Json<HeatmapRequest>,
) -> Result<Json<HeatmapResponse>, AppError> {
    let cells = cached_cells(&state, &payload)?;
    let grid = HeatmapGrid::pivot(&cells);

    Ok(Json(HeatmapResponse {
        year: payload.year,
        metric: payload.metric,
        method: payload.method,
        method_title: payload.method.title(),
        price_basis: payload.price_basis,
        precision: payload.method.precision(),
        overview: HeatmapOverview::from_cells(&cells),
        value_range: grid.value_range(),
        grid,
    }))
}

/// 热力图的 SVG 版本
pub async fn heatmap_svg(
    State(state): State<AppState>,
    Query(payload): Query<HeatmapRequest>,
) -> Result<Response, AppError> {
    let cells = cached_cells(&state, &payload)?;
    let grid = HeatmapGrid::pivot(&cells);
    let title = format!(
        "{} 年 {}漲幅區間 × {} {}",
        payload.year,
        payload.price_basis.label(),
        payload.metric.label(),
        payload.method.title()
    );
    let svg = grid.render_svg(payload.method, &title);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml; charset=utf-8")], svg).into_response())
}

/// 每个涨幅区间的营收统计摘要
pub async fn query_summary(
    State(state): State<AppState>,
    Json(payload): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let bins = cached_summary(&state, payload.year, payload.metric, payload.price_basis)?;

    Ok(Json(SummaryResponse {
        year: payload.year,
        metric: payload.metric,
        price_basis: payload.price_basis,
        worst_decline: worst_decline(&bins).cloned(),
        best_rise: best_rise(&bins).cloned(),
        bins: bins.to_vec(),
    }))
}

/// 单一涨幅区间内的个股
pub async fn query_leaders(
    State(state): State<AppState>,
    Json(payload): Json<LeadersRequest>,
) -> Result<Json<LeadersResponse>, AppError> {
    let window = research_window(payload.year)?;
    if !LEADER_LIMITS.contains(&payload.limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be one of {:?}",
            LEADER_LIMITS
        )));
    }
    let bin = scheme_for(payload.price_basis)
        .find(payload.bin_order)
        .ok_or_else(|| AppError::BadRequest("unknown bin_order for this price basis".to_string()))?;
    let keyword = normalize_keyword(payload.keyword.as_deref());

    let mut conn = connection(&state)?;
    let rows = revenue_heatmap::query_bin_leaders(
        &mut conn,
        &window,
        payload.price_basis,
        payload.bin_order,
        keyword.as_deref(),
        payload.sort,
        payload.limit,
    )
    .map_err(|e| AppError::query_failed("Bin leaders query", e))?;

    let items = rows
        .into_iter()
        .map(|r| LeaderItem {
            stock_id: r.stock_id,
            stock_name: r.stock_name,
            annual_return: r.annual_return,
            avg_yoy: r.avg_yoy,
            avg_mom: r.avg_mom,
            std_yoy: r.std_yoy,
            std_mom: r.std_mom,
            latest_remark: r.latest_remark,
        })
        .collect();

    Ok(Json(LeadersResponse {
        bin_order: bin.order,
        bin_label: bin.label.to_string(),
        items,
    }))
}

/// 生成给外部 AI 的分析提示词
pub async fn heatmap_prompt(
    State(state): State<AppState>,
    Json(payload): Json<HeatmapRequest>,
) -> Result<Json<PromptResponse>, AppError> {
    let cells = cached_cells(&state, &payload)?;
    let summary = cached_summary(&state, payload.year, payload.metric, payload.price_basis)?;
    let overview = HeatmapOverview::from_cells(&cells);

    let prompt = HeatmapBrief {
        year: payload.year,
        metric: payload.metric,
        method: payload.method,
        basis: payload.price_basis,
        total_samples: overview.total_samples,
        summary: &summary,
        today: today_taipei(),
    }
    .render();

    Ok(Json(PromptResponse::new(prompt)))
}
