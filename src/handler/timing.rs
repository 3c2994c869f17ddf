use std::sync::Arc;

use axum::{extract::State, Json};

use crate::api_models::timing::{OutlierRequest, OutlierResponse, TimingRequest, TimingResponse};
use crate::app::AppState;
use crate::handler::error::AppError;
use crate::handler::{connection, normalize_keyword, research_window};
use crate::models::research::Metric;
use crate::repositories::announcement_timing;
use crate::services::prompt::{PromptResponse, TimingBrief};
use crate::services::timing::{stage_outliers, validate_threshold, TimingEvent, TimingReport};

fn cached_events(
    state: &AppState,
    year: i32,
    metric: Metric,
    threshold: i32,
    keyword: Option<&str>,
) -> Result<Arc<Vec<TimingEvent>>, AppError> {
    let window = research_window(year)?;
    validate_threshold(threshold).map_err(AppError::BadRequest)?;
    let keyword = normalize_keyword(keyword);

    let key = (year, metric, threshold, keyword.clone());
    state.caches.timing.get_or_try_insert_with(&key, || {
        let mut conn = connection(state)?;
        announcement_timing::query_timing_events(
            &mut conn,
            &window,
            metric,
            threshold,
            keyword.as_deref(),
        )
        .map_err(|e| AppError::query_failed("Timing events query", e))
    })
}

/// 首度爆发事件在公告前后各阶段的报酬
pub async fn query_timing(
    State(state): State<AppState>,
    Json(payload): Json<TimingRequest>,
) -> Result<Json<TimingResponse>, AppError> {
    let events = cached_events(
        &state,
        payload.year,
        payload.metric,
        payload.threshold,
        payload.keyword.as_deref(),
    )?;
    tracing::info!(
        "Timing lab {} {:?} >= {}: {} events",
        payload.year,
        payload.metric,
        payload.threshold,
        events.len()
    );

    Ok(Json(TimingResponse {
        year: payload.year,
        metric: payload.metric,
        threshold: payload.threshold,
        report: TimingReport::from_events(&events),
        events: events.to_vec(),
    }))
}

/// 某阶段报酬的离群事件
pub async fn query_outliers(
    State(state): State<AppState>,
    Json(payload): Json<OutlierRequest>,
) -> Result<Json<OutlierResponse>, AppError> {
    let events = cached_events(
        &state,
        payload.year,
        payload.metric,
        payload.threshold,
        payload.keyword.as_deref(),
    )?;

    Ok(Json(OutlierResponse {
        stage: payload.stage,
        label: payload.stage.label(),
        events: stage_outliers(&events, payload.stage),
    }))
}

pub async fn timing_prompt(
    State(state): State<AppState>,
    Json(payload): Json<TimingRequest>,
) -> Result<Json<PromptResponse>, AppError> {
    let events = cached_events(
        &state,
        payload.year,
        payload.metric,
        payload.threshold,
        payload.keyword.as_deref(),
    )?;
    let report = TimingReport::from_events(&events);
    let prompt = TimingBrief {
        year: payload.year,
        metric: payload.metric,
        threshold: payload.threshold,
        report: &report,
        events: &events,
    }
    .render();

    Ok(Json(PromptResponse::new(prompt)))
}
