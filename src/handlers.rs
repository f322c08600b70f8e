use crate::auth::LoginOutcome;
use crate::backend::{ExportFormat, FinePayment, FinesQuery};
use crate::errors::{AppError, ExportError, FetchError};
use crate::export::{to_csv, to_json, ColumnMapping, Download};
use crate::filter::{FilterQuery, ViolationFilter};
use crate::models::{
    AnalysisResponse, FeedStatus, HealthResponse, LoginRequest, LoginResponse, MarkPaidResponse,
    Summary, Violation,
};
use crate::state::AppState;
use crate::stats::{build_analysis, build_summary, group_counts, ranked, GroupField};
use crate::ui::{render_dashboard, render_login};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info};

pub async fn index(State(state): State<AppState>) -> Redirect {
    if state.auth.current_session().await.is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_page() -> Html<String> {
    Html(render_login(None))
}

pub async fn login_form(State(state): State<AppState>, Form(form): Form<LoginRequest>) -> Result<Response, AppError> {
    match state.auth.login(&form.identifier, &form.secret).await? {
        LoginOutcome::Success(_) => Ok(Redirect::to("/dashboard").into_response()),
        LoginOutcome::Failure { message } => {
            Ok((StatusCode::UNAUTHORIZED, Html(render_login(Some(&message)))).into_response())
        }
    }
}

pub async fn logout_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.auth.logout().await?;
    Ok(Redirect::to("/login"))
}

pub async fn api_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let (status, body) = match state.auth.login(&payload.identifier, &payload.secret).await? {
        LoginOutcome::Success(session) => (
            StatusCode::OK,
            LoginResponse {
                success: true,
                message: None,
                session: Some(session),
            },
        ),
        LoginOutcome::Failure { message } => (
            StatusCode::UNAUTHORIZED,
            LoginResponse {
                success: false,
                message: Some(message),
                session: None,
            },
        ),
    };
    Ok((status, Json(body)))
}

pub async fn api_logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.auth.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let identifier = state
        .auth
        .current_session()
        .await
        .map(|session| session.identifier)
        .unwrap_or_default();
    let violations = state.violations.snapshot().await;
    let feed = state.violations.feed_status().await;
    Html(render_dashboard(&identifier, &build_summary(&violations), &feed, &violations))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let feed = state.violations.feed_status().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        violations: feed.count,
    })
}

pub async fn list_violations(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<Violation>>, AppError> {
    let filter = ViolationFilter::from_query(query)?;
    Ok(Json(filter.apply(state.violations.snapshot().await)))
}

pub async fn get_violation(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Violation>, AppError> {
    state
        .violations
        .find(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("violation {id} not found")))
}

pub async fn mark_paid(State(state): State<AppState>, Path(id): Path<String>) -> Json<MarkPaidResponse> {
    let matched = state.violations.mark_paid(&id).await;
    if matched {
        info!(%id, "violation marked paid locally");
    }
    let status = state.violations.find(&id).await.map(|v| v.status);
    Json(MarkPaidResponse { id, matched, status })
}

pub async fn get_summary(State(state): State<AppState>) -> Json<Summary> {
    Json(build_summary(&state.violations.snapshot().await))
}

pub async fn get_analysis(State(state): State<AppState>) -> Json<AnalysisResponse> {
    Json(build_analysis(&state.violations.snapshot().await))
}

pub async fn get_feed_status(State(state): State<AppState>) -> Json<FeedStatus> {
    Json(state.violations.feed_status().await)
}

pub async fn export_violations_csv(State(state): State<AppState>) -> Result<Download, AppError> {
    let violations = state.violations.snapshot().await;
    let csv = to_csv(&violations, &ColumnMapping::violations()).inspect_err(log_export_failure)?;
    Ok(Download::csv("all_violations_report.csv", &csv))
}

pub async fn export_area_csv(State(state): State<AppState>) -> Result<Download, AppError> {
    let areas = ranked(group_counts(&state.violations.snapshot().await, GroupField::Area));
    let csv = to_csv(&areas, &ColumnMapping::area_summary()).inspect_err(log_export_failure)?;
    Ok(Download::csv("area_summary_report.csv", &csv))
}

pub async fn export_type_csv(State(state): State<AppState>) -> Result<Download, AppError> {
    let types = ranked(group_counts(&state.violations.snapshot().await, GroupField::Type));
    let csv = to_csv(&types, &ColumnMapping::type_summary()).inspect_err(log_export_failure)?;
    Ok(Download::csv("type_summary_report.csv", &csv))
}

pub async fn export_violations_json(State(state): State<AppState>) -> Result<Download, AppError> {
    let violations = state.violations.snapshot().await;
    let json = to_json(&violations).inspect_err(log_export_failure)?;
    let filename = format!("violations_{}.json", Utc::now().timestamp_millis());
    Ok(Download::json(filename, json))
}

pub async fn remote_fines_summary(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let bearer = state.auth.bearer_token().await;
    Ok(Json(state.backend.fines_summary(bearer.as_deref()).await.inspect_err(log_backend_failure)?))
}

pub async fn remote_fines(
    State(state): State<AppState>,
    Query(query): Query<FinesQuery>,
) -> Result<Json<Value>, AppError> {
    let bearer = state.auth.bearer_token().await;
    Ok(Json(state.backend.fines(&query, bearer.as_deref()).await.inspect_err(log_backend_failure)?))
}

pub async fn remote_mark_fine_paid(
    State(state): State<AppState>,
    Json(payment): Json<FinePayment>,
) -> Result<Json<Value>, AppError> {
    let bearer = state.auth.bearer_token().await;
    let body = state
        .backend
        .mark_fine_paid(&payment, bearer.as_deref())
        .await
        .inspect_err(log_backend_failure)?;
    info!(violation_idx = payment.violation_idx, "fine marked paid on backend");
    Ok(Json(body))
}

pub async fn remote_analysis_overview(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let bearer = state.auth.bearer_token().await;
    Ok(Json(state.backend.analysis_overview(bearer.as_deref()).await.inspect_err(log_backend_failure)?))
}

pub async fn remote_violation_types(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let bearer = state.auth.bearer_token().await;
    Ok(Json(state.backend.violation_types(bearer.as_deref()).await.inspect_err(log_backend_failure)?))
}

pub async fn remote_export(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Value>, AppError> {
    let format = ExportFormat::parse(&raw)
        .ok_or_else(|| AppError::bad_request(format!("unknown export format '{raw}'")))?;
    let bearer = state.auth.bearer_token().await;
    Ok(Json(state.backend.export(format, bearer.as_deref()).await.inspect_err(log_backend_failure)?))
}

fn log_backend_failure(err: &FetchError) {
    error!("backend request failed: {err}");
}

fn log_export_failure(err: &ExportError) {
    error!("error exporting data: {err}");
}
