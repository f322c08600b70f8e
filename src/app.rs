use crate::auth::require_session;
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(handlers::dashboard))
        .route("/api/violations", get(handlers::list_violations))
        .route("/api/violations/:id", get(handlers::get_violation))
        .route("/api/violations/:id/paid", post(handlers::mark_paid))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/analysis", get(handlers::get_analysis))
        .route("/api/status", get(handlers::get_feed_status))
        .route("/api/export/violations.csv", get(handlers::export_violations_csv))
        .route("/api/export/areas.csv", get(handlers::export_area_csv))
        .route("/api/export/types.csv", get(handlers::export_type_csv))
        .route("/api/export/violations.json", get(handlers::export_violations_json))
        .route("/api/remote/fines", get(handlers::remote_fines))
        .route("/api/remote/fines/summary", get(handlers::remote_fines_summary))
        .route("/api/remote/fines/mark-paid", post(handlers::remote_mark_fine_paid))
        .route("/api/remote/analysis/overview", get(handlers::remote_analysis_overview))
        .route("/api/remote/analysis/violation-types", get(handlers::remote_violation_types))
        .route("/api/remote/export/:format", get(handlers::remote_export))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login_form))
        .route("/logout", post(handlers::logout_form))
        .route("/api/auth/login", post(handlers::api_login))
        .route("/api/auth/logout", post(handlers::api_logout))
        .route("/api/health", get(handlers::health))
        .merge(protected)
        .with_state(state)
}
