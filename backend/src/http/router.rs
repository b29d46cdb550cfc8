//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Default request body cap when no configuration is supplied.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState, body_limit: usize) -> Router {
    // Admin dashboard runs on a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Directory
        .route("/faculty", get(handlers::list_faculty).post(handlers::create_faculty))
        .route("/faculty/stats", get(handlers::faculty_stats))
        .route(
            "/faculty/{id}",
            patch(handlers::update_faculty).delete(handlers::delete_faculty),
        )
        .route("/schools", get(handlers::list_schools).post(handlers::create_school))
        .route(
            "/schools/{id}",
            patch(handlers::update_school).delete(handlers::delete_school),
        )
        .route("/students", get(handlers::list_students).post(handlers::create_student))
        // Timetable
        .route(
            "/timetable",
            get(handlers::list_timetable).post(handlers::create_assignment),
        )
        .route("/timetable/check", post(handlers::check_assignment))
        .route(
            "/timetable/{id}",
            patch(handlers::update_assignment).delete(handlers::delete_assignment),
        )
        // Scholarships
        .route(
            "/scholarships",
            get(handlers::list_scholarships).post(handlers::create_scholarship),
        )
        .route("/scholarships/{id}", patch(handlers::update_scholarship))
        // Partners and affiliates
        .route(
            "/partners/applications",
            get(handlers::list_applications).post(handlers::apply_for_partnership),
        )
        .route("/partners/applications/{id}", patch(handlers::review_application))
        .route("/partners/{id}", get(handlers::partner_detail))
        .route("/partners/{id}/dashboard", get(handlers::partner_dashboard))
        .route("/referrals", post(handlers::record_referral))
        // Finance and administration
        .route("/finance", get(handlers::finance_overview))
        .route("/finance/transactions", post(handlers::record_transaction))
        .route("/admin/stats", get(handlers::admin_stats))
        .route("/admin/access-grants", post(handlers::grant_access))
        .route("/security/audit-logs", get(handlers::audit_logs));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FullRepository;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router() -> Router {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        create_router(AppState::new(repo), DEFAULT_BODY_LIMIT)
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = router()
            .oneshot(Request::get("/v1/reports").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        let app = create_router(AppState::new(repo), 16);
        let body = serde_json::json!({ "name": "A very long faculty member name" }).to_string();
        let response = app
            .oneshot(
                Request::post("/v1/faculty")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
