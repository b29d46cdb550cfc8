//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer. Extractors are taken as `Result` so malformed paths, queries and
//! bodies all surface as 400 responses in the common error format.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::dto::{
    AccessGrantRequest, AccessGrantResponse, AuditLogResponse, CheckRequest, CheckResponse,
    FacultyListResponse, HealthResponse, PartnerDetailResponse, ScholarshipStatusUpdate,
    StudentsQuery, TimetableQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::{
    ApplicationReview, Assignment, AssignmentId, AssignmentPatch, Faculty, FacultyId, FacultyPatch,
    NewAssignment, NewFaculty, NewPartnerApplication, NewReferral, NewSchool, NewScholarship,
    NewStudent, NewTransaction, Partner, PartnerId, Referral, Scholarship, ScholarshipId, School,
    SchoolId, SchoolPatch, Student, TimeSlot, TimetableEntry, Transaction,
};
use crate::scheduling::SlotRequest;
use crate::services::{AccessGrantError, AdminStats, FacultyStats, FinanceOverview, PartnerDashboard};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a record.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type PathId = Result<Path<i64>, PathRejection>;

fn created<T>(value: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(value)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repository = match db_services::health_check(state.repo()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository,
    }))
}

// =============================================================================
// Faculty
// =============================================================================

/// GET /v1/faculty
///
/// Faculty directory, newest first, with the dashboard statistics.
pub async fn list_faculty(State(state): State<AppState>) -> HandlerResult<FacultyListResponse> {
    let (faculty, stats) = db_services::faculty_overview(state.repo(), Utc::now()).await?;
    Ok(Json(FacultyListResponse { faculty, stats }))
}

/// GET /v1/faculty/stats
pub async fn faculty_stats(State(state): State<AppState>) -> HandlerResult<FacultyStats> {
    Ok(Json(db_services::faculty_stats(state.repo(), Utc::now()).await?))
}

/// POST /v1/faculty
pub async fn create_faculty(State(state): State<AppState>, body: JsonBody<NewFaculty>) -> CreatedResult<Faculty> {
    let Json(new) = body?;
    created(db_services::create_faculty(state.repo(), new).await?)
}

/// PATCH /v1/faculty/{id}
pub async fn update_faculty(
    State(state): State<AppState>,
    id: PathId,
    body: JsonBody<FacultyPatch>,
) -> HandlerResult<Faculty> {
    let Path(id) = id?;
    let Json(patch) = body?;
    Ok(Json(db_services::update_faculty(state.repo(), FacultyId::new(id), patch).await?))
}

/// DELETE /v1/faculty/{id}
pub async fn delete_faculty(State(state): State<AppState>, id: PathId) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    db_services::delete_faculty(state.repo(), FacultyId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Schools and students
// =============================================================================

/// GET /v1/schools
pub async fn list_schools(State(state): State<AppState>) -> HandlerResult<Vec<School>> {
    Ok(Json(db_services::list_schools(state.repo()).await?))
}

/// POST /v1/schools
pub async fn create_school(State(state): State<AppState>, body: JsonBody<NewSchool>) -> CreatedResult<School> {
    let Json(new) = body?;
    created(db_services::create_school(state.repo(), new).await?)
}

/// PATCH /v1/schools/{id}
pub async fn update_school(
    State(state): State<AppState>,
    id: PathId,
    body: JsonBody<SchoolPatch>,
) -> HandlerResult<School> {
    let Path(id) = id?;
    let Json(patch) = body?;
    Ok(Json(db_services::update_school(state.repo(), SchoolId::new(id), patch).await?))
}

/// DELETE /v1/schools/{id}
pub async fn delete_school(State(state): State<AppState>, id: PathId) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    db_services::delete_school(state.repo(), SchoolId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/students?school_id=
pub async fn list_students(
    State(state): State<AppState>,
    query: Result<Query<StudentsQuery>, QueryRejection>,
) -> HandlerResult<Vec<Student>> {
    let Query(query) = query?;
    let school_id = query
        .school_id
        .ok_or_else(|| AppError::BadRequest("school_id is required".to_string()))?;
    Ok(Json(db_services::list_students(state.repo(), school_id).await?))
}

/// POST /v1/students
pub async fn create_student(State(state): State<AppState>, body: JsonBody<NewStudent>) -> CreatedResult<Student> {
    let Json(new) = body?;
    created(db_services::create_student(state.repo(), new).await?)
}

// =============================================================================
// Timetable
// =============================================================================

/// GET /v1/timetable?faculty_id=
///
/// Entries joined with faculty and school names; double-booked entries carry
/// `conflicting: true`.
pub async fn list_timetable(
    State(state): State<AppState>,
    query: Result<Query<TimetableQuery>, QueryRejection>,
) -> HandlerResult<Vec<TimetableEntry>> {
    let Query(query) = query?;
    Ok(Json(db_services::list_timetable(state.repo(), query.faculty_id).await?))
}

/// POST /v1/timetable
///
/// 201 with the stored assignment, 409 when the faculty member is already
/// teaching in an overlapping slot that day.
pub async fn create_assignment(
    State(state): State<AppState>,
    body: JsonBody<NewAssignment>,
) -> CreatedResult<Assignment> {
    let Json(new) = body?;
    created(db_services::create_assignment(state.repo(), new).await?)
}

/// POST /v1/timetable/check
///
/// Read-only pre-check used by clients before submitting a slot.
pub async fn check_assignment(
    State(state): State<AppState>,
    body: JsonBody<CheckRequest>,
) -> HandlerResult<CheckResponse> {
    let Json(req) = body?;
    let slot = TimeSlot::new(req.day, req.start_time, req.end_time)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let request = SlotRequest::new(req.faculty_id, slot);

    let response = match db_services::check_assignment(state.repo(), request, req.exclude_id).await? {
        Some(conflict) => CheckResponse {
            conflict: true,
            conflicting_with: Some(conflict.conflicting_subject().to_string()),
            message: Some(conflict.to_string()),
        },
        None => CheckResponse {
            conflict: false,
            conflicting_with: None,
            message: None,
        },
    };
    Ok(Json(response))
}

/// PATCH /v1/timetable/{id}
pub async fn update_assignment(
    State(state): State<AppState>,
    id: PathId,
    body: JsonBody<AssignmentPatch>,
) -> HandlerResult<Assignment> {
    let Path(id) = id?;
    let Json(patch) = body?;
    Ok(Json(
        db_services::update_assignment(state.repo(), AssignmentId::new(id), patch).await?,
    ))
}

/// DELETE /v1/timetable/{id}
pub async fn delete_assignment(State(state): State<AppState>, id: PathId) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    db_services::delete_assignment(state.repo(), AssignmentId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Scholarships
// =============================================================================

/// GET /v1/scholarships
///
/// Pending applications only.
pub async fn list_scholarships(State(state): State<AppState>) -> HandlerResult<Vec<Scholarship>> {
    Ok(Json(db_services::list_pending_scholarships(state.repo()).await?))
}

/// POST /v1/scholarships
pub async fn create_scholarship(
    State(state): State<AppState>,
    body: JsonBody<NewScholarship>,
) -> CreatedResult<Scholarship> {
    let Json(new) = body?;
    created(db_services::create_scholarship(state.repo(), new).await?)
}

/// PATCH /v1/scholarships/{id}
pub async fn update_scholarship(
    State(state): State<AppState>,
    id: PathId,
    body: JsonBody<ScholarshipStatusUpdate>,
) -> HandlerResult<Scholarship> {
    let Path(id) = id?;
    let Json(update) = body?;
    Ok(Json(
        db_services::update_scholarship_status(state.repo(), ScholarshipId::new(id), update.status).await?,
    ))
}

// =============================================================================
// Partners and affiliates
// =============================================================================

/// GET /v1/partners/applications
pub async fn list_applications(State(state): State<AppState>) -> HandlerResult<Vec<Partner>> {
    Ok(Json(db_services::list_applications(state.repo()).await?))
}

/// POST /v1/partners/applications
pub async fn apply_for_partnership(
    State(state): State<AppState>,
    body: JsonBody<NewPartnerApplication>,
) -> CreatedResult<Partner> {
    let Json(new) = body?;
    created(db_services::apply_for_partnership(state.repo(), new).await?)
}

/// PATCH /v1/partners/applications/{id}
pub async fn review_application(
    State(state): State<AppState>,
    id: PathId,
    body: JsonBody<ApplicationReview>,
) -> HandlerResult<Partner> {
    let Path(id) = id?;
    let Json(review) = body?;
    Ok(Json(
        db_services::review_application(state.repo(), PartnerId::new(id), review).await?,
    ))
}

/// GET /v1/partners/{id}
pub async fn partner_detail(State(state): State<AppState>, id: PathId) -> HandlerResult<PartnerDetailResponse> {
    let Path(id) = id?;
    let (partner, referrals) = db_services::partner_detail(state.repo(), PartnerId::new(id)).await?;
    Ok(Json(PartnerDetailResponse { partner, referrals }))
}

/// GET /v1/partners/{id}/dashboard
pub async fn partner_dashboard(State(state): State<AppState>, id: PathId) -> HandlerResult<PartnerDashboard> {
    let Path(id) = id?;
    Ok(Json(
        db_services::partner_dashboard(state.repo(), PartnerId::new(id)).await?,
    ))
}

/// POST /v1/referrals
pub async fn record_referral(State(state): State<AppState>, body: JsonBody<NewReferral>) -> CreatedResult<Referral> {
    let Json(new) = body?;
    created(db_services::record_referral(state.repo(), new).await?)
}

// =============================================================================
// Finance, admin and security
// =============================================================================

/// GET /v1/finance
pub async fn finance_overview(State(state): State<AppState>) -> HandlerResult<FinanceOverview> {
    Ok(Json(db_services::finance_overview(state.repo()).await?))
}

/// POST /v1/finance/transactions
pub async fn record_transaction(
    State(state): State<AppState>,
    body: JsonBody<NewTransaction>,
) -> CreatedResult<Transaction> {
    let Json(new) = body?;
    created(db_services::record_transaction(state.repo(), new).await?)
}

/// GET /v1/admin/stats
pub async fn admin_stats(State(state): State<AppState>) -> HandlerResult<AdminStats> {
    Ok(Json(db_services::admin_stats(state.repo()).await?))
}

/// GET /v1/security/audit-logs
pub async fn audit_logs(State(state): State<AppState>) -> HandlerResult<AuditLogResponse> {
    let logs = db_services::recent_audit_logs(state.repo()).await?;
    Ok(Json(AuditLogResponse { logs }))
}

/// POST /v1/admin/access-grants
///
/// Grants a platform user access to the protected script. 503 when no
/// credentials are configured, 502 when the platform refuses.
pub async fn grant_access(
    State(state): State<AppState>,
    body: JsonBody<AccessGrantRequest>,
) -> HandlerResult<AccessGrantResponse> {
    let Json(request) = body?;
    let granter = state
        .access_granter
        .as_ref()
        .ok_or(AccessGrantError::NotConfigured)?;
    granter.grant(&request.username).await?;

    let username = request.username.trim().to_string();
    db_services::record_audit(state.repo(), "access.granted", Some(username.clone())).await?;
    Ok(Json(AccessGrantResponse {
        username,
        granted: true,
    }))
}
