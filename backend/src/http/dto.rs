//! Data Transfer Objects for the HTTP API.
//!
//! Domain records already derive Serialize/Deserialize and are returned
//! as-is; the types here cover envelopes, query strings and the pre-check.

use serde::{Deserialize, Serialize};

use crate::models::{
    AssignmentId, AuditLog, Faculty, FacultyId, Partner, Referral, ScholarshipStatus, SchoolId,
    TimeOfDay, Weekday,
};
use crate::services::FacultyStats;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub repository: String,
}

/// GET /v1/faculty body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacultyListResponse {
    pub faculty: Vec<Faculty>,
    pub stats: FacultyStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimetableQuery {
    pub faculty_id: Option<FacultyId>,
}

/// `school_id` is optional here so a missing value yields a descriptive 400.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentsQuery {
    pub school_id: Option<SchoolId>,
}

/// Body of POST /v1/timetable/check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub faculty_id: FacultyId,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    /// Assignment being edited, ignored by the check
    #[serde(default)]
    pub exclude_id: Option<AssignmentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub conflict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScholarshipStatusUpdate {
    pub status: ScholarshipStatus,
}

/// GET /v1/partners/{id} body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerDetailResponse {
    pub partner: Partner,
    pub referrals: Vec<Referral>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogResponse {
    pub logs: Vec<AuditLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrantRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrantResponse {
    pub username: String,
    pub granted: bool,
}
