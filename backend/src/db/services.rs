//! Service layer: business operations on top of the repository traits.
//!
//! Handlers call these functions with the repository they hold; nothing here
//! touches the global singleton, which keeps every operation testable against
//! a fresh [`LocalRepository`](super::LocalRepository).

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::repository::{AssignmentWrite, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{
    ApplicationReview, ApplicationStatus, Assignment, AssignmentId, AssignmentPatch, AuditLog,
    Faculty, FacultyId, FacultyPatch, InvalidAssignment, NewAssignment, NewAuditLog, NewFaculty,
    NewPartnerApplication, NewReferral, NewSchool, NewScholarship, NewStudent, NewTransaction,
    Partner, PartnerId, Referral, Scholarship, ScholarshipId, ScholarshipStatus, School, SchoolId,
    SchoolPatch, Student, TimetableEntry, Transaction,
};
use crate::scheduling::{self, Conflict, SlotRequest};
use crate::services::faculty_stats::{compute_faculty_stats, FacultyStats};
use crate::services::finance::{summarize_finances, total_revenue, AdminStats, FinanceOverview};
use crate::services::partner_dashboard::{compute_partner_dashboard, PartnerDashboard};

/// Actor recorded in the audit log. Requests are not authenticated here.
pub const ADMIN_ACTOR: &str = "admin";

/// Entries returned by the security overview.
const RECENT_AUDIT_LOGS: usize = 20;

/// Failures of the timetable write paths.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    /// The faculty member is already teaching in the requested slot.
    #[error("{0}")]
    Conflict(Conflict),
    #[error("Invalid assignment: {0}")]
    Invalid(#[from] InvalidAssignment),
    /// The body names a faculty member or school that does not exist.
    #[error("Unknown {entity} {id}")]
    UnknownReference { entity: &'static str, id: i64 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// =========================================================
// Health
// =========================================================

pub async fn health_check(repo: &dyn FullRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

// =========================================================
// Timetable
// =========================================================

fn settle(write: AssignmentWrite) -> Result<Assignment, TimetableError> {
    match write {
        AssignmentWrite::Stored(stored) => Ok(stored),
        AssignmentWrite::Rejected(conflict) => {
            warn!(
                faculty_id = %conflict.requested.faculty_id,
                existing_id = %conflict.existing.id,
                "rejected overlapping assignment: {}",
                conflict
            );
            Err(TimetableError::Conflict(conflict))
        }
        AssignmentWrite::UnknownReference { entity, id } => {
            warn!(entity, id, "assignment references a deleted record");
            Err(TimetableError::UnknownReference { entity, id })
        }
    }
}

/// Validate and store a new assignment.
///
/// The reference and conflict checks run inside the repository write, so two
/// concurrent requests for the same slot cannot both succeed and a faculty
/// member or school deleted meanwhile is reported as unknown.
pub async fn create_assignment(repo: &dyn FullRepository, new: NewAssignment) -> Result<Assignment, TimetableError> {
    new.validate()?;

    let stored = settle(repo.insert_assignment(new).await?)?;
    info!(
        assignment_id = %stored.id,
        faculty_id = %stored.faculty_id,
        "stored assignment {} {}",
        stored.day,
        stored.start_time
    );
    Ok(stored)
}

/// Apply a partial update to an assignment.
///
/// The record's own previous slot never counts as a conflict. Edits that do
/// not touch faculty, day or times skip the check.
pub async fn update_assignment(
    repo: &dyn FullRepository,
    id: AssignmentId,
    patch: AssignmentPatch,
) -> Result<Assignment, TimetableError> {
    let current = repo.get_assignment(id).await?;
    if patch.is_empty() {
        return Ok(current);
    }

    let merged = patch.merge(&current);
    merged.validate()?;

    let stored = settle(repo.update_assignment(id, merged, patch.moves_slot()).await?)?;
    info!(assignment_id = %id, "updated assignment");
    Ok(stored)
}

/// Read-only pre-check: the assignment `request` would collide with, if any.
pub async fn check_assignment(
    repo: &dyn FullRepository,
    request: SlotRequest,
    exclude: Option<AssignmentId>,
) -> RepositoryResult<Option<Conflict>> {
    let existing = repo.assignments_for(request.faculty_id, request.slot.day).await?;
    Ok(scheduling::check(&request, &existing, exclude).err())
}

/// Timetable rows with display names, flagged where they double-book.
///
/// Sorted by day, then start time.
pub async fn list_timetable(
    repo: &dyn FullRepository,
    faculty_id: Option<FacultyId>,
) -> RepositoryResult<Vec<TimetableEntry>> {
    let assignments = repo.list_assignments(faculty_id).await?;
    let flagged = scheduling::flag_conflicts(&assignments);

    let faculty = repo.list_faculty().await?;
    let schools = repo.list_schools().await?;
    let faculty_name = |id: FacultyId| faculty.iter().find(|f| f.id == id).map(|f| f.name.clone());
    let school_name = |id: SchoolId| schools.iter().find(|s| s.id == id).map(|s| s.name.clone());

    let mut entries: Vec<TimetableEntry> = assignments
        .into_iter()
        .map(|assignment| TimetableEntry {
            faculty_name: faculty_name(assignment.faculty_id),
            school_name: school_name(assignment.school_id),
            conflicting: flagged.contains(&assignment.id),
            assignment,
        })
        .collect();
    entries.sort_by_key(|e| (e.assignment.day, e.assignment.start_time, e.assignment.id));
    Ok(entries)
}

pub async fn delete_assignment(repo: &dyn FullRepository, id: AssignmentId) -> RepositoryResult<()> {
    repo.delete_assignment(id).await?;
    info!(assignment_id = %id, "deleted assignment");
    Ok(())
}

// =========================================================
// Faculty
// =========================================================

fn require_name(field: &str, value: &str) -> RepositoryResult<()> {
    if value.trim().is_empty() {
        return Err(RepositoryError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub async fn list_faculty(repo: &dyn FullRepository) -> RepositoryResult<Vec<Faculty>> {
    repo.list_faculty().await
}

/// Faculty list together with the dashboard statistics computed at `now`.
pub async fn faculty_overview(
    repo: &dyn FullRepository,
    now: DateTime<Utc>,
) -> RepositoryResult<(Vec<Faculty>, FacultyStats)> {
    let faculty = repo.list_faculty().await?;
    let stats = compute_faculty_stats(&faculty, now);
    Ok((faculty, stats))
}

pub async fn faculty_stats(repo: &dyn FullRepository, now: DateTime<Utc>) -> RepositoryResult<FacultyStats> {
    Ok(faculty_overview(repo, now).await?.1)
}

pub async fn create_faculty(repo: &dyn FullRepository, new: NewFaculty) -> RepositoryResult<Faculty> {
    require_name("name", &new.name)?;
    let faculty = repo.insert_faculty(new).await?;
    info!(faculty_id = %faculty.id, "created faculty member");
    Ok(faculty)
}

pub async fn update_faculty(
    repo: &dyn FullRepository,
    id: FacultyId,
    patch: FacultyPatch,
) -> RepositoryResult<Faculty> {
    if let Some(name) = &patch.name {
        require_name("name", name)?;
    }
    repo.update_faculty(id, &patch).await
}

pub async fn delete_faculty(repo: &dyn FullRepository, id: FacultyId) -> RepositoryResult<()> {
    repo.delete_faculty(id).await?;
    info!(faculty_id = %id, "deleted faculty member");
    Ok(())
}

// =========================================================
// Schools and students
// =========================================================

pub async fn list_schools(repo: &dyn FullRepository) -> RepositoryResult<Vec<School>> {
    repo.list_schools().await
}

pub async fn create_school(repo: &dyn FullRepository, new: NewSchool) -> RepositoryResult<School> {
    require_name("name", &new.name)?;
    let school = repo.insert_school(new).await?;
    info!(school_id = %school.id, "created school");
    Ok(school)
}

pub async fn update_school(repo: &dyn FullRepository, id: SchoolId, patch: SchoolPatch) -> RepositoryResult<School> {
    if let Some(name) = &patch.name {
        require_name("name", name)?;
    }
    repo.update_school(id, &patch).await
}

pub async fn delete_school(repo: &dyn FullRepository, id: SchoolId) -> RepositoryResult<()> {
    repo.delete_school(id).await?;
    info!(school_id = %id, "deleted school");
    Ok(())
}

/// Students of a school; unknown schools are reported as not found.
pub async fn list_students(repo: &dyn FullRepository, school_id: SchoolId) -> RepositoryResult<Vec<Student>> {
    repo.get_school(school_id).await?;
    repo.list_students(school_id).await
}

/// Enroll a student. An unknown school is a validation failure of the body.
pub async fn create_student(repo: &dyn FullRepository, new: NewStudent) -> RepositoryResult<Student> {
    require_name("name", &new.name)?;
    let school_id = new.school_id;
    repo.insert_student(new).await.map_err(|e| {
        if e.is_not_found() {
            RepositoryError::validation(format!("Unknown school {}", school_id))
        } else {
            e
        }
    })
}

// =========================================================
// Scholarships
// =========================================================

/// Applications still awaiting a decision.
pub async fn list_pending_scholarships(repo: &dyn FullRepository) -> RepositoryResult<Vec<Scholarship>> {
    repo.list_scholarships(Some(ScholarshipStatus::Pending)).await
}

pub async fn create_scholarship(repo: &dyn FullRepository, new: NewScholarship) -> RepositoryResult<Scholarship> {
    require_name("applicant_name", &new.applicant_name)?;
    require_amount("amount", new.amount)?;
    if let Some(school_id) = new.school_id {
        repo.get_school(school_id).await.map_err(|e| {
            if e.is_not_found() {
                RepositoryError::validation(format!("Unknown school {}", school_id))
            } else {
                e
            }
        })?;
    }
    let scholarship = repo.insert_scholarship(new).await?;
    info!(scholarship_id = %scholarship.id, "received scholarship application");
    Ok(scholarship)
}

pub async fn update_scholarship_status(
    repo: &dyn FullRepository,
    id: ScholarshipId,
    status: ScholarshipStatus,
) -> RepositoryResult<Scholarship> {
    let scholarship = repo.update_scholarship_status(id, status).await?;
    info!(scholarship_id = %id, status = ?status, "updated scholarship status");
    let action = match status {
        ScholarshipStatus::Pending => "scholarship.reopened",
        ScholarshipStatus::Approved => "scholarship.approved",
        ScholarshipStatus::Rejected => "scholarship.rejected",
    };
    record_audit(repo, action, Some(format!("{} {}", ScholarshipId::ENTITY, id))).await?;
    Ok(scholarship)
}

fn require_amount(field: &str, value: f64) -> RepositoryResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(RepositoryError::validation(format!("{} must be a non-negative number", field)));
    }
    Ok(())
}

// =========================================================
// Partners and affiliates
// =========================================================

/// All partner and affiliate records, pending or reviewed.
pub async fn list_applications(repo: &dyn FullRepository) -> RepositoryResult<Vec<Partner>> {
    repo.list_partners().await
}

/// Submit a partner or affiliate application. It starts unapproved.
pub async fn apply_for_partnership(
    repo: &dyn FullRepository,
    new: NewPartnerApplication,
) -> RepositoryResult<Partner> {
    require_name("name", &new.name)?;
    if !new.email.contains('@') {
        return Err(RepositoryError::validation("email must be an email address"));
    }
    let partner = repo.insert_partner(new).await?;
    info!(partner_id = %partner.id, role = ?partner.role, "received partner application");
    Ok(partner)
}

/// Approve or reject an application and adjust its rates.
pub async fn review_application(
    repo: &dyn FullRepository,
    id: PartnerId,
    review: ApplicationReview,
) -> RepositoryResult<Partner> {
    if let Some((field, rate)) = review.invalid_rate() {
        return Err(RepositoryError::validation(format!(
            "{} must be between 0 and 1, got {}",
            field, rate
        )));
    }
    let partner = repo.review_partner(id, &review).await?;
    let action = match review.status {
        Some(ApplicationStatus::Approved) => "application.approved",
        Some(ApplicationStatus::Rejected) => "application.rejected",
        None => "application.updated",
    };
    info!(partner_id = %id, action, "reviewed partner application");
    record_audit(repo, action, Some(format!("{} {}", PartnerId::ENTITY, id))).await?;
    Ok(partner)
}

/// A partner together with the users they referred, newest first.
pub async fn partner_detail(repo: &dyn FullRepository, id: PartnerId) -> RepositoryResult<(Partner, Vec<Referral>)> {
    let partner = repo.get_partner(id).await?;
    let referrals = repo.referrals_for(id).await?;
    Ok((partner, referrals))
}

pub async fn partner_dashboard(repo: &dyn FullRepository, id: PartnerId) -> RepositoryResult<PartnerDashboard> {
    let (partner, referrals) = partner_detail(repo, id).await?;
    Ok(compute_partner_dashboard(&partner, &referrals))
}

/// Attribute a sign-up to the partner owning its referral code.
pub async fn record_referral(repo: &dyn FullRepository, new: NewReferral) -> RepositoryResult<Referral> {
    require_name("name", &new.name)?;
    require_amount("revenue", new.revenue)?;
    let code = new.referral_code.clone();
    let referral = repo.insert_referral(new).await.map_err(|e| {
        if e.is_not_found() {
            RepositoryError::validation(format!("Unknown referral code {}", code))
        } else {
            e
        }
    })?;
    info!(referral_id = %referral.id, partner_id = %referral.partner_id, "recorded referral");
    Ok(referral)
}

// =========================================================
// Finance and admin statistics
// =========================================================

pub async fn record_transaction(repo: &dyn FullRepository, new: NewTransaction) -> RepositoryResult<Transaction> {
    require_name("description", &new.description)?;
    require_amount("amount", new.amount)?;
    let transaction = repo.insert_transaction(new).await?;
    info!(transaction_id = %transaction.id, direction = ?transaction.direction, "recorded transaction");
    Ok(transaction)
}

/// Latest transactions and inbound revenue per month.
pub async fn finance_overview(repo: &dyn FullRepository) -> RepositoryResult<FinanceOverview> {
    let transactions = repo.list_transactions().await?;
    Ok(summarize_finances(&transactions))
}

pub async fn admin_stats(repo: &dyn FullRepository) -> RepositoryResult<AdminStats> {
    let transactions = repo.list_transactions().await?;
    let approved = repo.list_scholarships(Some(ScholarshipStatus::Approved)).await?;
    Ok(AdminStats {
        active_enrolled: repo.count_students().await?,
        total_revenue: total_revenue(&transactions),
        scholarship_burn: approved.iter().map(|s| s.amount).sum(),
    })
}

// =========================================================
// Security
// =========================================================

pub async fn record_audit(
    repo: &dyn FullRepository,
    action: &str,
    target: Option<String>,
) -> RepositoryResult<AuditLog> {
    repo.insert_audit_log(NewAuditLog {
        actor: ADMIN_ACTOR.to_string(),
        action: action.to_string(),
        target,
    })
    .await
}

/// The most recent audit entries, newest first.
pub async fn recent_audit_logs(repo: &dyn FullRepository) -> RepositoryResult<Vec<AuditLog>> {
    repo.recent_audit_logs(RECENT_AUDIT_LOGS).await
}
