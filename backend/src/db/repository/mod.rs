//! Repository traits.
//!
//! Storage is split into one trait per aggregate and combined into
//! [`FullRepository`], which is what the service and HTTP layers hold.
//! Every method is async so a networked document store can sit behind the
//! same interface as the in-memory backend.

use async_trait::async_trait;

use crate::models::{
    ApplicationReview, Assignment, AssignmentId, AuditLog, Faculty, FacultyId, FacultyPatch,
    NewAssignment, NewAuditLog, NewFaculty, NewPartnerApplication, NewReferral, NewSchool,
    NewScholarship, NewStudent, NewTransaction, Partner, PartnerId, Referral, Scholarship,
    ScholarshipId, ScholarshipStatus, School, SchoolId, SchoolPatch, Student, Transaction, Weekday,
};
use crate::scheduling::Conflict;

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Outcome of a conflict-checked timetable write.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentWrite {
    /// The write went through; carries the stored record.
    Stored(Assignment),
    /// Nothing was written because the slot is taken.
    Rejected(Conflict),
    /// Nothing was written because the faculty member or school is gone.
    UnknownReference { entity: &'static str, id: i64 },
}

#[async_trait]
pub trait FacultyRepository: Send + Sync {
    /// All faculty, newest first.
    async fn list_faculty(&self) -> RepositoryResult<Vec<Faculty>>;
    async fn get_faculty(&self, id: FacultyId) -> RepositoryResult<Faculty>;
    async fn insert_faculty(&self, new: NewFaculty) -> RepositoryResult<Faculty>;
    async fn update_faculty(&self, id: FacultyId, patch: &FacultyPatch) -> RepositoryResult<Faculty>;
    /// Fails with a conflict error while assignments still reference the member.
    async fn delete_faculty(&self, id: FacultyId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait SchoolRepository: Send + Sync {
    /// All schools sorted by name.
    async fn list_schools(&self) -> RepositoryResult<Vec<School>>;
    async fn get_school(&self, id: SchoolId) -> RepositoryResult<School>;
    async fn insert_school(&self, new: NewSchool) -> RepositoryResult<School>;
    async fn update_school(&self, id: SchoolId, patch: &SchoolPatch) -> RepositoryResult<School>;
    /// Fails with a conflict error while students or assignments reference the school.
    async fn delete_school(&self, id: SchoolId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Students of one school sorted by grade, then name.
    async fn list_students(&self, school_id: SchoolId) -> RepositoryResult<Vec<Student>>;
    /// Fails with not-found when the referenced school does not exist.
    async fn insert_student(&self, new: NewStudent) -> RepositoryResult<Student>;
    /// Enrolled students across all schools.
    async fn count_students(&self) -> RepositoryResult<usize>;
}

/// Timetable storage.
///
/// `insert_assignment` and `update_assignment` must run the reference check,
/// the conflict check and the write as one atomic step, so two concurrent
/// requests for the same slot cannot both be stored and a concurrent delete
/// cannot orphan the record.
#[async_trait]
pub trait TimetableRepository: Send + Sync {
    async fn list_assignments(&self, faculty_id: Option<FacultyId>) -> RepositoryResult<Vec<Assignment>>;
    async fn get_assignment(&self, id: AssignmentId) -> RepositoryResult<Assignment>;
    /// Assignments of one faculty member on one day.
    async fn assignments_for(&self, faculty_id: FacultyId, day: Weekday) -> RepositoryResult<Vec<Assignment>>;
    /// `new` must already be validated.
    async fn insert_assignment(&self, new: NewAssignment) -> RepositoryResult<AssignmentWrite>;
    /// Replace the stored fields of `id` with `merged`.
    ///
    /// With `check_conflicts` set, `merged` is checked against every other
    /// assignment (never against `id` itself). Edits that leave faculty, day
    /// and times untouched pass `false` so legacy double-bookings stay editable.
    async fn update_assignment(
        &self,
        id: AssignmentId,
        merged: NewAssignment,
        check_conflicts: bool,
    ) -> RepositoryResult<AssignmentWrite>;
    async fn delete_assignment(&self, id: AssignmentId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ScholarshipRepository: Send + Sync {
    async fn list_scholarships(&self, status: Option<ScholarshipStatus>) -> RepositoryResult<Vec<Scholarship>>;
    async fn insert_scholarship(&self, new: NewScholarship) -> RepositoryResult<Scholarship>;
    async fn update_scholarship_status(
        &self,
        id: ScholarshipId,
        status: ScholarshipStatus,
    ) -> RepositoryResult<Scholarship>;
}

#[async_trait]
pub trait PartnerRepository: Send + Sync {
    /// Partners and affiliates, newest application first.
    async fn list_partners(&self) -> RepositoryResult<Vec<Partner>>;
    async fn get_partner(&self, id: PartnerId) -> RepositoryResult<Partner>;
    /// Fails with a conflict error when the email already applied.
    async fn insert_partner(&self, new: NewPartnerApplication) -> RepositoryResult<Partner>;
    async fn review_partner(&self, id: PartnerId, review: &ApplicationReview) -> RepositoryResult<Partner>;
    /// Fails with not-found when no partner owns `new.referral_code`.
    async fn insert_referral(&self, new: NewReferral) -> RepositoryResult<Referral>;
    /// Referrals of one partner, newest first.
    async fn referrals_for(&self, partner_id: PartnerId) -> RepositoryResult<Vec<Referral>>;
}

#[async_trait]
pub trait FinanceRepository: Send + Sync {
    async fn list_transactions(&self) -> RepositoryResult<Vec<Transaction>>;
    async fn insert_transaction(&self, new: NewTransaction) -> RepositoryResult<Transaction>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert_audit_log(&self, new: NewAuditLog) -> RepositoryResult<AuditLog>;
    /// At most `limit` entries, newest first.
    async fn recent_audit_logs(&self, limit: usize) -> RepositoryResult<Vec<AuditLog>>;
}

/// Everything the application needs from storage.
#[async_trait]
pub trait FullRepository:
    FacultyRepository
    + SchoolRepository
    + StudentRepository
    + TimetableRepository
    + ScholarshipRepository
    + PartnerRepository
    + FinanceRepository
    + AuditRepository
{
    /// Check whether the backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
