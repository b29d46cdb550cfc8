//! In-memory repository implementation.
//!
//! Backs unit tests and local development. All records live behind a single
//! `RwLock`, which also makes the timetable check-and-write atomic: the
//! conflict scan and the insert/update happen under the same write guard.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::db::repository::{
    AssignmentWrite, AuditRepository, ErrorContext, FacultyRepository, FinanceRepository,
    FullRepository, PartnerRepository, RepositoryError, RepositoryResult, ScholarshipRepository,
    SchoolRepository, StudentRepository, TimetableRepository,
};
use crate::models::{
    ApplicationReview, Assignment, AssignmentId, AuditLog, AuditLogId, Faculty, FacultyId,
    FacultyPatch, NewAssignment, NewAuditLog, NewFaculty, NewPartnerApplication, NewReferral,
    NewSchool, NewScholarship, NewStudent, NewTransaction, Partner, PartnerId, Referral, ReferralId,
    Scholarship, ScholarshipId, ScholarshipStatus, School, SchoolId, SchoolPatch, Student,
    StudentId, Transaction, TransactionId, Weekday,
};
use crate::scheduling::{self, SlotRequest};

#[derive(Default)]
struct LocalState {
    next_id: i64,
    faculty: BTreeMap<FacultyId, Faculty>,
    schools: BTreeMap<SchoolId, School>,
    students: BTreeMap<StudentId, Student>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    scholarships: BTreeMap<ScholarshipId, Scholarship>,
    partners: BTreeMap<PartnerId, Partner>,
    referrals: BTreeMap<ReferralId, Referral>,
    transactions: BTreeMap<TransactionId, Transaction>,
    audit_logs: BTreeMap<AuditLogId, AuditLog>,
}

impl LocalState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Check references and conflicts for `merged` and, if clear, store it under `id`.
    ///
    /// The faculty member and school are looked up under the same guard as the
    /// write, so a concurrent delete cannot leave the assignment dangling.
    fn write_assignment(
        &mut self,
        id: AssignmentId,
        merged: NewAssignment,
        exclude: Option<AssignmentId>,
        check_conflicts: bool,
    ) -> RepositoryResult<AssignmentWrite> {
        let slot = merged.validate().map_err(|e| {
            RepositoryError::validation_with_context(
                e.to_string(),
                ErrorContext::new("write_assignment")
                    .with_entity(AssignmentId::ENTITY)
                    .with_entity_id(id),
            )
        })?;
        if !self.faculty.contains_key(&merged.faculty_id) {
            return Ok(AssignmentWrite::UnknownReference {
                entity: FacultyId::ENTITY,
                id: merged.faculty_id.value(),
            });
        }
        if !self.schools.contains_key(&merged.school_id) {
            return Ok(AssignmentWrite::UnknownReference {
                entity: SchoolId::ENTITY,
                id: merged.school_id.value(),
            });
        }

        let request = SlotRequest::new(merged.faculty_id, slot);
        if check_conflicts {
            if let Err(conflict) = scheduling::check(&request, self.assignments.values(), exclude) {
                return Ok(AssignmentWrite::Rejected(conflict));
            }
        }

        let created_at = self
            .assignments
            .get(&id)
            .map(|a| a.created_at)
            .unwrap_or_else(Utc::now);
        let stored = Assignment::from_new(id, merged, created_at);
        self.assignments.insert(id, stored.clone());
        Ok(AssignmentWrite::Stored(stored))
    }
}

fn missing(operation: &str, entity: &str, id: impl ToString) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::not_found_with_context(
        format!("{} {} not found", entity, id),
        ErrorContext::new(operation).with_entity(entity).with_entity_id(id),
    )
}

fn still_referenced(operation: &str, entity: &str, id: impl ToString, details: String) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::conflict_with_context(
        format!("{} {} is still referenced", entity, id),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_entity_id(id)
            .with_details(details),
    )
}

/// In-memory repository.
#[derive(Default)]
pub struct LocalRepository {
    state: RwLock<LocalState>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an assignment without the conflict check.
    ///
    /// Only meant for seeding data that predates the check (imports,
    /// fixtures), which is what the listing's conflict flag exists for.
    pub fn import_assignment(&self, new: NewAssignment) -> Assignment {
        let mut state = self.state.write();
        let id = AssignmentId::new(state.allocate_id());
        let stored = Assignment::from_new(id, new, Utc::now());
        state.assignments.insert(id, stored.clone());
        stored
    }
}

#[async_trait]
impl FacultyRepository for LocalRepository {
    async fn list_faculty(&self) -> RepositoryResult<Vec<Faculty>> {
        let state = self.state.read();
        let mut faculty: Vec<Faculty> = state.faculty.values().cloned().collect();
        // Newest first; ids break ties between records created in the same instant.
        faculty.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(faculty)
    }

    async fn get_faculty(&self, id: FacultyId) -> RepositoryResult<Faculty> {
        self.state
            .read()
            .faculty
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("get_faculty", FacultyId::ENTITY, id))
    }

    async fn insert_faculty(&self, new: NewFaculty) -> RepositoryResult<Faculty> {
        let mut state = self.state.write();
        let id = FacultyId::new(state.allocate_id());
        let faculty = Faculty::from_new(id, new, Utc::now());
        state.faculty.insert(id, faculty.clone());
        debug!(faculty_id = %id, "stored faculty member");
        Ok(faculty)
    }

    async fn update_faculty(&self, id: FacultyId, patch: &FacultyPatch) -> RepositoryResult<Faculty> {
        let mut state = self.state.write();
        let faculty = state
            .faculty
            .get_mut(&id)
            .ok_or_else(|| missing("update_faculty", FacultyId::ENTITY, id))?;
        faculty.apply(patch);
        Ok(faculty.clone())
    }

    async fn delete_faculty(&self, id: FacultyId) -> RepositoryResult<()> {
        let mut state = self.state.write();
        if !state.faculty.contains_key(&id) {
            return Err(missing("delete_faculty", FacultyId::ENTITY, id));
        }
        let assigned = state.assignments.values().filter(|a| a.faculty_id == id).count();
        if assigned > 0 {
            return Err(still_referenced(
                "delete_faculty",
                FacultyId::ENTITY,
                id,
                format!("{} timetable assignment(s)", assigned),
            ));
        }
        state.faculty.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SchoolRepository for LocalRepository {
    async fn list_schools(&self) -> RepositoryResult<Vec<School>> {
        let state = self.state.read();
        let mut schools: Vec<School> = state.schools.values().cloned().collect();
        schools.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(schools)
    }

    async fn get_school(&self, id: SchoolId) -> RepositoryResult<School> {
        self.state
            .read()
            .schools
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("get_school", SchoolId::ENTITY, id))
    }

    async fn insert_school(&self, new: NewSchool) -> RepositoryResult<School> {
        let mut state = self.state.write();
        let id = SchoolId::new(state.allocate_id());
        let school = School::from_new(id, new, Utc::now());
        state.schools.insert(id, school.clone());
        Ok(school)
    }

    async fn update_school(&self, id: SchoolId, patch: &SchoolPatch) -> RepositoryResult<School> {
        let mut state = self.state.write();
        let school = state
            .schools
            .get_mut(&id)
            .ok_or_else(|| missing("update_school", SchoolId::ENTITY, id))?;
        school.apply(patch);
        Ok(school.clone())
    }

    async fn delete_school(&self, id: SchoolId) -> RepositoryResult<()> {
        let mut state = self.state.write();
        if !state.schools.contains_key(&id) {
            return Err(missing("delete_school", SchoolId::ENTITY, id));
        }
        let students = state.students.values().filter(|s| s.school_id == id).count();
        let assignments = state.assignments.values().filter(|a| a.school_id == id).count();
        if students > 0 || assignments > 0 {
            return Err(still_referenced(
                "delete_school",
                SchoolId::ENTITY,
                id,
                format!("{} student(s) and {} assignment(s)", students, assignments),
            ));
        }
        state.schools.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl StudentRepository for LocalRepository {
    async fn list_students(&self, school_id: SchoolId) -> RepositoryResult<Vec<Student>> {
        let state = self.state.read();
        let mut students: Vec<Student> = state
            .students
            .values()
            .filter(|s| s.school_id == school_id)
            .cloned()
            .collect();
        students.sort_by(|a, b| a.grade.cmp(&b.grade).then_with(|| a.name.cmp(&b.name)));
        Ok(students)
    }

    async fn insert_student(&self, new: NewStudent) -> RepositoryResult<Student> {
        let mut state = self.state.write();
        if !state.schools.contains_key(&new.school_id) {
            return Err(missing("insert_student", SchoolId::ENTITY, new.school_id));
        }
        let id = StudentId::new(state.allocate_id());
        let student = Student::from_new(id, new, Utc::now());
        state.students.insert(id, student.clone());
        Ok(student)
    }

    async fn count_students(&self) -> RepositoryResult<usize> {
        Ok(self.state.read().students.len())
    }
}

#[async_trait]
impl TimetableRepository for LocalRepository {
    async fn list_assignments(&self, faculty_id: Option<FacultyId>) -> RepositoryResult<Vec<Assignment>> {
        let state = self.state.read();
        Ok(state
            .assignments
            .values()
            .filter(|a| faculty_id.map_or(true, |f| a.faculty_id == f))
            .cloned()
            .collect())
    }

    async fn get_assignment(&self, id: AssignmentId) -> RepositoryResult<Assignment> {
        self.state
            .read()
            .assignments
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("get_assignment", AssignmentId::ENTITY, id))
    }

    async fn assignments_for(&self, faculty_id: FacultyId, day: Weekday) -> RepositoryResult<Vec<Assignment>> {
        let state = self.state.read();
        Ok(state
            .assignments
            .values()
            .filter(|a| a.faculty_id == faculty_id && a.day == day)
            .cloned()
            .collect())
    }

    async fn insert_assignment(&self, new: NewAssignment) -> RepositoryResult<AssignmentWrite> {
        let mut state = self.state.write();
        let id = AssignmentId::new(state.next_id + 1);
        let outcome = state.write_assignment(id, new, None, true)?;
        if matches!(outcome, AssignmentWrite::Stored(_)) {
            state.allocate_id();
        }
        Ok(outcome)
    }

    async fn update_assignment(
        &self,
        id: AssignmentId,
        merged: NewAssignment,
        check_conflicts: bool,
    ) -> RepositoryResult<AssignmentWrite> {
        let mut state = self.state.write();
        if !state.assignments.contains_key(&id) {
            return Err(missing("update_assignment", AssignmentId::ENTITY, id));
        }
        state.write_assignment(id, merged, Some(id), check_conflicts)
    }

    async fn delete_assignment(&self, id: AssignmentId) -> RepositoryResult<()> {
        self.state
            .write()
            .assignments
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("delete_assignment", AssignmentId::ENTITY, id))
    }
}

#[async_trait]
impl ScholarshipRepository for LocalRepository {
    async fn list_scholarships(&self, status: Option<ScholarshipStatus>) -> RepositoryResult<Vec<Scholarship>> {
        let state = self.state.read();
        Ok(state
            .scholarships
            .values()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .cloned()
            .collect())
    }

    async fn insert_scholarship(&self, new: NewScholarship) -> RepositoryResult<Scholarship> {
        let mut state = self.state.write();
        let id = ScholarshipId::new(state.allocate_id());
        let scholarship = Scholarship::from_new(id, new, Utc::now());
        state.scholarships.insert(id, scholarship.clone());
        Ok(scholarship)
    }

    async fn update_scholarship_status(
        &self,
        id: ScholarshipId,
        status: ScholarshipStatus,
    ) -> RepositoryResult<Scholarship> {
        let mut state = self.state.write();
        let scholarship = state
            .scholarships
            .get_mut(&id)
            .ok_or_else(|| missing("update_scholarship_status", ScholarshipId::ENTITY, id))?;
        scholarship.status = status;
        Ok(scholarship.clone())
    }
}

#[async_trait]
impl PartnerRepository for LocalRepository {
    async fn list_partners(&self) -> RepositoryResult<Vec<Partner>> {
        let state = self.state.read();
        let mut partners: Vec<Partner> = state.partners.values().cloned().collect();
        partners.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));
        Ok(partners)
    }

    async fn get_partner(&self, id: PartnerId) -> RepositoryResult<Partner> {
        self.state
            .read()
            .partners
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("get_partner", PartnerId::ENTITY, id))
    }

    async fn insert_partner(&self, new: NewPartnerApplication) -> RepositoryResult<Partner> {
        let mut state = self.state.write();
        if let Some(existing) = state
            .partners
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(RepositoryError::conflict_with_context(
                format!("{} already applied", new.email),
                ErrorContext::new("insert_partner")
                    .with_entity(PartnerId::ENTITY)
                    .with_entity_id(existing.id),
            ));
        }
        let id = PartnerId::new(state.allocate_id());
        let partner = Partner::from_new(id, new, Utc::now());
        state.partners.insert(id, partner.clone());
        debug!(partner_id = %id, role = ?partner.role, "stored partner application");
        Ok(partner)
    }

    async fn review_partner(&self, id: PartnerId, review: &ApplicationReview) -> RepositoryResult<Partner> {
        let mut state = self.state.write();
        let partner = state
            .partners
            .get_mut(&id)
            .ok_or_else(|| missing("review_partner", PartnerId::ENTITY, id))?;
        partner.apply(review);
        Ok(partner.clone())
    }

    async fn insert_referral(&self, new: NewReferral) -> RepositoryResult<Referral> {
        let mut state = self.state.write();
        let partner_id = state
            .partners
            .values()
            .find(|p| p.referral_code == new.referral_code)
            .map(|p| p.id)
            .ok_or_else(|| missing("insert_referral", "referral code", &new.referral_code))?;
        let id = ReferralId::new(state.allocate_id());
        let referral = Referral::from_new(id, partner_id, new, Utc::now());
        state.referrals.insert(id, referral.clone());
        Ok(referral)
    }

    async fn referrals_for(&self, partner_id: PartnerId) -> RepositoryResult<Vec<Referral>> {
        let state = self.state.read();
        let mut referrals: Vec<Referral> = state
            .referrals
            .values()
            .filter(|r| r.partner_id == partner_id)
            .cloned()
            .collect();
        referrals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(referrals)
    }
}

#[async_trait]
impl FinanceRepository for LocalRepository {
    async fn list_transactions(&self) -> RepositoryResult<Vec<Transaction>> {
        Ok(self.state.read().transactions.values().cloned().collect())
    }

    async fn insert_transaction(&self, new: NewTransaction) -> RepositoryResult<Transaction> {
        let mut state = self.state.write();
        let id = TransactionId::new(state.allocate_id());
        let transaction = Transaction::from_new(id, new, Utc::now());
        state.transactions.insert(id, transaction.clone());
        Ok(transaction)
    }
}

#[async_trait]
impl AuditRepository for LocalRepository {
    async fn insert_audit_log(&self, new: NewAuditLog) -> RepositoryResult<AuditLog> {
        let mut state = self.state.write();
        let id = AuditLogId::new(state.allocate_id());
        let entry = AuditLog::from_new(id, new, Utc::now());
        state.audit_logs.insert(id, entry.clone());
        Ok(entry)
    }

    async fn recent_audit_logs(&self, limit: usize) -> RepositoryResult<Vec<AuditLog>> {
        let state = self.state.read();
        let mut logs: Vec<AuditLog> = state.audit_logs.values().cloned().collect();
        logs.sort_by(|a, b| b.time.cmp(&a.time).then(b.id.cmp(&a.id)));
        logs.truncate(limit);
        Ok(logs)
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
