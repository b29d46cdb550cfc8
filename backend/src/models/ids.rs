//! Record identifiers allocated by the repository.

use crate::define_id_type;

define_id_type!(i64, FacultyId, "faculty");
define_id_type!(i64, SchoolId, "school");
define_id_type!(i64, StudentId, "student");
define_id_type!(i64, AssignmentId, "assignment");
define_id_type!(i64, ScholarshipId, "scholarship");
define_id_type!(i64, PartnerId, "partner");
define_id_type!(i64, ReferralId, "referral");
define_id_type!(i64, TransactionId, "transaction");
define_id_type!(i64, AuditLogId, "audit_log");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&FacultyId::new(7)).unwrap(), "7");
        let id: AssignmentId = serde_json::from_str("42").unwrap();
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_id_conversions_and_labels() {
        let id: SchoolId = 3.into();
        let raw: i64 = id.into();
        assert_eq!(raw, 3);
        assert_eq!(id.to_string(), "3");
        assert_eq!(SchoolId::ENTITY, "school");
        assert_eq!(StudentId::ENTITY, "student");
    }
}
