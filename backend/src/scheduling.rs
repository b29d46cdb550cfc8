//! Timetable conflict detection.
//!
//! A faculty member cannot teach two classes at once: two assignments for the
//! same faculty on the same day conflict when their `[start, end)` ranges
//! intersect. Back-to-back slots (one ends exactly when the next starts) are
//! allowed.
//!
//! Every write path (create, update, move) and every read-side flag goes
//! through the functions in this module, so the rule is defined exactly once.
//! The per-faculty, per-day record count is small, so a linear scan is used.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::models::{Assignment, AssignmentId, FacultyId, TimeSlot, Weekday};

/// The faculty member and slot being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotRequest {
    pub faculty_id: FacultyId,
    pub slot: TimeSlot,
}

impl SlotRequest {
    pub fn new(faculty_id: FacultyId, slot: TimeSlot) -> Self {
        Self { faculty_id, slot }
    }

    /// Whether this request clashes with a stored assignment.
    pub fn clashes_with(&self, existing: &Assignment) -> bool {
        self.faculty_id == existing.faculty_id && self.slot.overlaps(&existing.slot())
    }
}

/// A rejected request together with the assignment it collides with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub requested: SlotRequest,
    pub existing: Assignment,
}

impl Conflict {
    /// Subject of the assignment already occupying the slot.
    pub fn conflicting_subject(&self) -> &str {
        &self.existing.subject
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time conflict: faculty {} is already teaching {} on {} ({}-{}), requested {}-{}",
            self.existing.faculty_id,
            self.existing.subject,
            self.existing.day,
            self.existing.start_time,
            self.existing.end_time,
            self.requested.slot.start,
            self.requested.slot.end,
        )
    }
}

/// Find the first stored assignment that clashes with `request`.
///
/// `exclude` skips the record being updated so an entry never conflicts
/// with its own previous position.
pub fn find_conflict<'a, I>(
    request: &SlotRequest,
    existing: I,
    exclude: Option<AssignmentId>,
) -> Option<&'a Assignment>
where
    I: IntoIterator<Item = &'a Assignment>,
{
    existing
        .into_iter()
        .filter(|a| Some(a.id) != exclude)
        .find(|a| request.clashes_with(a))
}

/// Boolean form of [`find_conflict`].
pub fn has_conflict<'a, I>(request: &SlotRequest, existing: I, exclude: Option<AssignmentId>) -> bool
where
    I: IntoIterator<Item = &'a Assignment>,
{
    find_conflict(request, existing, exclude).is_some()
}

/// Check a request and package the clash for error reporting.
pub fn check<'a, I>(
    request: &SlotRequest,
    existing: I,
    exclude: Option<AssignmentId>,
) -> Result<(), Conflict>
where
    I: IntoIterator<Item = &'a Assignment>,
{
    match find_conflict(request, existing, exclude) {
        Some(clash) => Err(Conflict {
            requested: *request,
            existing: clash.clone(),
        }),
        None => Ok(()),
    }
}

/// IDs of every entry that overlaps at least one other entry.
///
/// Used to flag double-bookings when rendering a timetable, e.g. records
/// written before the check existed or imported in bulk.
pub fn flag_conflicts(entries: &[Assignment]) -> HashSet<AssignmentId> {
    let mut groups: HashMap<(FacultyId, Weekday), Vec<&Assignment>> = HashMap::new();
    for entry in entries {
        groups
            .entry((entry.faculty_id, entry.day))
            .or_default()
            .push(entry);
    }

    let mut flagged = HashSet::new();
    for group in groups.values() {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                if a.slot().overlaps(&b.slot()) {
                    flagged.insert(a.id);
                    flagged.insert(b.id);
                }
            }
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SchoolId, TimeOfDay};
    use chrono::Utc;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn slot(day: Weekday, start: &str, end: &str) -> TimeSlot {
        TimeSlot::new(day, t(start), t(end)).unwrap()
    }

    fn assignment(id: i64, faculty: i64, day: Weekday, start: &str, end: &str, subject: &str) -> Assignment {
        Assignment {
            id: AssignmentId::new(id),
            faculty_id: FacultyId::new(faculty),
            school_id: SchoolId::new(1),
            grade: "Grade 11".to_string(),
            subject: subject.to_string(),
            day,
            start_time: t(start),
            end_time: t(end),
            created_at: Utc::now(),
        }
    }

    fn request(faculty: i64, day: Weekday, start: &str, end: &str) -> SlotRequest {
        SlotRequest::new(FacultyId::new(faculty), slot(day, start, end))
    }

    fn existing() -> Vec<Assignment> {
        vec![assignment(1, 1, Weekday::Monday, "09:00", "10:00", "Physics")]
    }

    #[test]
    fn test_partial_overlap_reports_existing_subject() {
        let stored = existing();
        let clash = find_conflict(&request(1, Weekday::Monday, "09:30", "10:30"), &stored, None);
        assert_eq!(clash.map(|a| a.subject.as_str()), Some("Physics"));
    }

    #[test]
    fn test_back_to_back_is_allowed() {
        let stored = existing();
        assert!(!has_conflict(&request(1, Weekday::Monday, "10:00", "11:00"), &stored, None));
        assert!(!has_conflict(&request(1, Weekday::Monday, "08:00", "09:00"), &stored, None));
    }

    #[test]
    fn test_other_faculty_or_day_never_conflicts() {
        let stored = existing();
        assert!(!has_conflict(&request(2, Weekday::Monday, "09:00", "10:00"), &stored, None));
        assert!(!has_conflict(&request(1, Weekday::Tuesday, "09:00", "10:00"), &stored, None));
    }

    #[test]
    fn test_containment_conflicts_both_ways() {
        let stored = existing();
        // inside the stored slot
        assert!(has_conflict(&request(1, Weekday::Monday, "09:15", "09:45"), &stored, None));
        // surrounding the stored slot
        assert!(has_conflict(&request(1, Weekday::Monday, "08:00", "11:00"), &stored, None));
        // identical slot
        assert!(has_conflict(&request(1, Weekday::Monday, "09:00", "10:00"), &stored, None));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let samples = [
            ("08:00", "09:00"),
            ("08:30", "09:30"),
            ("09:00", "10:00"),
            ("09:15", "09:45"),
            ("09:59", "11:00"),
            ("10:00", "10:30"),
            ("07:00", "12:00"),
        ];
        for (s1, e1) in samples {
            for (s2, e2) in samples {
                let a = slot(Weekday::Wednesday, s1, e1);
                let b = slot(Weekday::Wednesday, s2, e2);
                assert_eq!(a.overlaps(&b), b.overlaps(&a), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_exclude_skips_own_record() {
        let stored = existing();
        let req = request(1, Weekday::Monday, "09:30", "10:30");
        assert!(!has_conflict(&req, &stored, Some(AssignmentId::new(1))));
        assert!(has_conflict(&req, &stored, Some(AssignmentId::new(99))));
    }

    #[test]
    fn test_check_packages_conflict_message() {
        let stored = existing();
        let err = check(&request(1, Weekday::Monday, "09:30", "10:30"), &stored, None).unwrap_err();
        assert_eq!(err.conflicting_subject(), "Physics");
        let message = err.to_string();
        assert!(message.contains("Physics"));
        assert!(message.contains("Monday"));
        assert!(message.contains("09:00-10:00"));
    }

    #[test]
    fn test_check_passes_on_empty_timetable() {
        let stored: Vec<Assignment> = Vec::new();
        assert!(check(&request(1, Weekday::Friday, "13:00", "14:00"), &stored, None).is_ok());
    }

    #[test]
    fn test_flag_conflicts_marks_every_overlapping_entry() {
        let entries = vec![
            assignment(1, 1, Weekday::Monday, "09:00", "10:00", "Physics"),
            assignment(2, 1, Weekday::Monday, "09:30", "10:30", "Chemistry"),
            assignment(3, 1, Weekday::Monday, "10:30", "11:30", "Biology"),
            assignment(4, 2, Weekday::Monday, "09:00", "10:00", "History"),
            assignment(5, 1, Weekday::Tuesday, "09:00", "10:00", "Physics"),
            assignment(6, 3, Weekday::Friday, "08:00", "12:00", "Lab"),
            assignment(7, 3, Weekday::Friday, "11:00", "11:30", "Seminar"),
        ];

        let flagged = flag_conflicts(&entries);
        let expected: HashSet<AssignmentId> =
            [1, 2, 6, 7].into_iter().map(AssignmentId::new).collect();
        assert_eq!(flagged, expected);
    }
}
