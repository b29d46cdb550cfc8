//! Timetable (faculty assignment) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AssignmentId, FacultyId, SchoolId};
use super::time::{TimeError, TimeOfDay, TimeSlot, Weekday};

/// Reasons an assignment request is rejected before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidAssignment {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error(transparent)]
    Time(#[from] TimeError),
}

/// A stored timetable entry: one faculty member teaching one class in one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub faculty_id: FacultyId,
    pub school_id: SchoolId,
    pub grade: String,
    pub subject: String,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Materialize a validated request into a stored record.
    pub fn from_new(id: AssignmentId, new: NewAssignment, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            faculty_id: new.faculty_id,
            school_id: new.school_id,
            grade: new.grade,
            subject: new.subject,
            day: new.day,
            start_time: new.start_time,
            end_time: new.end_time,
            created_at,
        }
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            day: self.day,
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Request body for creating an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssignment {
    pub faculty_id: FacultyId,
    pub school_id: SchoolId,
    pub grade: String,
    pub subject: String,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl NewAssignment {
    /// Check required fields and the `start < end` invariant.
    ///
    /// Returns the requested slot on success.
    pub fn validate(&self) -> Result<TimeSlot, InvalidAssignment> {
        if self.subject.trim().is_empty() {
            return Err(InvalidAssignment::MissingField("subject"));
        }
        if self.grade.trim().is_empty() {
            return Err(InvalidAssignment::MissingField("grade"));
        }
        Ok(TimeSlot::new(self.day, self.start_time, self.end_time)?)
    }
}

/// Partial update for an assignment. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPatch {
    #[serde(default)]
    pub faculty_id: Option<FacultyId>,
    #[serde(default)]
    pub school_id: Option<SchoolId>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub day: Option<Weekday>,
    #[serde(default)]
    pub start_time: Option<TimeOfDay>,
    #[serde(default)]
    pub end_time: Option<TimeOfDay>,
}

impl AssignmentPatch {
    pub fn is_empty(&self) -> bool {
        self == &AssignmentPatch::default()
    }

    /// Whether the patch changes who teaches or when.
    pub fn moves_slot(&self) -> bool {
        self.faculty_id.is_some()
            || self.day.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
    }

    /// Overlay this patch on a stored record.
    pub fn merge(&self, current: &Assignment) -> NewAssignment {
        NewAssignment {
            faculty_id: self.faculty_id.unwrap_or(current.faculty_id),
            school_id: self.school_id.unwrap_or(current.school_id),
            grade: self.grade.clone().unwrap_or_else(|| current.grade.clone()),
            subject: self.subject.clone().unwrap_or_else(|| current.subject.clone()),
            day: self.day.unwrap_or(current.day),
            start_time: self.start_time.unwrap_or(current.start_time),
            end_time: self.end_time.unwrap_or(current.end_time),
        }
    }
}

/// Timetable row enriched with display names and a conflict flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub faculty_name: Option<String>,
    pub school_name: Option<String>,
    /// Set when the entry overlaps another entry of the same faculty member.
    pub conflicting: bool,
}
