//! Faculty, school and student records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{FacultyId, SchoolId, StudentId};

/// Progress values are percentages.
pub const MAX_PROGRESS: u8 = 100;

/// Faculty member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: FacultyId,
    pub name: String,
    pub role: String,
    pub dept: String,
    pub research: String,
    /// Research/lab completion in percent (0-100)
    pub progress: u8,
    /// Free-form status, e.g. "Active", "Sabbatical", "Grant Phase"
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFaculty {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub dept: String,
    #[serde(default)]
    pub research: String,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default = "default_status")]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacultyPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub dept: Option<String>,
    #[serde(default)]
    pub research: Option<String>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Faculty {
    pub fn from_new(id: FacultyId, new: NewFaculty, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            role: new.role,
            dept: new.dept,
            research: new.research,
            progress: clamp_progress(new.progress.unwrap_or(0)),
            status: new.status,
            created_at,
        }
    }

    pub fn apply(&mut self, patch: &FacultyPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(role) = &patch.role {
            self.role = role.clone();
        }
        if let Some(dept) = &patch.dept {
            self.dept = dept.clone();
        }
        if let Some(research) = &patch.research {
            self.research = research.clone();
        }
        if let Some(progress) = patch.progress {
            self.progress = clamp_progress(progress);
        }
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
    }
}

fn clamp_progress(value: u32) -> u8 {
    value.min(MAX_PROGRESS as u32) as u8
}

fn default_status() -> String {
    "Active".to_string()
}

/// Partner school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub region: String,
    /// "Public", "Private", "Charter", "Non-Profit"
    pub school_type: String,
    pub student_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSchool {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default = "default_school_type")]
    pub school_type: String,
    #[serde(default)]
    pub student_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub school_type: Option<String>,
    #[serde(default)]
    pub student_count: Option<u32>,
}

impl School {
    pub fn from_new(id: SchoolId, new: NewSchool, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            region: new.region,
            school_type: new.school_type,
            student_count: new.student_count,
            created_at,
        }
    }

    pub fn apply(&mut self, patch: &SchoolPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(region) = &patch.region {
            self.region = region.clone();
        }
        if let Some(school_type) = &patch.school_type {
            self.school_type = school_type.clone();
        }
        if let Some(count) = patch.student_count {
            self.student_count = count;
        }
    }
}

fn default_school_type() -> String {
    "Public".to_string()
}

/// Student enrolled at a school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub school_id: SchoolId,
    pub name: String,
    pub grade: String,
    /// "Active", "Pending", "On-Leave"
    pub status: String,
    pub entry_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub school_id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub entry_year: Option<i32>,
}

impl Student {
    pub fn from_new(id: StudentId, new: NewStudent, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            school_id: new.school_id,
            name: new.name,
            grade: new.grade,
            status: new.status,
            entry_year: new.entry_year,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_faculty_defaults() {
        let new: NewFaculty = serde_json::from_str(r#"{"name": "Grace"}"#).unwrap();
        let faculty = Faculty::from_new(FacultyId::new(1), new, Utc::now());
        assert_eq!(faculty.progress, 0);
        assert_eq!(faculty.status, "Active");
    }

    #[test]
    fn test_progress_is_clamped() {
        let new: NewFaculty =
            serde_json::from_str(r#"{"name": "Grace", "progress": 250}"#).unwrap();
        let mut faculty = Faculty::from_new(FacultyId::new(1), new, Utc::now());
        assert_eq!(faculty.progress, MAX_PROGRESS);

        faculty.apply(&FacultyPatch {
            progress: Some(42),
            ..Default::default()
        });
        assert_eq!(faculty.progress, 42);
    }

    #[test]
    fn test_school_patch_updates_only_given_fields() {
        let new: NewSchool = serde_json::from_str(r#"{"name": "North High"}"#).unwrap();
        let mut school = School::from_new(SchoolId::new(1), new, Utc::now());
        assert_eq!(school.school_type, "Public");

        school.apply(&SchoolPatch {
            student_count: Some(320),
            ..Default::default()
        });
        assert_eq!(school.student_count, 320);
        assert_eq!(school.name, "North High");
    }

    #[test]
    fn test_new_student_requires_school() {
        assert!(serde_json::from_str::<NewStudent>(r#"{"name": "Lin"}"#).is_err());
        let new: NewStudent =
            serde_json::from_str(r#"{"name": "Lin", "school_id": 4, "grade": "Grade 9"}"#)
                .unwrap();
        assert_eq!(new.school_id, SchoolId::new(4));
        assert_eq!(new.status, "Active");
    }
}
