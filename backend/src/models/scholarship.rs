//! Scholarship applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ScholarshipId, SchoolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScholarshipStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: ScholarshipId,
    pub applicant_name: String,
    pub school_id: Option<SchoolId>,
    pub amount: f64,
    pub status: ScholarshipStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScholarship {
    pub applicant_name: String,
    #[serde(default)]
    pub school_id: Option<SchoolId>,
    #[serde(default)]
    pub amount: f64,
}

impl Scholarship {
    /// New applications always start out pending review.
    pub fn from_new(id: ScholarshipId, new: NewScholarship, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            applicant_name: new.applicant_name,
            school_id: new.school_id,
            amount: new.amount,
            status: ScholarshipStatus::Pending,
            created_at,
        }
    }
}
