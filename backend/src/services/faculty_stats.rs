//! Dashboard statistics over the faculty directory.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Faculty;

/// Statuses that count towards the active-grants figure.
const GRANT_STATUSES: [&str; 2] = ["Active", "Grant Phase"];

/// Length of one growth comparison window, in days.
const GROWTH_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyStats {
    pub total_faculty: usize,
    pub active_grants: usize,
    /// Percentage change of new faculty in the last 30 days against the 30
    /// days before; 0 when the earlier window is empty.
    pub research_growth: f64,
    pub avg_progress: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn compute_faculty_stats(faculty: &[Faculty], now: DateTime<Utc>) -> FacultyStats {
    let window = Duration::days(GROWTH_WINDOW_DAYS);
    let current_start = now - window;
    let previous_start = current_start - window;

    let active_grants = faculty
        .iter()
        .filter(|f| GRANT_STATUSES.contains(&f.status.as_str()))
        .count();
    let current = faculty.iter().filter(|f| f.created_at >= current_start).count();
    let previous = faculty
        .iter()
        .filter(|f| f.created_at >= previous_start && f.created_at < current_start)
        .count();

    let research_growth = if previous == 0 {
        0.0
    } else {
        round1((current as f64 - previous as f64) / previous as f64 * 100.0)
    };

    let avg_progress = if faculty.is_empty() {
        0.0
    } else {
        let total: u32 = faculty.iter().map(|f| u32::from(f.progress)).sum();
        round1(f64::from(total) / faculty.len() as f64)
    };

    FacultyStats {
        total_faculty: faculty.len(),
        active_grants,
        research_growth,
        avg_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FacultyId, NewFaculty};

    fn member(id: i64, status: &str, progress: u32, created_at: DateTime<Utc>) -> Faculty {
        let new = NewFaculty {
            name: format!("Member {}", id),
            role: String::new(),
            dept: String::new(),
            research: String::new(),
            progress: Some(progress),
            status: status.to_string(),
        };
        Faculty::from_new(FacultyId::new(id), new, created_at)
    }

    #[test]
    fn test_empty_directory() {
        let stats = compute_faculty_stats(&[], Utc::now());
        assert_eq!(stats.total_faculty, 0);
        assert_eq!(stats.active_grants, 0);
        assert_eq!(stats.research_growth, 0.0);
        assert_eq!(stats.avg_progress, 0.0);
    }

    #[test]
    fn test_active_grants_counts_both_statuses() {
        let now = Utc::now();
        let faculty = vec![
            member(1, "Active", 0, now),
            member(2, "Grant Phase", 0, now),
            member(3, "On Leave", 0, now),
        ];
        assert_eq!(compute_faculty_stats(&faculty, now).active_grants, 2);
    }

    #[test]
    fn test_growth_compares_thirty_day_windows() {
        let now = Utc::now();
        let faculty = vec![
            member(1, "Active", 0, now - Duration::days(1)),
            member(2, "Active", 0, now - Duration::days(10)),
            member(3, "Active", 0, now - Duration::days(29)),
            member(4, "Active", 0, now - Duration::days(45)),
            member(5, "Active", 0, now - Duration::days(50)),
            // outside both windows
            member(6, "Active", 0, now - Duration::days(90)),
        ];
        // 3 new against 2 before: +50%
        assert_eq!(compute_faculty_stats(&faculty, now).research_growth, 50.0);
    }

    #[test]
    fn test_growth_is_zero_without_previous_window() {
        let now = Utc::now();
        let faculty = vec![member(1, "Active", 0, now)];
        assert_eq!(compute_faculty_stats(&faculty, now).research_growth, 0.0);
    }

    #[test]
    fn test_average_progress_rounds_to_one_decimal() {
        let now = Utc::now();
        let faculty = vec![
            member(1, "Active", 10, now),
            member(2, "Active", 20, now),
            member(3, "Active", 25, now),
        ];
        // 55 / 3 = 18.333...
        assert_eq!(compute_faculty_stats(&faculty, now).avg_progress, 18.3);
    }
}
