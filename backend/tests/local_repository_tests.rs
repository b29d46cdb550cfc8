//! Concurrency tests for LocalRepository.
//!
//! The timetable check and write share one lock, so racing requests for the
//! same slot must leave exactly one stored record.

use std::sync::Arc;

use giftech_admin::db::repositories::LocalRepository;
use giftech_admin::db::repository::{
    AssignmentWrite, FacultyRepository, SchoolRepository, TimetableRepository,
};
use giftech_admin::models::{FacultyId, NewAssignment, NewFaculty, NewSchool, SchoolId, Weekday};

async fn seed(repo: &LocalRepository) -> (FacultyId, SchoolId) {
    let faculty: NewFaculty = serde_json::from_str(r#"{"name": "Grace Hopper"}"#).unwrap();
    let school: NewSchool = serde_json::from_str(r#"{"name": "Harbor Academy"}"#).unwrap();
    let faculty = repo.insert_faculty(faculty).await.unwrap();
    let school = repo.insert_school(school).await.unwrap();
    (faculty.id, school.id)
}

fn lesson(faculty: FacultyId, school: SchoolId, day: Weekday, start: &str, end: &str) -> NewAssignment {
    NewAssignment {
        faculty_id: faculty,
        school_id: school,
        grade: "Grade 11".to_string(),
        subject: "Chemistry".to_string(),
        day,
        start_time: start.parse().unwrap(),
        end_time: end.parse().unwrap(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_conflicting_creations_store_one() {
    let repo = Arc::new(LocalRepository::new());
    let (faculty, school) = seed(&repo).await;

    let slots = [
        ("09:00", "10:00"),
        ("09:30", "10:30"),
        ("08:30", "09:30"),
        ("09:15", "09:45"),
    ];
    let handles: Vec<_> = (0..32)
        .map(|i| {
            let repo = Arc::clone(&repo);
            let (start, end) = slots[i % slots.len()];
            let request = lesson(faculty, school, Weekday::Tuesday, start, end);
            tokio::spawn(async move { repo.insert_assignment(request).await })
        })
        .collect();

    let mut stored = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            AssignmentWrite::Stored(_) => stored += 1,
            AssignmentWrite::Rejected(_) => rejected += 1,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(stored, 1);
    assert_eq!(rejected, 31);
    assert_eq!(repo.list_assignments(Some(faculty)).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_disjoint_creations_all_succeed() {
    let repo = Arc::new(LocalRepository::new());
    let (faculty, school) = seed(&repo).await;

    let hours = [("08:00", "09:00"), ("09:00", "10:00"), ("10:00", "11:00"), ("11:00", "12:00")];
    let handles: Vec<_> = Weekday::ALL
        .iter()
        .flat_map(|day| hours.iter().map(move |(start, end)| (*day, *start, *end)))
        .map(|(day, start, end)| {
            let repo = Arc::clone(&repo);
            let request = lesson(faculty, school, day, start, end);
            tokio::spawn(async move { repo.insert_assignment(request).await })
        })
        .collect();

    for handle in handles {
        assert!(matches!(handle.await.unwrap().unwrap(), AssignmentWrite::Stored(_)));
    }
    assert_eq!(repo.list_assignments(None).await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_different_faculty_share_a_slot() {
    let repo = LocalRepository::new();
    let (first, school) = seed(&repo).await;
    let second = repo
        .insert_faculty(serde_json::from_str(r#"{"name": "Katherine Johnson"}"#).unwrap())
        .await
        .unwrap()
        .id;

    for faculty in [first, second] {
        let outcome = repo
            .insert_assignment(lesson(faculty, school, Weekday::Monday, "09:00", "10:00"))
            .await
            .unwrap();
        assert!(matches!(outcome, AssignmentWrite::Stored(_)));
    }
}

#[tokio::test]
async fn test_rejection_names_existing_assignment() {
    let repo = LocalRepository::new();
    let (faculty, school) = seed(&repo).await;
    let AssignmentWrite::Stored(existing) = repo
        .insert_assignment(lesson(faculty, school, Weekday::Monday, "09:00", "10:00"))
        .await
        .unwrap()
    else {
        panic!("first slot should be free");
    };

    let AssignmentWrite::Rejected(conflict) = repo
        .insert_assignment(lesson(faculty, school, Weekday::Monday, "09:30", "10:30"))
        .await
        .unwrap()
    else {
        panic!("overlapping slot should be rejected");
    };
    assert_eq!(conflict.existing.id, existing.id);
    assert_eq!(conflict.conflicting_subject(), "Chemistry");
}
