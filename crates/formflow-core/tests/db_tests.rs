use formflow_core::{
    models::{Answers, NavigationMode, SubmissionStatus, Visibility, Visitor},
    Database, ProgressStatus, TrackerError,
};
use jiff::Timestamp;
use serde_json::json;
use tempfile::NamedTempFile;

/// Helper function to create a temporary database for testing
fn create_test_db() -> (NamedTempFile, Database) {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let db = Database::new(temp_file.path()).expect("Failed to create test database");
    (temp_file, db)
}

fn now() -> Timestamp {
    "2024-03-01T12:00:00Z".parse().expect("valid timestamp")
}

fn step_titles(db: &Database, process_id: u64) -> Vec<(u32, String)> {
    db.get_steps(process_id)
        .expect("Failed to get steps")
        .into_iter()
        .map(|s| (s.order, s.title))
        .collect()
}

#[test]
fn test_reopening_database_keeps_data() {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let form_id = {
        let mut db = Database::new(temp_file.path()).expect("Failed to create database");
        db.create_form("Survey", "survey", None, now())
            .expect("Failed to create form")
            .id
    };

    let db = Database::new(temp_file.path()).expect("Failed to reopen database");
    let form = db
        .get_form(form_id)
        .expect("Failed to get form")
        .expect("Form should exist");
    assert_eq!(form.slug, "survey");
}

#[test]
fn test_duplicate_slugs_are_rejected() {
    let (_temp_file, mut db) = create_test_db();

    db.create_form("Survey", "survey", None, now())
        .expect("Failed to create form");
    let err = db
        .create_form("Another survey", "survey", None, now())
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput { ref field, .. } if field == "slug"));

    db.create_process(
        "Flow",
        "flow",
        None,
        NavigationMode::Linear,
        Visibility::Public,
        false,
        now(),
    )
    .expect("Failed to create process");
    let err = db
        .create_process(
            "Flow again",
            "flow",
            None,
            NavigationMode::Free,
            Visibility::Public,
            false,
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput { ref field, .. } if field == "slug"));
}

#[test]
fn test_step_order_stays_dense() {
    let (_temp_file, mut db) = create_test_db();
    let form = db
        .create_form("Shared", "shared", None, now())
        .expect("Failed to create form");
    let process = db
        .create_process(
            "Ordered",
            "ordered",
            None,
            NavigationMode::Linear,
            Visibility::Public,
            false,
            now(),
        )
        .expect("Failed to create process");

    let a = db
        .add_step(process.id, form.id, "A", None, true, now())
        .expect("Failed to add step");
    let b = db
        .add_step(process.id, form.id, "B", None, true, now())
        .expect("Failed to add step");
    db.insert_step(process.id, Some(1), form.id, "Middle", None, false, now())
        .expect("Failed to insert step");
    assert_eq!(
        step_titles(&db, process.id),
        vec![
            (0, "A".to_string()),
            (1, "Middle".to_string()),
            (2, "B".to_string())
        ]
    );

    let err = db
        .insert_step(process.id, Some(9), form.id, "Far", None, true, now())
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput { ref field, .. } if field == "position"));

    db.swap_steps(a.id, b.id, now()).expect("Failed to swap steps");
    assert_eq!(
        step_titles(&db, process.id),
        vec![
            (0, "B".to_string()),
            (1, "Middle".to_string()),
            (2, "A".to_string())
        ]
    );

    let removed = db.remove_step(b.id, now()).expect("Failed to remove step");
    assert_eq!(removed.title, "B");
    assert_eq!(
        step_titles(&db, process.id),
        vec![(0, "Middle".to_string()), (1, "A".to_string())]
    );

    let err = db.remove_step(b.id, now()).unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { entity: "Step", .. }));
}

#[test]
fn test_swap_across_processes_is_rejected() {
    let (_temp_file, mut db) = create_test_db();
    let form = db
        .create_form("Shared", "shared", None, now())
        .expect("Failed to create form");
    let mut step_ids = Vec::new();
    for slug in ["one", "two"] {
        let process = db
            .create_process(
                slug,
                slug,
                None,
                NavigationMode::Free,
                Visibility::Public,
                false,
                now(),
            )
            .expect("Failed to create process");
        let step = db
            .add_step(process.id, form.id, "Only", None, true, now())
            .expect("Failed to add step");
        step_ids.push(step.id);
    }

    let err = db.swap_steps(step_ids[0], step_ids[1], now()).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput { .. }));
}

#[test]
fn test_abandon_only_matches_observed_activity() {
    let (_temp_file, mut db) = create_test_db();
    let form = db
        .create_form("Shared", "shared", None, now())
        .expect("Failed to create form");
    let process = db
        .create_process(
            "Idle",
            "idle",
            None,
            NavigationMode::Linear,
            Visibility::Public,
            false,
            now(),
        )
        .expect("Failed to create process");
    db.add_step(process.id, form.id, "Only", None, true, now())
        .expect("Failed to add step");
    db.set_process_published(process.id, Some(now()), now())
        .expect("Failed to publish process");

    let progress = db
        .start_progress(process.id, &Visitor::anonymous("idle"), None, now())
        .expect("Failed to start progress");

    let open = db.open_activity().expect("Failed to read activity");
    assert_eq!(open.len(), 1);
    let (open_id, observed) = open[0].clone();
    assert_eq!(open_id, progress.id);

    // activity changed since it was read
    let stale = db
        .abandon_if_idle(progress.id, "2000-01-01T00:00:00Z")
        .expect("Failed to abandon");
    assert!(!stale);

    assert!(db
        .abandon_if_idle(progress.id, &observed)
        .expect("Failed to abandon"));
    let abandoned = db
        .get_progress(progress.id)
        .expect("Failed to get progress")
        .expect("Progress should exist");
    assert_eq!(abandoned.status, ProgressStatus::Abandoned);
    assert_eq!(abandoned.version, progress.version + 1);
    assert_eq!(abandoned.last_activity_at, progress.last_activity_at);

    assert!(db.open_activity().expect("Failed to read activity").is_empty());
    assert!(!db
        .abandon_if_idle(progress.id, &observed)
        .expect("Failed to abandon"));
}

#[test]
fn test_submission_paging_and_archive() {
    let (_temp_file, mut db) = create_test_db();
    let form = db
        .create_form("Feedback", "feedback", None, now())
        .expect("Failed to create form");

    let mut ids = Vec::new();
    for i in 0..5 {
        let answers = Answers::from([(1, json!(format!("answer {i}")))]);
        let submission = db
            .create_submission(
                form.id,
                &format!("s{i}"),
                SubmissionStatus::Submitted,
                &answers,
                now(),
            )
            .expect("Failed to create submission");
        ids.push(submission.id);
    }

    let first = db
        .list_submissions(form.id, None, 2, 0)
        .expect("Failed to list submissions");
    assert_eq!(first.total, 5);
    assert!(first.has_more());
    assert_eq!(
        first.items.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![ids[4], ids[3]]
    );

    let last = db
        .list_submissions(form.id, None, 2, 4)
        .expect("Failed to list submissions");
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].id, ids[0]);
    assert!(!last.has_more());

    let archived = db
        .archive_submission(ids[2], now())
        .expect("Failed to archive submission");
    assert_eq!(archived.status, SubmissionStatus::Archived);

    let only_archived = db
        .list_submissions(form.id, Some(SubmissionStatus::Archived), 10, 0)
        .expect("Failed to list submissions");
    assert_eq!(only_archived.total, 1);
    assert_eq!(only_archived.items[0].answers, archived.answers);

    let err = db.archive_submission(999, now()).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::NotFound {
            entity: "Submission",
            ..
        }
    ));
}
