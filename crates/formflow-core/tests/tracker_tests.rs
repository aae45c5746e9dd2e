mod common;

use common::{answer, fixture, TestStep};
use formflow_core::{
    models::{CompletionStatus, Navigation, ProgressStatus, Visitor},
    params::{
        AddStep, CompleteStep, CreateProcess, FindProgress, Id, ListProgress, Navigate,
        SetPassword, SkipStep, StartProcess, UpdateProcess,
    },
    TrackerError,
};
use jiff::SignedDuration;

fn complete(progress_id: u64, step: &TestStep, value: &str) -> CompleteStep {
    CompleteStep {
        progress_id,
        step_id: step.step.id,
        answers: answer(step.field_id, value),
    }
}

fn navigate(progress_id: u64) -> Navigate {
    Navigate {
        progress_id,
        expected_version: None,
    }
}

#[tokio::test]
async fn test_linear_process_runs_to_completion() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Signup", "linear", &[true, true, true]).await;
    let progress = fx.start(process.id, "visitor-1").await;
    assert_eq!(progress.status, ProgressStatus::InProgress);
    assert_eq!(progress.current_step_index, 0);

    for (i, step) in steps.iter().enumerate() {
        let current = fx
            .tracker
            .get_current_step(&Id { id: progress.id })
            .await
            .expect("Failed to get current step");
        assert_eq!(current.step.id, step.step.id);
        assert_eq!(current.index, i as u32);

        fx.clock.advance(SignedDuration::from_mins(5));
        let result = fx
            .tracker
            .complete_step(&complete(progress.id, step, "fine"))
            .await
            .expect("Failed to complete step");
        assert!(!result.unchanged);
        assert!(result.submission_id.is_some());

        let navigation = fx
            .tracker
            .advance(&navigate(progress.id))
            .await
            .expect("Failed to advance");
        assert_eq!(navigation.is_completed(), i == steps.len() - 1);
    }

    let finished = fx.progress(progress.id).await;
    assert_eq!(finished.status, ProgressStatus::Completed);
    assert_eq!(finished.completion_percentage, 100.0);
    assert_eq!(finished.current_step_index, 3);
    assert_eq!(finished.completed_at, Some(fx.tracker.now()));

    let err = fx
        .tracker
        .get_current_step(&Id { id: progress.id })
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { .. }));

    // finishing again reports the existing completion
    let done = fx
        .tracker
        .complete(&Id { id: progress.id })
        .await
        .expect("Completing twice should succeed");
    assert_eq!(Some(done.completed_at), finished.completed_at);
}

#[tokio::test]
async fn test_advance_count_is_capped_at_step_count() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Survey", "linear", &[false, false, false]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    for k in 1..=steps.len() {
        fx.tracker
            .skip_step(&SkipStep {
                progress_id: progress.id,
                step_id: steps[k - 1].step.id,
            })
            .await
            .expect("Failed to skip step");
        fx.tracker
            .advance(&navigate(progress.id))
            .await
            .expect("Failed to advance");
        assert_eq!(fx.progress(progress.id).await.current_step_index, k as u32);
    }

    let err = fx.tracker.advance(&navigate(progress.id)).await.unwrap_err();
    assert!(matches!(
        err,
        TrackerError::ProgressClosed {
            status: ProgressStatus::Completed,
            ..
        }
    ));
    let progress = fx.progress(progress.id).await;
    assert_eq!(progress.current_step_index, 3);
    assert_eq!(progress.completion_percentage, 100.0);
}

#[tokio::test]
async fn test_linear_order_is_enforced() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Ordered", "linear", &[true, false]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    let err = fx.tracker.advance(&navigate(progress.id)).await.unwrap_err();
    assert!(matches!(err, TrackerError::StepIncomplete { step_id } if step_id == steps[0].step.id));

    let err = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[1], "early"))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::StepIncomplete { step_id } if step_id == steps[0].step.id));

    // retreating from the first step changes nothing
    let before = fx.progress(progress.id).await;
    let current = fx
        .tracker
        .retreat(&navigate(progress.id))
        .await
        .expect("Failed to retreat");
    assert_eq!(current.index, 0);
    assert_eq!(fx.progress(progress.id).await.version, before.version);
}

#[tokio::test]
async fn test_retreat_after_advance() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Back", "linear", &[true, true]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    fx.tracker
        .complete_step(&complete(progress.id, &steps[0], "one"))
        .await
        .expect("Failed to complete step");
    fx.tracker
        .advance(&navigate(progress.id))
        .await
        .expect("Failed to advance");

    let current = fx
        .tracker
        .retreat(&navigate(progress.id))
        .await
        .expect("Failed to retreat");
    assert_eq!(current.index, 0);
    assert_eq!(current.status, CompletionStatus::Completed);
}

#[tokio::test]
async fn test_free_process_completion_is_idempotent() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Free", "free", &[true, true]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    // free processes accept any order
    let first = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[1], "second first"))
        .await
        .expect("Failed to complete step");
    let version = fx.progress(progress.id).await.version;

    let again = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[1], "second first"))
        .await
        .expect("Repeating a completion should succeed");
    assert!(again.unchanged);
    assert_eq!(again.submission_id, first.submission_id);
    assert_eq!(fx.progress(progress.id).await.version, version);

    let err = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[1], "changed my mind"))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::AlreadyCompleted { step_id } if step_id == steps[1].step.id));

    let err = fx.tracker.advance(&navigate(progress.id)).await.unwrap_err();
    assert!(matches!(err, TrackerError::LinearOnly { process_id } if process_id == process.id));
}

#[tokio::test]
async fn test_resubmission_updates_the_same_submission() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Editable", "free", &[true]).await;
    fx.tracker
        .update_process(&UpdateProcess {
            id: process.id,
            allow_resubmission: Some(true),
            ..Default::default()
        })
        .await
        .expect("Failed to update process");
    let progress = fx.start(process.id, "visitor-1").await;

    let first = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[0], "draft answer"))
        .await
        .expect("Failed to complete step");
    let second = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[0], "final answer"))
        .await
        .expect("Resubmission should succeed");
    assert!(!second.unchanged);
    assert_eq!(second.submission_id, first.submission_id);

    let submission = fx
        .tracker
        .get_submission(&Id {
            id: second.submission_id.expect("submission id"),
        })
        .await
        .expect("Failed to get submission")
        .expect("Submission should exist");
    assert_eq!(submission.answers, answer(steps[0].field_id, "final answer"));
    assert_eq!(submission.progress_id, Some(progress.id));
}

#[tokio::test]
async fn test_required_steps_cannot_be_skipped() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Strict", "linear", &[true, false]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    let err = fx
        .tracker
        .skip_step(&SkipStep {
            progress_id: progress.id,
            step_id: steps[0].step.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::StepRequired { step_id } if step_id == steps[0].step.id));
    assert_eq!(fx.progress(progress.id).await, progress);

    let detail = fx
        .tracker
        .get_progress_detail(&Id { id: progress.id })
        .await
        .expect("Failed to get detail")
        .expect("Detail should exist");
    assert!(detail
        .entries
        .iter()
        .all(|entry| entry.status == CompletionStatus::Pending));
}

#[tokio::test]
async fn test_skipping_twice_is_a_no_op() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Optional", "free", &[false]).await;
    let progress = fx.start(process.id, "visitor-1").await;
    let skip = SkipStep {
        progress_id: progress.id,
        step_id: steps[0].step.id,
    };

    let first = fx.tracker.skip_step(&skip).await.expect("Failed to skip");
    assert_eq!(first.status, CompletionStatus::Skipped);
    assert_eq!(first.completion_percentage, 100.0);
    let again = fx.tracker.skip_step(&skip).await.expect("Failed to skip again");
    assert!(again.unchanged);

    // a skipped step can still be completed later
    let completed = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[0], "after all"))
        .await
        .expect("Failed to complete skipped step");
    assert_eq!(completed.status, CompletionStatus::Completed);

    let err = fx.tracker.skip_step(&skip).await.unwrap_err();
    assert!(matches!(err, TrackerError::AlreadyCompleted { .. }));
}

#[tokio::test]
async fn test_percentage_never_decreases() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Growing", "free", &[true, true, false]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    let result = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[0], "one"))
        .await
        .expect("Failed to complete step");
    assert_eq!(result.completion_percentage, 50.0);

    // a new required step would lower the ratio to one in three
    fx.tracker
        .add_step(&AddStep {
            process_id: process.id,
            form_id: steps[0].step.form_id,
            title: "Late addition".to_string(),
            description: None,
            is_required: true,
        })
        .await
        .expect("Failed to add step");

    let result = fx
        .tracker
        .skip_step(&SkipStep {
            progress_id: progress.id,
            step_id: steps[2].step.id,
        })
        .await
        .expect("Failed to skip step");
    assert_eq!(result.completion_percentage, 50.0);

    let result = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[1], "two"))
        .await
        .expect("Failed to complete step");
    assert_eq!(result.completion_percentage, 66.67);
}

#[tokio::test]
async fn test_complete_requires_all_required_steps() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Checklist", "free", &[true, false, true]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    fx.tracker
        .complete_step(&complete(progress.id, &steps[0], "done"))
        .await
        .expect("Failed to complete step");

    let err = fx
        .tracker
        .complete(&Id { id: progress.id })
        .await
        .unwrap_err();
    match err {
        TrackerError::IncompleteRequiredSteps { step_ids } => {
            assert_eq!(step_ids, vec![steps[2].step.id]);
        }
        other => panic!("unexpected error: {other}"),
    }

    fx.tracker
        .complete_step(&complete(progress.id, &steps[2], "done"))
        .await
        .expect("Failed to complete step");
    let done = fx
        .tracker
        .complete(&Id { id: progress.id })
        .await
        .expect("Failed to complete process");
    assert_eq!(done.completion_percentage, 100.0);
}

#[tokio::test]
async fn test_answers_are_validated() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Validated", "free", &[true]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    let err = fx
        .tracker
        .complete_step(&complete(progress.id, &steps[0], "   "))
        .await
        .unwrap_err();
    match err {
        TrackerError::Validation { errors } => {
            assert_eq!(
                errors.for_field(steps[0].field_id),
                ["This field is required".to_string()]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.progress(progress.id).await.version, progress.version);
}

#[tokio::test]
async fn test_concurrent_advances_move_once() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Race", "linear", &[true, true]).await;
    let progress = fx.start(process.id, "visitor-1").await;
    fx.tracker
        .complete_step(&complete(progress.id, &steps[0], "ready"))
        .await
        .expect("Failed to complete step");
    let version = fx
        .tracker
        .get_current_step(&Id { id: progress.id })
        .await
        .expect("Failed to get current step")
        .version;

    let request = Navigate {
        progress_id: progress.id,
        expected_version: Some(version),
    };
    let (a, b) = tokio::join!(
        fx.tracker.advance(&request),
        fx.tracker.advance(&request)
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(TrackerError::ConcurrencyConflict { .. }))));
    assert_eq!(fx.progress(progress.id).await.current_step_index, 1);
}

#[tokio::test]
async fn test_stale_expected_version_is_rejected() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Stale", "linear", &[true, true]).await;
    let progress = fx.start(process.id, "visitor-1").await;
    fx.tracker
        .complete_step(&complete(progress.id, &steps[0], "ready"))
        .await
        .expect("Failed to complete step");

    let err = fx
        .tracker
        .advance(&Navigate {
            progress_id: progress.id,
            expected_version: Some(progress.version),
        })
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(fx.progress(progress.id).await.current_step_index, 0);
}

#[tokio::test]
async fn test_start_checks_availability() {
    let fx = fixture().await;
    let draft = fx
        .tracker
        .create_process(&CreateProcess {
            title: "Draft".to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create process");
    let start = |process_id| StartProcess {
        process_id,
        visitor: Visitor::anonymous("visitor-1"),
        password: None,
    };

    // no steps and unpublished
    let err = fx.tracker.start(&start(draft.id)).await.unwrap_err();
    assert!(matches!(err, TrackerError::ProcessUnavailable { .. }));

    let (process, _) = fx.process("Gated", "linear", &[true]).await;
    fx.tracker
        .deactivate_process(&Id { id: process.id })
        .await
        .expect("Failed to deactivate");
    let err = fx.tracker.start(&start(process.id)).await.unwrap_err();
    assert!(matches!(err, TrackerError::ProcessUnavailable { ref reason, .. } if reason.contains("inactive")));
    fx.tracker
        .activate_process(&Id { id: process.id })
        .await
        .expect("Failed to activate");

    let err = fx.tracker.start(&start(9_999)).await.unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { entity: "Process", .. }));
}

#[tokio::test]
async fn test_private_process_requires_password() {
    let fx = fixture().await;
    let (process, _) = fx.process("Members", "linear", &[true]).await;
    fx.tracker
        .update_process(&UpdateProcess {
            id: process.id,
            visibility: Some("private".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to update process");
    let process = fx
        .tracker
        .set_process_password(&SetPassword {
            id: process.id,
            password: Some("open sesame".to_string()),
        })
        .await
        .expect("Failed to set password");
    assert!(process.password_protected);

    let start = |password: Option<&str>| StartProcess {
        process_id: process.id,
        visitor: Visitor::anonymous("visitor-1"),
        password: password.map(String::from),
    };
    for password in [None, Some("wrong")] {
        let err = fx.tracker.start(&start(password)).await.unwrap_err();
        assert!(matches!(err, TrackerError::ProcessUnavailable { .. }));
    }
    fx.tracker
        .start(&start(Some("open sesame")))
        .await
        .expect("Correct password should be accepted");
}

#[tokio::test]
async fn test_start_resumes_open_record() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Resume", "linear", &[true, true]).await;
    let first = fx.start(process.id, "visitor-1").await;

    fx.clock.advance(SignedDuration::from_hours(2));
    let resumed = fx.start(process.id, "visitor-1").await;
    assert_eq!(resumed.id, first.id);
    assert_eq!(resumed.started_at, first.started_at);
    assert!(resumed.last_activity_at > first.last_activity_at);

    let other = fx.start(process.id, "visitor-2").await;
    assert_ne!(other.id, first.id);

    // a finished record is not resumed
    fx.tracker
        .complete_step(&complete(first.id, &steps[0], "a"))
        .await
        .expect("Failed to complete step");
    fx.tracker
        .advance(&navigate(first.id))
        .await
        .expect("Failed to advance");
    fx.tracker
        .complete_step(&complete(first.id, &steps[1], "b"))
        .await
        .expect("Failed to complete step");
    let navigation = fx
        .tracker
        .advance(&navigate(first.id))
        .await
        .expect("Failed to advance");
    assert!(matches!(navigation, Navigation::Completed(_)));

    let fresh = fx.start(process.id, "visitor-1").await;
    assert_ne!(fresh.id, first.id);

    let found = fx
        .tracker
        .find_progress(&FindProgress {
            process_id: process.id,
            session_id: "visitor-1".to_string(),
        })
        .await
        .expect("Failed to find progress")
        .expect("Progress should exist");
    assert_eq!(found.id, fresh.id);

    let page = fx
        .tracker
        .list_progress(&ListProgress {
            process_id: process.id,
            status: Some(ProgressStatus::InProgress),
            ..Default::default()
        })
        .await
        .expect("Failed to list progress");
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, fresh.id);
}

#[tokio::test]
async fn test_removed_step_does_not_skip_the_last_one() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Shrink", "linear", &[true, true, false]).await;
    let progress = fx.start(process.id, "visitor-1").await;

    for step in &steps[..2] {
        fx.tracker
            .complete_step(&complete(progress.id, step, "done"))
            .await
            .expect("Failed to complete step");
        fx.tracker
            .advance(&navigate(progress.id))
            .await
            .expect("Failed to advance");
    }
    assert_eq!(fx.progress(progress.id).await.current_step_index, 2);

    fx.tracker
        .remove_step(&Id {
            id: steps[0].step.id,
        })
        .await
        .expect("Failed to remove step");

    let current = fx
        .tracker
        .get_current_step(&Id { id: progress.id })
        .await
        .expect("Failed to get current step");
    assert_eq!(current.step.id, steps[2].step.id);

    let err = fx.tracker.advance(&navigate(progress.id)).await.unwrap_err();
    assert!(
        matches!(err, TrackerError::StepIncomplete { step_id } if step_id == steps[2].step.id)
    );
    assert_eq!(fx.progress(progress.id).await.status, ProgressStatus::InProgress);

    fx.tracker
        .skip_step(&SkipStep {
            progress_id: progress.id,
            step_id: steps[2].step.id,
        })
        .await
        .expect("Failed to skip step");
    let navigation = fx
        .tracker
        .advance(&navigate(progress.id))
        .await
        .expect("Failed to advance");
    assert!(matches!(navigation, Navigation::Completed(_)));
}
