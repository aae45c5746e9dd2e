mod common;

use common::{answer, fixture, start_time};
use formflow_core::{
    models::{Answers, ChoiceCount, FieldAggregation, FieldKind},
    params::{
        ActivityWindow, AddField, CompleteStep, CreateForm, FieldReport, Id, SubmitForm,
        TrackFormView, TrackView,
    },
    Sweeper, TrackerError,
};
use jiff::{civil::date, SignedDuration};
use serde_json::json;

#[tokio::test]
async fn test_process_reports() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Funnel", "linear", &[true, true]).await;

    for session in ["a", "b", "c", "d"] {
        fx.tracker
            .track_view(&TrackView {
                process_id: process.id,
                session_id: session.to_string(),
            })
            .await
            .expect("Failed to track view");
    }

    // a finishes in 30 minutes, b stops after the first step, c never starts
    // a step, d only looked
    let a = fx.start(process.id, "a").await;
    let b = fx.start(process.id, "b").await;
    let c = fx.start(process.id, "c").await;

    for step in &steps {
        fx.clock.advance(SignedDuration::from_mins(15));
        fx.tracker
            .complete_step(&CompleteStep {
                progress_id: a.id,
                step_id: step.step.id,
                answers: answer(step.field_id, "yes"),
            })
            .await
            .expect("Failed to complete step");
        if step.step.order == 0 {
            fx.tracker
                .complete_step(&CompleteStep {
                    progress_id: b.id,
                    step_id: step.step.id,
                    answers: answer(step.field_id, "yes"),
                })
                .await
                .expect("Failed to complete step");
        }
    }
    fx.tracker
        .complete(&Id { id: a.id })
        .await
        .expect("Failed to complete process");

    fx.clock.advance(SignedDuration::from_hours(30));
    Sweeper::new(fx.tracker.clone())
        .sweep_once()
        .await
        .expect("Sweep failed");

    let rate = fx
        .tracker
        .completion_rate(&Id { id: process.id })
        .await
        .expect("Failed to compute completion rate");
    assert_eq!(rate.total_views, 4);
    assert_eq!(rate.total_started, 3);
    assert_eq!(rate.total_completed, 1);
    assert_eq!(rate.total_abandoned, 2);
    assert_eq!(rate.total_in_progress, 0);
    assert_eq!(rate.completion_rate, 33.33);
    assert_eq!(rate.abandonment_rate, 66.67);

    let drop_off = fx
        .tracker
        .drop_off(&Id { id: process.id })
        .await
        .expect("Failed to compute drop-off");
    assert_eq!(drop_off.steps.len(), 2);
    let first = &drop_off.steps[0];
    assert_eq!((first.started_count, first.completed_count), (2, 2));
    assert_eq!(first.retention_rate, 66.67);
    let second = &drop_off.steps[1];
    assert_eq!((second.started_count, second.completed_count), (1, 1));
    assert_eq!(second.retention_rate, 50.0);

    let times = fx
        .tracker
        .completion_times(&Id { id: process.id })
        .await
        .expect("Failed to compute completion times");
    assert_eq!(times.sample_size, 1);
    assert_eq!(times.average_minutes, Some(30.0));
    assert_eq!(times.median_minutes, Some(30.0));

    let abandoned = fx
        .tracker
        .abandoned_progress(&Id { id: process.id })
        .await
        .expect("Failed to list abandoned progress");
    let ids: Vec<u64> = abandoned.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![c.id, b.id]);
    // b last acted 15 minutes after starting
    assert_eq!(abandoned[1].hours_inactive, 30.25);
    assert_eq!(abandoned[0].hours_inactive, 30.5);
}

#[tokio::test]
async fn test_reports_on_unknown_process() {
    let fx = fixture().await;
    let err = fx
        .tracker
        .completion_rate(&Id { id: 42 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        formflow_core::TrackerError::NotFound {
            entity: "Process",
            id: 42
        }
    ));
}

#[tokio::test]
async fn test_form_reports() {
    let fx = fixture().await;
    let form = fx
        .tracker
        .create_form(&CreateForm {
            title: "Survey".to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create form");
    let mut field_ids = Vec::new();
    for (label, kind) in [
        (
            "Rating",
            FieldKind::Number {
                min_value: Some(1.0),
                max_value: Some(5.0),
            },
        ),
        (
            "Colour",
            FieldKind::Radio {
                options: vec!["red".to_string(), "blue".to_string()],
            },
        ),
        (
            "Comment",
            FieldKind::Textarea {
                min_length: None,
                max_length: None,
            },
        ),
    ] {
        let field = fx
            .tracker
            .add_field(&AddField {
                form_id: form.id,
                label: label.to_string(),
                description: None,
                is_required: false,
                kind,
            })
            .await
            .expect("Failed to add field");
        field_ids.push(field.id);
    }
    let (rating, colour, comment) = (field_ids[0], field_ids[1], field_ids[2]);

    for session in ["a", "b", "c", "d", "e"] {
        fx.tracker
            .track_form_view(&TrackFormView {
                form_id: form.id,
                session_id: session.to_string(),
            })
            .await
            .expect("Failed to track form view");
    }

    let submit = |session: &str, answers: Answers, draft: bool| SubmitForm {
        form_id: form.id,
        session_id: session.to_string(),
        answers,
        draft,
    };
    // a and b submit, c keeps a draft, d submits and is archived, e only looked
    let plan = [
        submit(
            "a",
            Answers::from([(rating, json!(4)), (colour, json!("red")), (comment, json!("nice"))]),
            false,
        ),
        submit(
            "d",
            Answers::from([(rating, json!(5)), (colour, json!("blue"))]),
            false,
        ),
        submit(
            "b",
            Answers::from([(rating, json!(2)), (colour, json!("red"))]),
            false,
        ),
        submit("c", Answers::from([(colour, json!("blue"))]), true),
    ];
    let mut submissions = Vec::new();
    for params in &plan {
        fx.clock.advance(SignedDuration::from_mins(10));
        submissions.push(
            fx.tracker
                .submit_form(params)
                .await
                .expect("Failed to submit form"),
        );
    }
    fx.tracker
        .archive_submission(&Id {
            id: submissions[1].id,
        })
        .await
        .expect("Failed to archive submission");

    let overview = fx
        .tracker
        .form_overview(&Id { id: form.id })
        .await
        .expect("Failed to compute form overview");
    assert_eq!(overview.total_views, 5);
    assert_eq!(overview.total_submissions, 2);
    assert_eq!(overview.conversion_rate, 40.0);
    assert_eq!(overview.last_viewed_at, Some(start_time()));
    assert_eq!(
        overview.last_submitted_at,
        Some(start_time() + SignedDuration::from_mins(30))
    );

    let drop_off = fx
        .tracker
        .form_drop_off(&Id { id: form.id })
        .await
        .expect("Failed to compute form drop-off");
    assert_eq!(
        (drop_off.views, drop_off.started, drop_off.submitted),
        (5, 4, 2)
    );
    assert_eq!(drop_off.start_rate, 80.0);
    assert_eq!(drop_off.completion_rate, 50.0);

    let summaries = fx
        .tracker
        .field_summary(&FieldReport {
            form_id: form.id,
            field_id: None,
        })
        .await
        .expect("Failed to summarize fields");
    let ids: Vec<u64> = summaries.iter().map(|s| s.field_id).collect();
    assert_eq!(ids, field_ids);
    assert_eq!(summaries[0].total_responses, 2);
    assert_eq!(
        summaries[0].aggregation,
        FieldAggregation::Numeric {
            average: Some(3.0),
            min: Some(2.0),
            max: Some(4.0),
            sum: 6.0,
        }
    );
    assert_eq!(
        summaries[1].aggregation,
        FieldAggregation::Choices {
            counts: vec![ChoiceCount {
                value: "red".to_string(),
                count: 2,
            }],
        }
    );
    assert_eq!(summaries[2].field_type, "textarea");
    assert_eq!(summaries[2].total_responses, 1);

    let single = fx
        .tracker
        .field_summary(&FieldReport {
            form_id: form.id,
            field_id: Some(colour),
        })
        .await
        .expect("Failed to summarize field");
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].label, "Colour");

    let err = fx
        .tracker
        .field_summary(&FieldReport {
            form_id: form.id,
            field_id: Some(999),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::NotFound {
            entity: "Field",
            id: 999
        }
    ));
}

#[tokio::test]
async fn test_form_reports_on_unknown_form() {
    let fx = fixture().await;
    let err = fx
        .tracker
        .track_form_view(&TrackFormView {
            form_id: 7,
            session_id: "a".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::NotFound {
            entity: "Form",
            id: 7
        }
    ));

    let err = fx.tracker.form_overview(&Id { id: 7 }).await.unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { entity: "Form", .. }));
}

#[tokio::test]
async fn test_activity_over_time() {
    let fx = fixture().await;
    let (process, steps) = fx.process("Daily", "linear", &[true]).await;
    let view = |session: &str| TrackView {
        process_id: process.id,
        session_id: session.to_string(),
    };

    fx.tracker.track_view(&view("a")).await.expect("Failed to track view");
    fx.tracker.track_view(&view("b")).await.expect("Failed to track view");

    fx.clock.advance(SignedDuration::from_hours(24));
    fx.tracker.track_view(&view("c")).await.expect("Failed to track view");
    let progress = fx.start(process.id, "c").await;
    fx.tracker
        .complete_step(&CompleteStep {
            progress_id: progress.id,
            step_id: steps[0].step.id,
            answers: answer(steps[0].field_id, "done"),
        })
        .await
        .expect("Failed to complete step");
    fx.tracker
        .complete(&Id { id: progress.id })
        .await
        .expect("Failed to complete process");

    let activity = fx
        .tracker
        .activity_over_time(&ActivityWindow {
            process_id: process.id,
            days: Some(3),
        })
        .await
        .expect("Failed to compute activity");
    let days: Vec<_> = activity.views.iter().map(|d| d.date).collect();
    assert_eq!(
        days,
        vec![date(2023, 12, 31), date(2024, 1, 1), date(2024, 1, 2)]
    );
    let views: Vec<u64> = activity.views.iter().map(|d| d.count).collect();
    assert_eq!(views, vec![0, 2, 1]);
    let completions: Vec<u64> = activity.completions.iter().map(|d| d.count).collect();
    assert_eq!(completions, vec![0, 0, 1]);

    let default_window = fx
        .tracker
        .activity_over_time(&ActivityWindow {
            process_id: process.id,
            days: None,
        })
        .await
        .expect("Failed to compute activity");
    assert_eq!(default_window.days, 30);
    assert_eq!(default_window.views.len(), 30);

    for days in [0, 366] {
        let err = fx
            .tracker
            .activity_over_time(&ActivityWindow {
                process_id: process.id,
                days: Some(days),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput { ref field, .. } if field == "days"));
    }
}
