use jiff::Timestamp;
use serde_json::json;

use crate::{
    display::{CreateResult, LocalDateTime},
    models::{
        analytics::summarize_field, Answers, ChoiceCount, FieldAggregation,
        CompletionStatus, FieldKind, Form, FormField, Navigation, NavigationMode, Page, Process,
        ProcessStep, Progress, ProgressStatus, ProgressSummary, StepDescriptor,
        SubmissionStatus, UpdateProcessRequest, Visibility,
    },
    params::{StartProcess, UpdateProcess},
    TrackerError,
};

fn at(second: i64) -> Timestamp {
    Timestamp::from_second(second).unwrap()
}

fn step(id: u64, order: u32, is_required: bool) -> ProcessStep {
    ProcessStep {
        id,
        process_id: 1,
        form_id: 10 + id,
        title: format!("Step {id}"),
        description: None,
        order,
        is_required,
        created_at: at(1_640_995_200),
        updated_at: at(1_640_995_200),
    }
}

fn field(id: u64, kind: FieldKind) -> FormField {
    FormField {
        id,
        form_id: 2,
        label: format!("Field {id}"),
        description: None,
        is_required: false,
        order: 0,
        kind,
        created_at: at(1_640_995_200),
        updated_at: at(1_640_995_200),
    }
}

fn process() -> Process {
    Process {
        id: 1,
        title: "Onboarding".to_string(),
        slug: "onboarding".to_string(),
        description: Some("Get new hires set up".to_string()),
        mode: NavigationMode::Linear,
        visibility: Visibility::Private,
        password_protected: true,
        is_active: true,
        allow_resubmission: false,
        published_at: Some(at(1_641_081_600)),
        created_at: at(1_640_995_200),
        updated_at: at(1_641_081_600),
        steps: vec![step(1, 0, true), step(2, 1, false)],
    }
}

fn progress() -> Progress {
    Progress {
        id: 5,
        process_id: 1,
        session_id: "sess".to_string(),
        user_id: Some("ada".to_string()),
        status: ProgressStatus::InProgress,
        current_step_index: 1,
        completion_percentage: 50.0,
        version: 3,
        started_at: at(1_640_995_200),
        last_activity_at: at(1_641_000_000),
        completed_at: None,
    }
}

#[test]
fn test_status_parsing_accepts_known_values_only() {
    assert_eq!("free".parse::<NavigationMode>(), Ok(NavigationMode::Free));
    assert_eq!("PRIVATE".parse::<Visibility>(), Ok(Visibility::Private));
    assert_eq!(
        "in_progress".parse::<ProgressStatus>(),
        Ok(ProgressStatus::InProgress)
    );
    assert_eq!(
        "skipped".parse::<CompletionStatus>(),
        Ok(CompletionStatus::Skipped)
    );
    assert_eq!(
        "archived".parse::<SubmissionStatus>(),
        Ok(SubmissionStatus::Archived)
    );
    assert!("sideways".parse::<NavigationMode>().is_err());
    assert!("paused".parse::<ProgressStatus>().is_err());
}

#[test]
fn test_terminal_statuses() {
    assert!(!ProgressStatus::InProgress.is_terminal());
    assert!(ProgressStatus::Completed.is_terminal());
    assert!(ProgressStatus::Abandoned.is_terminal());
    assert!(!CompletionStatus::Pending.is_resolved());
    assert!(CompletionStatus::Skipped.is_resolved());
}

#[test]
fn test_field_kind_json_shape() {
    let kind: FieldKind =
        serde_json::from_value(json!({"type": "checkbox", "options": ["a", "b"], "max_selections": 1}))
            .unwrap();
    assert_eq!(
        kind,
        FieldKind::Checkbox {
            options: vec!["a".to_string(), "b".to_string()],
            min_selections: None,
            max_selections: Some(1),
        }
    );
    assert_eq!(kind.options(), Some(&["a".to_string(), "b".to_string()][..]));

    let email = serde_json::to_value(FieldKind::Email).unwrap();
    assert_eq!(email, json!({"type": "email"}));

    let unknown = serde_json::from_value::<FieldKind>(json!({"type": "colour"}));
    assert!(unknown.is_err());
}

#[test]
fn test_field_kind_check() {
    assert!(FieldKind::Text {
        min_length: Some(2),
        max_length: Some(10)
    }
    .check()
    .is_ok());
    assert_eq!(
        FieldKind::Text {
            min_length: Some(5),
            max_length: Some(3)
        }
        .check(),
        Err("min_length 5 exceeds max_length 3".to_string())
    );
    assert!(FieldKind::Select { options: vec![] }.check().is_err());
    assert!(FieldKind::Radio {
        options: vec!["yes".to_string(), "yes".to_string()]
    }
    .check()
    .is_err());
    assert!(FieldKind::Checkbox {
        options: vec!["a".to_string()],
        min_selections: Some(2),
        max_selections: None,
    }
    .check()
    .is_err());
    assert!(FieldKind::Number {
        min_value: Some(f64::NAN),
        max_value: None
    }
    .check()
    .is_err());
}

#[test]
fn test_required_step_ids() {
    let process = process();
    assert!(process.is_published());
    assert_eq!(process.required_step_ids().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn test_process_display() {
    let output = process().to_string();
    assert!(output.starts_with("# 1. Onboarding\n"));
    assert!(output.contains("- Mode: linear"));
    assert!(output.contains("- Visibility: private (password)"));
    assert!(output.contains(&format!(
        "- Published: {}",
        LocalDateTime(&at(1_641_081_600))
    )));
    assert!(output.contains("Get new hires set up"));
    assert!(output.contains("### 1. Step 1 (ID: 1, form 11, required)"));
    assert!(output.contains("### 2. Step 2 (ID: 2, form 12, optional)"));

    let mut empty = process();
    empty.steps.clear();
    empty.published_at = None;
    let output = empty.to_string();
    assert!(output.contains("- Published: no"));
    assert!(output.contains("No steps in this process."));
}

#[test]
fn test_form_display_lists_field_rules() {
    let form = Form {
        id: 2,
        title: "Contact".to_string(),
        slug: "contact".to_string(),
        description: None,
        is_active: true,
        created_at: at(1_640_995_200),
        updated_at: at(1_640_995_200),
        fields: vec![
            FormField {
                id: 7,
                form_id: 2,
                label: "Name".to_string(),
                description: None,
                is_required: true,
                order: 0,
                kind: FieldKind::Text {
                    min_length: Some(2),
                    max_length: Some(40),
                },
                created_at: at(1_640_995_200),
                updated_at: at(1_640_995_200),
            },
            FormField {
                id: 8,
                form_id: 2,
                label: "Topic".to_string(),
                description: Some("What is this about?".to_string()),
                is_required: false,
                order: 1,
                kind: FieldKind::Select {
                    options: vec!["sales".to_string(), "support".to_string()],
                },
                created_at: at(1_640_995_200),
                updated_at: at(1_640_995_200),
            },
        ],
    };

    let output = CreateResult::new(form).to_string();
    assert!(output.starts_with("Created form with ID: 2"));
    assert!(output.contains("- **Name** * (ID: 7): text, 2-40 chars"));
    assert!(output.contains("- **Topic** (ID: 8): select: sales | support"));
    assert!(output.contains("  What is this about?"));
}

#[test]
fn test_navigation_serializes_with_outcome_tag() {
    let process = process();
    let descriptor = StepDescriptor {
        progress_id: 5,
        index: 1,
        total_steps: 2,
        step: process.steps[1].clone(),
        status: CompletionStatus::Pending,
        completion_percentage: 50.0,
        version: 4,
    };
    let value = serde_json::to_value(Navigation::Step(descriptor.clone())).unwrap();
    assert_eq!(value["outcome"], "step");
    assert_eq!(value["index"], 1);

    let output = Navigation::Step(descriptor).to_string();
    assert!(output.starts_with("Step 2 of 2: Step 2 (○ Pending)"));
    assert!(output.contains("- Required: no"));
    assert!(output.contains("- Version: 4"));
}

#[test]
fn test_summary_from_progress() {
    let progress = progress();
    let summary = ProgressSummary::from(&progress);
    assert_eq!(summary.id, 5);
    assert_eq!(summary.user_id.as_deref(), Some("ada"));
    assert_eq!(summary.completion_percentage, 50.0);
    assert!(progress.to_string().contains("- Completion: 50.00%"));
}

#[test]
fn test_page_has_more() {
    let page = Page {
        items: vec![1, 2],
        total: 3,
        limit: 2,
        offset: 0,
    };
    assert!(page.has_more());
    let last = Page {
        items: vec![3],
        total: 3,
        limit: 2,
        offset: 2,
    };
    assert!(!last.has_more());
}

#[test]
fn test_start_params_flatten_visitor() {
    let params: StartProcess = serde_json::from_value(json!({
        "process_id": 3,
        "session_id": "abc",
        "user_id": "ada"
    }))
    .unwrap();
    assert_eq!(params.visitor.session_id, "abc");
    assert_eq!(params.visitor.user_id.as_deref(), Some("ada"));
    assert_eq!(params.password, None);
}

#[test]
fn test_update_process_request_validation() {
    let request = UpdateProcessRequest::try_from(UpdateProcess {
        id: 1,
        visibility: Some("private".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(request.visibility, Some(Visibility::Private));
    assert_eq!(request.description, None);
    assert!(!request.is_empty());

    let request = UpdateProcessRequest::try_from(UpdateProcess {
        id: 1,
        description: Some(String::new()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(request.description, Some(None));
    assert!(!request.is_empty());

    let err = UpdateProcessRequest::try_from(UpdateProcess {
        id: 1,
        mode: Some("random".to_string()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput { ref field, .. } if field == "mode"));

    let err = UpdateProcessRequest::try_from(UpdateProcess {
        id: 1,
        title: Some("   ".to_string()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput { ref field, .. } if field == "title"));
}

#[test]
fn test_field_summary_aggregates_by_type() {
    let submissions: Vec<Answers> = vec![
        Answers::from([(1, json!(4)), (2, json!("red")), (3, json!(["a", "b"])), (4, json!("hi"))]),
        Answers::from([(1, json!("8.5")), (2, json!("blue")), (3, json!(["b"])), (4, json!("  "))]),
        Answers::from([(1, json!(null)), (2, json!("red")), (3, json!([]))]),
    ];

    let number = summarize_field(
        &field(1, FieldKind::Number { min_value: None, max_value: None }),
        &submissions,
    );
    assert_eq!(number.field_type, "number");
    assert_eq!(number.total_responses, 2);
    assert_eq!(
        number.aggregation,
        FieldAggregation::Numeric {
            average: Some(6.25),
            min: Some(4.0),
            max: Some(8.5),
            sum: 12.5,
        }
    );

    let choice = |value: &str, count| ChoiceCount { value: value.to_string(), count };
    let select = summarize_field(
        &field(2, FieldKind::Radio { options: vec!["red".into(), "blue".into()] }),
        &submissions,
    );
    assert_eq!(select.total_responses, 3);
    assert_eq!(
        select.aggregation,
        FieldAggregation::Choices { counts: vec![choice("red", 2), choice("blue", 1)] }
    );

    let checkbox = summarize_field(
        &field(
            3,
            FieldKind::Checkbox {
                options: vec!["a".into(), "b".into()],
                min_selections: None,
                max_selections: None,
            },
        ),
        &submissions,
    );
    assert_eq!(checkbox.total_responses, 2);
    assert_eq!(
        checkbox.aggregation,
        FieldAggregation::Choices { counts: vec![choice("b", 2), choice("a", 1)] }
    );

    let text = summarize_field(
        &field(4, FieldKind::Text { min_length: None, max_length: None }),
        &submissions,
    );
    assert_eq!(text.total_responses, 1);
    assert_eq!(text.aggregation, FieldAggregation::None);

    let empty = summarize_field(
        &field(1, FieldKind::Number { min_value: None, max_value: None }),
        &[],
    );
    assert_eq!(
        empty.aggregation,
        FieldAggregation::Numeric { average: None, min: None, max: None, sum: 0.0 }
    );
}
