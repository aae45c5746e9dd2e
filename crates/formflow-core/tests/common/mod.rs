#![allow(dead_code)]

use std::sync::Arc;

use formflow_core::{
    models::{Answers, FieldKind, Process, ProcessStep, Progress, Visitor},
    params::{AddField, AddStep, CreateForm, CreateProcess, Id, StartProcess},
    FixedClock, Settings, Tracker, TrackerBuilder,
};
use jiff::Timestamp;
use serde_json::Value;
use tempfile::TempDir;

/// A step of a test process with the ID of the single text field its form
/// holds.
pub struct TestStep {
    pub step: ProcessStep,
    pub field_id: u64,
}

/// Tracker on a temporary database with a manually driven clock.
pub struct Fixture {
    pub dir: TempDir,
    pub tracker: Tracker,
    pub clock: Arc<FixedClock>,
}

pub fn start_time() -> Timestamp {
    "2024-01-01T09:00:00Z".parse().expect("valid timestamp")
}

pub async fn fixture() -> Fixture {
    fixture_with_settings(Settings::default()).await
}

pub async fn fixture_with_settings(settings: Settings) -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let clock = Arc::new(FixedClock::new(start_time()));
    let tracker = TrackerBuilder::new()
        .with_database_path(Some(dir.path().join("test.db")))
        .with_clock(clock.clone())
        .with_settings(settings)
        .build()
        .await
        .expect("Failed to create tracker");
    Fixture {
        dir,
        tracker,
        clock,
    }
}

pub fn answer(field_id: u64, value: impl Into<Value>) -> Answers {
    Answers::from([(field_id, value.into())])
}

impl Fixture {
    /// Creates a published process with one step per entry of `required`,
    /// each backed by its own form with a required text field.
    pub async fn process(&self, title: &str, mode: &str, required: &[bool]) -> (Process, Vec<TestStep>) {
        let process = self
            .tracker
            .create_process(&CreateProcess {
                title: title.to_string(),
                mode: Some(mode.to_string()),
                ..Default::default()
            })
            .await
            .expect("Failed to create process");

        let mut steps = Vec::new();
        for (i, is_required) in required.iter().enumerate() {
            let form = self
                .tracker
                .create_form(&CreateForm {
                    title: format!("{title} form {}", i + 1),
                    ..Default::default()
                })
                .await
                .expect("Failed to create form");
            let field = self
                .tracker
                .add_field(&AddField {
                    form_id: form.id,
                    label: "Answer".to_string(),
                    description: None,
                    is_required: true,
                    kind: FieldKind::Text {
                        min_length: None,
                        max_length: Some(100),
                    },
                })
                .await
                .expect("Failed to add field");
            let step = self
                .tracker
                .add_step(&AddStep {
                    process_id: process.id,
                    form_id: form.id,
                    title: format!("Step {}", i + 1),
                    description: None,
                    is_required: *is_required,
                })
                .await
                .expect("Failed to add step");
            steps.push(TestStep {
                step,
                field_id: field.id,
            });
        }

        let process = self
            .tracker
            .publish_process(&Id { id: process.id })
            .await
            .expect("Failed to publish process");
        (process, steps)
    }

    pub async fn start(&self, process_id: u64, session_id: &str) -> Progress {
        self.tracker
            .start(&StartProcess {
                process_id,
                visitor: Visitor::anonymous(session_id),
                password: None,
            })
            .await
            .expect("Failed to start process")
    }

    pub async fn progress(&self, progress_id: u64) -> Progress {
        self.tracker
            .get_progress(&Id { id: progress_id })
            .await
            .expect("Failed to get progress")
            .expect("Progress should exist")
    }
}
