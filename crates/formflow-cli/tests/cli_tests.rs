use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Temporary database and settings paths for one test
struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temporary directory"),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("cli_test.db")
    }

    /// `ff --no-color` against this environment's database
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ff").expect("Failed to find ff binary");
        cmd.arg("--no-color")
            .arg("--database-file")
            .arg(self.db())
            .arg("--config-file")
            .arg(self.dir.path().join("config.json"));
        cmd
    }

    fn run(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).assert().success().get_output().clone();
        String::from_utf8(output.stdout).expect("Invalid UTF-8 in CLI output")
    }

    /// A published one-step process whose form asks for an email.
    fn signup(&self) {
        self.run(&["form", "create", "Contact"]);
        self.run(&["form", "add-field", "1", "Email", "--kind", "email", "--required"]);
        self.run(&["process", "create", "Signup"]);
        self.run(&["step", "add", "1", "1", "Contact details"]);
        self.run(&["process", "publish", "1"]);
    }
}

#[test]
fn test_cli_default_lists_processes() {
    let env = Env::new();
    env.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("No processes found."));
}

#[test]
fn test_cli_create_form() {
    let env = Env::new();
    env.cmd()
        .args(["form", "create", "Customer Feedback", "-d", "Tell us more"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created form with ID: 1"))
        .stdout(predicate::str::contains("Tell us more"));

    env.cmd()
        .args(["form", "show", "--slug", "customer-feedback"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Customer Feedback"));
}

#[test]
fn test_cli_rejects_bad_field_rules() {
    let env = Env::new();
    env.run(&["form", "create", "Poll"]);
    env.cmd()
        .args(["form", "add-field", "1", "Colour", "--kind", "select"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input for field 'kind'"));
}

#[test]
fn test_cli_visitor_flow() {
    let env = Env::new();
    env.signup();

    env.cmd()
        .args(["run", "start", "1", "--session", "s1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Progress 1 (process 1)"))
        .stdout(predicate::str::contains("- Status: in_progress"));

    env.cmd()
        .args(["run", "current", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1 of 1: Contact details"));

    env.cmd()
        .args(["run", "complete", "1", "1", "--answer", "1=ada@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1 completed"))
        .stdout(predicate::str::contains("- Completion: 100.00%"));

    env.cmd()
        .args(["run", "finish", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress 1 completed at"));

    env.cmd()
        .args(["progress", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Status: completed"))
        .stdout(predicate::str::contains("## Signup"));

    env.cmd()
        .args(["stats", "rate", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Completed: 1 (100.00%)"));
}

#[test]
fn test_cli_reports_validation_errors() {
    let env = Env::new();
    env.signup();
    env.run(&["run", "start", "1", "--session", "s1"]);

    env.cmd()
        .args(["run", "complete", "1", "1", "--answer", "1=not-an-email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "field 1: Enter a valid email address",
        ));

    env.cmd()
        .args(["run", "complete", "1", "1", "--answer", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected FIELD_ID=VALUE"));
}

#[test]
fn test_cli_unpublished_process_cannot_start() {
    let env = Env::new();
    env.signup();
    env.run(&["process", "unpublish", "1"]);

    env.cmd()
        .args(["run", "start", "1", "--session", "s1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Process 1 is unavailable"));
}

#[test]
fn test_cli_json_output() {
    let env = Env::new();
    let output = env.run(&["--json", "process", "create", "Onboarding", "--mode", "free"]);
    let value: serde_json::Value = serde_json::from_str(&output).expect("Output is not JSON");
    assert_eq!(value["slug"], "onboarding");
    assert_eq!(value["mode"], "free");
}

#[test]
fn test_cli_sweep_once() {
    let env = Env::new();
    env.cmd()
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("Abandoned 0 of 0 open records"));
}

#[test]
fn test_cli_show_missing_process() {
    let env = Env::new();
    env.cmd()
        .args(["process", "show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Process not found"));
}

#[test]
fn test_cli_form_stats() {
    let env = Env::new();
    env.run(&["form", "create", "Poll"]);
    env.run(&["form", "add-field", "1", "Plan", "--kind", "select", "--options", "free,pro"]);
    env.run(&["form", "add-field", "1", "Seats", "--kind", "number"]);
    for session in ["a", "b", "c", "d"] {
        env.cmd()
            .args(["submission", "view", "1", "--session", session])
            .assert()
            .success()
            .stdout(predicate::str::contains("Recorded view of form 1"));
    }
    env.run(&["submission", "submit", "1", "--session", "a", "-a", "1=pro", "-a", "2=3"]);
    env.run(&["submission", "submit", "1", "--session", "b", "-a", "1=pro", "-a", "2=5"]);
    env.run(&["submission", "submit", "1", "--session", "c", "-a", "1=free", "--draft"]);

    env.cmd()
        .args(["stats", "form", "overview", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Views: 4"))
        .stdout(predicate::str::contains("- Submissions: 2 (50.00% of views)"));

    env.cmd()
        .args(["stats", "form", "drop-off", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Started: 3 (75.00%)"))
        .stdout(predicate::str::contains("- Submitted: 2 (66.67%)"));

    env.cmd()
        .args(["stats", "form", "fields", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- pro: 2"))
        .stdout(predicate::str::contains("## Seats (ID: 2, number)"))
        .stdout(predicate::str::contains("- Average: 4, min 3, max 5"));

    env.cmd()
        .args(["stats", "form", "fields", "1", "--field", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Field with ID 9 not found"));
}

#[test]
fn test_cli_activity_rejects_long_windows() {
    let env = Env::new();
    env.signup();
    env.run(&["run", "view", "1", "--session", "s1"]);
    env.cmd()
        .args(["stats", "activity", "1", "--days", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("| Day | Views | Completions |"));
    env.cmd()
        .args(["stats", "activity", "1", "--days", "400"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input for field 'days'"));
}
