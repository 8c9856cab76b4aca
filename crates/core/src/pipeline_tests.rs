// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn step_definition_defaults() {
    let step: StepDefinition = serde_json::from_str(r#"{"name": "a", "task": "t"}"#).unwrap();
    assert_eq!(step.name, "a");
    assert!(step.depends_on.is_empty());
    assert_eq!(step.on_failure, OnFailure::Stop);
}

#[test]
fn step_definition_parses_policy() {
    let step: StepDefinition = serde_json::from_str(
        r#"{"name": "b", "task": "t", "depends_on": ["a"], "on_failure": "continue"}"#,
    )
    .unwrap();
    assert_eq!(step.depends_on, vec!["a"]);
    assert_eq!(step.on_failure, OnFailure::Continue);
}

#[test]
fn step_definition_rejects_unknown_policy() {
    let err = serde_json::from_str::<StepDefinition>(
        r#"{"name": "b", "task": "t", "on_failure": "retry"}"#,
    );
    assert!(err.is_err());
}

#[test]
fn step_definition_serializes_without_empty_deps() {
    let json = serde_json::to_value(StepDefinition::new("a", "t")).unwrap();
    assert!(json.get("depends_on").is_none());
    assert_eq!(json["on_failure"], "stop");
}

#[test]
fn run_status_round_trip() {
    for status in [
        RunStatus::Pending,
        RunStatus::Running,
        RunStatus::Completed,
        RunStatus::Failed,
    ] {
        assert_eq!(RunStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(RunStatus::parse("retrying"), None);
}

#[test]
fn run_terminal_states() {
    assert!(RunStatus::Completed.is_terminal());
    assert!(RunStatus::Failed.is_terminal());
    assert!(!RunStatus::Pending.is_terminal());
    assert!(!RunStatus::Running.is_terminal());
}

#[test]
fn step_builder_sets_dependencies() {
    let step = StepDefinition::new("d", "merge")
        .depends_on(["b", "c"])
        .on_failure(OnFailure::Continue);
    assert_eq!(step.depends_on, vec!["b", "c"]);
    assert_eq!(step.on_failure, OnFailure::Continue);
}
