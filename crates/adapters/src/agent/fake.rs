// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable fake agent for engine and end-to-end tests.

use super::{AgentError, AgentInvocation, AgentOutcome, AgentRunner};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;

enum Scripted {
    Succeed(AgentOutcome),
    Fail(String),
}

/// Fake agent that replays a script of per-attempt results.
///
/// When the script is exhausted, further invocations succeed with a
/// default outcome. Every invocation is recorded for assertions.
#[derive(Default)]
pub struct FakeAgent {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<AgentInvocation>>,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome used when the script is empty.
    pub fn default_outcome() -> AgentOutcome {
        AgentOutcome {
            exit_code: 0,
            pr_url: Some("https://github.com/octo/demo/pull/1".to_string()),
            log_lines: vec!["agent: task complete".to_string()],
            output: json!({"pr_url": "https://github.com/octo/demo/pull/1", "exit_code": 0}),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Queue a successful invocation with the given structured output.
    pub fn push_success(&self, output: Value) {
        let outcome = AgentOutcome {
            output,
            ..Self::default_outcome()
        };
        self.script.lock().push_back(Scripted::Succeed(outcome));
    }

    /// Queue a successful invocation with a full outcome.
    pub fn push_outcome(&self, outcome: AgentOutcome) {
        self.script.lock().push_back(Scripted::Succeed(outcome));
    }

    /// Queue a failing invocation.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.script.lock().push_back(Scripted::Fail(message.into()));
    }

    /// All invocations seen so far.
    pub fn calls(&self) -> Vec<AgentInvocation> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AgentRunner for FakeAgent {
    async fn run(&self, invocation: AgentInvocation) -> Result<AgentOutcome, AgentError> {
        self.calls.lock().push(invocation);
        match self.script.lock().pop_front() {
            Some(Scripted::Succeed(outcome)) => Ok(outcome),
            Some(Scripted::Fail(message)) => Err(AgentError::Launch(message)),
            None => Ok(Self::default_outcome()),
        }
    }
}
