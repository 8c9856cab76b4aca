// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: the agent child process, the source
//! provider, and subprocess plumbing.

pub mod agent;
pub mod dispatch;
pub mod subprocess;

pub use agent::{
    AgentError, AgentInvocation, AgentOutcome, AgentRunner, ProcessAgent, StepContext,
    DEFAULT_AGENT_TIMEOUT, LOG_TAIL_LINES, STEP_RESULT_FILE,
};
pub use dispatch::{DispatchError, Dispatcher, GitDispatcher};
pub use subprocess::{run_with_timeout, SubprocessError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use agent::FakeAgent;
#[cfg(any(test, feature = "test-support"))]
pub use dispatch::{DispatchCall, FakeDispatcher};
