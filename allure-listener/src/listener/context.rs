// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::identity::IdentityContext;
use allure_model::TestResultUuid;
use std::fmt;

/// Where the current worker is in a test's lifecycle.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum TestState {
    /// No test has started on this worker since the last terminal event.
    #[default]
    NotStarted,

    /// A test is running.
    Running {
        /// The identity of the test's result.
        uuid: TestResultUuid,

        /// The fully qualified name of the test.
        full_name: String,
    },

    /// Forked from a context whose test is running. Failures are reported to that test, but
    /// only the parent context may finish it.
    Attached {
        /// The identity of the parent's result.
        uuid: TestResultUuid,

        /// The fully qualified name of the test.
        full_name: String,
    },

    /// The last test finished.
    Finished,

    /// The last test was ignored.
    Ignored,
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Running { uuid, full_name } => write!(f, "running {full_name} ({uuid})"),
            Self::Attached { uuid, full_name } => {
                write!(f, "attached to {full_name} ({uuid})")
            }
            Self::Finished => f.write_str("finished"),
            Self::Ignored => f.write_str("ignored"),
        }
    }
}

/// Per-worker state threaded through every listener callback.
///
/// Each worker owns one context and passes it by `&mut`. Work spawned by a running test takes a
/// [`fork`](Self::fork).
#[derive(Clone, Debug, Default)]
pub struct ListenerContext {
    pub(super) identity: IdentityContext,
    pub(super) state: TestState,
}

impl ListenerContext {
    /// Creates a context with no test in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> &TestState {
        &self.state
    }

    /// The identity registry for this worker.
    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    /// The identity of the running test, if any.
    pub fn current_uuid(&self) -> Option<TestResultUuid> {
        match &self.state {
            TestState::Running { uuid, .. } | TestState::Attached { uuid, .. } => Some(*uuid),
            _ => None,
        }
    }

    /// Derives a child context holding a copy of the current identity.
    ///
    /// If a test is running, the child is attached to it: failures reported through the child
    /// land on the parent's result, while a finish through the child leaves it untouched. Later
    /// changes to either context are not seen by the other.
    pub fn fork(&self) -> Self {
        let state = match &self.state {
            TestState::Running { uuid, full_name } | TestState::Attached { uuid, full_name } => {
                TestState::Attached {
                    uuid: *uuid,
                    full_name: full_name.clone(),
                }
            }
            _ => TestState::NotStarted,
        };
        Self {
            identity: self.identity.fork(),
            state,
        }
    }
}
