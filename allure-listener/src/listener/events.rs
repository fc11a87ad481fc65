// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{failure::TestFailure, metadata::TestDescriptor};
use chrono::{DateTime, Utc};

/// A lifecycle callback from the runner, as a value.
#[derive(Clone, Debug)]
pub struct ListenerEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// The kind of event.
    pub kind: ListenerEventKind,
}

impl ListenerEvent {
    /// Creates an event timestamped now.
    pub fn new(kind: ListenerEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Creates an event with an explicit timestamp.
    pub fn at(timestamp: DateTime<Utc>, kind: ListenerEventKind) -> Self {
        Self { timestamp, kind }
    }
}

/// The kind of a [`ListenerEvent`].
#[derive(Clone, Debug)]
pub enum ListenerEventKind {
    /// The run started.
    RunStarted,

    /// The run finished.
    RunFinished,

    /// A test started.
    TestStarted {
        /// The test that started.
        descriptor: TestDescriptor,
    },

    /// A test finished, whatever its outcome.
    TestFinished {
        /// The test that finished.
        descriptor: TestDescriptor,
    },

    /// The running test failed.
    TestFailure {
        /// The failure.
        failure: TestFailure,
    },

    /// An assumption of the running test did not hold.
    TestAssumptionFailure {
        /// The failure.
        failure: TestFailure,
    },

    /// A test was skipped without being started.
    TestIgnored {
        /// The ignored test.
        descriptor: TestDescriptor,
    },
}
