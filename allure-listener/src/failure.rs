// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failures reported by the runner, and how they map to result statuses.

use allure_model::Status;
use std::{any::Any, fmt};

/// The broad category of a failure.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FailureKind {
    /// A test assertion did not hold.
    Assertion,

    /// Any other error escaped the test.
    Error,
}

impl FailureKind {
    fn default_type_name(self) -> &'static str {
        match self {
            Self::Assertion => "AssertionError",
            Self::Error => "Error",
        }
    }
}

/// A failure reported for a running test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestFailure {
    kind: FailureKind,
    type_name: String,
    message: Option<String>,
    frames: Vec<String>,
    cause: Option<Box<TestFailure>>,
}

impl TestFailure {
    /// Creates a failure of the given kind.
    pub fn new(kind: FailureKind, type_name: impl Into<String>) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            message: None,
            frames: Vec::new(),
            cause: None,
        }
    }

    /// Creates an assertion failure with a message.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Assertion, "AssertionError").with_message(message)
    }

    /// Creates a non-assertion failure with a type name and message.
    pub fn error(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Error, type_name).with_message(message)
    }

    /// Creates an assertion failure from a panic payload.
    ///
    /// Panics carrying a `&str` or `String` use it as the message.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned());
        let mut failure = Self::new(FailureKind::Assertion, "panic");
        failure.message = message;
        failure
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Appends a stack frame.
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frames.push(frame.into());
        self
    }

    /// Sets the failure that caused this one.
    pub fn with_cause(mut self, cause: TestFailure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The category of this failure.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The type name, falling back to a name for the kind if empty.
    pub fn type_name(&self) -> &str {
        if self.type_name.is_empty() {
            self.kind.default_type_name()
        } else {
            &self.type_name
        }
    }

    /// The message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The stack frames, innermost first.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// The failure that caused this one.
    pub fn cause(&self) -> Option<&TestFailure> {
        self.cause.as_deref()
    }

    /// Renders the failure and its causes as a stack trace. Never empty.
    pub fn trace(&self) -> String {
        self.to_string()
    }

    fn fmt_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {message}", self.type_name()),
            None => f.write_str(self.type_name()),
        }
    }
}

impl fmt::Display for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current = Some(self);
        let mut first = true;
        while let Some(failure) = current {
            if !first {
                f.write_str("\nCaused by: ")?;
            }
            failure.fmt_header(f)?;
            for frame in &failure.frames {
                write!(f, "\n\tat {frame}")?;
            }
            first = false;
            current = failure.cause();
        }
        Ok(())
    }
}

/// Maps a failure to the status recorded on the result.
pub trait FailureClassifier: Send + Sync {
    /// Returns the status for this failure.
    fn classify(&self, failure: &TestFailure) -> Status;
}

/// Assertion failures are [`Status::Failed`]; everything else is [`Status::Broken`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultClassifier;

impl FailureClassifier for DefaultClassifier {
    fn classify(&self, failure: &TestFailure) -> Status {
        match failure.kind() {
            FailureKind::Assertion => Status::Failed,
            FailureKind::Error => Status::Broken,
        }
    }
}
