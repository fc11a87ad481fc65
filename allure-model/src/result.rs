// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{DeserializeError, SerializeError},
    serialize::{deserialize_result, serialize_result, serialize_result_to_string},
    uuid::TestResultUuid,
};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::{fmt, io};

/// The record written out for a single test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct TestResult {
    /// The identity token of this result.
    pub uuid: TestResultUuid,

    /// A stable key grouping the same logical test across independent runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,

    /// The name shown for this test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The fully qualified name of this test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// The outcome of the test. `None` until something decides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    /// The message and trace attached to the status.
    #[serde(default, skip_serializing_if = "StatusDetails::is_empty")]
    pub status_details: StatusDetails,

    /// Where in its lifecycle this result is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    /// Free-form description of the test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Links attached to this test, deduplicated by value.
    #[serde(default)]
    pub links: IndexSet<Link>,

    /// Labels attached to this test. Repeated labels are kept.
    #[serde(default)]
    pub labels: Vec<Label>,

    /// Start time, in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    /// Stop time, in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
}

impl TestResult {
    /// Creates a new, empty `TestResult` with the given identity.
    pub fn new(uuid: TestResultUuid) -> Self {
        Self {
            uuid,
            history_id: None,
            name: None,
            full_name: None,
            status: None,
            status_details: StatusDetails::default(),
            stage: None,
            description: None,
            links: IndexSet::new(),
            labels: vec![],
            start: None,
            stop: None,
        }
    }

    /// Sets the history id.
    pub fn set_history_id(&mut self, history_id: impl Into<String>) -> &mut Self {
        self.history_id = Some(history_id.into());
        self
    }

    /// Sets the display name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the fully qualified name.
    pub fn set_full_name(&mut self, full_name: impl Into<String>) -> &mut Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: Status) -> &mut Self {
        self.status = Some(status);
        self
    }

    /// Sets the status message.
    pub fn set_status_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.status_details.message = Some(message.into());
        self
    }

    /// Sets the status trace.
    pub fn set_status_trace(&mut self, trace: impl Into<String>) -> &mut Self {
        self.status_details.trace = Some(trace.into());
        self
    }

    /// Sets the stage.
    pub fn set_stage(&mut self, stage: Stage) -> &mut Self {
        self.stage = Some(stage);
        self
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the start time, in milliseconds since the Unix epoch.
    pub fn set_start(&mut self, start: i64) -> &mut Self {
        self.start = Some(start);
        self
    }

    /// Sets the stop time, in milliseconds since the Unix epoch.
    pub fn set_stop(&mut self, stop: i64) -> &mut Self {
        self.stop = Some(stop);
        self
    }

    /// Adds a link. Links equal to one already present are dropped.
    pub fn add_link(&mut self, link: Link) -> &mut Self {
        self.links.insert(link);
        self
    }

    /// Adds several links, dropping duplicates.
    pub fn add_links(&mut self, links: impl IntoIterator<Item = Link>) -> &mut Self {
        self.links.extend(links);
        self
    }

    /// Adds a label.
    pub fn add_label(&mut self, label: impl Into<Label>) -> &mut Self {
        self.labels.push(label.into());
        self
    }

    /// Adds several labels, in order.
    pub fn add_labels(&mut self, labels: impl IntoIterator<Item = impl Into<Label>>) -> &mut Self {
        for label in labels {
            self.add_label(label);
        }
        self
    }

    /// Returns the status message, if any.
    pub fn status_message(&self) -> Option<&str> {
        self.status_details.message.as_deref()
    }

    /// Returns the status trace, if any.
    pub fn status_trace(&self) -> Option<&str> {
        self.status_details.trace.as_deref()
    }

    /// Returns the values of all labels with the given name, in order.
    pub fn label_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.labels
            .iter()
            .filter(move |label| label.name == name)
            .map(|label| label.value.as_str())
    }

    /// Returns the name of the file this result is written to: `<uuid>-result.json`.
    pub fn file_name(&self) -> String {
        format!("{}-result.json", self.uuid)
    }

    /// Serialize this result as JSON to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serialize_result(self, writer)
    }

    /// Serialize this result to a JSON string.
    pub fn to_json_string(&self) -> Result<String, SerializeError> {
        serialize_result_to_string(self)
    }

    /// Reads a result back from JSON.
    pub fn deserialize(reader: impl io::Read) -> Result<Self, DeserializeError> {
        deserialize_result(reader)
    }
}

/// The outcome of a test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The test failed an assertion.
    Failed,

    /// The test raised an unexpected error.
    Broken,

    /// The test passed.
    Passed,

    /// The test was not run, or bailed out on an unmet assumption.
    Skipped,
}

impl Status {
    /// Returns the serialized form of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Failed => "failed",
            Status::Broken => "broken",
            Status::Passed => "passed",
            Status::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a result is in its lifecycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Registered with the lifecycle and collecting updates.
    Running,

    /// Timing stamped; ready to be written out.
    Finished,
}

/// The message and trace attached to a status.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatusDetails {
    /// A short, human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The formatted trace of the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl StatusDetails {
    /// Returns true if neither a message nor a trace is set.
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.trace.is_none()
    }
}

/// A name/value pair attached to a result.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Label {
    /// The name of the label, e.g. `"tag"`.
    pub name: String,

    /// The value of the label.
    pub value: String,
}

impl Label {
    /// The package the test class lives in.
    pub const PACKAGE: &'static str = "package";
    /// The qualified test class name.
    pub const TEST_CLASS: &'static str = "testClass";
    /// The test method name.
    pub const TEST_METHOD: &'static str = "testMethod";
    /// The suite the test is grouped under.
    pub const SUITE: &'static str = "suite";
    /// The host the test ran on.
    pub const HOST: &'static str = "host";
    /// The thread the test ran on.
    pub const THREAD: &'static str = "thread";
    /// Top level of the behaviour hierarchy.
    pub const EPIC: &'static str = "epic";
    /// Middle level of the behaviour hierarchy.
    pub const FEATURE: &'static str = "feature";
    /// Bottom level of the behaviour hierarchy.
    pub const STORY: &'static str = "story";
    /// Severity of the test.
    pub const SEVERITY: &'static str = "severity";
    /// Owner of the test.
    pub const OWNER: &'static str = "owner";
    /// A free-form tag.
    pub const TAG: &'static str = "tag";

    /// Creates a new label.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl<T, U> From<(T, U)> for Label
where
    T: Into<String>,
    U: Into<String>,
{
    fn from((name, value): (T, U)) -> Self {
        Label::new(name, value)
    }
}

/// A typed reference attached to a result.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// The display name of the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Where the link points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// The kind of link, e.g. `"issue"` or `"tms"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

impl Link {
    /// The type used for links declared without one.
    pub const CUSTOM_TYPE: &'static str = "custom";
    /// The type used for issue tracker links.
    pub const ISSUE_TYPE: &'static str = "issue";
    /// The type used for test management system links.
    pub const TMS_TYPE: &'static str = "tms";

    /// Creates a new link with the given name and no URL or type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: None,
            link_type: None,
        }
    }

    /// Sets the URL.
    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the type.
    pub fn set_type(&mut self, link_type: impl Into<String>) -> &mut Self {
        self.link_type = Some(link_type.into());
        self
    }
}
