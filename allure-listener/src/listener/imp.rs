// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    context::{ListenerContext, TestState},
    events::{ListenerEvent, ListenerEventKind},
};
use crate::{
    config::ListenerConfig,
    errors::{DisplayErrorChain, LifecycleError, ListenerError},
    failure::{DefaultClassifier, FailureClassifier, TestFailure},
    helpers::{host_name, thread_name},
    history::HistoryIdComputer,
    lifecycle::ResultLifecycle,
    metadata::{ExtractedMetadata, MetadataExtractor, TestDescriptor},
};
use allure_model::{Label, Status, TestResult, TestResultUuid};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// The status message of an ignored test that gives no reason.
pub const IGNORED_WITHOUT_REASON: &str = "Test ignored (without reason)!";

/// Translates runner callbacks into test results.
///
/// The listener is shared between workers. Each worker passes its own [`ListenerContext`] into
/// every callback; the context tracks which result that worker is building.
#[derive(Debug)]
pub struct AllureListener<L, C = DefaultClassifier> {
    lifecycle: L,
    classifier: C,
    extractor: MetadataExtractor,
    history: HistoryIdComputer,
    host_name: String,
    thread_name: Option<String>,
}

impl<L: ResultLifecycle> AllureListener<L> {
    /// Creates a listener reporting to `lifecycle`, configured by `config`.
    pub fn new(lifecycle: L, config: &ListenerConfig) -> Self {
        Self {
            lifecycle,
            classifier: DefaultClassifier,
            extractor: config.metadata_extractor(),
            history: config.history_id_computer(),
            host_name: host_name(config.host_name()),
            thread_name: config.thread_name().map(str::to_owned),
        }
    }
}

impl<L: ResultLifecycle, C: FailureClassifier> AllureListener<L, C> {
    /// Replaces the failure classifier.
    pub fn with_classifier<C2: FailureClassifier>(self, classifier: C2) -> AllureListener<L, C2> {
        AllureListener {
            lifecycle: self.lifecycle,
            classifier,
            extractor: self.extractor,
            history: self.history,
            host_name: self.host_name,
            thread_name: self.thread_name,
        }
    }

    /// The lifecycle results are reported to.
    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// Dispatches an event to the matching callback.
    pub fn handle_event(
        &self,
        cx: &mut ListenerContext,
        event: ListenerEvent,
    ) -> Result<(), ListenerError> {
        match event.kind {
            ListenerEventKind::RunStarted => {
                self.on_run_started();
                Ok(())
            }
            ListenerEventKind::RunFinished => {
                self.on_run_finished();
                Ok(())
            }
            ListenerEventKind::TestStarted { descriptor } => self.on_test_started(cx, &descriptor),
            ListenerEventKind::TestFinished { descriptor } => {
                self.on_test_finished(cx, &descriptor)
            }
            ListenerEventKind::TestFailure { failure } => self.on_test_failure(cx, &failure),
            ListenerEventKind::TestAssumptionFailure { failure } => {
                self.on_test_assumption_failure(cx, &failure)
            }
            ListenerEventKind::TestIgnored { descriptor } => {
                self.test_ignored_at(cx, &descriptor, event.timestamp)
            }
        }
    }

    /// Called when the run starts.
    pub fn on_run_started(&self) {
        debug!("run started");
    }

    /// Called when the run finishes.
    pub fn on_run_finished(&self) {
        debug!("run finished");
    }

    /// Called when a test starts. Builds its result and registers it with the lifecycle.
    pub fn on_test_started(
        &self,
        cx: &mut ListenerContext,
        descriptor: &TestDescriptor,
    ) -> Result<(), ListenerError> {
        self.discard_stale(cx, descriptor);
        let metadata = self.extract(descriptor)?;

        let uuid = cx.identity.current_identity();
        let result = self.build_result(uuid, descriptor, metadata);
        if let Err(error) = self.lifecycle.register_result(result) {
            cx.identity.release();
            cx.state = TestState::NotStarted;
            return Err(lifecycle_error(descriptor, error));
        }

        debug!("{descriptor}: started ({uuid})");
        cx.state = TestState::Running {
            uuid,
            full_name: descriptor.full_name(),
        };
        Ok(())
    }

    /// Called when the running test fails. The status comes from the failure classifier.
    pub fn on_test_failure(
        &self,
        cx: &mut ListenerContext,
        failure: &TestFailure,
    ) -> Result<(), ListenerError> {
        let status = self.classifier.classify(failure);
        self.update_running(cx, "failure", |result| {
            record_failure(result, status, failure);
        })
    }

    /// Called when an assumption of the running test fails. The test is marked skipped.
    pub fn on_test_assumption_failure(
        &self,
        cx: &mut ListenerContext,
        failure: &TestFailure,
    ) -> Result<(), ListenerError> {
        self.update_running(cx, "assumption failure", |result| {
            record_failure(result, Status::Skipped, failure);
        })
    }

    /// Called when a test finishes. Persists its result and releases its identity.
    pub fn on_test_finished(
        &self,
        cx: &mut ListenerContext,
        descriptor: &TestDescriptor,
    ) -> Result<(), ListenerError> {
        let res = match std::mem::replace(&mut cx.state, TestState::Finished) {
            TestState::Running { uuid, .. } => self
                .finish(uuid)
                .map_err(|error| lifecycle_error(descriptor, error)),
            TestState::Attached { uuid, .. } => {
                warn!("{descriptor}: finish from a forked context ignored, {uuid} is left running");
                Ok(())
            }
            other => {
                warn!("{descriptor}: finished with no running test result (state: {other})");
                Ok(())
            }
        };
        cx.identity.release();
        if res.is_ok() {
            debug!("{descriptor}: finished");
        }
        res
    }

    /// Called for a test that is skipped without starting. Builds, registers and persists a
    /// skipped result in one step.
    pub fn on_test_ignored(
        &self,
        cx: &mut ListenerContext,
        descriptor: &TestDescriptor,
    ) -> Result<(), ListenerError> {
        self.test_ignored_at(cx, descriptor, Utc::now())
    }

    fn test_ignored_at(
        &self,
        cx: &mut ListenerContext,
        descriptor: &TestDescriptor,
        timestamp: DateTime<Utc>,
    ) -> Result<(), ListenerError> {
        self.discard_stale(cx, descriptor);
        let metadata = self.extract(descriptor)?;
        let message = self
            .extractor
            .ignore_reason(descriptor)
            .unwrap_or(IGNORED_WITHOUT_REASON);

        let uuid = cx.identity.current_identity();
        let mut result = self.build_result(uuid, descriptor, metadata);
        result
            .set_status(Status::Skipped)
            .set_status_message(message)
            .set_start(timestamp.timestamp_millis());

        let res = self
            .lifecycle
            .register_result(result)
            .and_then(|()| self.lifecycle.finalize_timing(uuid))
            .and_then(|()| self.lifecycle.persist(uuid))
            .map_err(|error| lifecycle_error(descriptor, error));
        cx.identity.release();
        cx.state = TestState::Ignored;
        if res.is_ok() {
            debug!("{descriptor}: ignored ({message})");
        }
        res
    }

    fn extract(&self, descriptor: &TestDescriptor) -> Result<ExtractedMetadata, ListenerError> {
        self.extractor
            .extract(descriptor)
            .map_err(|error| ListenerError::Extract {
                test: descriptor.full_name(),
                error,
            })
    }

    fn build_result(
        &self,
        uuid: TestResultUuid,
        descriptor: &TestDescriptor,
        metadata: ExtractedMetadata,
    ) -> TestResult {
        let ExtractedMetadata {
            display_name,
            suite_name,
            description,
            links,
            labels,
        } = metadata;

        let mut result = TestResult::new(uuid);
        result
            .set_history_id(
                self.history
                    .history_id(descriptor.class_name(), descriptor.method_name()),
            )
            .set_name(display_name.as_deref().unwrap_or(descriptor.name()))
            .set_full_name(descriptor.full_name())
            .add_links(links)
            .add_labels([
                Label::new(Label::PACKAGE, descriptor.package_name()),
                Label::new(Label::TEST_CLASS, descriptor.class_name()),
                Label::new(Label::TEST_METHOD, descriptor.name()),
                Label::new(
                    Label::SUITE,
                    suite_name.as_deref().unwrap_or(descriptor.class_name()),
                ),
                Label::new(Label::HOST, self.host_name.as_str()),
                Label::new(Label::THREAD, thread_name(self.thread_name.as_deref())),
            ])
            .add_labels(labels);
        if let Some(description) = description {
            result.set_description(description);
        }
        result
    }

    fn update_running(
        &self,
        cx: &ListenerContext,
        event: &str,
        mut f: impl FnMut(&mut TestResult),
    ) -> Result<(), ListenerError> {
        match &cx.state {
            TestState::Running { uuid, full_name } | TestState::Attached { uuid, full_name } => self
                .lifecycle
                .mutate_result(*uuid, &mut f)
                .map_err(|error| ListenerError::Lifecycle {
                    test: full_name.clone(),
                    error,
                }),
            other => {
                warn!("received test {event} with no running test result (state: {other})");
                Ok(())
            }
        }
    }

    /// Drops the result of a test that never reached a terminal event.
    fn discard_stale(&self, cx: &mut ListenerContext, descriptor: &TestDescriptor) {
        match std::mem::take(&mut cx.state) {
            TestState::Running { uuid, full_name } => {
                warn!(
                    "{descriptor}: previous test {full_name} ({uuid}) did not finish, \
                     its result will not be written"
                );
                if let Err(error) = self.lifecycle.discard(uuid) {
                    warn!(
                        "{descriptor}: failed to discard {full_name}: {}",
                        DisplayErrorChain::new(&error)
                    );
                }
                cx.identity.release();
            }
            TestState::Attached { .. } => {
                // The parent still owns that result.
                cx.identity.release();
            }
            other => cx.state = other,
        }
    }

    fn finish(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        self.lifecycle.mutate_result(uuid, &mut |result| {
            if result.status.is_none() {
                result.set_status(Status::Passed);
            }
        })?;
        self.lifecycle.finalize_timing(uuid)?;
        self.lifecycle.persist(uuid)
    }
}

fn record_failure(result: &mut TestResult, status: Status, failure: &TestFailure) {
    result.set_status(status).set_status_trace(failure.trace());
    result.status_details.message = failure.message().map(str::to_owned);
}

fn lifecycle_error(descriptor: &TestDescriptor, error: LifecycleError) -> ListenerError {
    ListenerError::Lifecycle {
        test: descriptor.full_name(),
        error,
    }
}
