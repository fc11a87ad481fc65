// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The collaborator that owns in-progress results and hands finished ones to a writer.

use crate::{
    config::ListenerConfig,
    errors::LifecycleError,
    writer::{FileSystemResultsWriter, ResultsWriter},
};
use allure_model::{Stage, TestResult, TestResultUuid};
use debug_ignore::DebugIgnore;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, warn};

/// Stores in-progress results and persists them once finished.
///
/// All operations are keyed by the result's uuid. Implementations are shared between workers.
pub trait ResultLifecycle: Send + Sync {
    /// Stores a new result. Its stage becomes running, and its start time is stamped if unset.
    fn register_result(&self, result: TestResult) -> Result<(), LifecycleError>;

    /// Applies `f` to a stored result. `f` must not call back into the lifecycle.
    fn mutate_result(
        &self,
        uuid: TestResultUuid,
        f: &mut dyn FnMut(&mut TestResult),
    ) -> Result<(), LifecycleError>;

    /// Stamps the stop time and marks the result finished.
    fn finalize_timing(&self, uuid: TestResultUuid) -> Result<(), LifecycleError>;

    /// Hands the result to the writer and drops it from working memory.
    fn persist(&self, uuid: TestResultUuid) -> Result<(), LifecycleError>;

    /// Drops the result from working memory without writing it.
    fn discard(&self, uuid: TestResultUuid) -> Result<(), LifecycleError>;
}

type Clock = dyn Fn() -> i64 + Send + Sync;

/// The default [`ResultLifecycle`]: a mutex-guarded map of results and a [`ResultsWriter`].
#[derive(Debug)]
pub struct AllureLifecycle<W> {
    results: Mutex<HashMap<TestResultUuid, TestResult>>,
    writer: W,
    clock: DebugIgnore<Arc<Clock>>,
}

impl AllureLifecycle<FileSystemResultsWriter> {
    /// Creates a lifecycle writing JSON files to the configured results directory.
    pub fn from_config(config: &ListenerConfig) -> Self {
        Self::new(FileSystemResultsWriter::new(config.results_directory()))
    }
}

impl<W: ResultsWriter> AllureLifecycle<W> {
    /// Creates a lifecycle using the system clock.
    pub fn new(writer: W) -> Self {
        Self::with_clock(writer, now_millis)
    }

    /// Creates a lifecycle that reads timestamps, in epoch milliseconds, from `clock`.
    pub fn with_clock(writer: W, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        let clock: Arc<Clock> = Arc::new(clock);
        Self {
            results: Mutex::new(HashMap::new()),
            writer,
            clock: DebugIgnore(clock),
        }
    }

    /// The writer results are persisted through.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Returns a copy of a stored result.
    pub fn get(&self, uuid: TestResultUuid) -> Option<TestResult> {
        self.lock().get(&uuid).cloned()
    }

    /// The number of results registered but not yet persisted.
    pub fn in_progress_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TestResultUuid, TestResult>> {
        self.results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn now(&self) -> i64 {
        (self.clock.0)()
    }
}

impl<W: ResultsWriter> ResultLifecycle for AllureLifecycle<W> {
    fn register_result(&self, mut result: TestResult) -> Result<(), LifecycleError> {
        let uuid = result.uuid;
        result.set_stage(Stage::Running);
        if result.start.is_none() {
            result.set_start(self.now());
        }
        debug!("lifecycle: registered {uuid}");
        if self.lock().insert(uuid, result).is_some() {
            warn!("test result {uuid} was registered twice, replacing the earlier one");
        }
        Ok(())
    }

    fn mutate_result(
        &self,
        uuid: TestResultUuid,
        f: &mut dyn FnMut(&mut TestResult),
    ) -> Result<(), LifecycleError> {
        let mut results = self.lock();
        let result = results
            .get_mut(&uuid)
            .ok_or(LifecycleError::NotFound { uuid })?;
        f(result);
        Ok(())
    }

    fn finalize_timing(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        let stop = self.now();
        self.mutate_result(uuid, &mut |result| {
            result.set_stop(stop).set_stage(Stage::Finished);
        })
    }

    fn persist(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        // Release the lock before writing.
        let result = self
            .lock()
            .remove(&uuid)
            .ok_or(LifecycleError::NotFound { uuid })?;
        self.writer
            .write(&result)
            .map_err(|error| LifecycleError::Write { uuid, error })?;
        debug!("lifecycle: persisted {uuid}");
        Ok(())
    }

    fn discard(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        self.lock()
            .remove(&uuid)
            .ok_or(LifecycleError::NotFound { uuid })?;
        debug!("lifecycle: discarded {uuid}");
        Ok(())
    }
}

impl<T: ResultLifecycle + ?Sized> ResultLifecycle for &T {
    fn register_result(&self, result: TestResult) -> Result<(), LifecycleError> {
        (**self).register_result(result)
    }

    fn mutate_result(
        &self,
        uuid: TestResultUuid,
        f: &mut dyn FnMut(&mut TestResult),
    ) -> Result<(), LifecycleError> {
        (**self).mutate_result(uuid, f)
    }

    fn finalize_timing(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        (**self).finalize_timing(uuid)
    }

    fn persist(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        (**self).persist(uuid)
    }

    fn discard(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        (**self).discard(uuid)
    }
}

impl<T: ResultLifecycle + ?Sized> ResultLifecycle for Arc<T> {
    fn register_result(&self, result: TestResult) -> Result<(), LifecycleError> {
        (**self).register_result(result)
    }

    fn mutate_result(
        &self,
        uuid: TestResultUuid,
        f: &mut dyn FnMut(&mut TestResult),
    ) -> Result<(), LifecycleError> {
        (**self).mutate_result(uuid, f)
    }

    fn finalize_timing(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        (**self).finalize_timing(uuid)
    }

    fn persist(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        (**self).persist(uuid)
    }

    fn discard(&self, uuid: TestResultUuid) -> Result<(), LifecycleError> {
        (**self).discard(uuid)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
