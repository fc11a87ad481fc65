// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writers that persist finished test results.

use crate::errors::WriteResultError;
use allure_model::TestResult;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use std::{io::Write, sync::Mutex};
use tracing::debug;

/// Persists finished test results.
pub trait ResultsWriter: Send + Sync {
    /// Writes a single result.
    fn write(&self, result: &TestResult) -> Result<(), WriteResultError>;
}

/// Writes each result to `<uuid>-result.json` under a directory, in the Allure results format.
///
/// The directory is created on first write. Files are replaced atomically, so a reader never
/// observes a partially written result.
#[derive(Clone, Debug)]
pub struct FileSystemResultsWriter {
    results_dir: Utf8PathBuf,
}

impl FileSystemResultsWriter {
    /// Creates a writer for the given directory.
    pub fn new(results_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// The directory results are written to.
    pub fn results_dir(&self) -> &Utf8Path {
        &self.results_dir
    }
}

impl ResultsWriter for FileSystemResultsWriter {
    fn write(&self, result: &TestResult) -> Result<(), WriteResultError> {
        let path = self.results_dir.join(result.file_name());

        let mut contents = Vec::new();
        result
            .serialize(&mut contents)
            .map_err(|error| WriteResultError::Serialize {
                file: path.clone(),
                error,
            })?;

        std::fs::create_dir_all(&self.results_dir).map_err(|error| WriteResultError::Fs {
            file: self.results_dir.clone(),
            error,
        })?;

        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|file| file.write_all(&contents))
            .map_err(|error| WriteResultError::Fs {
                file: path.clone(),
                error: error.into(),
            })?;

        debug!("wrote test result to {path}");
        Ok(())
    }
}

/// Collects results in memory.
#[derive(Debug, Default)]
pub struct InMemoryResultsWriter {
    results: Mutex<Vec<TestResult>>,
}

impl InMemoryResultsWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the results written so far, in write order.
    pub fn results(&self) -> Vec<TestResult> {
        self.lock().clone()
    }

    /// Removes and returns the results written so far.
    pub fn take_results(&self) -> Vec<TestResult> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TestResult>> {
        self.results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResultsWriter for InMemoryResultsWriter {
    fn write(&self, result: &TestResult) -> Result<(), WriteResultError> {
        self.lock().push(result.clone());
        Ok(())
    }
}

impl<W: ResultsWriter + ?Sized> ResultsWriter for &W {
    fn write(&self, result: &TestResult) -> Result<(), WriteResultError> {
        (**self).write(result)
    }
}

impl<W: ResultsWriter + ?Sized> ResultsWriter for std::sync::Arc<W> {
    fn write(&self, result: &TestResult) -> Result<(), WriteResultError> {
        (**self).write(result)
    }
}
