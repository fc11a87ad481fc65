// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the Allure listener.

use crate::history::HistoryIdAlgorithm;
use allure_model::{SerializeError, TestResultUuid};
use camino::Utf8PathBuf;
use thiserror::Error;

/// An error that occurred while loading listener configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("listener config file not found at {path}")]
    FileNotFound {
        /// The path that was requested.
        path: Utf8PathBuf,
    },

    /// The config file could not be read.
    #[error("failed to read listener config at {path}")]
    Read {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// The config file is not valid TOML, or doesn't match the expected schema.
    #[error("failed to parse listener config at {path}")]
    Parse {
        /// The path to the config file.
        path: Utf8PathBuf,

        /// The underlying TOML error.
        #[source]
        error: toml::de::Error,
    },

    /// The configured history id algorithm isn't available.
    #[error("history id digest is unavailable")]
    HistoryIdAlgorithm(#[source] HistoryIdAlgorithmParseError),

    /// A link pattern has no `{}` placeholder.
    #[error("link pattern for type `{link_type}` does not contain `{{}}`: {pattern}")]
    InvalidLinkPattern {
        /// The link type the pattern was declared for.
        link_type: String,

        /// The pattern as written.
        pattern: String,
    },

    /// Two custom label kinds were declared with the same name.
    #[error("custom label kind `{kind}` is declared more than once")]
    DuplicateCustomLabel {
        /// The duplicated kind.
        kind: String,
    },
}

/// Error returned while parsing a [`HistoryIdAlgorithm`] from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized history id algorithm: {input}\n(known values: {})",
    HistoryIdAlgorithm::variants().join(", "),
)]
pub struct HistoryIdAlgorithmParseError {
    input: String,
}

impl HistoryIdAlgorithmParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// The string that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// An error that occurred while reading metadata off a test descriptor.
///
/// These are fatal for the callback that triggered extraction: a partially built result is
/// never handed to the lifecycle.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractError {
    /// A recognised annotation does not carry the field its handler reads.
    #[error("annotation `{kind}` has no `{field}` field")]
    MissingField {
        /// The annotation kind.
        kind: String,

        /// The field the handler expected.
        field: String,
    },
}

/// An error that occurred while writing a result out.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteResultError {
    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while producing JSON.
    #[error("error writing Allure result to {file}")]
    Serialize {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: SerializeError,
    },
}

/// An error returned by a [`ResultLifecycle`](crate::lifecycle::ResultLifecycle).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LifecycleError {
    /// No result is registered under this uuid.
    #[error("no test result registered for {uuid}")]
    NotFound {
        /// The uuid that was looked up.
        uuid: TestResultUuid,
    },

    /// The result was found but could not be written out.
    #[error("failed to persist test result {uuid}")]
    Write {
        /// The uuid of the result.
        uuid: TestResultUuid,

        /// The underlying error.
        #[source]
        error: WriteResultError,
    },
}

/// An error returned to the runner from a listener callback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ListenerError {
    /// Metadata could not be read off the test descriptor.
    #[error("failed to extract metadata for {test}")]
    Extract {
        /// The fully qualified name of the test.
        test: String,

        /// The underlying error.
        #[source]
        error: ExtractError,
    },

    /// The lifecycle collaborator failed.
    #[error("test result lifecycle failed for {test}")]
    Lifecycle {
        /// The fully qualified name of the test.
        test: String,

        /// The underlying error.
        #[source]
        error: LifecycleError,
    },
}

/// Displays an error along with its chain of sources, one per line.
#[derive(Clone, Copy, Debug)]
pub struct DisplayErrorChain<E>(E);

impl<E> DisplayErrorChain<E> {
    /// Wraps an error for display.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: std::error::Error> std::fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, "\n  caused by:\n  - {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
