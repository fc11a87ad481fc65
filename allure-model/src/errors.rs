// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurs while serializing a [`TestResult`](crate::TestResult).
///
/// Returned by [`TestResult::serialize`](crate::TestResult::serialize) and
/// [`TestResult::to_json_string`](crate::TestResult::to_json_string).
#[derive(Debug, Error)]
#[error("error serializing Allure test result")]
pub struct SerializeError {
    #[from]
    inner: serde_json::Error,
}

/// An error that occurs while reading a [`TestResult`](crate::TestResult) back from JSON.
#[derive(Debug, Error)]
#[error("error deserializing Allure test result")]
pub struct DeserializeError {
    #[from]
    inner: serde_json::Error,
}
