// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize and deserialize a `TestResult`.
//!
//! The layout follows the Allure result schema: camelCase keys, `statusDetails` as a nested
//! object, and times as milliseconds since the Unix epoch.

use crate::{DeserializeError, SerializeError, TestResult};
use std::io;

pub(crate) fn serialize_result(
    result: &TestResult,
    mut writer: impl io::Write,
) -> Result<(), SerializeError> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    // Add a trailing newline.
    writer
        .write_all(b"\n")
        .map_err(|error| SerializeError::from(serde_json::Error::io(error)))
}

pub(crate) fn serialize_result_to_string(result: &TestResult) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub(crate) fn deserialize_result(reader: impl io::Read) -> Result<TestResult, DeserializeError> {
    Ok(serde_json::from_reader(reader)?)
}
