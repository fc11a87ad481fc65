// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Build, serialize and read Allure test results in Rust.
//!
//! A [`TestResult`] is the unit written out by an Allure listener: one JSON document per test,
//! named `<uuid>-result.json`, inside a results directory.

mod errors;
mod result;
mod serialize;
mod uuid;

pub use errors::*;
pub use result::*;
pub use uuid::*;
