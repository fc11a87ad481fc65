// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative test metadata and its translation into labels and links.
//!
//! A runner describes each test with a [`TestDescriptor`]: the class and method names plus the
//! [`Annotation`]s declared at each [`Scope`]. The [`MetadataExtractor`] resolves those into the
//! labels, links and name overrides recorded on a test result.

mod annotation;
mod extract;
mod links;

pub use annotation::*;
pub use extract::*;
pub use links::LinkPatterns;
