// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Translates test runner lifecycle events into Allure test results.
//!
//! A runner drives an [`AllureListener`](listener::AllureListener) through its callbacks, one
//! [`ListenerContext`](listener::ListenerContext) per worker. The listener derives names,
//! labels, links and a history id from each test's [`TestDescriptor`](metadata::TestDescriptor),
//! and hands results to a [`ResultLifecycle`](lifecycle::ResultLifecycle), which persists them
//! through a [`ResultsWriter`](writer::ResultsWriter).
//!
//! ```
//! use allure_listener::{
//!     config::ListenerConfig,
//!     lifecycle::AllureLifecycle,
//!     listener::{AllureListener, ListenerContext},
//!     metadata::{Annotation, TestDescriptor},
//!     writer::InMemoryResultsWriter,
//! };
//!
//! let config = ListenerConfig::default();
//! let listener = AllureListener::new(AllureLifecycle::new(InMemoryResultsWriter::new()), &config);
//! let mut cx = ListenerContext::new();
//!
//! let test = TestDescriptor::new("com.example.Foo", "shouldWork")
//!     .with_method_annotation(Annotation::Tag("smoke".to_owned()));
//! listener.on_test_started(&mut cx, &test)?;
//! listener.on_test_finished(&mut cx, &test)?;
//!
//! let results = listener.lifecycle().writer().results();
//! assert_eq!(results[0].name.as_deref(), Some("shouldWork"));
//! # Ok::<_, allure_listener::errors::ListenerError>(())
//! ```

pub mod config;
pub mod errors;
pub mod failure;
pub mod helpers;
pub mod history;
pub mod identity;
pub mod lifecycle;
pub mod listener;
pub mod metadata;
pub mod output;
pub mod writer;
