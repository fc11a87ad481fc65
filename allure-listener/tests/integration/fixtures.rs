// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use allure_listener::{
    config::{EnvOverrides, ListenerConfig, ListenerConfigLocation},
    lifecycle::AllureLifecycle,
    listener::AllureListener,
    metadata::TestDescriptor,
    writer::InMemoryResultsWriter,
};
use allure_model::TestResult;
use camino::Utf8Path;
use color_eyre::eyre::{Result, WrapErr};
use std::sync::{Arc, Once};

pub(crate) type MemoryLifecycle = Arc<AllureLifecycle<InMemoryResultsWriter>>;
pub(crate) type MemoryListener = AllureListener<MemoryLifecycle>;

static INIT: Once = Once::new();

pub(crate) fn test_init() {
    INIT.call_once(|| {
        // Another test binary may have installed the hook already.
        _ = color_eyre::install();
    });
}

/// Overrides that keep labels independent of the machine running the tests.
pub(crate) fn fixed_env() -> EnvOverrides {
    EnvOverrides {
        host_name: Some("test-host".to_owned()),
        thread_name: Some("test-thread".to_owned()),
        ..Default::default()
    }
}

pub(crate) fn listener_with_config(config: &ListenerConfig) -> MemoryListener {
    let lifecycle = Arc::new(AllureLifecycle::new(InMemoryResultsWriter::new()));
    AllureListener::new(lifecycle, config)
}

pub(crate) fn memory_listener() -> Result<MemoryListener> {
    let config = ListenerConfig::load_with_env(ListenerConfigLocation::Isolated, &fixed_env())?;
    Ok(listener_with_config(&config))
}

pub(crate) fn load_config(path: &Utf8Path, env: &EnvOverrides) -> Result<ListenerConfig> {
    ListenerConfig::load_with_env(ListenerConfigLocation::Explicit(path), env)
        .wrap_err_with(|| format!("loading config from {path}"))
}

pub(crate) fn written(listener: &MemoryListener) -> Vec<TestResult> {
    listener.lifecycle().writer().take_results()
}

pub(crate) fn label_values<'a>(result: &'a TestResult, name: &'a str) -> Vec<&'a str> {
    result.label_values(name).collect()
}

pub(crate) fn foo_should_work() -> TestDescriptor {
    TestDescriptor::new("com.example.Foo", "shouldWork")
}
