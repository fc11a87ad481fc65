// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for allure-listener.

use crate::errors::DisplayErrorChain;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    thread,
};
use tracing::debug;

/// Used as the host label when the host name cannot be determined.
pub const DEFAULT_HOST_NAME: &str = "default";

/// Returns the host label: the override if set, else the machine's host name.
pub fn host_name(override_: Option<&str>) -> String {
    if let Some(host_name) = override_ {
        return host_name.to_owned();
    }
    match whoami::hostname() {
        Ok(host_name) if !host_name.is_empty() => host_name,
        Ok(_) => DEFAULT_HOST_NAME.to_owned(),
        Err(error) => {
            debug!(
                "could not determine host name, using `{DEFAULT_HOST_NAME}`: {}",
                DisplayErrorChain::new(&error)
            );
            DEFAULT_HOST_NAME.to_owned()
        }
    }
}

/// Returns the thread label for the calling thread: the override if set, else
/// `<pid>.<thread name>(<index>)`, where the index numbers threads in the order they first ask.
pub fn thread_name(override_: Option<&str>) -> String {
    match override_ {
        Some(thread_name) => thread_name.to_owned(),
        None => current_thread_label(),
    }
}

static NEXT_THREAD_INDEX: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // Assigned on first use, so ids are stable per thread and unique within the process.
    static THREAD_INDEX: u64 = NEXT_THREAD_INDEX.fetch_add(1, Ordering::Relaxed);
}

fn current_thread_label() -> String {
    let current = thread::current();
    format!(
        "{}.{}({})",
        std::process::id(),
        current.name().unwrap_or("unnamed"),
        THREAD_INDEX.with(|index| *index),
    )
}
