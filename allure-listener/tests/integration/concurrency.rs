// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Several workers sharing one listener.

use crate::fixtures::*;
use allure_listener::{
    config::{EnvOverrides, ListenerConfig, ListenerConfigLocation},
    failure::TestFailure,
    listener::ListenerContext,
    metadata::TestDescriptor,
};
use allure_model::{Label, Status};
use color_eyre::eyre::{Result, ensure, eyre};
use std::{collections::HashSet, thread};

const WORKERS: usize = 4;
const TESTS_PER_WORKER: usize = 25;

#[test]
fn workers_do_not_share_identities() -> Result<()> {
    test_init();
    let env = EnvOverrides {
        host_name: Some("test-host".to_owned()),
        ..Default::default()
    };
    let config = ListenerConfig::load_with_env(ListenerConfigLocation::Isolated, &env)?;
    let listener = listener_with_config(&config);
    let shared = &listener;

    thread::scope(|s| -> Result<()> {
        let handles: Vec<_> = (0..WORKERS)
            .map(move |worker| {
                let listener = shared;
                thread::Builder::new()
                    .name(format!("worker-{worker}"))
                    .spawn_scoped(s, move || -> Result<()> {
                        let mut cx = ListenerContext::new();
                        for index in 0..TESTS_PER_WORKER {
                            let descriptor = TestDescriptor::new(
                                format!("com.example.Worker{worker}"),
                                format!("test{index}"),
                            );
                            listener.on_test_started(&mut cx, &descriptor)?;
                            if index % 2 == 1 {
                                listener.on_test_failure(
                                    &mut cx,
                                    &TestFailure::assertion(format!("{worker}/{index}")),
                                )?;
                            }
                            listener.on_test_finished(&mut cx, &descriptor)?;
                        }
                        Ok(())
                    })
            })
            .collect::<Result<_, _>>()?;

        for handle in handles {
            handle
                .join()
                .map_err(|_| eyre!("worker thread panicked"))??;
        }
        Ok(())
    })?;

    let results = written(&listener);
    ensure!(
        results.len() == WORKERS * TESTS_PER_WORKER,
        "expected {} results, got {}",
        WORKERS * TESTS_PER_WORKER,
        results.len()
    );
    ensure!(
        listener.lifecycle().in_progress_count() == 0,
        "every result was persisted"
    );

    let uuids: HashSet<_> = results.iter().map(|result| result.uuid).collect();
    ensure!(uuids.len() == results.len(), "every result has its own uuid");

    for result in &results {
        let class_name = result
            .label_values(Label::TEST_CLASS)
            .next()
            .ok_or_else(|| eyre!("{} has a testClass label", result.uuid))?;
        let worker = class_name.trim_start_matches("com.example.Worker");
        let thread_label = result
            .label_values(Label::THREAD)
            .next()
            .ok_or_else(|| eyre!("{} has a thread label", result.uuid))?;
        ensure!(
            thread_label.contains(&format!(".worker-{worker}(")),
            "{thread_label} names the worker that ran {class_name}"
        );

        // Failures must land on the result of the test that reported them.
        let index: usize = result
            .name
            .as_deref()
            .and_then(|name| name.strip_prefix("test"))
            .ok_or_else(|| eyre!("{} has a test name", result.uuid))?
            .parse()?;
        if index % 2 == 1 {
            ensure!(result.status == Some(Status::Failed), "odd tests fail");
            ensure!(
                result.status_message() == Some(format!("{worker}/{index}").as_str()),
                "failure message belongs to this test"
            );
        } else {
            ensure!(result.status == Some(Status::Passed), "even tests pass");
        }
    }
    Ok(())
}

#[test]
fn forked_context_reports_into_the_same_result() -> Result<()> {
    test_init();
    let listener = memory_listener()?;
    let mut cx = ListenerContext::new();

    listener.on_test_started(&mut cx, &foo_should_work())?;
    let uuid = cx
        .current_uuid()
        .ok_or_else(|| eyre!("test is running"))?;

    let child = cx.fork();
    thread::scope(|s| {
        s.spawn(|| {
            let mut child = child;
            listener.on_test_failure(&mut child, &TestFailure::error("TimeoutError", "slow"))
        })
        .join()
        .map_err(|_| eyre!("child thread panicked"))
    })??;

    listener.on_test_finished(&mut cx, &foo_should_work())?;
    let result = written(&listener).remove(0);
    ensure!(result.uuid == uuid, "the parent's identity is used");
    ensure!(
        result.status == Some(Status::Broken),
        "the child's failure is recorded: {:?}",
        result.status
    );
    Ok(())
}
