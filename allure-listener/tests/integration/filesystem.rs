// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Results written through the default lifecycle to a results directory.

use crate::fixtures::*;
use allure_listener::{
    lifecycle::AllureLifecycle,
    listener::{AllureListener, ListenerContext},
    metadata::Annotation,
};
use allure_model::TestResult;
use camino_tempfile::tempdir;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use serde_json::Value;

#[test]
fn results_are_written_as_allure_json() -> Result<()> {
    test_init();
    let temp_dir = tempdir()?;
    let results_dir = temp_dir.path().join("allure-results");
    let config_path = temp_dir.path().join("allure.toml");
    std::fs::write(&config_path, format!("results-directory = {:?}\n", results_dir.as_str()))?;

    let config = load_config(&config_path, &fixed_env())?;
    assert_eq!(config.results_directory(), results_dir.as_path());

    let listener = AllureListener::new(AllureLifecycle::from_config(&config), &config);
    let mut cx = ListenerContext::new();
    let descriptor = foo_should_work().with_method_annotation(Annotation::Tag("smoke".to_owned()));
    listener.on_test_started(&mut cx, &descriptor)?;
    let uuid = cx.current_uuid();
    listener.on_test_finished(&mut cx, &descriptor)?;

    let entries: Vec<_> = results_dir.read_dir_utf8()?.collect::<Result<_, _>>()?;
    ensure!(entries.len() == 1, "one file written, got {}", entries.len());
    let path = entries[0].path();
    assert_eq!(
        path.file_name().map(str::to_owned),
        uuid.map(|uuid| format!("{uuid}-result.json"))
    );

    let contents = std::fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&contents)?;
    assert_eq!(json["name"], "shouldWork");
    assert_eq!(json["fullName"], "com.example.Foo.shouldWork");
    assert_eq!(json["status"], "passed");
    assert_eq!(json["stage"], "finished");
    ensure!(json["historyId"].is_string(), "historyId is present");
    ensure!(
        json["labels"]
            .as_array()
            .is_some_and(|labels| labels.contains(&serde_json::json!({"name": "tag", "value": "smoke"}))),
        "tag label is present: {}",
        json["labels"]
    );

    let result = TestResult::deserialize(contents.as_bytes())?;
    assert_eq!(result.status_message(), None);
    Ok(())
}
