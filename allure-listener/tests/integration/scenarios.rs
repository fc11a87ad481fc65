// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end callback sequences against an in-memory lifecycle.

use crate::fixtures::*;
use allure_listener::{
    failure::{FailureClassifier, TestFailure},
    history::{HistoryIdAlgorithm, HistoryIdComputer},
    listener::{IGNORED_WITHOUT_REASON, ListenerContext, ListenerEvent, ListenerEventKind},
    metadata::{Annotation, CustomAnnotation, SeverityLevel, TestDescriptor},
};
use allure_model::{Label, Link, Stage, Status};
use camino_tempfile::tempdir;
use color_eyre::eyre::{Result, ensure, eyre};
use indoc::indoc;
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test]
fn passing_test_is_fully_labeled() -> Result<()> {
    test_init();
    let listener = memory_listener()?;
    let mut cx = ListenerContext::new();

    listener.on_run_started();
    listener.on_test_started(&mut cx, &foo_should_work())?;
    listener.on_test_finished(&mut cx, &foo_should_work())?;
    listener.on_run_finished();

    let results = written(&listener);
    ensure!(results.len() == 1, "one result written, got {}", results.len());
    let result = &results[0];

    assert_eq!(result.name.as_deref(), Some("shouldWork"));
    assert_eq!(result.full_name.as_deref(), Some("com.example.Foo.shouldWork"));
    assert_eq!(result.status, Some(Status::Passed));
    assert_eq!(result.stage, Some(Stage::Finished));
    assert_eq!(label_values(result, Label::PACKAGE), ["com.example"]);
    assert_eq!(label_values(result, Label::TEST_CLASS), ["com.example.Foo"]);
    assert_eq!(label_values(result, Label::TEST_METHOD), ["shouldWork"]);
    assert_eq!(label_values(result, Label::SUITE), ["com.example.Foo"]);
    assert_eq!(label_values(result, Label::HOST), ["test-host"]);
    assert_eq!(label_values(result, Label::THREAD), ["test-thread"]);

    let expected_history_id = HistoryIdComputer::new(HistoryIdAlgorithm::Sha256)
        .history_id("com.example.Foo", Some("shouldWork"));
    assert_eq!(result.history_id.as_deref(), Some(expected_history_id.as_str()));

    let (start, stop) = result
        .start
        .zip(result.stop)
        .ok_or_else(|| eyre!("result has start and stop times"))?;
    ensure!(start <= stop, "start {start} is not after stop {stop}");
    Ok(())
}

#[test_case(TestFailure::assertion("x!=y"), Status::Failed ; "assertion")]
#[test_case(TestFailure::error("NullPointerException", "x!=y"), Status::Broken ; "error")]
fn failure_is_classified(failure: TestFailure, expected: Status) -> Result<()> {
    test_init();
    let listener = memory_listener()?;
    let mut cx = ListenerContext::new();

    listener.on_test_started(&mut cx, &foo_should_work())?;
    listener.on_test_failure(&mut cx, &failure)?;
    listener.on_test_finished(&mut cx, &foo_should_work())?;

    let result = written(&listener).remove(0);
    assert_eq!(result.status, Some(expected));
    assert_eq!(result.status_message(), Some("x!=y"));
    let trace = result
        .status_trace()
        .ok_or_else(|| eyre!("failure trace is recorded"))?;
    ensure!(trace.contains("x!=y"), "trace mentions the message: {trace}");
    Ok(())
}

#[test]
fn custom_classifier() -> Result<()> {
    struct EverythingFails;

    impl FailureClassifier for EverythingFails {
        fn classify(&self, _failure: &TestFailure) -> Status {
            Status::Failed
        }
    }

    test_init();
    let listener = memory_listener()?.with_classifier(EverythingFails);
    let mut cx = ListenerContext::new();

    listener.on_test_started(&mut cx, &foo_should_work())?;
    listener.on_test_failure(&mut cx, &TestFailure::error("IoError", "disk full"))?;
    listener.on_test_finished(&mut cx, &foo_should_work())?;

    let result = listener.lifecycle().writer().take_results().remove(0);
    assert_eq!(result.status, Some(Status::Failed));
    Ok(())
}

#[test_case(None, IGNORED_WITHOUT_REASON ; "without reason")]
#[test_case(Some(""), IGNORED_WITHOUT_REASON ; "empty reason")]
#[test_case(Some("flaky"), "flaky" ; "with reason")]
fn ignored_test(reason: Option<&str>, expected_message: &str) -> Result<()> {
    test_init();
    let listener = memory_listener()?;
    let mut cx = ListenerContext::new();

    let descriptor = foo_should_work().with_method_annotation(Annotation::Ignore {
        reason: reason.map(str::to_owned),
    });
    listener.on_test_ignored(&mut cx, &descriptor)?;

    let results = written(&listener);
    ensure!(results.len() == 1, "one result written");
    let result = &results[0];
    assert_eq!(result.status, Some(Status::Skipped));
    assert_eq!(result.status_message(), Some(expected_message));
    assert_eq!(label_values(result, Label::TEST_METHOD), ["shouldWork"]);
    ensure!(cx.identity().peek().is_none(), "identity is released");
    Ok(())
}

#[test]
fn tags_merge_method_first() -> Result<()> {
    test_init();
    let listener = memory_listener()?;
    let mut cx = ListenerContext::new();

    let descriptor = foo_should_work()
        .with_class_annotation(Annotation::Tag("a".to_owned()))
        .with_class_annotation(Annotation::Tag("b".to_owned()))
        .with_method_annotation(Annotation::Tag("c".to_owned()));
    listener.on_test_started(&mut cx, &descriptor)?;
    listener.on_test_finished(&mut cx, &descriptor)?;

    let result = written(&listener).remove(0);
    assert_eq!(label_values(&result, Label::TAG), ["c", "a", "b"]);
    Ok(())
}

#[test]
fn annotations_shape_the_result() -> Result<()> {
    test_init();
    let listener = memory_listener()?;
    let mut cx = ListenerContext::new();

    let descriptor = foo_should_work()
        .with_class_annotation(Annotation::DisplayName("Foo features".to_owned()))
        .with_class_annotation(Annotation::Description("Checks Foo.".to_owned()))
        .with_class_annotation(Annotation::Epic("core".to_owned()))
        .with_class_annotation(Annotation::Owner("team-a".to_owned()))
        .with_class_annotation(Annotation::Severity(SeverityLevel::Critical))
        .with_method_annotation(Annotation::DisplayName("Foo works".to_owned()))
        .with_method_annotation(Annotation::Owner("alex".to_owned()))
        .with_method_annotation(Annotation::Story("happy path".to_owned()))
        .with_method_annotation(Annotation::link("design-doc", "https://docs.example.com/foo"));

    listener.on_test_started(&mut cx, &descriptor)?;
    listener.on_test_finished(&mut cx, &descriptor)?;

    let result = written(&listener).remove(0);
    assert_eq!(result.name.as_deref(), Some("Foo works"));
    assert_eq!(
        result.full_name.as_deref(),
        Some("com.example.Foo.shouldWork"),
        "display names don't change the full name"
    );
    assert_eq!(result.description.as_deref(), Some("Checks Foo."));
    assert_eq!(label_values(&result, Label::SUITE), ["Foo features"]);
    assert_eq!(label_values(&result, Label::OWNER), ["alex"]);
    assert_eq!(label_values(&result, Label::SEVERITY), ["critical"]);
    assert_eq!(label_values(&result, Label::EPIC), ["core"]);
    assert_eq!(label_values(&result, Label::STORY), ["happy path"]);

    let mut link = Link::new("design-doc");
    link.set_url("https://docs.example.com/foo").set_type(Link::CUSTOM_TYPE);
    assert_eq!(result.links.iter().collect::<Vec<_>>(), [&link]);
    Ok(())
}

#[test]
fn configured_patterns_and_custom_labels() -> Result<()> {
    test_init();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("allure.toml");
    std::fs::write(
        &config_path,
        indoc! {r#"
            history-id-algorithm = "xxh3-128"

            [link-patterns]
            issue = "https://tracker.example.com/browse/{}"

            [[custom-labels]]
            kind = "layer"
            label = "layer"
            repeatable = true
        "#},
    )?;
    let config = load_config(&config_path, &fixed_env())?;
    let listener = listener_with_config(&config);
    let mut cx = ListenerContext::new();

    let descriptor = foo_should_work()
        .with_class_annotation(Annotation::Issue("FOO-1".to_owned()))
        .with_class_annotation(Annotation::Custom(
            CustomAnnotation::new("layer").with_field("value", "api"),
        ))
        .with_method_annotation(Annotation::Issue("FOO-1".to_owned()))
        .with_method_annotation(Annotation::Issue("FOO-2".to_owned()))
        .with_method_annotation(Annotation::Custom(
            CustomAnnotation::new("layer").with_field("value", "service"),
        ));
    listener.on_test_started(&mut cx, &descriptor)?;
    listener.on_test_finished(&mut cx, &descriptor)?;

    let result = written(&listener).remove(0);
    let urls: Vec<_> = result
        .links
        .iter()
        .map(|link| link.url.as_deref())
        .collect();
    assert_eq!(
        urls,
        [
            Some("https://tracker.example.com/browse/FOO-1"),
            Some("https://tracker.example.com/browse/FOO-2"),
        ],
        "duplicate issue links are collapsed"
    );
    assert_eq!(label_values(&result, "layer"), ["service", "api"]);
    assert_eq!(
        result.history_id.as_ref().map(String::len),
        Some(HistoryIdAlgorithm::Xxh3_128.hex_len())
    );
    Ok(())
}

#[test]
fn history_id_is_stable_across_runs() -> Result<()> {
    test_init();
    let mut history_ids = Vec::new();
    for _ in 0..2 {
        let listener = memory_listener()?;
        let mut cx = ListenerContext::new();
        listener.on_test_started(&mut cx, &foo_should_work())?;
        listener.on_test_finished(&mut cx, &foo_should_work())?;
        let result = written(&listener).remove(0);
        history_ids.push((result.uuid, result.history_id));
    }

    ensure!(history_ids[0].0 != history_ids[1].0, "uuids differ between runs");
    assert_eq!(history_ids[0].1, history_ids[1].1);

    let listener = memory_listener()?;
    let mut cx = ListenerContext::new();
    let other = TestDescriptor::new("com.example.Foo", "shouldAlsoWork");
    listener.on_test_started(&mut cx, &other)?;
    listener.on_test_finished(&mut cx, &other)?;
    let result = written(&listener).remove(0);
    ensure!(
        result.history_id != history_ids[0].1,
        "distinct methods have distinct history ids"
    );
    Ok(())
}

#[test]
fn event_stream() -> Result<()> {
    test_init();
    let listener = memory_listener()?;
    let mut cx = ListenerContext::new();

    let events = [
        ListenerEventKind::RunStarted,
        ListenerEventKind::TestStarted {
            descriptor: foo_should_work(),
        },
        ListenerEventKind::TestFailure {
            failure: TestFailure::assertion("x!=y"),
        },
        ListenerEventKind::TestFinished {
            descriptor: foo_should_work(),
        },
        ListenerEventKind::TestIgnored {
            descriptor: TestDescriptor::new("com.example.Foo", "notYet"),
        },
        ListenerEventKind::TestStarted {
            descriptor: TestDescriptor::new("com.example.Foo", "needsNetwork"),
        },
        ListenerEventKind::TestAssumptionFailure {
            failure: TestFailure::error("AssumptionViolatedException", "offline"),
        },
        ListenerEventKind::TestFinished {
            descriptor: TestDescriptor::new("com.example.Foo", "needsNetwork"),
        },
        ListenerEventKind::RunFinished,
    ];
    for kind in events {
        listener.handle_event(&mut cx, ListenerEvent::new(kind))?;
    }

    let outcomes: Vec<_> = written(&listener)
        .into_iter()
        .map(|result| (result.name, result.status))
        .collect();
    assert_eq!(
        outcomes,
        [
            (Some("shouldWork".to_owned()), Some(Status::Failed)),
            (Some("notYet".to_owned()), Some(Status::Skipped)),
            (Some("needsNetwork".to_owned()), Some(Status::Skipped)),
        ]
    );
    ensure!(
        listener.lifecycle().in_progress_count() == 0,
        "nothing is left in progress"
    );
    Ok(())
}
