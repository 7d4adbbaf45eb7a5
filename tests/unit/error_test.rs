//! Tests for error types

use prometheus_plugin_dispatch::core::{CompositeError, InnerFailure, PluginError, SchedulerError};

#[test]
fn test_plugin_error_from_text() {
    let err: PluginError = "no such user".into();
    assert_eq!(format!("{}", err), "plugin failed: no such user");

    let err: PluginError = String::from("timeout").into();
    assert_eq!(err, PluginError::Failed { msg: "timeout".into() });
}

#[test]
fn test_invalid_argument_count_error() {
    let err = PluginError::InvalidArgumentCount { expected: 2, found: 3 };
    assert_eq!(format!("{}", err), "invalid argument count: 3 (expected 2)");
}

#[test]
fn test_panicked_error() {
    let err = PluginError::Panicked {
        plugin: "dice".into(),
        message: "index out of bounds".into(),
    };
    assert_eq!(format!("{}", err), "plugin `dice` panicked: index out of bounds");
}

#[test]
fn test_composite_error_display() {
    let err = CompositeError::new(vec![
        InnerFailure {
            plugin: "a".into(),
            error: "down".into(),
        },
        InnerFailure {
            plugin: "b".into(),
            error: PluginError::InvalidArgumentCount { expected: 1, found: 0 },
        },
    ]);
    assert_eq!(err.len(), 2);
    assert_eq!(err.failed_plugins(), vec!["a", "b"]);

    let rendered = PluginError::from(err).to_string();
    assert!(rendered.starts_with("2 inner plugin(s) failed"));
    assert!(rendered.contains("`a`: plugin failed: down"));
    assert!(rendered.contains("`b`: invalid argument count: 0 (expected 1)"));
}

#[test]
fn test_scheduler_errors() {
    assert_eq!(format!("{}", SchedulerError::QueueFull), "task queue is full");
    assert_eq!(format!("{}", SchedulerError::PoolShutdown), "worker pool has been shut down");
    assert_eq!(
        format!("{}", SchedulerError::InvalidConfig("worker_count must be greater than 0".into())),
        "invalid configuration: worker_count must be greater than 0"
    );
    assert_eq!(
        format!("{}", SchedulerError::Internal("join failed".into())),
        "internal error: join failed"
    );
}
