//! Tests for configuration validation and loading

use prometheus_plugin_dispatch::config::{SchedulerConfig, SchedulerKind, SubmissionMode, WorkerPoolConfig};
use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_pool_config_validation() {
    let valid = WorkerPoolConfig::new()
        .with_worker_count(4)
        .with_max_queue_depth(16)
        .with_shutdown_timeout_ms(500);
    assert!(valid.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_values() {
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_max_queue_depth(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_thread_stack_size(1024).validate().is_err());
    assert!(WorkerPoolConfig::new().with_shutdown_timeout_ms(0).validate().is_err());
}

#[test]
fn test_basic_config_ignores_pool_settings() {
    let cfg = SchedulerConfig {
        kind: SchedulerKind::Basic,
        pool: WorkerPoolConfig::new().with_worker_count(0),
    };
    assert!(cfg.validate().is_ok());

    let threaded = SchedulerConfig {
        kind: SchedulerKind::Threaded,
        ..cfg
    };
    let err = threaded.validate().unwrap_err();
    assert!(err.starts_with("pool invalid:"));
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "kind": "threaded",
        "pool": {
            "worker_count": 8,
            "max_queue_depth": 64,
            "submission": "non_blocking",
            "allow_overlapping_dispatch": true
        }
    }"#;
    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.kind, SchedulerKind::Threaded);
    assert_eq!(cfg.pool.worker_count, 8);
    assert_eq!(cfg.pool.max_queue_depth, 64);
    assert_eq!(cfg.pool.submission, SubmissionMode::NonBlocking);
    assert!(cfg.pool.allow_overlapping_dispatch);
    // Omitted fields keep their defaults.
    assert_eq!(cfg.pool.shutdown_timeout_ms, WorkerPoolConfig::default().shutdown_timeout_ms);
}

#[test]
fn test_scheduler_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str("not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{"kind":"threaded","pool":{"worker_count":0}}"#).is_err());
    assert!(SchedulerConfig::from_json_str(r#"{"kind":"fastest"}"#).is_err());
}

#[test]
fn test_scheduler_config_from_lookup() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        ("DISPATCH_SCHEDULER", "threaded"),
        ("DISPATCH_WORKERS", "3"),
        ("DISPATCH_QUEUE_DEPTH", "12"),
        ("DISPATCH_SUBMISSION", "non-blocking"),
        ("DISPATCH_ALLOW_OVERLAP", "true"),
        ("DISPATCH_SHUTDOWN_TIMEOUT_MS", "250"),
    ]))
    .unwrap();

    assert_eq!(cfg.kind, SchedulerKind::Threaded);
    assert_eq!(cfg.pool.worker_count, 3);
    assert_eq!(cfg.pool.max_queue_depth, 12);
    assert_eq!(cfg.pool.submission, SubmissionMode::NonBlocking);
    assert!(cfg.pool.allow_overlapping_dispatch);
    assert_eq!(cfg.pool.shutdown_timeout_ms, 250);
}

#[test]
fn test_scheduler_config_from_lookup_defaults_and_errors() {
    assert_eq!(SchedulerConfig::from_lookup(lookup(&[])).unwrap(), SchedulerConfig::default());

    let err = SchedulerConfig::from_lookup(lookup(&[("DISPATCH_WORKERS", "many")])).unwrap_err();
    assert!(err.starts_with("DISPATCH_WORKERS:"));

    assert!(SchedulerConfig::from_lookup(lookup(&[
        ("DISPATCH_SCHEDULER", "threaded"),
        ("DISPATCH_WORKERS", "0"),
    ]))
    .is_err());
}
