use super::error::{PublishError, TopicError};
use super::logging;
use std::time::Duration;

#[test]
fn logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
}

#[test]
fn parse_level_falls_back_to_info() {
    assert_eq!(logging::parse_level("DEBUG"), tracing::Level::DEBUG);
    assert_eq!(logging::parse_level(" warning "), tracing::Level::WARN);
    assert_eq!(logging::parse_level("chatty"), tracing::Level::INFO);
}

#[test]
fn bootstrap_logs_warnings_before_init() {
    assert!(logging::bootstrap(|| tracing::enabled!(tracing::Level::WARN)));
    assert_eq!(logging::bootstrap(|| 7), 7);
}

#[test]
fn topic_timeout_names_missing_channels() {
    let err = TopicError::Timeout {
        missing: vec!["#ops".to_string()],
    };
    assert!(err.to_string().contains("#ops"));
}

#[test]
fn publish_error_labels_are_stable() {
    assert_eq!(
        PublishError::TimedOut(Duration::from_secs(1)).as_label(),
        "timed_out"
    );
    assert_eq!(PublishError::Panicked("boom".into()).as_label(), "panicked");
}
