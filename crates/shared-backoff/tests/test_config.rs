//! Interval configuration from code, files and the environment

use rstest::*;
use shared_backoff::{BackoffIntervals, ConfigError};
use std::time::Duration;

#[rstest]
#[case(Duration::from_millis(1), 1.0, Duration::from_millis(1))]
#[case(Duration::from_secs(600), 2.0, Duration::from_secs(120))]
#[case(Duration::from_secs(1), 0.5, Duration::from_secs(60))]
#[case(Duration::from_secs(1), 1e9, Duration::from_secs(3600))]
fn test_valid_intervals(#[case] start: Duration, #[case] multiplier: f64, #[case] max: Duration) {
    let intervals = BackoffIntervals::new(start, multiplier, max).unwrap();

    assert_eq!(intervals.start_interval(), start);
    assert_eq!(intervals.multiplier(), multiplier);
    assert_eq!(intervals.max_interval(), max);
}

#[rstest]
#[case(Duration::ZERO, 2.0, Duration::from_secs(1), ConfigError::ZeroStartInterval)]
#[case(Duration::from_secs(1), 2.0, Duration::ZERO, ConfigError::ZeroMaxInterval)]
#[case(Duration::from_secs(1), 0.0, Duration::from_secs(1), ConfigError::InvalidMultiplier(0.0))]
#[case(Duration::from_secs(1), -1.5, Duration::from_secs(1), ConfigError::InvalidMultiplier(-1.5))]
fn test_invalid_intervals(
    #[case] start: Duration,
    #[case] multiplier: f64,
    #[case] max: Duration,
    #[case] expected: ConfigError,
) {
    assert_eq!(BackoffIntervals::new(start, multiplier, max), Err(expected));
}

#[test]
fn test_builder_validates() {
    let result = BackoffIntervals::builder()
        .start_interval(Duration::ZERO)
        .build();

    assert_eq!(result, Err(ConfigError::ZeroStartInterval));
}

#[cfg(feature = "env")]
mod env {
    use super::*;
    use shared_backoff::config::{DEFAULT_MAX_INTERVAL, DEFAULT_MULTIPLIER, DEFAULT_START_INTERVAL};

    const VARS: [&str; 3] = [
        "TEST_BACKOFF_START_INTERVAL_MS",
        "TEST_BACKOFF_MULTIPLIER",
        "TEST_BACKOFF_MAX_INTERVAL_MS",
    ];

    #[test]
    fn test_from_env_defaults_when_unset() {
        temp_env::with_vars_unset(VARS, || {
            let intervals = BackoffIntervals::from_env("TEST_BACKOFF").unwrap();

            assert_eq!(intervals.start_interval(), DEFAULT_START_INTERVAL);
            assert_eq!(intervals.multiplier(), DEFAULT_MULTIPLIER);
            assert_eq!(intervals.max_interval(), DEFAULT_MAX_INTERVAL);
        });
    }

    #[test]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                ("TEST_BACKOFF_START_INTERVAL_MS", Some("250")),
                ("TEST_BACKOFF_MULTIPLIER", Some(" 1.5 ")),
                ("TEST_BACKOFF_MAX_INTERVAL_MS", Some("10000")),
            ],
            || {
                let intervals = BackoffIntervals::from_env("TEST_BACKOFF").unwrap();

                assert_eq!(intervals.start_interval(), Duration::from_millis(250));
                assert_eq!(intervals.multiplier(), 1.5);
                assert_eq!(intervals.max_interval(), Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn test_from_env_partial_override() {
        temp_env::with_vars(
            [
                ("TEST_BACKOFF_START_INTERVAL_MS", None),
                ("TEST_BACKOFF_MULTIPLIER", Some("3")),
                ("TEST_BACKOFF_MAX_INTERVAL_MS", None),
            ],
            || {
                let intervals = BackoffIntervals::from_env("TEST_BACKOFF").unwrap();

                assert_eq!(intervals.start_interval(), DEFAULT_START_INTERVAL);
                assert_eq!(intervals.multiplier(), 3.0);
            },
        );
    }

    #[test]
    fn test_from_env_reports_unparseable_value() {
        temp_env::with_vars(
            [
                ("TEST_BACKOFF_START_INTERVAL_MS", Some("soon")),
                ("TEST_BACKOFF_MULTIPLIER", None),
                ("TEST_BACKOFF_MAX_INTERVAL_MS", None),
            ],
            || {
                let err = BackoffIntervals::from_env("TEST_BACKOFF").unwrap_err();

                assert_eq!(
                    err,
                    ConfigError::InvalidEnvVar {
                        var: "TEST_BACKOFF_START_INTERVAL_MS".to_string(),
                        value: "soon".to_string(),
                    }
                );
            },
        );
    }

    #[test]
    fn test_from_env_validates() {
        temp_env::with_vars(
            [
                ("TEST_BACKOFF_START_INTERVAL_MS", None),
                ("TEST_BACKOFF_MULTIPLIER", Some("-2")),
                ("TEST_BACKOFF_MAX_INTERVAL_MS", None),
            ],
            || {
                let err = BackoffIntervals::from_env("TEST_BACKOFF").unwrap_err();
                assert_eq!(err, ConfigError::InvalidMultiplier(-2.0));
            },
        );
    }
}
