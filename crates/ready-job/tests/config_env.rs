//! Environment variable configuration.
//!
//! This test mutates the process environment, so it lives in its own test
//! binary away from the tests that parse defaults.

#![allow(unsafe_code)]

use std::time::Duration;

use clap::Parser;
use ready_job::JobConfig;

const VARS: &[&str] = &[
    "MAX_CLUSTER_AGE_MINUTES",
    "CLEAN_CHECK_RUNS",
    "CLEAN_CHECK_INTERVAL_SECONDS",
    "FAILED_CHECK_INTERVAL_SECONDS",
    "SILENCE_CREATED_BY",
];

fn clear() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
fn test_environment_overrides() {
    clear();

    unsafe {
        std::env::set_var("MAX_CLUSTER_AGE_MINUTES", "90");
        std::env::set_var("CLEAN_CHECK_RUNS", "5");
        std::env::set_var("CLEAN_CHECK_INTERVAL_SECONDS", "15");
        std::env::set_var("FAILED_CHECK_INTERVAL_SECONDS", "45");
        std::env::set_var("SILENCE_CREATED_BY", "Staging Readiness Job");
    }
    let config = JobConfig::try_parse_from(["cluster-ready"]).expect("env values are valid");
    assert_eq!(config.max_cluster_age(), Duration::from_secs(90 * 60));
    assert_eq!(config.clean_check_runs, 5);
    assert_eq!(config.clean_check_interval(), Duration::from_secs(15));
    assert_eq!(config.failed_check_interval(), Duration::from_secs(45));
    assert_eq!(config.silence_created_by, "Staging Readiness Job");

    // flags win over the environment
    let config = JobConfig::try_parse_from(["cluster-ready", "--clean-check-runs", "7"])
        .expect("flag value is valid");
    assert_eq!(config.clean_check_runs, 7);

    unsafe { std::env::set_var("CLEAN_CHECK_RUNS", "twenty") };
    assert!(
        JobConfig::try_parse_from(["cluster-ready"]).is_err(),
        "non-integer env value should be rejected"
    );

    clear();
}
