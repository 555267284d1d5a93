//! Integration tests for the `sweep` command.
use std::path::PathBuf;
use steelplan::cli::{RunOpts, handle_sweep_command};
use steelplan::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `sweep` command.
///
/// No supplier's scrap is more than 5% copper, so the loosest limit is always feasible; with no
/// copper allowed at all, only supplier A can be used and 18/10 can't be made.
#[test]
fn test_handle_sweep_command() {
    unsafe { std::env::set_var("STEELPLAN_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        ..RunOpts::default()
    };
    handle_sweep_command(
        &PathBuf::from("demos/single_month"),
        &[0.05, 0.0],
        &opts,
        Some(Settings::default()),
    )
    .unwrap();

    let sweep = std::fs::read_to_string(tempdir.path().join("sweep.csv")).unwrap();
    let lines: Vec<_> = sweep.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "copper_limit,status,objective");
    assert!(lines[1].starts_with("0.05,OPTIMAL,"));
    assert_eq!(lines[2], "0.0,INFEASIBLE,");
}
