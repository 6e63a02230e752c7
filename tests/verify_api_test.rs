//! Integration tests for the verification API and the report on disk.

use devrig::config::parse_manifest;
use devrig::shell::CancelToken;
use devrig::ui::MockUI;
use devrig::verify::{CheckStatus, ReportStore, Verifier, VerifyOptions};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const SCENARIO: &str = r#"
checks:
  - { name: a, description: a prints hi, probe: echo hi }
  - { name: b, description: b is false, probe: "false" }
  - { name: c, description: c is not installed, probe: missing-cmd-xyz }
"#;

fn report_store(temp: &TempDir) -> ReportStore {
    ReportStore::new(temp.path().join(".devrig/report.json"))
}

#[test]
fn scenario_pass_fail_fail() {
    let temp = TempDir::new().unwrap();
    let manifest = parse_manifest(SCENARIO).unwrap();

    let outcome = Verifier::new(&manifest, temp.path(), CancelToken::new())
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();

    assert_eq!(outcome.summary.headline(), "PASSED: 1/3");
    let failed: Vec<_> = outcome
        .summary
        .failures
        .iter()
        .map(|f| f.description.as_str())
        .collect();
    assert_eq!(failed, vec!["b is false", "c is not installed"]);

    let report = report_store(&temp).load().unwrap();
    assert_eq!(report.get("a").unwrap().status, CheckStatus::Pass);
    assert_eq!(report.get("b").unwrap().status, CheckStatus::Fail);
    assert_eq!(report.get("c").unwrap().status, CheckStatus::Fail);
    assert_eq!(report.get("a").unwrap().log, "hi\n");
}

#[test]
fn report_has_one_complete_entry_per_check() {
    let temp = TempDir::new().unwrap();
    let manifest = parse_manifest(SCENARIO).unwrap();

    Verifier::new(&manifest, temp.path(), CancelToken::new())
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();

    let report = report_store(&temp).load().unwrap();
    assert_eq!(report.len(), 3);
    for (_, entry) in report.iter() {
        assert!(!entry.description.is_empty());
        assert!(entry.log_file.ends_with(".log"));
        assert!(std::path::Path::new(&entry.log_file).exists());
    }
}

#[test]
fn later_runs_overwrite_only_their_checks() {
    let temp = TempDir::new().unwrap();
    let first = parse_manifest(SCENARIO).unwrap();
    Verifier::new(&first, temp.path(), CancelToken::new())
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();

    // b now passes
    let second = parse_manifest(
        r#"
checks:
  - { name: b, description: b is fixed, probe: "true" }
"#,
    )
    .unwrap();
    Verifier::new(&second, temp.path(), CancelToken::new())
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();

    let report = report_store(&temp).load().unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report.get("b").unwrap().status, CheckStatus::Pass);
    assert_eq!(report.get("b").unwrap().description, "b is fixed");
    assert_eq!(report.get("c").unwrap().status, CheckStatus::Fail);
}

#[test]
fn rerunning_same_manifest_keeps_n_entries_with_new_values() {
    let temp = TempDir::new().unwrap();
    let manifest = parse_manifest(SCENARIO).unwrap();
    let verifier = Verifier::new(&manifest, temp.path(), CancelToken::new());

    verifier
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();
    let first = report_store(&temp).load().unwrap();

    thread::sleep(Duration::from_millis(20));
    verifier
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();
    let second = report_store(&temp).load().unwrap();

    assert_eq!(second.len(), 3);
    for (name, entry) in second.iter() {
        let before = first.get(name).unwrap();
        assert_eq!(entry.status, before.status);
        assert!(entry.checked_at.unwrap() > before.checked_at.unwrap());
    }
}

#[test]
fn fresh_run_discards_previous_entries() {
    let temp = TempDir::new().unwrap();
    let manifest = parse_manifest(SCENARIO).unwrap();
    let verifier = Verifier::new(&manifest, temp.path(), CancelToken::new());
    verifier
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();

    verifier
        .run(
            &VerifyOptions {
                fresh: true,
                only: vec!["a".to_string()],
                ..Default::default()
            },
            &mut MockUI::new(),
        )
        .unwrap();

    let report = report_store(&temp).load().unwrap();
    assert_eq!(report.len(), 1);
    assert!(report.get("a").is_some());
}

#[test]
fn interrupted_run_keeps_completed_checks() {
    let temp = TempDir::new().unwrap();
    let manifest = parse_manifest(
        r#"
checks:
  - { name: one, description: one, probe: echo 1 }
  - { name: two, description: two, probe: echo 2 }
  - { name: three, description: three, probe: sleep 30 }
  - { name: four, description: four, probe: echo 4 }
  - { name: five, description: five, probe: echo 5 }
"#,
    )
    .unwrap();
    let cancel = CancelToken::new();
    let remote = cancel.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(1));
        remote.cancel();
    });

    let outcome = Verifier::new(&manifest, temp.path(), cancel)
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();
    assert!(outcome.interrupted);

    // The file on disk is valid JSON with exactly the completed checks.
    let report = report_store(&temp).load().unwrap();
    let names: Vec<_> = report.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["one", "two"]);
}

#[test]
fn parallel_run_matches_sequential_results() {
    let temp = TempDir::new().unwrap();
    let manifest = parse_manifest(SCENARIO).unwrap();

    let outcome = Verifier::new(&manifest, temp.path(), CancelToken::new())
        .run(
            &VerifyOptions {
                jobs: Some(3),
                ..Default::default()
            },
            &mut MockUI::new(),
        )
        .unwrap();

    assert_eq!(outcome.summary.headline(), "PASSED: 1/3");
    let failed: Vec<_> = outcome
        .summary
        .failures
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(failed, vec!["b", "c"]);
    assert_eq!(report_store(&temp).load().unwrap().len(), 3);
}

#[test]
fn corrupt_report_is_replaced() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join(".devrig")).unwrap();
    std::fs::write(temp.path().join(".devrig/report.json"), "not json").unwrap();
    let manifest = parse_manifest(SCENARIO).unwrap();

    Verifier::new(&manifest, temp.path(), CancelToken::new())
        .run(&VerifyOptions::default(), &mut MockUI::new())
        .unwrap();

    assert_eq!(report_store(&temp).load().unwrap().len(), 3);
}
