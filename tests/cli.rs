//! Black-box tests against the compiled binary (SPEC_FULL §10.6). The CLI
//! requires a real controlling terminal (spec §6), which `assert_cmd`
//! cannot fabricate, so these cover the two slices of behavior that are
//! observable without a pty: the version flag and the non-tty rejection.
//! Genuinely interactive job-control scenarios are covered by the unit
//! tests in `job_table`, `reaper`, and `executor` instead.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn version_flag_prints_version_and_exits_success() {
    Command::cargo_bin("jcsh")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("jcsh version"));
}

#[test]
fn rejects_non_interactive_stdin() {
    Command::cargo_bin("jcsh")
        .unwrap()
        .write_stdin("echo hi\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a terminal"));
}
