// End-to-end checks of the loxtest binary against the fake interpreter in
// tests/fixtures. Requires: assert_cmd, predicates crates in [dev-dependencies]
#![cfg(unix)]

use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

mod common;
use common::{corpus, fake_interpreter};

fn loxtest() -> Command {
    Command::cargo_bin("loxtest").unwrap()
}

#[test]
fn missing_binary_argument_prints_usage_to_stdout() {
    loxtest()
        .assert()
        .code(2)
        .stdout(contains("Usage"))
        .stdout(contains("OK").not());
}

#[test]
fn extra_arguments_are_a_usage_error() {
    let dir = corpus(&[("a.lox", "print 1\n// out: 1\n")]);
    loxtest()
        .arg("--root")
        .arg(dir.path())
        .arg("build/lox")
        .arg("surplus")
        .assert()
        .code(2)
        .stdout(contains("Usage"))
        .stdout(contains("a.lox").not());
}

#[test]
fn passing_corpus_exits_zero() {
    let dir = corpus(&[
        ("a.lox", "print 2 // out: 2\n"),
        ("nested/b.lox", "error Undefined variable.\n// err: Undefined variable.\n"),
        ("nested/c.lox", "var a = 1;\n"),
        ("notes.txt", "// out: ignored\n"),
    ]);
    loxtest()
        .arg("--root")
        .arg(dir.path())
        .arg(fake_interpreter())
        .assert()
        .success()
        .stdout(contains("a.lox: OK\n"))
        .stdout(contains("b.lox: OK\n"))
        .stdout(contains("c.lox: OK\n"))
        .stdout(contains("notes.txt").not())
        .stdout(contains("Test summary: total 3, passed 3, failed 0\n"));
}

#[test]
fn output_on_wrong_stream_shows_both_sections() {
    let dir = corpus(&[(
        "b.lox",
        "print Undefined variable.\n// err: Undefined variable.\n",
    )]);
    loxtest()
        .arg("--root")
        .arg(dir.path())
        .arg(fake_interpreter())
        .assert()
        .code(1)
        .stdout(contains(
            "b.lox: MISMATCH\n\
             standard output:\n\
             Undefined variable.\n\
             expected:\n\
             standard error:\n\
             expected:\n\
             Undefined variable.\n",
        ))
        .stdout(contains("Failed tests:"));
}

#[test]
fn missing_interpreter_fails_every_case_but_reports_all() {
    let dir = corpus(&[("a.lox", "// out: 1\n"), ("b.lox", "")]);
    loxtest()
        .arg("--root")
        .arg(dir.path())
        .arg(dir.path().join("no-such-lox"))
        .assert()
        .code(1)
        .stdout(contains("a.lox: FAILED-TO-START"))
        .stdout(contains("b.lox: FAILED-TO-START"))
        .stdout(contains("total 2, passed 0, failed 2"));
}

#[test]
fn hanging_script_times_out_and_run_continues() {
    // `hang` forks a sleep, so the interpreter leaves a grandchild behind.
    let dir = corpus(&[("a_hang.lox", "hang\n"), ("b_ok.lox", "print 1 // out: 1\n")]);
    let started = Instant::now();
    loxtest()
        .arg("--root")
        .arg(dir.path())
        .arg("--timeout")
        .arg("0.5")
        .arg(fake_interpreter())
        .assert()
        .code(1)
        .stdout(contains("a_hang.lox: TIMEOUT"))
        .stdout(contains("b_ok.lox: OK"))
        .stdout(contains("passed 1, failed 1"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn missing_root_is_fatal() {
    let dir = corpus(&[]);
    loxtest()
        .arg("--root")
        .arg(dir.path().join("test"))
        .arg(fake_interpreter())
        .assert()
        .code(1)
        .stdout(contains("Test summary").not())
        .stderr(contains("missing_root"));
}

#[test]
fn malformed_annotations_are_warned_about() {
    let dir = corpus(&[("a.lox", "print 1\n//out: 1\n")]);
    loxtest()
        .arg("--root")
        .arg(dir.path())
        .arg(fake_interpreter())
        .assert()
        .code(1)
        .stdout(contains("a.lox: MISMATCH"))
        .stdout(contains("warning: line 2: malformed annotation `//out: 1`"));
}

#[test]
fn color_is_opt_in_when_piped() {
    let dir = corpus(&[("a.lox", "print 1 // out: 1\n")]);
    loxtest()
        .arg("--root")
        .arg(dir.path())
        .arg(fake_interpreter())
        .assert()
        .success()
        .stdout(contains("\x1b[").not());

    loxtest()
        .arg("--root")
        .arg(dir.path())
        .arg("--color")
        .arg("always")
        .arg(fake_interpreter())
        .assert()
        .success()
        .stdout(contains("\x1b["));
}
