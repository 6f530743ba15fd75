//! End-to-end coverage of the CLI's documented usage scenarios, driven
//! through the `sysir` binary as an external process.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn asm_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn adds_two_s32_parameters() {
    let file = asm_file(
        r#"(asm :link-name "add" :parameter-count 2 :instructions (
            (prim 0 s32) (bind 0 0) (bind 1 0) (bind 2 0) (add 2 0 1) (return 2)))"#,
    );
    Command::cargo_bin("sysir")
        .unwrap()
        .arg("build")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("_t0 add(_t0 _r0, _t0 _r1) {"))
        .stdout(predicate::str::contains("_r2 = _r0 + _r1;"));
}

#[test]
fn type_mismatch_fails_with_a_diagnostic() {
    let file = asm_file(
        r#"(asm :parameter-count 2 :instructions (
            (prim 0 s32) (prim 1 f32) (bind 0 0) (bind 1 1) (bind 2 0) (add 2 0 1) (return 2)))"#,
    );
    Command::cargo_bin("sysir")
        .unwrap()
        .arg("check")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("type failure"));
}

#[test]
fn missing_terminator_fails() {
    let file = asm_file(
        r#"(asm :parameter-count 2 :instructions (
            (prim 0 s32) (bind 0 0) (bind 1 0) (bind 2 0) (add 2 0 1)))"#,
    );
    Command::cargo_bin("sysir")
        .unwrap()
        .arg("check")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("jump or return"));
}

#[test]
fn named_call_promotes_to_callk_and_lowers_directly() {
    let file = asm_file(r#"(asm :instructions ((call 0 printf 1) (return 0)))"#);
    Command::cargo_bin("sysir")
        .unwrap()
        .arg("build")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("_r0 = printf(_r1);"));
}

#[test]
fn struct_field_access_lowers_to_member_access() {
    let file = asm_file(
        r#"(asm :instructions (
            (prim 0 s32) (struct 1 0 0 0) (bind 0 1) (fget 1 0 2) (return 1)))"#,
    );
    Command::cargo_bin("sysir")
        .unwrap()
        .arg("build")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("_r1 = _r0._f2;"));
}

#[test]
fn boolean_branch_lowers_to_a_goto() {
    let file = asm_file(
        r#"(asm :instructions (
            (prim 0 boolean) (prim 1 s32) (bind 0 0) (bind 1 1)
            (branch 0 4) (return 1) (return 1)))"#,
    );
    Command::cargo_bin("sysir")
        .unwrap()
        .arg("build")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("if (_r0) goto _i4;"));
}
