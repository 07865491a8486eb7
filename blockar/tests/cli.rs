use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn blockar() -> Command {
    Command::cargo_bin("blockar").unwrap()
}

fn create_in(dir: &std::path::Path, files: &[&str]) -> Vec<u8> {
    let output = blockar()
        .current_dir(dir)
        .arg("create")
        .args(files)
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);
    output.stdout
}

#[test]
fn create_then_extract() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.txt"), b"hello\n").unwrap();
    fs::create_dir(src.path().join("sub")).unwrap();
    fs::write(src.path().join("sub/b.bin"), vec![9u8; 1500]).unwrap();

    let archive = create_in(src.path(), &["a.txt", "sub/b.bin"]);
    assert_eq!(&archive[..8], b"ustar\x0007");
    assert_eq!((archive.len() - 8) % 512, 0);

    let dest = tempfile::tempdir().unwrap();
    blockar()
        .arg("x")
        .arg("-C")
        .arg(dest.path())
        .write_stdin(archive)
        .assert()
        .success();

    assert_eq!(fs::read(dest.path().join("a.txt")).unwrap(), b"hello\n");
    assert_eq!(
        fs::read(dest.path().join("sub/b.bin")).unwrap(),
        vec![9u8; 1500]
    );
}

#[test]
fn extract_defaults_to_current_directory() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("here.txt"), b"x").unwrap();
    let archive = create_in(src.path(), &["here.txt"]);

    let dest = tempfile::tempdir().unwrap();
    blockar()
        .current_dir(dest.path())
        .arg("extract")
        .write_stdin(archive)
        .assert()
        .success();
    assert_eq!(fs::read(dest.path().join("here.txt")).unwrap(), b"x");
}

#[test]
fn empty_file_archive_size() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("empty"), b"").unwrap();
    let archive = create_in(src.path(), &["empty"]);
    assert_eq!(archive.len(), 8 + 512 + 1024);
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    blockar()
        .current_dir(dir.path())
        .args(["create", "does-not-exist"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does-not-exist"));
}

#[test]
fn truncated_archive_fails() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("big"), vec![1u8; 2000]).unwrap();
    let mut archive = create_in(src.path(), &["big"]);
    archive.truncate(8 + 512 + 700);

    let dest = tempfile::tempdir().unwrap();
    blockar()
        .args(["extract", "-C"])
        .arg(dest.path())
        .write_stdin(archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("incomplete archive"));

    // Whatever arrived before the cut is kept.
    assert_eq!(fs::read(dest.path().join("big")).unwrap().len(), 700);
}

#[test]
fn garbage_input_fails() {
    let dest = tempfile::tempdir().unwrap();
    blockar()
        .args(["extract", "-C"])
        .arg(dest.path())
        .write_stdin("definitely not an archive")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not an archive"));
}

#[test]
fn usage_errors_exit_with_one() {
    blockar().assert().code(1);
    blockar().arg("frobnicate").assert().code(1);
    blockar().arg("create").assert().code(1);
}

#[test]
fn help_succeeds() {
    blockar()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"));
}

#[test]
fn list_shows_entries() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("one.txt"), b"1").unwrap();
    fs::write(src.path().join("two.txt"), b"22").unwrap();
    let archive = create_in(src.path(), &["one.txt", "two.txt"]);

    blockar()
        .arg("ls")
        .write_stdin(archive.clone())
        .assert()
        .success()
        .stdout(predicate::str::contains("one.txt").and(predicate::str::contains("two.txt")));

    let output = blockar()
        .args(["list", "--json"])
        .write_stdin(archive)
        .output()
        .unwrap();
    assert!(output.status.success());
    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["name"], "two.txt");
    assert_eq!(lines[1]["size"], 2);
}

#[test]
fn malformed_size_fails() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.txt"), b"abc").unwrap();
    let mut archive = create_in(src.path(), &["a.txt"]);
    archive[8 + 124..8 + 136].copy_from_slice(b"  notanumber");

    let dest = tempfile::tempdir().unwrap();
    blockar()
        .args(["extract", "-C"])
        .arg(dest.path())
        .write_stdin(archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a decimal number"));
    assert!(!dest.path().join("a.txt").exists());
}

#[test]
fn create_accepts_parent_segments() {
    let src = tempfile::tempdir().unwrap();
    fs::create_dir(src.path().join("work")).unwrap();
    fs::write(src.path().join("up.txt"), b"up").unwrap();
    let archive = create_in(&src.path().join("work"), &["../up.txt"]);

    let dest = tempfile::tempdir().unwrap();
    blockar()
        .args(["extract", "-C"])
        .arg(dest.path())
        .write_stdin(archive)
        .assert()
        .success();
    assert_eq!(fs::read(dest.path().join("up.txt")).unwrap(), b"up");
}
