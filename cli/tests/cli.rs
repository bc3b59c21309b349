use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn backup() -> Command {
    let mut cmd = Command::cargo_bin("backup").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn sample_source(root: &std::path::Path) -> std::path::PathBuf {
    let src = root.join("src");
    std::fs::create_dir_all(src.join("sub")).unwrap();
    std::fs::write(src.join("a.txt"), "alpha").unwrap();
    std::fs::write(src.join("sub").join("b.txt"), "bravo").unwrap();
    src
}

#[test]
fn check_backup_help() {
    backup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn nested_backup_copies_tree_quietly() {
    let dir = tempdir().unwrap();
    let src = sample_source(dir.path());
    let dst = dir.path().join("dst");

    backup()
        .arg(&src)
        .arg(&dst)
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());

    assert_eq!(std::fs::read_to_string(dst.join("a.txt")).unwrap(), "alpha");
    assert_eq!(
        std::fs::read_to_string(dst.join("sub").join("b.txt")).unwrap(),
        "bravo"
    );
}

#[test]
fn flat_backup_puts_everything_in_root() {
    let dir = tempdir().unwrap();
    let src = sample_source(dir.path());
    let dst = dir.path().join("dst");

    backup().arg(&src).arg(&dst).arg("--flat").assert().code(0);

    assert!(dst.join("a.txt").is_file());
    assert!(dst.join("b.txt").is_file());
    assert!(!dst.join("sub").exists());
}

#[test]
fn verbose_reports_copies_and_renames() {
    let dir = tempdir().unwrap();
    let src = sample_source(dir.path());
    let dst = dir.path().join("dst");
    std::fs::create_dir_all(&dst).unwrap();
    std::fs::write(dst.join("a.txt"), "older").unwrap();

    backup()
        .arg(&src)
        .arg(&dst)
        .arg("--verbose")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Destination ready:"))
        .stdout(predicate::str::contains("[RENAMED]"))
        .stdout(predicate::str::contains("[COPIED]"))
        .stdout(predicate::str::contains(
            "Summary: 2 files, 1 copied, 1 renamed, 0 failed",
        ))
        .stdout(predicate::str::contains("Backup completed."));

    assert_eq!(std::fs::read_to_string(dst.join("a.txt")).unwrap(), "older");
    let copies = std::fs::read_dir(&dst)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.starts_with("a_") && name.ends_with(".txt")
        })
        .count();
    assert_eq!(copies, 1);
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = tempdir().unwrap();
    let src = sample_source(dir.path());
    let dst = dir.path().join("dst");

    backup()
        .arg(&src)
        .arg(&dst)
        .arg("--dry-run")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[DRY] COPY:"))
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("b.txt"));

    assert!(!dst.exists());
}

#[test]
fn missing_source_exits_with_one() {
    let dir = tempdir().unwrap();
    let dst = dir.path().join("dst");

    backup()
        .arg(dir.path().join("nope"))
        .arg(&dst)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "[ERROR] Source directory does not exist",
        ));

    assert!(!dst.exists());
}

#[test]
fn file_as_source_exits_with_one() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    std::fs::write(&file, "x").unwrap();

    backup()
        .arg(&file)
        .arg(dir.path().join("dst"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[ERROR] Source is not a directory"));
}

#[cfg(unix)]
#[test]
fn per_file_failure_still_exits_zero() {
    let dir = tempdir().unwrap();
    let src = sample_source(dir.path());
    std::os::unix::fs::symlink(src.join("missing.txt"), src.join("broken.txt")).unwrap();
    let dst = dir.path().join("dst");

    backup()
        .arg(&src)
        .arg(&dst)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("[ERROR] Failed to copy"))
        .stderr(predicate::str::contains("broken.txt"));

    assert!(dst.join("a.txt").exists());
    assert!(dst.join("sub").join("b.txt").exists());
}

#[test]
fn json_summary_is_parseable() {
    let dir = tempdir().unwrap();
    let src = sample_source(dir.path());
    let dst = dir.path().join("dst");

    let output = backup()
        .arg(&src)
        .arg(&dst)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let summary: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(summary["files_copied"], 2);
    assert_eq!(summary["files_failed"], 0);
    assert_eq!(summary["dry_run"], false);
}

#[test]
fn dry_run_flat_duplicates_report_a_rename() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(src.join("one")).unwrap();
    std::fs::create_dir_all(src.join("two")).unwrap();
    std::fs::write(src.join("one").join("notes.txt"), "first").unwrap();
    std::fs::write(src.join("two").join("notes.txt"), "second").unwrap();
    let dst = dir.path().join("dst");

    backup()
        .arg(&src)
        .arg(&dst)
        .arg("--flat")
        .arg("--dry-run")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[DRY] COPY:").count(1))
        .stdout(predicate::str::contains("[DRY] RENAME:").count(1));

    assert!(!dst.exists());
}

#[test]
fn verbose_dry_run_announces_existing_destination_root() {
    let dir = tempdir().unwrap();
    let src = sample_source(dir.path());
    let dst = dir.path().join("dst");
    std::fs::create_dir_all(dst.join("sub")).unwrap();

    let root_line = format!("[DRY] Ensure directory exists: {}\n", dst.display());
    let sub_line = format!(
        "[DRY] Ensure directory exists: {}\n",
        dst.join("sub").display()
    );

    backup()
        .arg(&src)
        .arg(&dst)
        .arg("--dry-run")
        .arg("--verbose")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(root_line))
        .stdout(predicate::str::contains(sub_line));
}

/// Spawns a dry run whose output is larger than any pipe buffer, so the
/// child blocks on stdout until the test reads from it.
#[cfg(unix)]
fn spawn_blocked_dry_run(dir: &std::path::Path) -> (std::process::Child, String) {
    use std::io::{BufRead, BufReader};
    use std::process::Stdio;

    let src = dir.join("src");
    std::fs::create_dir_all(&src).unwrap();
    let padding = "x".repeat(120);
    for i in 0..4000 {
        std::fs::write(src.join(format!("{:05}-{}.txt", i, padding)), "").unwrap();
    }

    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_backup"))
        .arg(&src)
        .arg(dir.join("dst"))
        .arg("--dry-run")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut first = String::new();
    let stdout = child.stdout.as_mut().unwrap();
    BufReader::new(stdout).read_line(&mut first).unwrap();
    (child, first)
}

#[cfg(unix)]
fn send_sigint(child: &std::process::Child) {
    let status = std::process::Command::new("kill")
        .arg("-INT")
        .arg(child.id().to_string())
        .status()
        .unwrap();
    assert!(status.success());
}

#[cfg(unix)]
#[test]
fn sigint_stops_run_with_130() {
    use std::io::Read;

    let dir = tempdir().unwrap();
    let (mut child, first) = spawn_blocked_dry_run(dir.path());
    assert!(first.starts_with("[DRY] COPY:"));

    send_sigint(&child);

    let mut rest = String::new();
    child.stdout.take().unwrap().read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(130));
    assert!(rest.contains("[INFO] Backup interrupted by user."));
    assert!(!rest.contains("03999-"));
    assert!(!dir.path().join("dst").exists());
}

#[cfg(unix)]
#[test]
fn second_sigint_exits_immediately() {
    let dir = tempdir().unwrap();
    let (mut child, _first) = spawn_blocked_dry_run(dir.path());

    // Stdout is never drained, so only the second signal can end the process.
    send_sigint(&child);
    std::thread::sleep(std::time::Duration::from_millis(200));
    send_sigint(&child);

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(130));
}
