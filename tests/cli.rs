use std::path::Path;
use std::process::{Command, Output};

const WORKED_EXAMPLE: &str = "Line Number,Modification Count\nL1,5\nL1,9\nL2,2\nL2,2\nL3,100\n";

fn churnlens(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_churnlens"))
        .args(args)
        .current_dir(dir)
        .env_remove("CHURNLENS_LOG")
        .output()
        .unwrap()
}

fn skewed_log() -> String {
    let mut log = String::new();
    for i in 0..20 {
        log.push_str(&format!("f{i}.rs\n\n"));
    }
    for _ in 0..60 {
        log.push_str("hot.rs\n\n");
    }
    log
}

#[test]
fn no_subcommand_prints_welcome() {
    let dir = tempfile::tempdir().unwrap();
    let output = churnlens(dir.path(), &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Quick start"));
}

#[test]
fn lines_writes_header_only_table_when_nothing_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.csv"), WORKED_EXAMPLE).unwrap();

    let output = churnlens(dir.path(), &["lines", "input.csv"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = std::fs::read_to_string(dir.path().join("outlier_lines.csv")).unwrap();
    assert_eq!(written, "Line Number,Modification Count\n");
    assert!(String::from_utf8_lossy(&output.stdout).contains("No outliers detected"));
}

#[test]
fn lines_threshold_flag_overrides_default() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.csv"), WORKED_EXAMPLE).unwrap();

    let output = churnlens(
        dir.path(),
        &["lines", "input.csv", "--threshold", "1", "--output", "out/flagged.csv"],
    );
    assert!(output.status.success());

    let written = std::fs::read_to_string(dir.path().join("out/flagged.csv")).unwrap();
    assert_eq!(written, "Line Number,Modification Count\nL3,100\n");
}

#[test]
fn lines_reads_threshold_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.csv"), WORKED_EXAMPLE).unwrap();
    std::fs::write(dir.path().join(".churnlens.toml"), "[lines]\nthreshold = 1.0\n").unwrap();

    let output = churnlens(dir.path(), &["lines", "input.csv"]);
    assert!(output.status.success());

    let written = std::fs::read_to_string(dir.path().join("outlier_lines.csv")).unwrap();
    assert!(written.ends_with("L3,100\n"));
}

#[test]
fn lines_writes_artifacts_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.csv"), WORKED_EXAMPLE).unwrap();

    let output = churnlens(dir.path(), &["lines", "input.csv", "--artifacts", "work"]);
    assert!(output.status.success());

    let unique = std::fs::read_to_string(dir.path().join("work/unique_rows.csv")).unwrap();
    assert_eq!(unique.lines().count(), 5);
    let highest = std::fs::read_to_string(dir.path().join("work/highest_counts.csv")).unwrap();
    assert_eq!(
        highest,
        "Line Number,Modification Count\nL1,9\nL2,2\nL3,100\n"
    );
}

#[test]
fn lines_bad_count_fails_in_extraction() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("input.csv"),
        "Line Number,Modification Count\nL1,five\n",
    )
    .unwrap();

    let output = churnlens(dir.path(), &["lines", "input.csv"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("extraction failed"), "stderr: {stderr}");
    assert!(!dir.path().join("outlier_lines.csv").exists());
}

#[test]
fn lines_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = churnlens(dir.path(), &["lines", "nope.csv"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("outlier_lines.csv").exists());
}

#[test]
fn lines_json_output_is_parseable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("input.csv"), WORKED_EXAMPLE).unwrap();

    let output = churnlens(dir.path(), &["lines", "input.csv", "--format", "json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["rowsRead"], 5);
    assert_eq!(json["uniqueRows"], 4);
    assert_eq!(json["lines"], 3);
    assert!(json["report"]["outliers"].as_array().unwrap().is_empty());
}

#[test]
fn files_reads_captured_log() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("git.log"), skewed_log()).unwrap();

    let output = churnlens(dir.path(), &["files", "--log-file", "git.log"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = std::fs::read_to_string(dir.path().join("file_outliers.csv")).unwrap();
    assert_eq!(written, "File,Total Changes\nhot.rs,60\n");
}

#[test]
fn files_markdown_lists_flagged_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("git.log"), skewed_log()).unwrap();

    let output = churnlens(
        dir.path(),
        &["files", "--log-file", "git.log", "--format", "markdown"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# File Change Outliers"));
    assert!(stdout.contains("| `hot.rs` | 60 |"));
}

#[test]
fn files_empty_log_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("git.log"), "\n\n").unwrap();

    let output = churnlens(dir.path(), &["files", "--log-file", "git.log"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("file_outliers.csv").exists());
}
