//! Integration test: CSV on disk → reduce → detect → CSV artifacts.

use churnlens_core::{ChurnConfig, Stage};
use churnlens_lines::pipeline::{
    run_line_outliers, LineOutlierOptions, HIGHEST_COUNTS_FILE, UNIQUE_ROWS_FILE,
};

#[test]
fn worked_example_writes_artifacts_and_no_outliers() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("line_modifications.csv");
    std::fs::write(
        &input,
        "Line Number,Modification Count\nL1,5\nL1,9\nL2,2\nL2,2\nL3,100\n",
    )
    .unwrap();

    let config = ChurnConfig::default();
    let mut options = LineOutlierOptions::from(&config.lines);
    options.output = dir.path().join("outlier_lines.csv");
    options.artifacts_dir = Some(dir.path().join("artifacts"));

    let run = run_line_outliers(&input, &options).unwrap();
    assert_eq!(run.rows_read, 5);
    assert_eq!(run.unique_rows, 4);
    assert_eq!(run.lines, 3);
    assert!(run.report.is_empty(), "three lines cannot reach |z| > 3");
    assert_eq!(run.artifacts.len(), 2);

    let unique = std::fs::read_to_string(dir.path().join("artifacts").join(UNIQUE_ROWS_FILE)).unwrap();
    assert_eq!(
        unique,
        "Line Number,Modification Count\nL1,5\nL1,9\nL2,2\nL3,100\n"
    );

    let highest =
        std::fs::read_to_string(dir.path().join("artifacts").join(HIGHEST_COUNTS_FILE)).unwrap();
    assert_eq!(highest, "Line Number,Modification Count\nL1,9\nL2,2\nL3,100\n");

    let outliers = std::fs::read_to_string(&options.output).unwrap();
    assert_eq!(outliers, "Line Number,Modification Count\n");
}

#[test]
fn spike_line_is_written_to_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");

    let mut csv = String::from("Line Number,Modification Count,Commit\n");
    for line in 1..=20 {
        csv.push_str(&format!("{line},1,c{line}\n"));
        // Older, lower counts for the same line are superseded.
        csv.push_str(&format!("{line},0,c0\n"));
    }
    csv.push_str("99,40,c40\n");
    csv.push_str("99,100,c41\n");
    std::fs::write(&input, csv).unwrap();

    let mut options = LineOutlierOptions::from(&ChurnConfig::default().lines);
    options.output = dir.path().join("out").join("outliers.csv");

    let run = run_line_outliers(&input, &options).unwrap();
    assert_eq!(run.lines, 21);
    assert_eq!(run.report.len(), 1);
    assert_eq!(run.report.outliers[0].key, "99");
    assert_eq!(run.report.outliers[0].count, 100);

    let written = std::fs::read_to_string(&options.output).unwrap();
    assert_eq!(written, "Line Number,Modification Count\n99,100\n");
}

#[test]
fn runs_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    let mut csv = String::from("Line Number,Modification Count\n");
    for i in 0..40u64 {
        csv.push_str(&format!("L{},{}\n", i % 13, (i * 7) % 11));
    }
    csv.push_str("L99,250\n");
    std::fs::write(&input, csv).unwrap();

    let mut options = LineOutlierOptions::from(&ChurnConfig::default().lines);
    options.output = dir.path().join("a.csv");
    let first = run_line_outliers(&input, &options).unwrap();
    options.output = dir.path().join("b.csv");
    let second = run_line_outliers(&input, &options).unwrap();

    assert_eq!(first.report, second.report);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a.csv")).unwrap(),
        std::fs::read_to_string(dir.path().join("b.csv")).unwrap(),
    );
}

#[test]
fn malformed_count_stops_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    std::fs::write(&input, "Line Number,Modification Count\nL1,5\nL2,n/a\n").unwrap();

    let mut options = LineOutlierOptions::from(&ChurnConfig::default().lines);
    options.output = dir.path().join("outliers.csv");

    let err = run_line_outliers(&input, &options).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Extraction));
    assert!(err.to_string().contains("row 2"));
    assert!(!options.output.exists());
}
