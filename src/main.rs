use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use churnlens_core::{ChurnConfig, OutputFormat, Stage};
use churnlens_gitpulse::mining::{GitHistory, HistorySource, MiningOptions, NameOnlyLog};
use churnlens_gitpulse::pipeline::{run_file_outliers, FileOutlierOptions, FileOutlierRun};
use churnlens_lines::extract::ColumnNames;
use churnlens_lines::pipeline::{run_line_outliers, LineOutlierOptions, LineOutlierRun};
use churnlens_outliers::OutlierReport;

const CONFIG_FILE: &str = ".churnlens.toml";

#[derive(Parser)]
#[command(
    name = "churnlens",
    version,
    about = "Find outliers in line modification counts and git file churn",
    long_about = "Find statistical outliers in change data.\n\n\
                   Two pipelines share one detector:\n  \
                     lines  CSV of per-line modification counts, z-score outliers\n  \
                     files  git history change counts, median deviation outliers\n\n\
                   Examples:\n  \
                     churnlens lines line_modifications.csv     Flag heavily modified lines\n  \
                     churnlens files --path .                   Flag files changed far more than usual\n  \
                     git log --name-only --pretty=format: | churnlens files --log-file -\n  \
                     churnlens init                             Write a default .churnlens.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .churnlens.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Format of the summary printed to stdout.\n\n\
                       Formats:\n  \
                         text      Human-readable table (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown\n\n\
                       The CSV output file is written regardless of this setting."
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Flag lines whose modification count is a z-score outlier
    #[command(long_about = "Flag lines whose modification count is a z-score outlier.\n\n\
        Reads a CSV with a line identifier column and a modification count column,\n\
        drops exact duplicate rows, keeps the highest count per line, and flags lines\n\
        whose |z-score| (population standard deviation) exceeds the threshold.\n\n\
        Examples:\n  churnlens lines input.csv\n  churnlens lines input.csv --threshold 2.5 --artifacts out/")]
    Lines {
        /// CSV table of line modification counts
        input: PathBuf,

        /// Where to write the outlier table (default: outlier_lines.csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Z-score magnitude above which a line is flagged (default: 3)
        #[arg(long)]
        threshold: Option<f64>,

        /// Header of the line identifier column (default: "Line Number")
        #[arg(long)]
        key_column: Option<String>,

        /// Header of the modification count column (default: "Modification Count")
        #[arg(long)]
        count_column: Option<String>,

        /// Also write unique_rows.csv and highest_counts.csv to this directory
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
    /// Flag files changed far more (or less) often than the median file
    #[command(long_about = "Flag files changed far more (or less) often than the median file.\n\n\
        Counts how many commits touched each file and flags files whose count differs\n\
        from the median by more than threshold x population standard deviation.\n\
        History comes from the repository at --path, or from captured\n\
        `git log --name-only --pretty=format:` output via --log-file.\n\n\
        Examples:\n  churnlens files --path .\n  churnlens files --since 365 --threshold 2\n  git log --name-only --pretty=format: > git.log && churnlens files --log-file git.log")]
    Files {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Read captured `git log --name-only --pretty=format:` output instead ("-" for stdin)
        #[arg(long, conflicts_with_all = ["since", "branch", "max_files_per_commit"])]
        log_file: Option<PathBuf>,

        /// Where to write the outlier table (default: file_outliers.csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Standard deviations from the median before a file is flagged (default: 3)
        #[arg(long)]
        threshold: Option<f64>,

        /// Only count commits from the last N days
        #[arg(long)]
        since: Option<u64>,

        /// Branch to walk instead of HEAD
        #[arg(long)]
        branch: Option<String>,

        /// Skip commits touching more files than this
        #[arg(long)]
        max_files_per_commit: Option<usize>,
    },
    /// Create a default .churnlens.toml configuration file
    #[command(long_about = "Create a default .churnlens.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .churnlens.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("churnlens v{version}: outliers in line modifications and git churn\n");

    println!("Quick start:");
    println!("  churnlens init                 Create a .churnlens.toml config file");
    println!("  churnlens lines input.csv      Flag heavily modified lines");
    println!("  churnlens files --path .       Flag files with unusual change counts\n");

    println!("Run 'churnlens <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("CHURNLENS_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ChurnConfig> {
    let config = match path {
        Some(path) => ChurnConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                ChurnConfig::from_file(default_path)?
            } else {
                ChurnConfig::default()
            }
        }
    };
    Ok(config)
}

fn print_line_run(run: &LineOutlierRun, columns: &ColumnNames, format: OutputFormat) -> Result<()> {
    let report = &run.report;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(run).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("# Line Modification Outliers\n");
            println!("- **Rows read:** {}", run.rows_read);
            println!("- **Unique rows:** {}", run.unique_rows);
            println!("- **Lines:** {}", run.lines);
            println!(
                "- **Mean:** {:.2}, **σ:** {:.2}, **threshold:** |z| > {}\n",
                report.summary.center, report.summary.spread, report.threshold
            );
            print_markdown_outliers(report, &columns.key, &columns.count, "z-score");
        }
        OutputFormat::Text => {
            println!(
                "Line outliers (|z| > {}, mean={:.2}, sigma={:.2}):",
                report.threshold, report.summary.center, report.summary.spread
            );
            print_text_outliers(report, "z");
        }
    }
    Ok(())
}

fn print_file_run(run: &FileOutlierRun, format: OutputFormat) -> Result<()> {
    let report = &run.report;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(run).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("# File Change Outliers\n");
            println!("- **File changes read:** {}", run.entries);
            println!("- **Files:** {}", run.files);
            println!(
                "- **Median:** {:.2}, **σ:** {:.2}, **threshold:** {} σ\n",
                report.summary.center, report.summary.spread, report.threshold
            );
            print_markdown_outliers(report, "File", "Total Changes", "Deviation (σ)");
        }
        OutputFormat::Text => {
            println!(
                "File change outliers (> {} sigma from median={:.2}, sigma={:.2}):",
                report.threshold, report.summary.center, report.summary.spread
            );
            print_text_outliers(report, "dev");
        }
    }
    Ok(())
}

fn print_text_outliers(report: &OutlierReport, score_label: &str) {
    println!("{:-<72}", "");
    if report.is_empty() {
        println!("  No outliers detected.");
    } else {
        for (i, o) in report.outliers.iter().enumerate() {
            println!(
                "{:>2}. {:<48} count={:<6} {score_label}={:+.2}",
                i + 1,
                o.key,
                o.count,
                o.score,
            );
        }
    }
    println!();
}

fn print_markdown_outliers(report: &OutlierReport, key: &str, count: &str, score: &str) {
    if report.is_empty() {
        println!("No outliers detected.");
        return;
    }
    println!("| {key} | {count} | {score} |");
    println!("|---|---|---|");
    for o in &report.outliers {
        println!("| `{}` | {} | {:+.2} |", o.key, o.count, o.score);
    }
    println!();
}

const DEFAULT_CONFIG: &str = r#"# churnlens configuration

[lines]
# key_column = "Line Number"
# count_column = "Modification Count"
# threshold = 3.0
# output = "outlier_lines.csv"
# artifacts_dir = "artifacts"

[files]
# threshold = 3.0
# output = "file_outliers.csv"
# since_days = 365
# branch = "main"
# max_files_per_commit = 100
"#;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(
        lines_threshold = config.lines.threshold,
        files_threshold = config.files.threshold,
        "configuration resolved"
    );

    if cli.verbose {
        eprintln!("format: {}", cli.format);
    }

    match cli.command {
        None => print_welcome(),
        Some(Command::Lines {
            ref input,
            ref output,
            threshold,
            ref key_column,
            ref count_column,
            ref artifacts,
        }) => {
            let mut lines_config = config.lines.clone();
            if let Some(output) = output {
                lines_config.output = output.clone();
            }
            if let Some(threshold) = threshold {
                lines_config.threshold = threshold;
            }
            if let Some(key) = key_column {
                lines_config.key_column = key.clone();
            }
            if let Some(count) = count_column {
                lines_config.count_column = count.clone();
            }
            if let Some(dir) = artifacts {
                lines_config.artifacts_dir = Some(dir.clone());
            }
            let options = LineOutlierOptions::from(&lines_config);

            eprintln!("Reading line modifications from {} ...", input.display());
            let run = run_line_outliers(input, &options)?;
            eprintln!(
                "Read {} rows ({} unique, {} lines).",
                run.rows_read, run.unique_rows, run.lines
            );

            print_line_run(&run, &options.columns, cli.format)?;

            for artifact in &run.artifacts {
                eprintln!("Wrote {}", artifact.display());
            }
            eprintln!(
                "Wrote {} outliers to {}",
                run.report.len(),
                run.output.display()
            );
        }
        Some(Command::Files {
            ref path,
            ref log_file,
            ref output,
            threshold,
            since,
            ref branch,
            max_files_per_commit,
        }) => {
            let mut files_config = config.files.clone();
            if let Some(output) = output {
                files_config.output = output.clone();
            }
            if let Some(threshold) = threshold {
                files_config.threshold = threshold;
            }
            if since.is_some() {
                files_config.since_days = since;
            }
            if branch.is_some() {
                files_config.branch = branch.clone();
            }
            if max_files_per_commit.is_some() {
                files_config.max_files_per_commit = max_files_per_commit;
            }

            let source: Box<dyn HistorySource> = match log_file {
                Some(log) if log.as_os_str() == "-" => {
                    eprintln!("Reading git log from stdin ...");
                    let log = NameOnlyLog::from_reader(std::io::stdin().lock())
                        .map_err(|e| e.at(Stage::Extraction))?;
                    Box::new(log)
                }
                Some(log) => {
                    eprintln!("Reading git log from {} ...", log.display());
                    let log =
                        NameOnlyLog::from_path(log).map_err(|e| e.at(Stage::Extraction))?;
                    Box::new(log)
                }
                None => {
                    // Hint: not a git repository
                    if git2::Repository::discover(path).is_err() {
                        miette::bail!(miette::miette!(
                            help = "Run churnlens from inside a git repository, specify --path to one, or pass --log-file",
                            "Not a git repository: {}",
                            path.display()
                        ));
                    }
                    match files_config.since_days {
                        Some(days) => eprintln!(
                            "Mining git history at {} (last {days} days) ...",
                            path.display()
                        ),
                        None => eprintln!("Mining git history at {} ...", path.display()),
                    }
                    Box::new(GitHistory::new(
                        path.clone(),
                        MiningOptions::from(&files_config),
                    ))
                }
            };

            let options = FileOutlierOptions::from(&files_config);
            let run = run_file_outliers(source.as_ref(), &options)?;
            eprintln!(
                "Counted {} file changes across {} files.",
                run.entries, run.files
            );

            print_file_run(&run, cli.format)?;

            eprintln!(
                "Wrote {} outliers to {}",
                run.report.len(),
                run.output.display()
            );
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "churnlens", &mut std::io::stdout());
        }
    }

    Ok(())
}
