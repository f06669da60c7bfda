use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use php_type_sniff::analyzer::config::AnalyzerConfig;
use php_type_sniff::analyzer::{
    Analyzer, Diagnostic, DiagnosticJson, Severity, collect_php_files_from_roots, is_php_file,
};

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

/// Entry point for the type sniff CLI.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Cross-checks PHP type declarations against their PHPDoc types."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a PHP file, a directory or a glob of PHP files.
    Analyse {
        /// File, directory or glob to analyse.
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Run once, then re-check PHP files as they change.
    Watch {
        /// File, directory or glob to watch.
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyse { path, format } => {
            let mut session = Session::open(&path, cli.config, format)?;
            let summary = session.check(None)?;
            Ok(if summary.total > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Watch { path, format } => {
            let mut session = Session::open(&path, cli.config, format)?;
            session.check(None)?;
            session.watch()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Resolved targets plus the analyzer that checks them.
struct Session {
    targets: Vec<PathBuf>,
    root: PathBuf,
    analyzer: Analyzer,
    format: OutputFormat,
}

impl Session {
    fn open(path: &Path, config_path: Option<PathBuf>, format: OutputFormat) -> Result<Self> {
        let targets = expand_targets(path)?;
        let root = common_root(&targets);
        let config = AnalyzerConfig::find_config(config_path, &root)
            .map(AnalyzerConfig::load)
            .transpose()?;
        debug!(root = %root.display(), targets = targets.len(), "resolved analysis targets");

        Ok(Self {
            targets,
            root,
            analyzer: Analyzer::new(config)?,
            format,
        })
    }

    /// Analyses every target file and prints the result. With `changed`, the
    /// whole project is still indexed but only those files are reported.
    fn check(&mut self, changed: Option<&BTreeSet<PathBuf>>) -> Result<Summary> {
        let files = collect_php_files_from_roots(&self.targets)?;
        if files.is_empty() {
            eprintln!("No PHP files found under {}", self.root.display());
            return Ok(Summary::default());
        }

        let progress = match (self.format, changed) {
            (OutputFormat::Text, None) => {
                println!("Checking {} file(s)...", files.len());
                Some(progress_bar(files.len())?)
            }
            _ => None,
        };

        let started = Instant::now();
        let mut diagnostics =
            self.analyzer
                .analyse_files_with_progress(&files, &self.root, progress.as_ref())?;
        if let Some(bar) = &progress {
            bar.finish_and_clear();
        }

        let file_count = match changed {
            Some(changed) => {
                diagnostics.retain(|diag| changed.contains(&diag.file));
                changed.len()
            }
            None => files.len(),
        };

        let summary = Summary::of(&diagnostics, file_count, started.elapsed());
        summary.print(&diagnostics, self.format)?;
        Ok(summary)
    }

    fn watch(&mut self) -> Result<()> {
        let (tx, rx) = channel::<notify::Result<Event>>();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )
        .context("failed to initialize file watcher")?;

        for target in &self.targets {
            let mode = if target.is_dir() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            watcher
                .watch(target, mode)
                .with_context(|| format!("failed to watch {}", target.display()))?;
        }

        println!("Watching for changes (Ctrl+C to exit)...");

        for event in rx {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "watch error");
                    continue;
                }
            };

            let changed = changed_php_files(event);
            if changed.is_empty() {
                continue;
            }

            println!("Detected {} PHP file(s) changed:", changed.len());
            for file in &changed {
                println!("  {}", file.display());
            }
            self.check(Some(&changed))?;
        }

        bail!("file watch channel closed")
    }
}

fn changed_php_files(event: Event) -> BTreeSet<PathBuf> {
    let mut changed = BTreeSet::new();
    for path in event.paths.into_iter().filter(|path| is_php_file(path)) {
        match path.canonicalize() {
            Ok(canonical) if canonical.is_file() => {
                changed.insert(canonical);
            }
            Ok(_) => {}
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable path"),
        }
    }
    changed
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
            .context("invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(bar)
}

/// Counts printed after a run; also the `stats` object of the JSON output.
#[derive(Default, Serialize)]
struct Summary {
    files: usize,
    errors: usize,
    warnings: usize,
    duration_seconds: f64,
    #[serde(skip)]
    total: usize,
}

impl Summary {
    fn of(diagnostics: &[Diagnostic], files: usize, elapsed: Duration) -> Self {
        let count = |severity: Severity| {
            diagnostics
                .iter()
                .filter(|diag| diag.severity == severity)
                .count()
        };

        Self {
            files,
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            duration_seconds: elapsed.as_secs_f64(),
            total: diagnostics.len(),
        }
    }

    fn print(&self, diagnostics: &[Diagnostic], format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text => {
                if diagnostics.is_empty() {
                    println!(
                        "Analysis complete ▸ {} PHP file(s), no diagnostics emitted.",
                        self.files
                    );
                }
                for diag in diagnostics {
                    println!("{diag}");
                }
                println!(
                    "Stats ▸ {} file(s) | {} error(s), {} warning(s) | {:.2}s",
                    self.files, self.errors, self.warnings, self.duration_seconds,
                );
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    diagnostics: diagnostics.iter().map(Diagnostic::to_json).collect(),
                    stats: self,
                };
                let mut stdout = io::stdout().lock();
                serde_json::to_writer_pretty(&mut stdout, &output)?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    diagnostics: Vec<DiagnosticJson>,
    stats: &'a Summary,
}

/// Expands a glob, then canonicalizes and deduplicates the targets.
fn expand_targets(path: &Path) -> Result<Vec<PathBuf>> {
    let pattern = path.to_string_lossy();
    let requested = if is_glob(&pattern) {
        let matches = glob(&pattern)
            .with_context(|| format!("invalid glob pattern \"{pattern}\""))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to read entries for pattern \"{pattern}\""))?;
        if matches.is_empty() {
            bail!("no files matched \"{pattern}\"");
        }
        matches
    } else {
        vec![path.to_path_buf()]
    };

    let mut targets = requested
        .into_iter()
        .map(|target| {
            target
                .canonicalize()
                .with_context(|| format!("failed to access {}", target.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    targets.sort();
    targets.dedup();
    Ok(targets)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', ']', '{', '}'])
}

/// Deepest directory containing every target. Files count as their parent.
fn common_root(targets: &[PathBuf]) -> PathBuf {
    let mut dirs = targets.iter().map(|target| match target.parent() {
        Some(parent) if target.is_file() => parent,
        _ => target.as_path(),
    });

    let Some(first) = dirs.next() else {
        return PathBuf::from(".");
    };

    let mut root = first.to_path_buf();
    for dir in dirs {
        while !dir.starts_with(&root) && root.pop() {}
    }
    root
}
