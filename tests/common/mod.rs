//! Fixture directory runner shared by the integration suites.
//!
//! A fixture directory holds PHP files and an optional `type_sniff.yaml`.
//! Every file is analysed as one project, and the diagnostics are rendered
//! as `"{line:03} {message}"` and grouped by file name.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use php_type_sniff::analyzer::config::AnalyzerConfig;
use php_type_sniff::analyzer::{Analyzer, Diagnostic, collect_php_files};

pub fn summary(diag: &Diagnostic) -> String {
    format!("{:03} {}", diag.line, diag.message)
}

/// Diagnostics of one fixture directory.
pub struct FixtureRun {
    pub files: Vec<PathBuf>,
    by_name: BTreeMap<String, Vec<String>>,
}

impl FixtureRun {
    pub fn analyse(dir: &Path) -> Result<Self> {
        let config = AnalyzerConfig::find_config(None, dir)
            .map(AnalyzerConfig::load)
            .transpose()?;
        let mut analyzer = Analyzer::new(config)?;
        let files = collect_php_files(dir)?;

        let mut by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for diag in analyzer.analyse_root(dir)? {
            by_name
                .entry(file_name(&diag.file))
                .or_default()
                .push(summary(&diag));
        }

        Ok(Self { files, by_name })
    }

    /// Takes the summaries reported for `path`, leaving the rest for
    /// [`FixtureRun::leftovers`].
    pub fn take(&mut self, path: &Path) -> Vec<String> {
        self.by_name.remove(&file_name(path)).unwrap_or_default()
    }

    pub fn leftovers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.by_name
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Non-empty trimmed lines of an `.expect` file.
pub fn expect_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read expectation file {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect())
}
