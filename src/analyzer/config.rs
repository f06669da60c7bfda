use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::analyzer::Severity;

/// Configuration for enabling/disabling individual rules plus the type sniff options.
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub rules: HashMap<String, bool>,
    /// Consult the project class index to detect overridden methods.
    pub use_reflection: bool,
    pub method: MethodConfig,
    pub description: DescriptionConfig,
    pub iterator: IteratorConfig,
}

impl AnalyzerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.method.invalid_tags = normalize_tag_names(&config.method.invalid_tags);
        config.description.invalid_tags = normalize_tag_names(&config.description.invalid_tags);
        Ok(config)
    }

    pub fn enabled(&self, rule_name: &str) -> bool {
        let mut candidate = rule_name;
        loop {
            if let Some(enabled) = self.rules.get(candidate) {
                return *enabled;
            }

            if let Some(idx) = candidate.rfind('/') {
                candidate = &candidate[..idx];
                continue;
            }

            break;
        }

        true
    }

    pub fn find_config(path: Option<PathBuf>, root: &Path) -> Option<PathBuf> {
        if let Some(path) = path {
            return Some(path);
        }

        let candidates = ["type_sniff.yaml", "type_sniff.yml"];
        for candidate in &candidates {
            let candidate_path = root.join(candidate);
            if candidate_path.is_file() {
                return Some(candidate_path);
            }
        }

        None
    }
}

/// Options of the function and method sniff.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MethodConfig {
    pub invalid_tags: Vec<String>,
    pub report_missing_tags: bool,
    pub report_nullable_basic_getter_doc_type: bool,
    pub report_nullable_basic_getter_fn_type: bool,
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            invalid_tags: Vec::new(),
            report_missing_tags: true,
            report_nullable_basic_getter_doc_type: true,
            report_nullable_basic_getter_fn_type: true,
        }
    }
}

/// Options of the class-like description sniff.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DescriptionConfig {
    pub invalid_tags: Vec<String>,
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            invalid_tags: vec!["package".to_string()],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct IteratorConfig {
    pub report_type: Severity,
}

impl Default for IteratorConfig {
    fn default() -> Self {
        Self {
            report_type: Severity::Warning,
        }
    }
}

/// Lowercases tag names and strips the leading `@`, keeping first occurrences.
pub fn normalize_tag_names(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().trim_start_matches('@').to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}
