// Judge configuration for the polyjudge worker
use crate::languages::Language;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/judge.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Target language of the submission
    pub language: String,
    /// Wall-clock limit per compile or execute invocation
    pub time_limit_ms: u64,
    /// Resident memory ceiling per invocation
    pub memory_limit_mb: u64,
    /// Budget for the whole judging run, linting included
    pub run_budget_ms: u64,
    /// Contexts judged at the same time
    pub parallelism: usize,
    /// Language of learner-facing messages
    pub natural_language: String,
    pub compiler_optimizations: bool,
    pub linter: bool,
    /// Root for per-run working directories, system temp dir when unset
    pub workdir: Option<PathBuf>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
            time_limit_ms: 10_000,
            memory_limit_mb: 512,
            run_budget_ms: 60_000,
            parallelism: 4,
            natural_language: "en".to_string(),
            compiler_optimizations: false,
            linter: true,
            workdir: None,
        }
    }
}

impl JudgeConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read judge config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse judge config {}", path.display()))
    }

    /// Load from `JUDGE_CONFIG` (or the default path), falling back to
    /// defaults when no file exists. `JUDGE_LANGUAGE` overrides the language.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var("JUDGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = Path::new(&path);

        let mut config = if path.exists() { Self::load(path)? } else { Self::default() };
        if let Ok(language) = std::env::var("JUDGE_LANGUAGE") {
            config.language = language.to_lowercase();
        }
        Ok(config)
    }

    /// Language of a submission: its `#!tested` line wins over the configured one
    pub fn submission_language(&self, declared: Option<&str>) -> Result<Language> {
        declared.unwrap_or(&self.language).parse()
    }

    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            natural_language: self.natural_language.clone(),
            compiler_optimizations: self.compiler_optimizations,
        }
    }

    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits {
            time_limit: Duration::from_millis(self.time_limit_ms),
            memory_limit_kb: self.memory_limit_mb * 1024,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            limits: self.limits(),
            run_budget: Duration::from_millis(self.run_budget_ms),
            parallelism: self.parallelism.max(1),
            lint: self.linter,
            workdir: self.workdir.clone(),
        }
    }
}

/// What an adapter is allowed to know about the run
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    pub natural_language: String,
    pub compiler_optimizations: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        JudgeConfig::default().adapter_config()
    }
}

/// Limits applied to every child process, not overridable by adapters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLimits {
    pub time_limit: Duration,
    pub memory_limit_kb: u64,
}

/// Pipeline knobs for one judging run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub limits: ResourceLimits,
    pub run_budget: Duration,
    pub parallelism: usize,
    pub lint: bool,
    pub workdir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        JudgeConfig::default().run_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"language": "bash", "time_limit_ms": 2000}}"#).unwrap();

        let config = JudgeConfig::load(file.path()).unwrap();
        assert_eq!(config.language, "bash");
        assert_eq!(config.time_limit_ms, 2000);
        assert_eq!(config.memory_limit_mb, 512);
        assert_eq!(config.limits().memory_limit_kb, 512 * 1024);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(JudgeConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_shebang_overrides_configured_language() {
        let config = JudgeConfig { language: "python".into(), ..Default::default() };
        assert_eq!(config.submission_language(None).unwrap(), Language::Python);
        assert_eq!(config.submission_language(Some("bash")).unwrap(), Language::Bash);
        assert!(config.submission_language(Some("cobol")).is_err());
    }

    #[test]
    fn test_parallelism_is_at_least_one() {
        let config = JudgeConfig { parallelism: 0, ..Default::default() };
        assert_eq!(config.run_options().parallelism, 1);
    }
}
