//! Run configuration
//!
//! Everything a run needs is held in [`PipelineConfig`] and passed to the
//! pipeline explicitly. Values come from the built-in defaults, optionally
//! overridden by a JSON config file, then by command-line flags.
//!
//! ```json
//! {
//!     "source_path": "messages/hu.json",
//!     "source_locale": "hu",
//!     "targets": [
//!         { "locale": "en", "output_path": "messages/en.json" },
//!         { "locale": "de", "output_path": "messages/de.json" }
//!     ],
//!     "batch_size": 25,
//!     "mode": "batched"
//! }
//! ```

use crate::mt::batch::{BatchSettings, TranslationMode};
use crate::mt::error::{MtError, MtResult};
use crate::mt::protect::{DEFAULT_ENTITY_PATTERN, DEFAULT_PLACEHOLDER_PATTERN, TokenProtector};
use crate::mt::translator::validate_locale;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// One output language and where its catalog goes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetLanguage {
    pub locale: String,
    pub output_path: PathBuf,
}

impl TargetLanguage {
    /// `<dir>/<locale>.json`
    pub fn in_dir(dir: &Path, locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            output_path: dir.join(format!("{}.json", locale)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub source_path: PathBuf,
    pub source_locale: String,
    /// Translated in this order
    pub targets: Vec<TargetLanguage>,
    pub mode: TranslationMode,
    pub batch_size: usize,
    pub max_attempts: u32,
    /// Defaults to 500 ms batched, 400 ms per-item
    pub retry_delay_ms: Option<u64>,
    /// Defaults to every 10 batches, or every 150 items per-item
    pub progress_every: Option<usize>,
    pub placeholder_pattern: String,
    pub entity_pattern: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let dir = Path::new("messages");
        Self {
            source_path: dir.join("hu.json"),
            source_locale: "hu".to_string(),
            targets: vec![
                TargetLanguage::in_dir(dir, "en"),
                TargetLanguage::in_dir(dir, "de"),
            ],
            mode: TranslationMode::Batched,
            batch_size: BatchSettings::DEFAULT_BATCH_SIZE,
            max_attempts: BatchSettings::DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: None,
            progress_every: None,
            placeholder_pattern: DEFAULT_PLACEHOLDER_PATTERN.to_string(),
            entity_pattern: DEFAULT_ENTITY_PATTERN.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> MtResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MtError::ConfigError(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
            .map_err(|e| MtError::ConfigError(format!("{} ({})", e, path.display())))
    }

    pub fn from_json_str(content: &str) -> MtResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| MtError::ConfigError(format!("Invalid config: {}", e)))
    }

    /// Directory holding the source catalog
    pub fn messages_dir(&self) -> PathBuf {
        self.source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Put the source and every target at `<dir>/<locale>.json`
    pub fn with_messages_dir(mut self, dir: &Path) -> Self {
        self.source_path = dir.join(format!("{}.json", self.source_locale));
        for target in &mut self.targets {
            target.output_path = dir.join(format!("{}.json", target.locale));
        }
        self
    }

    /// Switch the source language, keeping the source directory and targets
    pub fn with_source_locale(mut self, locale: &str) -> Self {
        self.source_path = self.messages_dir().join(format!("{}.json", locale));
        self.source_locale = locale.to_string();
        self
    }

    /// Replace the target list, writing next to the source catalog
    pub fn with_target_locales<S: AsRef<str>>(mut self, locales: &[S]) -> Self {
        let dir = self.messages_dir();
        self.targets = locales
            .iter()
            .map(|locale| TargetLanguage::in_dir(&dir, locale.as_ref()))
            .collect();
        self
    }

    /// Reject settings that cannot produce a sensible run
    pub fn validate(&self) -> MtResult<()> {
        validate_locale(&self.source_locale)?;
        if self.targets.is_empty() {
            return Err(MtError::ConfigError(
                "At least one target language is required".to_string(),
            ));
        }
        for target in &self.targets {
            validate_locale(&target.locale)?;
            if same_file(&target.output_path, &self.source_path) {
                return Err(MtError::ConfigError(format!(
                    "Output for '{}' would overwrite the source catalog",
                    target.locale
                )));
            }
        }
        if self.batch_size == 0 {
            return Err(MtError::ConfigError("batch_size must be at least 1".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(MtError::ConfigError(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn batch_settings(&self) -> BatchSettings {
        let defaults = match self.mode {
            TranslationMode::Batched => BatchSettings::default(),
            TranslationMode::PerItem => BatchSettings::per_item(),
        };
        BatchSettings {
            mode: self.mode,
            batch_size: self.batch_size,
            max_attempts: self.max_attempts,
            retry_delay: self
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            progress_every: self.progress_every.unwrap_or(defaults.progress_every),
        }
    }

    pub fn protector(&self) -> MtResult<TokenProtector> {
        TokenProtector::new(&self.placeholder_pattern, &self.entity_pattern)
    }
}

/// Whether two paths name the same file, lexically or once resolved on disk
fn same_file(a: &Path, b: &Path) -> bool {
    if lexically_normalized(a) == lexically_normalized(b) {
        return true;
    }
    match (resolved(a), resolved(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Drop `.` and fold `dir/..` without touching the filesystem
fn lexically_normalized(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(out.components().next_back(), Some(Component::Normal(_))) =>
            {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Canonical form of `path`, or of its parent if the file does not exist yet
fn resolved(path: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = fs::canonicalize(path) {
        return Some(canonical);
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Some(fs::canonicalize(parent).ok()?.join(path.file_name()?))
}
