//! Data file discovery
//!
//! A script hands its output to the engine by writing a file. The preferred
//! channel is the per-run output slot (`DATALOOM_OUTPUT_DIR`); the legacy
//! channel is "the newest accepted file in the data directory modified within
//! the last few seconds", which is racy when two scripts finish inside the
//! same window and is kept only as a fallback.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use glob::MatchOptions;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{IngestError, IngestResult};

/// Configuration for data file discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LocatorConfig {
    /// Directory scanned by the legacy recency heuristic
    pub directory: PathBuf,
    /// Trailing window (seconds) a file must have been modified in
    pub window_secs: u64,
    /// Accepted file extensions, without the dot
    pub extensions: Vec<String>,
    /// Fall back to the recency scan when the output slot is empty
    pub scan_fallback: bool,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            window_secs: 120,
            extensions: vec!["csv".to_string(), "xlsx".to_string(), "json".to_string()],
            scan_fallback: true,
        }
    }
}

impl LocatorConfig {
    /// Recency window as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// A candidate data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    /// Path to the file
    pub path: PathBuf,
    /// Last modification time
    pub modified: SystemTime,
    /// Where the file was found
    pub source: LocateSource,
}

/// Channel a file was found through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocateSource {
    /// The per-run output slot
    OutputSlot,
    /// The legacy recency scan
    RecencyScan,
}

/// Finds the file a script just produced
#[derive(Debug, Clone, Default)]
pub struct DataFileLocator {
    config: LocatorConfig,
}

impl DataFileLocator {
    /// Create a locator
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Locate the newest file, preferring the output slot
    pub fn locate(&self, output_slot: Option<&Path>) -> IngestResult<LocatedFile> {
        if let Some(slot) = output_slot {
            let candidates = self.candidates(slot)?;
            if let Some((path, modified)) = newest(candidates) {
                debug!(path = %path.display(), "Found data file in output slot");
                return Ok(LocatedFile {
                    path,
                    modified,
                    source: LocateSource::OutputSlot,
                });
            }
            if !self.config.scan_fallback {
                return Err(IngestError::InputNotFound {
                    directory: slot.to_path_buf(),
                    reason: "the output slot is empty".to_string(),
                });
            }
        }

        self.locate_recent(SystemTime::now())
    }

    /// Legacy heuristic: newest accepted file modified within the window before `now`
    pub fn locate_recent(&self, now: SystemTime) -> IngestResult<LocatedFile> {
        let window = self.config.window();
        let earliest = now.checked_sub(window).unwrap_or(SystemTime::UNIX_EPOCH);

        let recent = self
            .candidates(&self.config.directory)?
            .into_iter()
            .filter(|(_, modified)| *modified >= earliest && *modified <= now);

        match newest(recent) {
            Some((path, modified)) => {
                warn!(
                    path = %path.display(),
                    "Using recency scan to pick the data file; write to DATALOOM_OUTPUT_DIR instead"
                );
                Ok(LocatedFile {
                    path,
                    modified,
                    source: LocateSource::RecencyScan,
                })
            }
            None => Err(IngestError::InputNotFound {
                directory: self.config.directory.clone(),
                reason: format!(
                    "no {} file modified in the last {}s",
                    self.config.extensions.join("/"),
                    self.config.window_secs
                ),
            }),
        }
    }

    /// Accepted files in a directory (not recursive) with their modification times
    fn candidates(&self, directory: &Path) -> IngestResult<Vec<(PathBuf, SystemTime)>> {
        if !directory.is_dir() {
            return Err(IngestError::InputNotFound {
                directory: directory.to_path_buf(),
                reason: "directory does not exist".to_string(),
            });
        }

        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let escaped = glob::Pattern::escape(&directory.display().to_string());
        let mut files = Vec::new();
        for extension in &self.config.extensions {
            let pattern = format!("{}/*.{}", escaped, extension.trim_start_matches('.'));
            let entries = glob::glob_with(&pattern, options)
                .map_err(|e| IngestError::InvalidPattern(format!("{}: {}", pattern, e)))?;

            for entry in entries {
                match entry {
                    Ok(path) => {
                        if path.is_file() {
                            let modified = fs::metadata(&path)?.modified()?;
                            files.push((path, modified));
                        }
                    }
                    Err(e) => {
                        warn!("Error accessing path: {}", e);
                    }
                }
            }
        }

        Ok(files)
    }
}

fn newest(files: impl IntoIterator<Item = (PathBuf, SystemTime)>) -> Option<(PathBuf, SystemTime)> {
    // Ties break on path so the choice is stable
    files
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
}
