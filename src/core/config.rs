//! Handler configuration for faultline.

use crate::core::error::{Error, Result};
use crate::core::types::{LogLevel, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// The active error-reporting mask: the set of severity kinds the
/// synchronous hook reports at all.
///
/// Stored as one bit per severity code. Kinds outside the mask are not
/// delivered synchronously; a masked fatal is still discoverable by the
/// process-exit inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportMask(u32);

impl ReportMask {
    /// Every severity kind.
    pub const ALL: ReportMask = ReportMask(32767);
    /// No severity kind.
    pub const NONE: ReportMask = ReportMask(0);

    /// Build a mask from an explicit list of kinds.
    pub fn of(severities: &[Severity]) -> Self {
        let mut bits = 0;
        for severity in severities {
            bits |= severity.code();
        }
        ReportMask(bits)
    }

    /// Raw bit value (for config files and display).
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Whether the mask permits reporting this kind.
    pub fn permits(&self, severity: Severity) -> bool {
        self.permits_code(severity.code())
    }

    /// Whether the mask permits a raw severity code.
    pub fn permits_code(&self, code: u32) -> bool {
        self.0 & code != 0
    }

    /// Add a kind to the mask.
    pub fn allow(mut self, severity: Severity) -> Self {
        self.0 |= severity.code();
        self
    }

    /// Remove a kind from the mask.
    pub fn without(mut self, severity: Severity) -> Self {
        self.0 &= !severity.code();
        self
    }
}

impl Default for ReportMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Handler configuration.
///
/// Fully populated before [`crate::handler::FaultHandler::install`] and
/// effectively read-only while handling runs; the handler owns its copy by
/// value and nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Log level used when a type has no override
    pub default_level: LogLevel,
    /// Per-type log level overrides, keyed by canonical type name
    pub level_overrides: BTreeMap<String, LogLevel>,
    /// Suppress diagnostic detail on the output channel
    pub silent: bool,
    /// Opaque message shown instead of diagnostics in silent mode
    pub silent_content: String,
    /// Types that, in silent mode, log but neither render nor halt
    pub ignore_types: BTreeSet<String>,
    /// Severity kinds the synchronous hook reports
    pub report_mask: ReportMask,
    /// Upper bound on captured trace frames per event
    pub max_trace_frames: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Error,
            level_overrides: BTreeMap::new(),
            silent: false,
            silent_content: "An internal error occurred. Please try again later.".to_string(),
            ignore_types: BTreeSet::new(),
            report_mask: ReportMask::ALL,
            max_trace_frames: 64,
        }
    }
}

impl HandlerConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level used when no override matches.
    pub fn with_default_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    /// Register a per-type log level override.
    ///
    /// Override lookup always wins over the default level; the absence of
    /// an override is plain fallback, not an error.
    pub fn with_level_override(mut self, type_name: impl Into<String>, level: LogLevel) -> Self {
        self.level_overrides.insert(type_name.into(), level);
        self
    }

    /// Enable or disable silent mode.
    pub fn with_silent_mode(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Set the opaque content shown in silent mode.
    pub fn with_silent_content(mut self, content: impl Into<String>) -> Self {
        self.silent_content = content.into();
        self
    }

    /// Set the types exempt from halting in silent mode.
    pub fn with_ignore_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the error-reporting mask.
    pub fn with_report_mask(mut self, mask: ReportMask) -> Self {
        self.report_mask = mask;
        self
    }

    /// Set the trace frame cap.
    pub fn with_max_trace_frames(mut self, max: usize) -> Self {
        self.max_trace_frames = max;
        self
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigSave(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| Error::ConfigSave(format!("Failed to write config file: {}", e)))
    }

    /// Load configuration from the default location, falling back to
    /// defaults when missing or unreadable.
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    log::warn!("Failed to load config, using defaults: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        Self::data_dir().join("config.json")
    }

    /// Get the default path for the JSON-lines log sink.
    pub fn default_sink_path() -> PathBuf {
        Self::data_dir().join("faults.jsonl")
    }

    /// Get the application data directory.
    pub fn data_dir() -> PathBuf {
        #[cfg(windows)]
        {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData"))
                .join("Faultline")
        }

        #[cfg(not(windows))]
        {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("faultline")
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.silent && self.silent_content.is_empty() {
            return Err(Error::config_invalid(
                "silent_content",
                "Must not be empty when silent mode is enabled",
            ));
        }

        if self.max_trace_frames == 0 {
            return Err(Error::config_invalid(
                "max_trace_frames",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Effective log level for a type: the override if present, else the
    /// default.
    pub fn effective_level(&self, type_name: &str) -> LogLevel {
        self.level_overrides
            .get(type_name)
            .copied()
            .unwrap_or(self.default_level)
    }

    /// Whether a type is exempt from halting in silent mode.
    pub fn is_ignored(&self, type_name: &str) -> bool {
        self.ignore_types.contains(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = HandlerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_level, LogLevel::Error);
        assert!(!config.silent);
        assert_eq!(config.report_mask, ReportMask::ALL);
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_config.json");

        let config = HandlerConfig::default()
            .with_default_level(LogLevel::Warning)
            .with_level_override("E_NOTICE", LogLevel::Info)
            .with_silent_mode(true)
            .with_ignore_types(["E_DEPRECATED"]);
        config.save(&path).unwrap();

        let loaded = HandlerConfig::load(&path).unwrap();
        assert_eq!(loaded.default_level, LogLevel::Warning);
        assert_eq!(
            loaded.level_overrides.get("E_NOTICE"),
            Some(&LogLevel::Info)
        );
        assert!(loaded.silent);
        assert!(loaded.is_ignored("E_DEPRECATED"));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = HandlerConfig::default()
            .with_silent_mode(true)
            .with_silent_content("");
        assert!(config.validate().is_err());

        config = HandlerConfig::default().with_max_trace_frames(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_level_precedence() {
        let config = HandlerConfig::default().with_level_override("E_NOTICE", LogLevel::Info);
        assert_eq!(config.effective_level("E_NOTICE"), LogLevel::Info);
        assert_eq!(config.effective_level("E_WARNING"), LogLevel::Error);
    }

    #[test]
    fn test_report_mask() {
        let mask = ReportMask::ALL.without(Severity::Notice);
        assert!(!mask.permits(Severity::Notice));
        assert!(mask.permits(Severity::Warning));

        let narrow = ReportMask::of(&[Severity::Error, Severity::Warning]);
        assert!(narrow.permits(Severity::Error));
        assert!(!narrow.permits(Severity::Deprecated));
        assert_eq!(narrow.allow(Severity::Deprecated).bits(), 1 | 2 | 8192);
    }
}
