//! Decorator configuration.
//!
//! A [`DecorateConfig`] is pure data describing how the decorators in
//! [`decorate`](crate::decorate) behave: how far each call level indents, how
//! stdout is captured, which stack frames count towards call depth, and
//! whether logged arguments are redacted.
//!
//! ```
//! use tidemark::config::{CaptureMode, DecorateConfig, ExclusionMode};
//!
//! let config = DecorateConfig::default()
//!     .with_spacing(2)
//!     .with_capture("basic".parse::<CaptureMode>().unwrap())
//!     .with_exclusions(ExclusionMode::Append, ["my_app::util"]);
//!
//! assert_eq!(config.spacing(), 2);
//! assert_eq!(config.half_step(), 1);
//! assert!(config.excluded_modules().iter().any(|m| m == "std"));
//! assert!(config.excluded_modules().iter().any(|m| m == "my_app::util"));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::entry::Level;
use crate::failure::ConfigError;

/// Modules whose stack frames never count towards call depth.
pub const DEFAULT_EXCLUDED_MODULES: &[&str] = &[
    "std",
    "core",
    "alloc",
    "test",
    "backtrace",
    "tidemark::capture",
    "tidemark::decorate",
];

/// Default indent step per decorated call level.
pub const DEFAULT_SPACING: usize = 4;

/// How `redirect_stdout` turns captured text into log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CaptureMode {
    /// Every captured line lands at the inherited indent.
    Basic,
    /// Each line is indented by the call depth it was written from.
    #[default]
    Depth,
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Basic => f.write_str("basic"),
            CaptureMode::Depth => f.write_str("depth"),
        }
    }
}

impl FromStr for CaptureMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(CaptureMode::Basic),
            "depth" => Ok(CaptureMode::Depth),
            _ => Err(ConfigError::UnsupportedCaptureMode(s.to_string())),
        }
    }
}

/// How caller-supplied module exclusions combine with the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExclusionMode {
    /// Add to the current set.
    Append,
    /// Discard the current set.
    Replace,
}

impl FromStr for ExclusionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(ExclusionMode::Append),
            "replace" => Ok(ExclusionMode::Replace),
            _ => Err(ConfigError::UnknownExclusionMode(s.to_string())),
        }
    }
}

/// Configuration shared by the decorators.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecorateConfig {
    spacing: usize,
    capture: CaptureMode,
    excluded_modules: Vec<String>,
    redact: bool,
    level: Level,
}

impl Default for DecorateConfig {
    fn default() -> Self {
        DecorateConfig {
            spacing: DEFAULT_SPACING,
            capture: CaptureMode::default(),
            excluded_modules: DEFAULT_EXCLUDED_MODULES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            redact: false,
            level: Level::Info,
        }
    }
}

impl DecorateConfig {
    /// Set the indent step per decorated call level.
    pub fn with_spacing(mut self, spacing: usize) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the stdout capture mode.
    pub fn with_capture(mut self, capture: CaptureMode) -> Self {
        self.capture = capture;
        self
    }

    /// Extend or replace the modules excluded from call-depth counting.
    pub fn with_exclusions<I, S>(mut self, mode: ExclusionMode, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if mode == ExclusionMode::Replace {
            self.excluded_modules.clear();
        }
        for module in modules {
            let module = module.into();
            if !self.excluded_modules.contains(&module) {
                self.excluded_modules.push(module);
            }
        }
        self
    }

    /// Redact sensitive-looking argument renderings.
    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    /// Level of the entries the decorators write themselves.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Indent step per decorated call level.
    pub fn spacing(&self) -> usize {
        self.spacing
    }

    /// Half the spacing, rounded up. Captured output indents in these units.
    pub fn half_step(&self) -> usize {
        self.spacing.div_ceil(2)
    }

    /// The stdout capture mode.
    pub fn capture(&self) -> CaptureMode {
        self.capture
    }

    /// Modules excluded from call-depth counting.
    pub fn excluded_modules(&self) -> &[String] {
        &self.excluded_modules
    }

    /// Whether argument renderings are redacted.
    pub fn redact(&self) -> bool {
        self.redact
    }

    /// Level of decorator-written entries.
    pub fn level(&self) -> Level {
        self.level
    }
}
