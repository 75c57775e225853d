//! Configuration type definitions

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LivesassError, LivesassResult};

use super::loader::{self, ConfigWarning};

/// Compiler output style, passed through to the Compiler opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

/// One ordered segment-replacement rule applied to a computed output
/// directory. The value is kept untyped so a non-string value can be
/// reported at planning time instead of rejecting the whole config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentReplacement {
    pub search: String,
    pub replace: toml::Value,
}

/// One named output configuration applied to every compiled source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatSpec {
    /// Target extension, including the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default)]
    pub style: OutputStyle,

    /// Output directory. A leading `~` means relative to the source file's
    /// own directory; otherwise relative to the project root.
    #[serde(default)]
    pub save_path: Option<String>,

    /// Ordered literal substitutions over the computed relative directory;
    /// each rule rewrites the first occurrence of its search string.
    #[serde(default)]
    pub replacements: Vec<SegmentReplacement>,

    /// Per-format override of the global `generate_map`.
    #[serde(default)]
    pub generate_map: Option<bool>,

    /// Per-format override of the global `generate_map_include_sources`.
    #[serde(default)]
    pub generate_map_include_sources: Option<bool>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            style: OutputStyle::default(),
            save_path: None,
            replacements: Vec::new(),
            generate_map: None,
            generate_map_include_sources: None,
        }
    }
}

fn default_extension() -> String {
    ".css".to_string()
}

/// Autoprefixer target configuration.
///
/// Supports `autoprefix = false` (disabled), `autoprefix = true` (let the
/// engine discover its own browserslist) and an explicit target list:
///   autoprefix = ["defaults", "ie 11"]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(untagged)]
pub enum AutoprefixSetting {
    #[default]
    Disabled,
    Discover,
    Targets(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AutoprefixSettingDe {
    Flag(bool),
    Targets(Vec<String>),
}

impl<'de> Deserialize<'de> for AutoprefixSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match AutoprefixSettingDe::deserialize(deserializer)? {
            AutoprefixSettingDe::Flag(true) => Ok(Self::Discover),
            AutoprefixSettingDe::Flag(false) => Ok(Self::Disabled),
            AutoprefixSettingDe::Targets(targets) => Ok(Self::Targets(targets)),
        }
    }
}

impl AutoprefixSetting {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub verbosity: Verbosity,
}

/// Verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

/// Main configuration structure, read from `livesass.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Include glob patterns. Empty means every `.sass`/`.scss` file.
    #[serde(default)]
    pub include: Vec<String>,

    /// Exclude glob patterns.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Partial glob patterns, additive with the leading-underscore rule.
    #[serde(default)]
    pub partials: Vec<String>,

    /// Output formats. Empty means a single default `.css` format.
    #[serde(default)]
    pub formats: Vec<FormatSpec>,

    #[serde(default = "default_true")]
    pub generate_map: bool,

    #[serde(default)]
    pub generate_map_include_sources: bool,

    #[serde(default)]
    pub autoprefix: AutoprefixSetting,

    /// Restrict compilation to a subdirectory of the project root.
    #[serde(default)]
    pub force_base_directory: Option<String>,

    /// Import alias prefix -> replacement root.
    #[serde(default)]
    pub path_aliases: BTreeMap<String, String>,

    /// Treat `/`-rooted import specifiers as project-root-relative.
    #[serde(default)]
    pub root_is_workspace: bool,

    /// Run a full compile pass when watching starts.
    #[serde(default = "default_true")]
    pub compile_on_watch: bool,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: default_exclude(),
            partials: Vec::new(),
            formats: Vec::new(),
            generate_map: true,
            generate_map_include_sources: false,
            autoprefix: AutoprefixSetting::default(),
            force_base_directory: None,
            path_aliases: BTreeMap::new(),
            root_is_workspace: false,
            compile_on_watch: true,
            output: OutputConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string()]
}

/// Default include patterns when none are configured.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.sass", "**/*.scss"];

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> LivesassResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> LivesassResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load from project config, user config, or defaults
    pub fn load_or_default(project_root: Option<&Path>) -> Self {
        loader::load_or_default(project_root)
    }

    /// Apply environment variable overrides (LIVESASS_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    /// Configured formats, or the single default format when none are set.
    pub fn effective_formats(&self) -> Vec<FormatSpec> {
        if self.formats.is_empty() {
            vec![FormatSpec::default()]
        } else {
            self.formats.clone()
        }
    }

    /// Effective include patterns. When the user configures `include`, the
    /// partial patterns ride along so partials stay visible to discovery
    /// (they are classified out later, not filtered out here).
    pub fn include_patterns(&self) -> Vec<String> {
        if self.include.is_empty() {
            DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()
        } else {
            let mut patterns = self.include.clone();
            patterns.extend(self.partials.iter().cloned());
            patterns
        }
    }

    /// Map generation for one format: per-format override beats the global.
    pub fn map_enabled(&self, format: &FormatSpec) -> bool {
        format.generate_map.unwrap_or(self.generate_map)
    }

    /// Map source-inlining for one format.
    pub fn map_include_sources(&self, format: &FormatSpec) -> bool {
        format
            .generate_map_include_sources
            .unwrap_or(self.generate_map_include_sources)
    }

    /// Resolve the effective base directory for a project root, honouring
    /// `force_base_directory`. The override must exist and be a directory.
    pub fn effective_base(&self, root: &Path) -> LivesassResult<PathBuf> {
        match &self.force_base_directory {
            Some(setting) if !setting.is_empty() => {
                let stripped = setting.trim_start_matches(['/', '\\']);
                let base = root.join(stripped);
                match std::fs::metadata(&base) {
                    Ok(meta) if meta.is_dir() => Ok(base),
                    Ok(_) => Err(LivesassError::BaseDirectoryInvalid {
                        setting: setting.clone(),
                        path: base,
                    }),
                    Err(_) => Err(LivesassError::DirectoryNotFound { path: base }),
                }
            }
            _ => Ok(root.to_path_buf()),
        }
    }
}
