//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LivesassError, LivesassResult};

use super::types::{AutoprefixSetting, Config, Verbosity};

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> LivesassResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| LivesassError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load from project config, user config, or defaults
pub fn load_or_default(project_root: Option<&Path>) -> Config {
    // Try project config first
    if let Some(root) = project_root {
        let project_config = root.join("livesass.toml");
        if project_config.exists() {
            if let Ok(config) = Config::load(&project_config) {
                return with_env_overrides(config);
            }
        }
    }

    // Try user config
    if let Some(user_config_dir) = dirs::config_dir() {
        let user_config = user_config_dir.join("livesass/config.toml");
        if user_config.exists() {
            if let Ok(config) = Config::load(&user_config) {
                return with_env_overrides(config);
            }
        }
    }

    with_env_overrides(Config::default())
}

/// Apply environment variable overrides (LIVESASS_* prefix)
pub fn with_env_overrides(mut config: Config) -> Config {
    // LIVESASS_GENERATE_MAP
    if let Ok(value) = std::env::var("LIVESASS_GENERATE_MAP") {
        config.generate_map = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
    }

    // LIVESASS_AUTOPREFIX ("false", "true", or comma-separated targets)
    if let Ok(value) = std::env::var("LIVESASS_AUTOPREFIX") {
        config.autoprefix = match value.to_lowercase().as_str() {
            "0" | "false" | "no" => AutoprefixSetting::Disabled,
            "1" | "true" | "yes" => AutoprefixSetting::Discover,
            _ => AutoprefixSetting::Targets(
                value.split(',').map(|s| s.trim().to_string()).collect(),
            ),
        };
    }

    // LIVESASS_VERBOSITY
    if let Ok(verbosity) = std::env::var("LIVESASS_VERBOSITY") {
        config.output.verbosity = match verbosity.to_lowercase().as_str() {
            "quiet" => Verbosity::Quiet,
            "verbose" => Verbosity::Verbose,
            "debug" => Verbosity::Debug,
            _ => Verbosity::Normal,
        };
    }

    config
}

/// Best-effort line number for a key in the raw TOML text.
fn find_line_number(content: &str, key: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with(key)
                && trimmed[key.len()..]
                    .trim_start()
                    .starts_with(['=', '.'])
        })
        .map(|i| i + 1)
}

/// Suggest a known key for a likely typo.
fn suggest_key(key: &str) -> Option<String> {
    const KNOWN: &[&str] = &[
        "include",
        "exclude",
        "partials",
        "formats",
        "extension",
        "style",
        "save_path",
        "replacements",
        "generate_map",
        "generate_map_include_sources",
        "autoprefix",
        "force_base_directory",
        "path_aliases",
        "root_is_workspace",
        "compile_on_watch",
        "output",
        "verbosity",
    ];

    KNOWN
        .iter()
        .find(|known| edit_distance(key, known) <= 2 && key != **known)
        .map(|s| s.to_string())
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
