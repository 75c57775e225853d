//! Configuration: `livesass.toml` schema, loading, and env overrides.

mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use loader::{load_or_default, load_with_warnings, with_env_overrides, ConfigWarning};
pub use types::{
    AutoprefixSetting, Config, FormatSpec, OutputConfig, OutputStyle, SegmentReplacement,
    Verbosity, DEFAULT_INCLUDE,
};
