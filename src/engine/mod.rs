//! Engine ports - abstractions over the external Compiler and Prefixer
//!
//! The stylesheet-to-CSS transformation and the vendor-prefixing engines
//! live outside this crate. These traits are the narrow contracts the core
//! invokes them through; process-based adapters are provided for the CLI,
//! and tests plug in their own fakes.

mod autoprefixer_cli;
mod sass_cli;

pub use autoprefixer_cli::AutoprefixerCli;
pub use sass_cli::SassCli;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{AutoprefixSetting, OutputStyle};

/// Import-resolution callback handed to the Compiler. Returning `None`
/// tells the engine to continue with its own default resolution.
pub type ImportResolver<'a> = &'a (dyn Fn(&str) -> Option<PathBuf> + Sync);

/// Sink for engine warn/debug messages, forwarded to the host's output
/// surface unmodified.
pub trait CompilerLog: Sync {
    fn warn(&self, message: &str, location: Option<&str>);
    fn debug(&self, message: &str, location: Option<&str>);
}

/// Options for one compiler invocation.
pub struct CompileOptions<'a> {
    pub style: OutputStyle,
    pub source_map: bool,
    pub source_map_include_sources: bool,
    pub import_resolver: ImportResolver<'a>,
    pub logger: &'a dyn CompilerLog,
    /// Extra resolution roots for engines that resolve imports
    /// out-of-process and cannot call `import_resolver`.
    pub load_paths: Vec<PathBuf>,
}

/// Successful compiler output.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub css: String,
    pub source_map: Option<serde_json::Value>,
}

/// The compiler rejected the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFault {
    pub message: String,
}

impl fmt::Display for CompileFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileFault {}

/// Abstract stylesheet compiler.
pub trait Compiler: Send + Sync {
    fn compile(
        &self,
        source: &Path,
        options: &CompileOptions<'_>,
    ) -> Result<CompileOutput, CompileFault>;
}

/// Successful prefixer output.
#[derive(Debug, Clone)]
pub struct PrefixOutput {
    pub css: String,
    pub map: Option<String>,
}

/// Prefixer failures. A malformed browser-target expression is a distinct,
/// user-visible configuration problem; anything else is fatal for the job.
#[derive(Debug, Clone)]
pub enum PrefixFault {
    InvalidTargets(String),
    Other(String),
}

impl fmt::Display for PrefixFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixFault::InvalidTargets(msg) => write!(f, "invalid browser targets: {msg}"),
            PrefixFault::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Abstract CSS vendor-prefixing engine.
pub trait Prefixer: Send + Sync {
    fn prefix(
        &self,
        css: &str,
        map: Option<&str>,
        css_path: &Path,
        targets: &AutoprefixSetting,
        generate_map: bool,
    ) -> Result<PrefixOutput, PrefixFault>;
}

/// Strip a trailing `sourceMappingURL` annotation; the job runner appends
/// its own pointing at the planned map path.
pub(crate) fn strip_source_mapping_url(css: &str) -> String {
    css.lines()
        .filter(|line| !line.trim_start().starts_with("/*# sourceMappingURL="))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_annotation_line_only() {
        let css = "a {\n  color: red;\n}\n/*# sourceMappingURL=a.css.map */";
        assert_eq!(strip_source_mapping_url(css), "a {\n  color: red;\n}");
    }

    #[test]
    fn leaves_css_without_annotation_alone() {
        let css = "a{color:red}";
        assert_eq!(strip_source_mapping_url(css), css);
    }
}
