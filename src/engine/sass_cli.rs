//! Sass compiler adapter shelling out to the `sass` executable
//!
//! Compiles into a temporary directory and reads the artifacts back so the
//! pipeline can post-process them (prefixing, map rewriting) before writing
//! to the planned locations. The external process cannot call back into
//! `import_resolver`; alias replacement roots arrive as `--load-path`
//! entries instead.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::OutputStyle;

use super::{strip_source_mapping_url, CompileFault, CompileOptions, CompileOutput, Compiler};

/// Compiler backed by the dart-sass command line.
pub struct SassCli {
    executable: PathBuf,
}

impl Default for SassCli {
    fn default() -> Self {
        Self::new()
    }
}

impl SassCli {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("sass"),
        }
    }

    pub fn with_executable(executable: PathBuf) -> Self {
        Self { executable }
    }

    /// Check if the sass binary is installed and available
    pub fn check_available(&self) -> bool {
        Command::new(&self.executable)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Compiler for SassCli {
    fn compile(
        &self,
        source: &Path,
        options: &CompileOptions<'_>,
    ) -> Result<CompileOutput, CompileFault> {
        let staging = tempfile::tempdir().map_err(|e| CompileFault {
            message: format!("failed to create staging directory: {e}"),
        })?;
        let out_css = staging.path().join("out.css");

        let mut cmd = Command::new(&self.executable);
        cmd.arg(source).arg(&out_css).arg("--no-error-css");

        cmd.arg(match options.style {
            OutputStyle::Expanded => "--style=expanded",
            OutputStyle::Compressed => "--style=compressed",
        });

        if options.source_map {
            cmd.arg("--source-map");
            if options.source_map_include_sources {
                cmd.arg("--embed-sources");
            }
        } else {
            cmd.arg("--no-source-map");
        }

        for load_path in &options.load_paths {
            cmd.arg("--load-path").arg(load_path);
        }

        let output = cmd.output().map_err(|e| CompileFault {
            message: format!("failed to run {}: {e}", self.executable.display()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompileFault {
                message: stderr.trim().to_string(),
            });
        }

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            options.logger.warn(line, None);
        }

        let css = std::fs::read_to_string(&out_css).map_err(|e| CompileFault {
            message: format!("compiler produced no CSS output: {e}"),
        })?;

        let source_map = if options.source_map {
            let map_path = staging.path().join("out.css.map");
            std::fs::read_to_string(&map_path)
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok())
        } else {
            None
        };

        Ok(CompileOutput {
            css: strip_source_mapping_url(&css),
            source_map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_available_does_not_panic() {
        let _ = SassCli::new().check_available();
    }

    #[test]
    fn missing_executable_is_a_compile_fault() {
        let compiler = SassCli::with_executable(PathBuf::from("/nonexistent/sass-binary"));
        assert!(!compiler.check_available());
    }
}
