//! Prefixer adapter shelling out to postcss + autoprefixer
//!
//! Runs `npx postcss --use autoprefixer` over a staged copy of the compiled
//! CSS. Browser targets go through the `BROWSERSLIST` environment variable;
//! a browserslist parse failure maps to `PrefixFault::InvalidTargets` so the
//! caller can abort the job before anything touches disk.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::AutoprefixSetting;

use super::{strip_source_mapping_url, PrefixFault, PrefixOutput, Prefixer};

/// Prefixer backed by the postcss command line with the autoprefixer plugin.
pub struct AutoprefixerCli {
    runner: String,
}

impl Default for AutoprefixerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoprefixerCli {
    pub fn new() -> Self {
        Self {
            runner: "npx".to_string(),
        }
    }

    /// Check if the postcss toolchain can be launched
    pub fn check_available(&self) -> bool {
        Command::new(&self.runner)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Prefixer for AutoprefixerCli {
    fn prefix(
        &self,
        css: &str,
        map: Option<&str>,
        css_path: &Path,
        targets: &AutoprefixSetting,
        generate_map: bool,
    ) -> Result<PrefixOutput, PrefixFault> {
        let staging = tempfile::tempdir()
            .map_err(|e| PrefixFault::Other(format!("failed to create staging directory: {e}")))?;

        // Stage the input under the real CSS file name so the rewritten map
        // keeps sensible source references.
        let file_name = css_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out.css".to_string());
        let in_css = staging.path().join(&file_name);
        let out_css = staging.path().join(format!("prefixed-{file_name}"));

        std::fs::write(&in_css, css)
            .map_err(|e| PrefixFault::Other(format!("failed to stage CSS: {e}")))?;
        if let Some(map_text) = map {
            let map_path = staging.path().join(format!("{file_name}.map"));
            std::fs::write(&map_path, map_text)
                .map_err(|e| PrefixFault::Other(format!("failed to stage map: {e}")))?;
        }

        let mut cmd = Command::new(&self.runner);
        cmd.arg("--yes")
            .arg("postcss")
            .arg(&in_css)
            .arg("--use")
            .arg("autoprefixer")
            .arg("-o")
            .arg(&out_css);

        if generate_map && map.is_some() {
            cmd.arg("--map");
        } else {
            cmd.arg("--no-map");
        }

        if let AutoprefixSetting::Targets(list) = targets {
            cmd.env("BROWSERSLIST", list.join(", "));
        }

        let output = cmd
            .output()
            .map_err(|e| PrefixFault::Other(format!("failed to run {}: {e}", self.runner)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let lowered = stderr.to_lowercase();
            if lowered.contains("browserslist") || lowered.contains("unknown browser") {
                return Err(PrefixFault::InvalidTargets(stderr));
            }
            return Err(PrefixFault::Other(stderr));
        }

        let prefixed = std::fs::read_to_string(&out_css)
            .map_err(|e| PrefixFault::Other(format!("prefixer produced no output: {e}")))?;

        let out_map = if generate_map && map.is_some() {
            std::fs::read_to_string(out_css.with_extension("css.map"))
                .ok()
                .or_else(|| map.map(|m| m.to_string()))
        } else {
            None
        };

        Ok(PrefixOutput {
            css: strip_source_mapping_url(&prefixed),
            map: out_map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_available_does_not_panic() {
        let _ = AutoprefixerCli::new().check_available();
    }
}
