//! Output path planning
//!
//! Computes where a compiled stylesheet and its companion map land for one
//! (source file × format) pair. Expressed as an ordered pipeline of small
//! rules: save_path resolution, then segment replacements, then the
//! extension swap. The only side effect is the idempotent creation of the
//! final output directory.

use std::path::{Path, PathBuf};

use crate::config::FormatSpec;
use crate::error::{LivesassError, LivesassResult};

/// Planned output locations for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPaths {
    pub css: PathBuf,
    pub map: PathBuf,
}

/// Plan the CSS and map paths for `source` under `format`.
///
/// Without a project root (single-file mode) the output sits next to the
/// source with its extension swapped. A non-string segment-replacement
/// value aborts planning for this pair with
/// [`LivesassError::InvalidReplacement`].
pub fn plan(
    source: &Path,
    format: &FormatSpec,
    project_root: Option<&Path>,
) -> LivesassResult<PlannedPaths> {
    let mut current = source.to_path_buf();

    if let Some(root) = project_root {
        current = apply_save_path(&current, format, root);
        current = apply_replacements(&current, format, root)?;

        if let Some(dir) = current.parent() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let css = swap_extension(&current, &format.extension);
    let mut map = css.clone().into_os_string();
    map.push(".map");

    Ok(PlannedPaths {
        css,
        map: PathBuf::from(map),
    })
}

/// Move the file under the format's `save_path`, when one is set.
/// `~`-prefixed paths are relative to the source file's own directory,
/// everything else is relative to the project root.
fn apply_save_path(current: &Path, format: &FormatSpec, root: &Path) -> PathBuf {
    let Some(save_path) = &format.save_path else {
        return current.to_path_buf();
    };

    let dir = if let Some(rel) = save_path.strip_prefix('~') {
        let source_dir = current.parent().unwrap_or(root);
        source_dir.join(rel.trim_start_matches(['/', '\\']))
    } else {
        root.join(save_path.trim_start_matches(['/', '\\']))
    };

    match current.file_name() {
        Some(name) => dir.join(name),
        None => dir,
    }
}

/// Apply the format's ordered segment replacements to the root-relative
/// directory of the already-adjusted path. Replacements only run when no
/// `save_path` is set, or the `save_path` is the `~` form.
fn apply_replacements(
    current: &Path,
    format: &FormatSpec,
    root: &Path,
) -> LivesassResult<PathBuf> {
    let applicable = !format.replacements.is_empty()
        && format
            .save_path
            .as_deref()
            .map(|sp| sp.starts_with('~'))
            .unwrap_or(true);
    if !applicable {
        return Ok(current.to_path_buf());
    }

    let dir = current.parent().unwrap_or(root);
    let Ok(relative) = dir.strip_prefix(root) else {
        // A `~` save_path can point above the project root; there is no
        // root-relative directory to rewrite in that case.
        return Ok(current.to_path_buf());
    };

    let mut segment = format!("/{}/", relative.to_string_lossy().replace('\\', "/"));

    for rule in &format.replacements {
        let Some(value) = rule.replace.as_str() else {
            return Err(LivesassError::InvalidReplacement {
                key: rule.search.clone(),
                found: rule.replace.type_str().to_string(),
            });
        };

        // Each rule rewrites only the first occurrence of its search string.
        segment = segment.replacen(
            &rule.search.replace('\\', "/"),
            &value.replace('\\', "/"),
            1,
        );
    }

    let new_dir = root.join(segment.trim_matches('/'));
    match current.file_name() {
        Some(name) => Ok(new_dir.join(name)),
        None => Ok(new_dir),
    }
}

fn swap_extension(path: &Path, extension: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    };
    path.with_file_name(format!("{stem}{ext}"))
}
