//! Import alias resolution
//!
//! Resolves `@use`/`@import` specifiers against a configured alias table
//! before the Compiler falls back to its own resolution. Returning `None`
//! is not an error: it tells the engine to keep looking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolve an import specifier against the alias table and candidate roots.
///
/// Alias keys are tried longest-first and must match at a path-segment
/// boundary. Once a prefix has matched, shorter prefixes are never
/// consulted, even when the matched alias fails to resolve on disk;
/// precedence wins over best-effort here so a specifier can never silently
/// land in an unintended root.
pub fn resolve(
    specifier: &str,
    aliases: &BTreeMap<String, String>,
    roots: &[PathBuf],
    root_is_workspace: bool,
) -> Option<PathBuf> {
    let normalized = specifier.replace('\\', "/");

    let mut keys: Vec<&String> = aliases.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()));

    for prefix in keys {
        let prefix_normalized = prefix.replace('\\', "/");
        if let Some(remainder) = split_at_boundary(&normalized, &prefix_normalized) {
            return resolve_alias(&aliases[prefix], remainder, roots);
        }
    }

    // No alias matched: absolute-style specifiers may resolve against the
    // workspace roots when root_is_workspace is on.
    if root_is_workspace {
        if let Some(rooted) = normalized.strip_prefix('/') {
            for root in roots {
                let candidate = join_remainder(root, rooted);
                if parent_exists(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

/// Match `prefix` at the start of `specifier`, only at a segment boundary.
fn split_at_boundary<'a>(specifier: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = specifier.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

fn resolve_alias(replacement: &str, remainder: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    let replacement_normalized = replacement.replace('\\', "/");

    if let Some(relative) = replacement_normalized.strip_prefix('/') {
        // Workspace-relative replacement: try each candidate root in order.
        for root in roots {
            let candidate = join_remainder(&root.join(relative), remainder);
            if parent_exists(&candidate) {
                return Some(candidate);
            }
        }

        // Fall back to treating it as a global absolute path.
        let candidate = join_remainder(Path::new(&replacement_normalized), remainder);
        if parent_exists(&candidate) {
            return Some(candidate);
        }
    } else {
        let candidate = join_remainder(Path::new(&replacement_normalized), remainder);
        if parent_exists(&candidate) {
            return Some(candidate);
        }
    }

    None
}

fn join_remainder(base: &Path, remainder: &str) -> PathBuf {
    if remainder.is_empty() {
        base.to_path_buf()
    } else {
        base.join(remainder)
    }
}

fn parent_exists(candidate: &Path) -> bool {
    candidate
        .parent()
        .map(|dir| dir.is_dir())
        .unwrap_or(false)
}
