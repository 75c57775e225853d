//! File classification and inclusion filtering
//!
//! Every path maps to exactly one of `Full`, `Partial`, or `Irrelevant`.
//! Inclusion is decided separately, and only matters for `Full` files.
//! All functions here are pure with respect to the filesystem.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::LivesassResult;

/// The two recognized style-sheet extensions, lowercase.
pub const SASS_EXTENSIONS: &[&str] = &["sass", "scss"];

/// Classification of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// A compilable style sheet.
    Full,
    /// A fragment meant only to be included by other files.
    Partial,
    /// Not a style sheet at all.
    Irrelevant,
}

/// A compiled glob pattern set, reusable across paths.
///
/// Patterns and paths are lowercased before comparison so matching does not
/// drift with platform case-sensitivity. Leading slashes on configured
/// patterns are stripped, matching the settings surface users write.
#[derive(Debug)]
pub struct PatternSet {
    set: GlobSet,
    empty: bool,
}

impl PatternSet {
    pub fn compile(patterns: &[String]) -> LivesassResult<Self> {
        Ok(Self {
            set: build_glob_set(patterns)?,
            empty: patterns.is_empty(),
        })
    }

    /// Test a path against the set, relative to `root`.
    pub fn matches(&self, path: &Path, root: &Path) -> bool {
        !self.empty && self.set.is_match(relative_key(path, root))
    }
}

/// Compiled include/exclude filter for one compile request.
#[derive(Debug)]
pub struct InclusionFilter {
    include: PatternSet,
    exclude: PatternSet,
}

impl InclusionFilter {
    pub fn compile(include: &[String], exclude: &[String]) -> LivesassResult<Self> {
        Ok(Self {
            include: PatternSet::compile(include)?,
            exclude: PatternSet::compile(exclude)?,
        })
    }

    /// Decide whether a `Full` file takes part in compilation.
    ///
    /// Three ordered short-circuit checks: the file must be under `base`,
    /// must match the include set, and must not match the exclude set.
    pub fn is_included(&self, path: &Path, base: &Path) -> bool {
        if path.strip_prefix(base).is_err() {
            return false;
        }
        if !self.include.matches(path, base) {
            return false;
        }
        !self.exclude.matches(path, base)
    }
}

/// Classify a path as `Full`, `Partial`, or `Irrelevant` against a
/// pre-compiled partial set.
///
/// A file is `Partial` when its base name starts with an underscore *or* it
/// matches any configured partial pattern; the two checks are additive.
/// Without a project root only the underscore convention applies.
pub fn classify_with(path: &Path, partials: &PatternSet, root: Option<&Path>) -> FileType {
    if !has_sass_extension(path) {
        return FileType::Irrelevant;
    }

    let underscore = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('_'))
        .unwrap_or(false);

    if underscore {
        return FileType::Partial;
    }

    if let Some(root) = root {
        if partials.matches(path, root) {
            return FileType::Partial;
        }
    }

    FileType::Full
}

/// One-shot form of [`classify_with`], compiling the partial patterns.
pub fn classify(
    path: &Path,
    partial_patterns: &[String],
    root: Option<&Path>,
) -> LivesassResult<FileType> {
    let partials = PatternSet::compile(partial_patterns)?;
    Ok(classify_with(path, &partials, root))
}

/// One-shot form of [`InclusionFilter::is_included`]. Callers deciding many
/// paths should compile the filter once instead.
pub fn is_included(
    path: &Path,
    include: &[String],
    exclude: &[String],
    base: &Path,
) -> LivesassResult<bool> {
    let filter = InclusionFilter::compile(include, exclude)?;
    Ok(filter.is_included(path, base))
}

/// Test a path against a set of glob patterns, relative to `root`.
pub fn matches_any(patterns: &[String], path: &Path, root: &Path) -> LivesassResult<bool> {
    Ok(PatternSet::compile(patterns)?.matches(path, root))
}

fn build_glob_set(patterns: &[String]) -> LivesassResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let stripped = pattern.trim_start_matches(['/', '\\']).to_lowercase();
        let glob = GlobBuilder::new(&stripped)
            .literal_separator(true)
            .case_insensitive(true)
            .build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Root-relative, `/`-separated, lowercased match key for a path.
fn relative_key(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn has_sass_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SASS_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
