//! Compile jobs
//!
//! One job is one (source file × format) unit of work with a single
//! outcome. Jobs are created fresh per compile request and never reused.
//! A job's failures stay inside its [`JobReport`]; nothing here returns
//! `Err` past the job boundary.

use std::path::{Component, Path, PathBuf};

use crate::config::{AutoprefixSetting, FormatSpec};
use crate::engine::{
    CompileOptions, Compiler, CompilerLog, ImportResolver, PrefixFault, Prefixer,
};
use crate::planner::PlannedPaths;

/// One (source file × format) unit of compilation work. The map flags are
/// resolved at job creation (per-format override beats the global).
#[derive(Debug, Clone)]
pub struct CompileJob {
    pub source: PathBuf,
    pub format: FormatSpec,
    pub paths: PlannedPaths,
    pub generate_map: bool,
    pub include_sources: bool,
}

/// A single output file that failed to write.
#[derive(Debug, Clone)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub cause: String,
}

/// Outcome of one job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Success,
    /// Planning was aborted by a configuration problem.
    InvalidConfig(String),
    /// The compiler rejected the input; nothing was written.
    CompileError(String),
    /// Malformed browser targets; nothing was written.
    PrefixError(String),
    /// Unexpected failure (prefixer internals, panicked job).
    Unhandled(String),
    /// One or more output files failed to write. Sibling files that wrote
    /// successfully are in `JobReport::written`.
    WriteError(Vec<WriteFailure>),
}

/// Per-job result, with everything the reporter needs for context.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub source: PathBuf,
    pub css_path: PathBuf,
    pub outcome: JobOutcome,
    pub written: Vec<PathBuf>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Success)
    }

    fn failed(job: &CompileJob, outcome: JobOutcome) -> Self {
        Self {
            source: job.source.clone(),
            css_path: job.paths.css.clone(),
            outcome,
            written: Vec::new(),
        }
    }
}

/// Everything a job needs from the request that spawned it.
pub struct JobContext<'a> {
    pub compiler: &'a dyn Compiler,
    pub prefixer: &'a dyn Prefixer,
    pub autoprefix: &'a AutoprefixSetting,
    pub import_resolver: ImportResolver<'a>,
    pub logger: &'a dyn CompilerLog,
    pub load_paths: Vec<PathBuf>,
}

/// Run one job to completion: compile, prefix, then write the artifacts.
pub fn run_job(job: &CompileJob, ctx: &JobContext<'_>) -> JobReport {
    let options = CompileOptions {
        style: job.format.style,
        source_map: job.generate_map,
        source_map_include_sources: job.include_sources,
        import_resolver: ctx.import_resolver,
        logger: ctx.logger,
        load_paths: ctx.load_paths.clone(),
    };

    let output = match ctx.compiler.compile(&job.source, &options) {
        Ok(output) => output,
        Err(fault) => return JobReport::failed(job, JobOutcome::CompileError(fault.message)),
    };

    let mut css = output.css;
    let mut map_text = match output.source_map {
        Some(mut map) => {
            rewrite_map_sources(&mut map, &job.paths.css);
            match serde_json::to_string(&map) {
                Ok(text) => Some(text),
                Err(e) => {
                    return JobReport::failed(
                        job,
                        JobOutcome::Unhandled(format!("failed to serialize source map: {e}")),
                    )
                }
            }
        }
        None => None,
    };

    if ctx.autoprefix.is_enabled() {
        match ctx.prefixer.prefix(
            &css,
            map_text.as_deref(),
            &job.paths.css,
            ctx.autoprefix,
            job.generate_map,
        ) {
            Ok(prefixed) => {
                css = prefixed.css;
                map_text = prefixed.map;
            }
            Err(PrefixFault::InvalidTargets(message)) => {
                return JobReport::failed(job, JobOutcome::PrefixError(message));
            }
            Err(PrefixFault::Other(message)) => {
                return JobReport::failed(job, JobOutcome::Unhandled(message));
            }
        }
    }

    let mut written = Vec::new();
    let mut failures = Vec::new();

    let write_map = job.generate_map && map_text.is_some();
    if write_map {
        if let Some(name) = job.paths.map.file_name() {
            css.push_str(&format!(
                "/*# sourceMappingURL={} */",
                name.to_string_lossy()
            ));
        }
    }

    if write_map {
        let map_text = map_text.unwrap_or_default();
        write_output(&job.paths.map, &map_text, &mut written, &mut failures);
    }
    write_output(&job.paths.css, &css, &mut written, &mut failures);

    let outcome = if failures.is_empty() {
        JobOutcome::Success
    } else {
        JobOutcome::WriteError(failures)
    };

    JobReport {
        source: job.source.clone(),
        css_path: job.paths.css.clone(),
        outcome,
        written,
    }
}

/// Write one output file, recording the result instead of short-circuiting
/// so a failed map write never blocks the CSS write (and vice versa).
fn write_output(
    path: &Path,
    content: &str,
    written: &mut Vec<PathBuf>,
    failures: &mut Vec<WriteFailure>,
) {
    let result = path
        .parent()
        .map(std::fs::create_dir_all)
        .unwrap_or(Ok(()))
        .and_then(|_| std::fs::write(path, content));

    match result {
        Ok(()) => written.push(path.to_path_buf()),
        Err(e) => failures.push(WriteFailure {
            path: path.to_path_buf(),
            cause: e.to_string(),
        }),
    }
}

/// Rewrite a source map's `sources` entries to be relative to the CSS
/// file's directory.
fn rewrite_map_sources(map: &mut serde_json::Value, css_path: &Path) {
    let Some(css_dir) = css_path.parent() else {
        return;
    };
    let Some(sources) = map.get_mut("sources").and_then(|s| s.as_array_mut()) else {
        return;
    };

    for source in sources {
        let Some(text) = source.as_str() else { continue };
        let path_text = text.strip_prefix("file://").unwrap_or(text);
        let path = Path::new(path_text);
        if !path.is_absolute() {
            continue;
        }
        let relative = relative_to(css_dir, path);
        *source = serde_json::Value::String(relative.to_string_lossy().replace('\\', "/"));
    }
}

/// Compute `target` relative to `base` without touching the filesystem.
fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base_components: Vec<Component> = base.components().collect();
    let target_components: Vec<Component> = target.components().collect();

    let common = base_components
        .iter()
        .zip(target_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &target_components[common..] {
        relative.push(component);
    }
    relative
}
