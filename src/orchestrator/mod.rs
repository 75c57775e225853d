//! Compile orchestration
//!
//! The orchestrator owns the watch/not-watch state and turns compile
//! requests into sets of jobs: discovered files × configured formats. All
//! jobs of one request are spawned together and joined together; outcomes
//! are aggregated into a single success flag that drives the status
//! indicator. Config is re-read from disk at every request, so edits to
//! `livesass.toml` apply without a restart.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use ignore::WalkBuilder;

use crate::aliases;
use crate::classifier::{self, FileType, InclusionFilter, PatternSet};
use crate::config::Config;
use crate::engine::{Compiler, Prefixer};
use crate::error::{LivesassError, LivesassResult};
use crate::jobs::{run_job, CompileJob, JobContext, JobOutcome, JobReport};
use crate::planner;
use crate::report::{Event, OutputLevel, Reporter, StatusState};
use crate::watcher::{self, CompileSink, WatchSubscription};

/// Source of configuration for a request. Swappable so tests can pin a
/// config without touching the filesystem.
pub trait ConfigProvider: Send + Sync {
    fn load(&self, root: Option<&Path>) -> Config;
}

/// Default provider: project `livesass.toml`, then the user config
/// directory, then built-in defaults, with environment overrides on top.
pub struct TomlConfigProvider;

impl ConfigProvider for TomlConfigProvider {
    fn load(&self, root: Option<&Path>) -> Config {
        Config::load_or_default(root)
    }
}

/// Discovery listing for one root, for the `files` command.
#[derive(Debug, Clone)]
pub struct RootListing {
    pub root: PathBuf,
    pub included: Vec<PathBuf>,
    pub partials: Vec<PathBuf>,
    pub excluded: Vec<PathBuf>,
}

/// Why one file would or would not compile, for the `explain` command.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub file_type: FileType,
    /// Inclusion verdict; only meaningful for full files under a root.
    pub included: Option<bool>,
}

/// How long a transient success/error status lingers before reverting to
/// the ambient watch state.
const REVERT_DELAY: Duration = Duration::from_secs(3);

pub struct Orchestrator<C: Compiler, P: Prefixer> {
    roots: Vec<PathBuf>,
    compiler: C,
    prefixer: P,
    config: Arc<dyn ConfigProvider>,
    reporter: Reporter,
    watching: Arc<AtomicBool>,
    subscription: Mutex<Option<WatchSubscription>>,
}

impl<C: Compiler, P: Prefixer> Orchestrator<C, P> {
    pub fn new(roots: Vec<PathBuf>, compiler: C, prefixer: P, reporter: Reporter) -> Self {
        Self {
            roots,
            compiler,
            prefixer,
            config: Arc::new(TomlConfigProvider),
            reporter,
            watching: Arc::new(AtomicBool::new(false)),
            subscription: Mutex::new(None),
        }
    }

    pub fn with_config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.config = provider;
        self
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    /// Compile every included file under every root. Returns true when all
    /// jobs succeeded.
    pub fn compile_all(&self) -> bool {
        self.reporter.status(StatusState::Working);
        let ok = match self.compile_all_inner() {
            Ok(ok) => ok,
            Err(e) => {
                self.reporter.error(&e.to_string());
                self.reporter.emit(&Event::Error {
                    message: e.to_string(),
                });
                false
            }
        };
        self.reporter.status(if ok {
            StatusState::Success
        } else {
            StatusState::Error
        });
        self.revert_ui_later();
        ok
    }

    fn compile_all_inner(&self) -> LivesassResult<bool> {
        let mut reports = Vec::new();
        for root in &self.roots {
            let config = self.config.load(Some(root));
            let files = self.discover(root, &config)?;
            self.reporter.emit(&Event::CompileStarted {
                files: files.iter().map(|f| f.display().to_string()).collect(),
            });
            reports.extend(self.run_request(Some(root), &config, &files));
        }
        Ok(self.finish_request(&reports))
    }

    /// Compile a single file. Partials, non-Sass files, and excluded files
    /// are skipped without counting as failures.
    pub fn compile_one(&self, path: &Path) -> bool {
        let root = self
            .roots
            .iter()
            .find(|root| path.starts_with(root))
            .cloned();
        let config = self.config.load(root.as_deref());

        match self.check_single(path, root.as_deref(), &config) {
            Ok(true) => {}
            Ok(false) => return true,
            Err(e) => {
                self.reporter.error(&e.to_string());
                self.reporter.emit(&Event::Error {
                    message: e.to_string(),
                });
                self.reporter.status(StatusState::Error);
                self.revert_ui_later();
                return false;
            }
        }

        self.reporter.status(StatusState::Working);
        self.reporter.emit(&Event::CompileStarted {
            files: vec![path.display().to_string()],
        });
        let files = [path.to_path_buf()];
        let reports = self.run_request(root.as_deref(), &config, &files);
        let ok = self.finish_request(&reports);
        self.reporter.status(if ok {
            StatusState::Success
        } else {
            StatusState::Error
        });
        self.revert_ui_later();
        ok
    }

    /// Gate for single-file compiles. Ok(false) means "valid to skip".
    fn check_single(
        &self,
        path: &Path,
        root: Option<&Path>,
        config: &Config,
    ) -> LivesassResult<bool> {
        match classifier::classify(path, &config.partials, root)? {
            FileType::Irrelevant => {
                self.reporter
                    .warn(&format!("not a Sass file: {}", path.display()));
                self.revert_ui_later();
                Ok(false)
            }
            FileType::Partial => {
                self.reporter.warn(&format!(
                    "cannot compile a partial on its own: {}",
                    path.display()
                ));
                self.revert_ui_later();
                Ok(false)
            }
            FileType::Full => {
                if let Some(root) = root {
                    let base = config.effective_base(root)?;
                    let include = config.include_patterns();
                    if !classifier::is_included(path, &include, &config.exclude, &base)? {
                        self.reporter
                            .trace(&format!("excluded by configuration: {}", path.display()));
                        self.revert_ui();
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Walk one root and return every compilable full file, sorted. The
    /// pattern sets are compiled once for the whole walk.
    fn discover(&self, root: &Path, config: &Config) -> LivesassResult<Vec<PathBuf>> {
        let base = config.effective_base(root)?;
        let partials = PatternSet::compile(&config.partials)?;
        let filter = InclusionFilter::compile(&config.include_patterns(), &config.exclude)?;

        let mut files = Vec::new();
        for path in self.walk_files(&base) {
            if classifier::classify_with(&path, &partials, Some(root)) != FileType::Full {
                continue;
            }
            if !filter.is_included(&path, &base) {
                continue;
            }
            files.push(path);
        }
        files.sort();
        Ok(files)
    }

    /// All regular files under `base`. Hidden files are visited; VCS
    /// ignore files are not consulted, exclusion is config-only.
    fn walk_files(&self, base: &Path) -> Vec<PathBuf> {
        let walk = WalkBuilder::new(base)
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(false)
            .build();

        let mut files = Vec::new();
        for entry in walk {
            match entry {
                Ok(entry) => {
                    if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    self.reporter
                        .debug(&format!("skipping unreadable entry: {e}"));
                }
            }
        }
        files
    }

    /// Fan one request out into jobs and join them all. Planning failures
    /// become per-job reports instead of aborting the request.
    fn run_request(
        &self,
        root: Option<&Path>,
        config: &Config,
        files: &[PathBuf],
    ) -> Vec<JobReport> {
        let formats = config.effective_formats();

        let mut reports = Vec::new();
        let mut jobs = Vec::new();
        for file in files {
            for format in &formats {
                match planner::plan(file, format, root) {
                    Ok(paths) => jobs.push(CompileJob {
                        source: file.clone(),
                        format: format.clone(),
                        paths,
                        generate_map: config.map_enabled(format),
                        include_sources: config.map_include_sources(format),
                    }),
                    Err(e) => {
                        let outcome = match e {
                            LivesassError::InvalidReplacement { .. } => {
                                JobOutcome::InvalidConfig(e.to_string())
                            }
                            other => JobOutcome::Unhandled(other.to_string()),
                        };
                        reports.push(JobReport {
                            source: file.clone(),
                            css_path: file.clone(),
                            outcome,
                            written: Vec::new(),
                        });
                    }
                }
            }
        }

        let resolver = |specifier: &str| {
            aliases::resolve(
                specifier,
                &config.path_aliases,
                &self.roots,
                config.root_is_workspace,
            )
        };
        let ctx = JobContext {
            compiler: &self.compiler,
            prefixer: &self.prefixer,
            autoprefix: &config.autoprefix,
            import_resolver: &resolver,
            logger: &self.reporter,
            load_paths: alias_load_paths(config, root),
        };

        let mut finished: Vec<JobReport> = thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|job| {
                    let ctx = &ctx;
                    scope.spawn(move || run_job(job, ctx))
                })
                .collect();
            handles
                .into_iter()
                .zip(jobs.iter())
                .map(|(handle, job)| {
                    handle.join().unwrap_or_else(|_| JobReport {
                        source: job.source.clone(),
                        css_path: job.paths.css.clone(),
                        outcome: JobOutcome::Unhandled("compile job panicked".to_string()),
                        written: Vec::new(),
                    })
                })
                .collect()
        });
        reports.append(&mut finished);
        reports
    }

    /// Log and emit every report; return the aggregate verdict.
    fn finish_request(&self, reports: &[JobReport]) -> bool {
        let mut failed = 0usize;
        for report in reports {
            let detail = match &report.outcome {
                JobOutcome::Success => None,
                JobOutcome::InvalidConfig(m) => Some(format!("invalid configuration: {m}")),
                JobOutcome::CompileError(m) => Some(format!("compilation error: {m}")),
                JobOutcome::PrefixError(m) => {
                    Some(format!("autoprefix error, output not saved: {m}"))
                }
                JobOutcome::Unhandled(m) => Some(format!("unexpected error: {m}")),
                JobOutcome::WriteError(failures) => Some(
                    failures
                        .iter()
                        .map(|f| format!("could not write {}: {}", f.path.display(), f.cause))
                        .collect::<Vec<_>>()
                        .join("; "),
                ),
            };
            self.reporter.emit(&Event::JobFinished {
                source: report.source.display().to_string(),
                css: report.css_path.display().to_string(),
                success: report.is_success(),
                detail: detail.clone(),
            });
            match detail {
                None => self
                    .reporter
                    .info(&format!("Generated: {}", report.css_path.display())),
                Some(detail) => {
                    failed += 1;
                    self.reporter.log_details(
                        OutputLevel::Error,
                        &report.source.display().to_string(),
                        &[detail],
                    );
                }
            }
        }
        let succeeded = reports.len() - failed;
        self.reporter
            .emit(&Event::CompileComplete { succeeded, failed });
        failed == 0
    }

    /// List every Sass file under every root with its discovery verdict.
    pub fn list_files(&self) -> LivesassResult<Vec<RootListing>> {
        let mut listings = Vec::new();
        for root in &self.roots {
            let config = self.config.load(Some(root));
            let base = config.effective_base(root)?;
            let partials = PatternSet::compile(&config.partials)?;
            let filter = InclusionFilter::compile(&config.include_patterns(), &config.exclude)?;

            let mut listing = RootListing {
                root: root.clone(),
                included: Vec::new(),
                partials: Vec::new(),
                excluded: Vec::new(),
            };
            for path in self.walk_files(&base) {
                match classifier::classify_with(&path, &partials, Some(root)) {
                    FileType::Irrelevant => {}
                    FileType::Partial => listing.partials.push(path),
                    FileType::Full => {
                        if filter.is_included(&path, &base) {
                            listing.included.push(path);
                        } else {
                            listing.excluded.push(path);
                        }
                    }
                }
            }
            listing.included.sort();
            listing.partials.sort();
            listing.excluded.sort();
            listings.push(listing);
        }
        Ok(listings)
    }

    /// Classify one path and report its inclusion verdict.
    pub fn explain(&self, path: &Path) -> LivesassResult<Explanation> {
        let root = self
            .roots
            .iter()
            .find(|root| path.starts_with(root))
            .map(|root| root.as_path());
        let config = self.config.load(root);
        let file_type = classifier::classify(path, &config.partials, root)?;

        let included = match (file_type, root) {
            (FileType::Full, Some(root)) => {
                let base = config.effective_base(root)?;
                let include = config.include_patterns();
                Some(classifier::is_included(
                    path,
                    &include,
                    &config.exclude,
                    &base,
                )?)
            }
            _ => None,
        };

        Ok(Explanation {
            file_type,
            included,
        })
    }

    fn revert_ui(&self) {
        let state = if self.is_watching() {
            StatusState::Watching
        } else {
            StatusState::NotWatching
        };
        self.reporter.status(state);
    }

    /// Advisory revert: the status returns to the ambient watch state
    /// after a pause, unless another request has taken over by then.
    fn revert_ui_later(&self) {
        let watching = Arc::clone(&self.watching);
        let reporter = self.reporter;
        thread::spawn(move || {
            thread::sleep(REVERT_DELAY);
            let state = if watching.load(Ordering::SeqCst) {
                StatusState::Watching
            } else {
                StatusState::NotWatching
            };
            reporter.status(state);
        });
    }
}

impl<C: Compiler + 'static, P: Prefixer + 'static> Orchestrator<C, P> {
    /// Enter the watching state. Idempotent: a second call while watching
    /// only refreshes the status indicator.
    pub fn start_watching(self: &Arc<Self>) -> LivesassResult<()> {
        {
            let mut slot = self
                .subscription
                .lock()
                .map_err(|_| LivesassError::Watch("watch state poisoned".to_string()))?;
            if slot.is_some() {
                self.revert_ui();
                return Ok(());
            }
            let subscription = watcher::subscribe(
                self.roots.clone(),
                Arc::clone(self) as Arc<dyn CompileSink>,
                Arc::clone(&self.config),
                self.reporter,
            )?;
            *slot = Some(subscription);
            self.watching.store(true, Ordering::SeqCst);
        }
        self.reporter.emit(&Event::WatchStarted {
            roots: self.roots.iter().map(|r| r.display().to_string()).collect(),
        });

        let first_root = self.roots.first().map(|r| r.as_path());
        if self.config.load(first_root).compile_on_watch {
            self.compile_all();
        } else {
            self.revert_ui();
        }
        Ok(())
    }

    /// Leave the watching state. Idempotent: stopping while not watching
    /// only refreshes the status indicator.
    pub fn stop_watching(&self) {
        let subscription = self
            .subscription
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        self.watching.store(false, Ordering::SeqCst);
        if let Some(subscription) = subscription {
            subscription.stop();
            self.reporter.emit(&Event::WatchStopped);
        }
        self.revert_ui();
    }
}

impl<C: Compiler, P: Prefixer> CompileSink for Orchestrator<C, P> {
    fn trigger_compile_all(&self) {
        self.compile_all();
    }

    fn trigger_compile_one(&self, path: &Path) {
        self.compile_one(path);
    }
}

/// Alias replacement directories, for engines that resolve imports
/// out-of-process. Leading `/` means root-relative, as in the resolver.
fn alias_load_paths(config: &Config, root: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for replacement in config.path_aliases.values() {
        let candidate = match (replacement.strip_prefix('/'), root) {
            (Some(relative), Some(root)) => root.join(relative),
            _ => PathBuf::from(replacement),
        };
        if candidate.is_dir() && !paths.contains(&candidate) {
            paths.push(candidate);
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CompileFault, CompileOptions, CompileOutput, PrefixFault, PrefixOutput};
    use tempfile::tempdir;

    struct StaticProvider(Config);

    impl ConfigProvider for StaticProvider {
        fn load(&self, _root: Option<&Path>) -> Config {
            self.0.clone()
        }
    }

    struct PassCompiler;

    impl Compiler for PassCompiler {
        fn compile(
            &self,
            source: &Path,
            _options: &CompileOptions<'_>,
        ) -> Result<CompileOutput, CompileFault> {
            Ok(CompileOutput {
                css: format!("/* from {} */", source.display()),
                source_map: None,
            })
        }
    }

    /// Fails any source whose file name contains "bad".
    struct PickyCompiler;

    impl Compiler for PickyCompiler {
        fn compile(
            &self,
            source: &Path,
            _options: &CompileOptions<'_>,
        ) -> Result<CompileOutput, CompileFault> {
            let name = source.file_name().unwrap_or_default().to_string_lossy();
            if name.contains("bad") {
                Err(CompileFault {
                    message: format!("syntax error in {name}"),
                })
            } else {
                Ok(CompileOutput {
                    css: String::new(),
                    source_map: None,
                })
            }
        }
    }

    struct NoopPrefixer;

    impl Prefixer for NoopPrefixer {
        fn prefix(
            &self,
            css: &str,
            map: Option<&str>,
            _css_path: &Path,
            _targets: &crate::config::AutoprefixSetting,
            _generate_map: bool,
        ) -> Result<PrefixOutput, PrefixFault> {
            Ok(PrefixOutput {
                css: css.to_string(),
                map: map.map(|m| m.to_string()),
            })
        }
    }

    fn quiet() -> Reporter {
        Reporter::new(OutputLevel::Error, false)
    }

    fn pinned(config: Config) -> Arc<dyn ConfigProvider> {
        Arc::new(StaticProvider(config))
    }

    #[test]
    fn compile_all_builds_every_included_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.scss"), "").unwrap();
        std::fs::write(dir.path().join("b.sass"), "").unwrap();
        std::fs::write(dir.path().join("_partial.scss"), "").unwrap();
        std::fs::write(dir.path().join("readme.md"), "").unwrap();

        let config = Config {
            generate_map: false,
            ..Config::default()
        };
        let orchestrator = Orchestrator::new(
            vec![dir.path().to_path_buf()],
            PassCompiler,
            NoopPrefixer,
            quiet(),
        )
        .with_config_provider(pinned(config));

        assert!(orchestrator.compile_all());
        assert!(dir.path().join("a.css").exists());
        assert!(dir.path().join("b.css").exists());
        assert!(!dir.path().join("_partial.css").exists());
    }

    #[test]
    fn one_failing_file_fails_the_request_but_not_its_siblings() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.scss"), "").unwrap();
        std::fs::write(dir.path().join("bad.scss"), "").unwrap();
        std::fs::write(dir.path().join("c.scss"), "").unwrap();

        let config = Config {
            generate_map: false,
            ..Config::default()
        };
        let orchestrator = Orchestrator::new(
            vec![dir.path().to_path_buf()],
            PickyCompiler,
            NoopPrefixer,
            quiet(),
        )
        .with_config_provider(pinned(config));

        assert!(!orchestrator.compile_all());
        assert!(dir.path().join("a.css").exists());
        assert!(dir.path().join("c.css").exists());
        assert!(!dir.path().join("bad.css").exists());
    }

    #[test]
    fn compile_one_skips_partials_without_failing() {
        let dir = tempdir().unwrap();
        let partial = dir.path().join("_mixins.scss");
        std::fs::write(&partial, "").unwrap();

        let orchestrator = Orchestrator::new(
            vec![dir.path().to_path_buf()],
            PassCompiler,
            NoopPrefixer,
            quiet(),
        )
        .with_config_provider(pinned(Config::default()));

        assert!(orchestrator.compile_one(&partial));
        assert!(!dir.path().join("_mixins.css").exists());
    }

    #[test]
    fn excluded_file_is_skipped_on_single_compile() {
        let dir = tempdir().unwrap();
        let vendored = dir.path().join("node_modules");
        std::fs::create_dir_all(&vendored).unwrap();
        let file = vendored.join("lib.scss");
        std::fs::write(&file, "").unwrap();

        let orchestrator = Orchestrator::new(
            vec![dir.path().to_path_buf()],
            PassCompiler,
            NoopPrefixer,
            quiet(),
        )
        .with_config_provider(pinned(Config::default()));

        assert!(orchestrator.compile_one(&file));
        assert!(!vendored.join("lib.css").exists());
    }

    #[test]
    fn watch_transitions_are_idempotent() {
        let dir = tempdir().unwrap();
        let config = Config {
            compile_on_watch: false,
            ..Config::default()
        };
        let orchestrator = Arc::new(
            Orchestrator::new(
                vec![dir.path().to_path_buf()],
                PassCompiler,
                NoopPrefixer,
                quiet(),
            )
            .with_config_provider(pinned(config)),
        );

        assert!(!orchestrator.is_watching());
        orchestrator.start_watching().unwrap();
        assert!(orchestrator.is_watching());
        orchestrator.start_watching().unwrap();
        assert!(orchestrator.is_watching());

        orchestrator.stop_watching();
        assert!(!orchestrator.is_watching());
        orchestrator.stop_watching();
        assert!(!orchestrator.is_watching());
    }

    #[test]
    fn list_files_partitions_by_verdict() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.scss"), "").unwrap();
        std::fs::write(dir.path().join("_p.scss"), "").unwrap();
        let vendored = dir.path().join("node_modules");
        std::fs::create_dir_all(&vendored).unwrap();
        std::fs::write(vendored.join("lib.scss"), "").unwrap();

        let orchestrator = Orchestrator::new(
            vec![dir.path().to_path_buf()],
            PassCompiler,
            NoopPrefixer,
            quiet(),
        )
        .with_config_provider(pinned(Config::default()));

        let listings = orchestrator.list_files().unwrap();
        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.included, vec![dir.path().join("a.scss")]);
        assert_eq!(listing.partials, vec![dir.path().join("_p.scss")]);
        assert_eq!(listing.excluded, vec![vendored.join("lib.scss")]);
    }

    #[test]
    fn explain_reports_type_and_inclusion() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.scss");
        std::fs::write(&file, "").unwrap();

        let orchestrator = Orchestrator::new(
            vec![dir.path().to_path_buf()],
            PassCompiler,
            NoopPrefixer,
            quiet(),
        )
        .with_config_provider(pinned(Config::default()));

        let explanation = orchestrator.explain(&file).unwrap();
        assert_eq!(explanation.file_type, FileType::Full);
        assert_eq!(explanation.included, Some(true));

        let outside = orchestrator.explain(Path::new("/elsewhere/b.scss")).unwrap();
        assert_eq!(outside.included, None);
    }
}
