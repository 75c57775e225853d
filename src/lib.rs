//! Livesass - Sass/SCSS watch-and-compile tool
//!
//! Livesass watches project directories for Sass changes and keeps the
//! compiled CSS (and source maps) up to date: files are classified and
//! filtered, output paths are planned per configured format, and compile
//! jobs run through pluggable compiler/prefixer engines.

pub mod aliases;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod orchestrator;
pub mod planner;
pub mod report;
pub mod watcher;

// Re-exports for convenience
pub use classifier::{classify, is_included, FileType};
pub use config::{AutoprefixSetting, Config, FormatSpec, OutputStyle, Verbosity};
pub use engine::{AutoprefixerCli, Compiler, Prefixer, SassCli};
pub use error::{LivesassError, LivesassResult};
pub use jobs::{CompileJob, JobOutcome, JobReport};
pub use orchestrator::{ConfigProvider, Explanation, Orchestrator, RootListing};
pub use planner::{plan, PlannedPaths};
pub use report::{Event, OutputLevel, Reporter, StatusState};
pub use watcher::{route, ChangeEvent, ChangeKind, CompileSink, RouteAction};
