//! Output surface
//!
//! One `Reporter` carries the leveled stderr log, the NDJSON event stream
//! (`--json` mode), and the single status indicator. Per-file compile
//! detail goes through the log stream; only aggregate state goes through
//! the status indicator.

use is_terminal::IsTerminal;
use serde::Serialize;

use crate::config::Verbosity;
use crate::engine::CompilerLog;

/// Log level filter, lowest to highest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<Verbosity> for OutputLevel {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Quiet => OutputLevel::Error,
            Verbosity::Normal => OutputLevel::Info,
            Verbosity::Verbose => OutputLevel::Debug,
            Verbosity::Debug => OutputLevel::Trace,
        }
    }
}

/// The status indicator's states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    NotWatching,
    Watching,
    Working,
    Success,
    Error,
}

/// Event types for NDJSON output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    WatchStarted { roots: Vec<String> },
    WatchStopped,
    FileChanged { path: String },
    CompileStarted { files: Vec<String> },
    JobFinished {
        source: String,
        css: String,
        success: bool,
        detail: Option<String>,
    },
    CompileComplete { succeeded: usize, failed: usize },
    Status { state: StatusState },
    Error { message: String },
}

impl Event {
    /// Convert to a JSON line, never panicking on serializer failure.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"event\":\"error\"}".to_string())
    }
}

/// Shared output handle. Cheap to copy across job threads.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    level: OutputLevel,
    json: bool,
    color: bool,
}

impl Reporter {
    pub fn new(level: OutputLevel, json: bool) -> Self {
        Self {
            level,
            json,
            color: !json && std::io::stderr().is_terminal(),
        }
    }

    pub fn json_mode(&self) -> bool {
        self.json
    }

    fn enabled(&self, level: OutputLevel) -> bool {
        level >= self.level
    }

    /// Emit one log line (stderr), honouring the level filter.
    pub fn log(&self, level: OutputLevel, message: &str) {
        if self.json || !self.enabled(level) {
            return;
        }
        match level {
            OutputLevel::Error if self.color => eprintln!("\x1b[31merror\x1b[0m: {message}"),
            OutputLevel::Error => eprintln!("error: {message}"),
            OutputLevel::Warn if self.color => eprintln!("\x1b[33mwarning\x1b[0m: {message}"),
            OutputLevel::Warn => eprintln!("warning: {message}"),
            _ => eprintln!("{message}"),
        }
    }

    /// Log a title line followed by indented detail lines.
    pub fn log_details(&self, level: OutputLevel, title: &str, details: &[String]) {
        if self.json || !self.enabled(level) {
            return;
        }
        self.log(level, title);
        for detail in details {
            eprintln!("  {detail}");
        }
    }

    pub fn trace(&self, message: &str) {
        self.log(OutputLevel::Trace, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(OutputLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(OutputLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(OutputLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(OutputLevel::Error, message);
    }

    /// Emit a structured event (stdout, `--json` mode only).
    pub fn emit(&self, event: &Event) {
        if self.json {
            println!("{}", event.to_json());
        }
    }

    /// Push the status indicator to a new state.
    pub fn status(&self, state: StatusState) {
        self.emit(&Event::Status { state });
        let label = match state {
            StatusState::NotWatching => "not watching",
            StatusState::Watching => "watching...",
            StatusState::Working => "working...",
            StatusState::Success => "success",
            StatusState::Error => "error",
        };
        self.log(OutputLevel::Info, &format!("[{label}]"));
    }
}

impl CompilerLog for Reporter {
    fn warn(&self, message: &str, location: Option<&str>) {
        match location {
            Some(loc) => self.log_details(
                OutputLevel::Warn,
                message,
                &[loc.to_string()],
            ),
            None => self.warn(message),
        }
    }

    fn debug(&self, message: &str, location: Option<&str>) {
        match location {
            Some(loc) => self.log_details(
                OutputLevel::Debug,
                message,
                &[loc.to_string()],
            ),
            None => self.debug(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_uses_snake_case_tags() {
        let event = Event::CompileComplete {
            succeeded: 2,
            failed: 1,
        };
        let json = event.to_json();
        assert!(json.contains("\"event\":\"compile_complete\""));
        assert!(json.contains("\"succeeded\":2"));
    }

    #[test]
    fn status_event_serializes_state() {
        let event = Event::Status {
            state: StatusState::Watching,
        };
        assert!(event.to_json().contains("\"state\":\"watching\""));
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(OutputLevel::from(Verbosity::Quiet), OutputLevel::Error);
        assert_eq!(OutputLevel::from(Verbosity::Debug), OutputLevel::Trace);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(OutputLevel::Error > OutputLevel::Warn);
        assert!(OutputLevel::Warn > OutputLevel::Info);
        assert!(OutputLevel::Info > OutputLevel::Debug);
    }
}
