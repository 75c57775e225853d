//! Filesystem watching
//!
//! A subscription owns one notify watcher over the configured roots plus a
//! router thread draining its events. Classification and routing re-read
//! the config on every event, so edits to `livesass.toml` apply without a
//! restart. Each routed action runs on its own thread; overlapping
//! triggers are allowed and the job layer tolerates them.

mod event;

pub use event::{route, ChangeEvent, ChangeKind, RouteAction};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};

use crate::classifier;
use crate::config::Config;
use crate::error::{LivesassError, LivesassResult};
use crate::orchestrator::ConfigProvider;
use crate::report::{Event, Reporter};

/// Where routed compile actions land.
pub trait CompileSink: Send + Sync {
    fn trigger_compile_all(&self);
    fn trigger_compile_one(&self, path: &Path);
}

/// Handle to a live watch. Stopping (or dropping) signals the router
/// thread and joins it; no new compiles are triggered afterwards, but
/// already-spawned ones run to completion.
pub struct WatchSubscription {
    stop: Arc<AtomicBool>,
    router: Option<JoinHandle<()>>,
}

impl WatchSubscription {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.router.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WatchSubscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Events arriving this soon after subscribing are swallowed; editors and
/// the OS often replay stale events right after a watch is registered.
const STARTUP_COOLDOWN: Duration = Duration::from_millis(500);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Start watching `roots` and routing change events into `sink`.
pub fn subscribe(
    roots: Vec<PathBuf>,
    sink: Arc<dyn CompileSink>,
    config: Arc<dyn ConfigProvider>,
    reporter: Reporter,
) -> LivesassResult<WatchSubscription> {
    let (tx, rx) = mpsc::channel::<ChangeEvent>();

    let mut watcher =
        notify::recommended_watcher(move |result: Result<notify::Event, notify::Error>| {
            if let Ok(event) = result {
                if let Some(kind) = ChangeKind::from_notify(&event.kind) {
                    for path in event.paths {
                        let _ = tx.send(ChangeEvent { kind, path });
                    }
                }
            }
        })
        .map_err(|e| LivesassError::Watch(e.to_string()))?;

    for root in &roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| LivesassError::Watch(format!("{}: {e}", root.display())))?;
    }

    let stop = Arc::new(AtomicBool::new(false));
    let router_stop = Arc::clone(&stop);
    let router = thread::spawn(move || {
        // The OS watcher must stay alive as long as the router runs.
        let _watcher = watcher;

        let cooldown_end = Instant::now() + STARTUP_COOLDOWN;
        while Instant::now() < cooldown_end && !router_stop.load(Ordering::SeqCst) {
            if let Ok(event) = rx.recv_timeout(POLL_INTERVAL) {
                reporter.trace(&format!(
                    "discarding startup event for {}",
                    event.path.display()
                ));
            }
        }

        while !router_stop.load(Ordering::SeqCst) {
            let Ok(event) = rx.recv_timeout(POLL_INTERVAL) else {
                continue;
            };
            dispatch(&event, &roots, &sink, config.as_ref(), reporter);
        }
    });

    Ok(WatchSubscription {
        stop,
        router: Some(router),
    })
}

/// Classify and route one event, spawning a compile thread when it maps to
/// an action. Never faults: a bad event is logged and dropped.
fn dispatch(
    event: &ChangeEvent,
    roots: &[PathBuf],
    sink: &Arc<dyn CompileSink>,
    config: &dyn ConfigProvider,
    reporter: Reporter,
) {
    let root = roots
        .iter()
        .find(|root| event.path.starts_with(root))
        .map(|root| root.as_path());
    let cfg = config.load(root);

    let file_type = match classifier::classify(&event.path, &cfg.partials, root) {
        Ok(file_type) => file_type,
        Err(e) => {
            reporter.debug(&format!(
                "could not classify {}: {e}",
                event.path.display()
            ));
            return;
        }
    };

    match route(event, file_type) {
        RouteAction::Ignore => {}
        RouteAction::CompileAll => {
            reporter.emit(&Event::FileChanged {
                path: event.path.display().to_string(),
            });
            reporter.info(&format!(
                "Partial file change detected - {}",
                chrono::Local::now().format("%H:%M:%S")
            ));
            let sink = Arc::clone(sink);
            thread::spawn(move || sink.trigger_compile_all());
        }
        RouteAction::CompileOne(path) => {
            // Excluded files produce neither an event nor a compile.
            if let Some(root) = root {
                match inclusion_verdict(&cfg, root, &path) {
                    Ok(true) => {}
                    Ok(false) => {
                        reporter
                            .trace(&format!("excluded by configuration: {}", path.display()));
                        return;
                    }
                    Err(e) => {
                        reporter.debug(&format!("could not filter {}: {e}", path.display()));
                        return;
                    }
                }
            }
            reporter.emit(&Event::FileChanged {
                path: event.path.display().to_string(),
            });
            reporter.info(&format!(
                "File change detected - {}",
                chrono::Local::now().format("%H:%M:%S")
            ));
            let sink = Arc::clone(sink);
            thread::spawn(move || sink.trigger_compile_one(&path));
        }
    }
}

fn inclusion_verdict(config: &Config, root: &Path, path: &Path) -> LivesassResult<bool> {
    let base = config.effective_base(root)?;
    classifier::is_included(path, &config.include_patterns(), &config.exclude, &base)
}
