//! Livesass CLI - Sass/SCSS watch-and-compile tool
//!
//! Usage: livesass <COMMAND>
//!
//! Commands:
//!   compile  Compile every included file once (or one file)
//!   watch    Watch for changes and compile continuously
//!   files    List discovered files and their verdicts
//!   explain  Show how one file is classified and filtered

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use livesass::classifier::FileType;
use livesass::config::Config;
use livesass::engine::{AutoprefixerCli, SassCli};
use livesass::orchestrator::Orchestrator;
use livesass::report::{OutputLevel, Reporter};

/// Livesass - Sass/SCSS watch-and-compile tool
#[derive(Parser, Debug)]
#[command(name = "livesass")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit NDJSON events on stdout
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile every included file once, or just FILE
    Compile {
        /// Compile only this file
        file: Option<PathBuf>,

        /// Project root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// Watch for changes and compile continuously
    Watch {
        /// Project root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// List discovered files and their inclusion verdicts
    Files {
        /// Project root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// Show how one file is classified and whether it would compile
    Explain {
        /// File to explain
        file: PathBuf,

        /// Project root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file, root } => cmd_compile(file, &root, cli.json, cli.verbose),
        Commands::Watch { root } => cmd_watch(&root, cli.json, cli.verbose),
        Commands::Files { root } => cmd_files(&root, cli.json, cli.verbose),
        Commands::Explain { file, root } => cmd_explain(&file, &root, cli.json, cli.verbose),
    }
}

fn output_level(root: &Path, verbose: u8) -> OutputLevel {
    match verbose {
        0 => OutputLevel::from(Config::load_or_default(Some(root)).output.verbosity),
        1 => OutputLevel::Debug,
        _ => OutputLevel::Trace,
    }
}

/// Build the production orchestrator over a canonicalized root.
/// `check_engines` gates the external-tool probes; read-only commands
/// work without sass installed.
fn build(
    root: &Path,
    json: bool,
    verbose: u8,
    check_engines: bool,
) -> Result<Orchestrator<SassCli, AutoprefixerCli>> {
    let root = std::fs::canonicalize(root)
        .map_err(|e| anyhow::anyhow!("project root {}: {e}", root.display()))?;
    let reporter = Reporter::new(output_level(&root, verbose), json);
    report_config_warnings(&root, &reporter);

    let compiler = SassCli::new();
    let prefixer = AutoprefixerCli::new();
    if check_engines {
        if !compiler.check_available() {
            anyhow::bail!("the `sass` executable was not found on PATH; install dart-sass first");
        }
        if Config::load_or_default(Some(&root)).autoprefix.is_enabled()
            && !prefixer.check_available()
        {
            reporter.warn("autoprefix is enabled but `npx` was not found; prefixing will fail");
        }
    }

    Ok(Orchestrator::new(vec![root], compiler, prefixer, reporter))
}

/// Warn about unknown keys (and outright parse failures) in the project
/// config file. Loading elsewhere silently falls back to defaults.
fn report_config_warnings(root: &Path, reporter: &Reporter) {
    let config_path = root.join("livesass.toml");
    if !config_path.exists() {
        return;
    }
    match Config::load_with_warnings(&config_path) {
        Ok((_, warnings)) => {
            for warning in warnings {
                let line = warning
                    .line
                    .map(|l| format!(" (line {l})"))
                    .unwrap_or_default();
                match &warning.suggestion {
                    Some(suggestion) => reporter.warn(&format!(
                        "unknown config key `{}`{line}; did you mean `{suggestion}`?",
                        warning.key
                    )),
                    None => reporter.warn(&format!("unknown config key `{}`{line}", warning.key)),
                }
            }
        }
        Err(e) => reporter.warn(&e.to_string()),
    }
}

fn cmd_compile(file: Option<PathBuf>, root: &Path, json: bool, verbose: u8) -> Result<()> {
    let orchestrator = build(root, json, verbose, true)?;

    let ok = match file {
        Some(file) => {
            let file = std::fs::canonicalize(&file)
                .map_err(|e| anyhow::anyhow!("{}: {e}", file.display()))?;
            orchestrator.compile_one(&file)
        }
        None => orchestrator.compile_all(),
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_watch(root: &Path, json: bool, verbose: u8) -> Result<()> {
    let orchestrator = Arc::new(build(root, json, verbose, true)?);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })?;

    if !json {
        orchestrator.reporter().info("Press Ctrl+C to stop");
    }
    orchestrator.start_watching()?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    orchestrator.stop_watching();
    Ok(())
}

fn cmd_files(root: &Path, json: bool, verbose: u8) -> Result<()> {
    let orchestrator = build(root, json, verbose, false)?;
    let listings = orchestrator.list_files()?;

    if json {
        for listing in &listings {
            let value = serde_json::json!({
                "event": "files",
                "root": listing.root.display().to_string(),
                "included": path_strings(&listing.included),
                "partials": path_strings(&listing.partials),
                "excluded": path_strings(&listing.excluded),
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    } else {
        for listing in &listings {
            println!("{}", listing.root.display());
            for path in &listing.included {
                println!("  compile  {}", path.display());
            }
            for path in &listing.partials {
                println!("  partial  {}", path.display());
            }
            for path in &listing.excluded {
                println!("  exclude  {}", path.display());
            }
        }
    }
    Ok(())
}

fn cmd_explain(file: &Path, root: &Path, json: bool, verbose: u8) -> Result<()> {
    let orchestrator = build(root, json, verbose, false)?;
    let file = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    let explanation = orchestrator.explain(&file)?;

    let kind = match explanation.file_type {
        FileType::Full => "full",
        FileType::Partial => "partial",
        FileType::Irrelevant => "irrelevant",
    };

    if json {
        let value = serde_json::json!({
            "event": "explain",
            "file": file.display().to_string(),
            "type": kind,
            "included": explanation.included,
        });
        println!("{}", serde_json::to_string(&value)?);
    } else {
        match explanation.file_type {
            FileType::Full => println!("{}: full stylesheet", file.display()),
            FileType::Partial => {
                println!("{}: partial, compiled only via importers", file.display())
            }
            FileType::Irrelevant => println!("{}: not a Sass file", file.display()),
        }
        match explanation.included {
            Some(true) => println!("  would compile"),
            Some(false) => println!("  excluded by include/exclude patterns"),
            None => {}
        }
    }
    Ok(())
}

fn path_strings(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}
