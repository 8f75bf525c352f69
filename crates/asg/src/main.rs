//! asg: run JSON action trees against the desktop.
//!
//! `asg --config tree.json` executes one tree. The `processes`, `foreground`,
//! `position` and `validate` subcommands help author trees without running them.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

use asg_core::activation::{self, Strategy};
use asg_core::input::EnigoDriver;
use asg_core::platform::{create_platform, PlatformFactory};
use asg_core::settings::load_settings;
use asg_core::{Action, Config, EngineSettings, InputDriver, MouseButton, Runner};

#[derive(Parser)]
#[command(name = "asg", version, about = "Run desktop automation action trees")]
struct Cli {
    /// Action tree to execute once.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Engine settings file (defaults to asg-settings.json next to the binary).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List running applications as JSON.
    Processes,
    /// Report the foreground application and an `activate` action for it.
    Foreground {
        /// Seconds to wait first, to switch to the target window.
        #[arg(long, default_value_t = 0.0)]
        delay: f64,
        /// Identifier the generated action should use.
        #[arg(long, value_enum, default_value_t = By::Name)]
        by: By,
    },
    /// Print `move` + `click` actions for the pointer position after a delay.
    Position {
        /// Seconds to wait first, to put the pointer on the target.
        #[arg(long, visible_alias = "timeout", default_value_t = 3.0)]
        delay: f64,
        /// Button for the generated click.
        #[arg(long, default_value = "left", value_parser = parse_button)]
        button: MouseButton,
    },
    /// Parse a config and print its tree without executing it.
    Validate { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum By {
    Handle,
    Name,
    Bundle,
    Path,
}

impl From<By> for Strategy {
    fn from(by: By) -> Self {
        match by {
            By::Handle => Strategy::WindowHandle,
            By::Name => Strategy::ProcessName,
            By::Bundle => Strategy::BundleId,
            By::Path => Strategy::AppPath,
        }
    }
}

fn parse_button(s: &str) -> Result<MouseButton, String> {
    MouseButton::parse(s).ok_or_else(|| format!("unknown mouse button {s:?} (expected left, right, center)"))
}

// ── Platforms ─────────────────────────────────────────────────────────────

fn platform_factories() -> Vec<&'static PlatformFactory> {
    #[allow(unused_mut)]
    let mut factories: Vec<&'static PlatformFactory> = Vec::new();

    #[cfg(feature = "platform-macos")]
    factories.push(&asg_macos::macos_platform_factory);

    #[cfg(feature = "platform-windows")]
    factories.push(&asg_windows::windows_platform_factory);

    #[cfg(feature = "platform-linux")]
    factories.push(&asg_linux::linux_platform_factory);

    factories
}

// ── Commands ──────────────────────────────────────────────────────────────

fn run_config(path: &Path, settings: EngineSettings) -> ExitCode {
    let cfg = match Config::load(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut runner = match Runner::from_settings(settings, &platform_factories()) {
        Ok(runner) => runner,
        Err(e) => {
            log::error!("Fatal: {e:#}");
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let summary = runner.run(&cfg);
    if summary.failed > 0 {
        log::warn!("{} of {} action(s) failed", summary.failed, summary.attempted);
    }
    ExitCode::SUCCESS
}

fn list_processes(settings: &EngineSettings) -> Result<()> {
    let platform = create_platform(settings, &platform_factories());
    let processes = platform.running_processes()?;
    println!("{}", serde_json::to_string_pretty(&processes)?);
    Ok(())
}

fn foreground(settings: &EngineSettings, delay: f64, by: By) -> Result<()> {
    wait_secs(delay, "switch to the target window now")?;
    let platform = create_platform(settings, &platform_factories());
    let info = platform.foreground_process()?;
    println!("{}", serde_json::to_string_pretty(&info)?);

    let hints = activation::hints_for(&info, by.into())
        .or_else(|| {
            log::warn!("Foreground process has no {} identifier, using its name", Strategy::from(by));
            activation::hints_for(&info, Strategy::ProcessName)
        })
        .context("foreground process has no usable identifier")?;
    println!("{}", serde_json::to_string_pretty(&Action::Activate(hints))?);
    Ok(())
}

fn wait_secs(delay: f64, what: &str) -> Result<()> {
    if delay > 0.0 {
        let wait = Duration::try_from_secs_f64(delay).context("invalid --delay")?;
        log::info!("Waiting {delay}s, {what}");
        std::thread::sleep(wait);
    }
    Ok(())
}

/// Read the pointer and turn it into a `move` + `click` pair.
fn capture_position(driver: &mut dyn InputDriver, button: MouseButton) -> Result<Vec<Action>> {
    let (x, y) = driver.pointer_location()?;
    log::info!("Pointer at ({x}, {y})");
    Ok(vec![Action::Move { x, y }, Action::Click { button }])
}

fn position(settings: &EngineSettings, delay: f64, button: MouseButton) -> Result<()> {
    let mut driver = EnigoDriver::new(settings)?;
    wait_secs(delay, "put the pointer on the target now")?;
    let actions = capture_position(&mut driver, button)?;
    println!("{}", serde_json::to_string_pretty(&actions)?);
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let cfg = Config::load(path)?;
    println!("{}: {}", cfg.name, cfg.description);
    println!("{} node(s)", cfg.node_count());
    print!("{}", cfg.outline());
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────

/// Written next to the executable, alongside stderr.
const LOG_FILE: &str = "asg.log";

fn log_file_path() -> Option<PathBuf> {
    std::env::current_exe().ok()?.parent().map(|dir| dir.join(LOG_FILE))
}

/// Copies every formatted record to stderr and to the log file.
struct TeeWriter {
    file: std::fs::File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    if let Some(Ok(file)) = log_file_path().map(std::fs::File::create) {
        builder.target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
    }
    builder.init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    let settings = load_settings(cli.settings.as_deref());

    let result = match (cli.command, cli.config) {
        (Some(Command::Validate { path }), _) => validate(&path),
        (Some(Command::Processes), _) => list_processes(&settings),
        (Some(Command::Foreground { delay, by }), _) => foreground(&settings, delay, by),
        (Some(Command::Position { delay, button }), _) => position(&settings, delay, button),
        (None, Some(path)) => return run_config(&path, settings),
        (None, None) => {
            // The interactive editor is a separate front-end.
            let _ = Cli::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Fatal: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
