//! Order of the steps behind process-name activation on Windows.
//!
//! The steps themselves need Win32 and UI Automation; the order does not,
//! so it lives here and is tested on every host.

use std::path::Path;

use anyhow::Context;
use asg_core::process::{self, ProcessInfo};

pub trait NameSteps {
    /// Focus the process's main window handle.
    fn activate_main_window(&self, name: &str) -> anyhow::Result<()>;
    /// Running processes, for pid and executable lookups.
    fn running(&self) -> Vec<ProcessInfo>;
    /// `Start-Process` by name, for targets that are not running.
    fn start_by_name(&self, name: &str) -> anyhow::Result<()>;
    /// Focus the first visible top-level window owned by `pid`.
    fn focus_top_level_window(&self, pid: u32) -> anyhow::Result<()>;
    /// Start the executable directly.
    fn launch(&self, path: &Path) -> anyhow::Result<()>;
}

/// Main window, then (if not running) start by name, then each matching
/// pid's top-level windows, then relaunch from the executable path.
pub fn activate_by_name(steps: &dyn NameSteps, name: &str) -> anyhow::Result<()> {
    match steps.activate_main_window(name) {
        Ok(()) => return Ok(()),
        Err(e) => log::debug!("Main window lookup for {name:?} failed: {e:#}"),
    }

    let processes = steps.running();
    let matches = process::find_by_name(&processes, name);
    if matches.is_empty() {
        log::debug!("{name:?} is not running, starting it");
        return steps.start_by_name(name);
    }

    for pid in matches.iter().filter_map(|p| p.pid) {
        match steps.focus_top_level_window(pid) {
            Ok(()) => return Ok(()),
            Err(e) => log::debug!("Window enumeration for pid {pid} failed: {e:#}"),
        }
    }

    let path = matches
        .iter()
        .find_map(|p| p.path.as_deref())
        .with_context(|| format!("{name:?} has no visible window and no known executable path"))?;
    steps.launch(path)
}
