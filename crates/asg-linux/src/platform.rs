//! Linux/X11 window platform driven by the `xdotool` binary.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::Context;
use asg_core::keys::Chord;
use asg_core::platform::{launch_detached, PlatformError, WindowPlatform};
use asg_core::process::{self, ProcessInfo, WindowHandle};
use asg_core::script::{self, ScriptOutput};
use asg_core::EngineSettings;

use crate::name_chain::{self, NameSteps};
use crate::xdotool;

pub struct X11Platform {
    timeout: Duration,
}

impl X11Platform {
    pub fn new(settings: &EngineSettings) -> anyhow::Result<Self> {
        let platform = Self { timeout: settings.script_timeout() };
        platform
            .xdotool(&["version"])
            .context("xdotool is required for window activation on Linux")?;
        Ok(platform)
    }

    fn xdotool(&self, args: &[&str]) -> anyhow::Result<ScriptOutput> {
        let mut cmd = Command::new("xdotool");
        cmd.args(args);
        let out = script::run(cmd, self.timeout)?;
        if !out.success {
            anyhow::bail!("xdotool {} failed: {}", args.join(" "), out.stderr.trim());
        }
        Ok(out)
    }

    fn window_for_pid(&self, pid: u32) -> anyhow::Result<WindowHandle> {
        let pid = pid.to_string();
        let out = self.xdotool(&["search", "--onlyvisible", "--pid", &pid])?;
        xdotool::parse_window_id(out.text()).with_context(|| format!("no visible window for pid {pid}"))
    }
}

impl NameSteps for X11Platform {
    fn running(&self) -> Vec<ProcessInfo> {
        process::running_processes()
    }

    fn focus_pid(&self, pid: u32) -> anyhow::Result<()> {
        let handle = self.window_for_pid(pid)?;
        self.xdotool(&["windowactivate", "--sync", &handle.to_string()])?;
        Ok(())
    }

    fn launch_by_name(&self, name: &str) -> anyhow::Result<()> {
        launch_detached(Path::new(name))?;
        Ok(())
    }
}

impl WindowPlatform for X11Platform {
    fn platform_name(&self) -> &str {
        "linux-xdotool"
    }

    fn activate_window(&self, handle: WindowHandle) -> Result<(), PlatformError> {
        self.xdotool(&["windowactivate", "--sync", &handle.to_string()])?;
        Ok(())
    }

    fn activate_process(&self, name: &str) -> Result<(), PlatformError> {
        Ok(name_chain::activate_by_name(self, name)?)
    }

    fn send_chord(&self, chord: &Chord) -> Result<(), PlatformError> {
        let keys = xdotool::chord_keysyms(chord)
            .ok_or_else(|| PlatformError::unsupported("this key in xdotool chords", self.platform_name()))?;
        self.xdotool(&["key", "--clearmodifiers", &keys])?;
        Ok(())
    }

    fn foreground_process(&self) -> Result<ProcessInfo, PlatformError> {
        let window = self.xdotool(&["getactivewindow"])?;
        let handle = xdotool::parse_window_id(window.text())
            .context("no active window")?;
        let id = handle.to_string();
        let pid: u32 = self
            .xdotool(&["getwindowpid", &id])?
            .text()
            .parse()
            .context("unexpected getwindowpid output")?;
        let title = self.xdotool(&["getwindowname", &id])?.text().to_string();

        let processes = process::running_processes();
        let mut info = processes
            .into_iter()
            .find(|p| p.pid == Some(pid))
            .with_context(|| format!("active window pid {pid} is not in the process list"))?;
        info.window_title = Some(title).filter(|t| !t.is_empty());
        info.window_handle = Some(handle);
        Ok(info)
    }
}
