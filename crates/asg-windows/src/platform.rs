//! Windows window platform: PowerShell for Win32 window calls, UI Automation
//! for window enumeration and key chords.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use uiautomation::types::{TreeScope, UIProperty};
use uiautomation::variants::Variant;
use uiautomation::UIAutomation;

use asg_core::keys::Chord;
use asg_core::platform::{launch_detached, PlatformError, WindowPlatform};
use asg_core::process::{self, ProcessInfo, WindowHandle};
use asg_core::script::{self, ScriptOutput};
use asg_core::EngineSettings;

use crate::name_chain::{self, NameSteps};
use crate::scripts;

pub struct WindowsPlatform {
    timeout: Duration,
}

impl WindowsPlatform {
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        let _uia = UIAutomation::new().context("Failed to initialize UI Automation")?;
        Ok(Self { timeout: settings.script_timeout() })
    }

    fn powershell(&self, source: &str) -> Result<ScriptOutput> {
        let mut cmd = Command::new("powershell");
        cmd.args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-Command", source]);
        let out = script::run(cmd, self.timeout)?;
        if !out.success {
            anyhow::bail!("powershell failed: {}", out.stderr.trim());
        }
        Ok(out)
    }
}

impl NameSteps for WindowsPlatform {
    fn focus_top_level_window(&self, pid: u32) -> Result<()> {
        let uia = UIAutomation::new().context("UI Automation init")?;
        let root = uia.get_root_element().context("get desktop root")?;
        let condition = uia
            .create_property_condition(UIProperty::ProcessId, Variant::from(pid as i32), None)
            .context("create PID condition")?;
        let windows = root
            .find_all(TreeScope::Children, &condition)
            .context("find windows by PID")?;
        let window = windows
            .into_iter()
            .find(|w| !w.is_offscreen().unwrap_or(true))
            .with_context(|| format!("no visible window for pid {pid}"))?;
        log::debug!("Focusing {:?} (pid {pid})", window.get_name().unwrap_or_default());
        window.set_focus().context("UIElement::set_focus()")?;
        Ok(())
    }

    fn activate_main_window(&self, name: &str) -> Result<()> {
        let out = self.powershell(&scripts::activate_main_window(name))?;
        match out.text() {
            t if t.starts_with("Activated:") => Ok(()),
            t => anyhow::bail!("no main window ({t})"),
        }
    }

    fn start_by_name(&self, name: &str) -> Result<()> {
        let out = self.powershell(&scripts::start_process(name))?;
        match out.text() {
            "Started" => {
                log::info!("Started {name:?}");
                Ok(())
            }
            t => anyhow::bail!("{}", t.trim_start_matches("Failed:")),
        }
    }

    fn running(&self) -> Vec<ProcessInfo> {
        process::running_processes()
    }

    fn launch(&self, path: &Path) -> Result<()> {
        launch_detached(path)?;
        Ok(())
    }
}

impl WindowPlatform for WindowsPlatform {
    fn platform_name(&self) -> &str {
        "windows-uia"
    }

    fn activate_window(&self, handle: WindowHandle) -> Result<(), PlatformError> {
        let out = self.powershell(&scripts::activate_handle(handle))?;
        match out.text() {
            "Activated" => Ok(()),
            "Invalid" => Err(anyhow::anyhow!("window handle {handle} is not a window").into()),
            t => Err(anyhow::anyhow!("SetForegroundWindow refused handle {handle} ({t})").into()),
        }
    }

    fn activate_process(&self, name: &str) -> Result<(), PlatformError> {
        name_chain::activate_by_name(self, name)?;
        Ok(())
    }

    fn activate_path(&self, path: &Path) -> Result<(), PlatformError> {
        let status = Command::new("cmd")
            .args(["/c", "start", ""])
            .arg(path)
            .status()
            .with_context(|| format!("failed to start {}", path.display()))?;
        if !status.success() {
            return Err(anyhow::anyhow!("start {} exited with {status}", path.display()).into());
        }
        Ok(())
    }

    fn send_chord(&self, chord: &Chord) -> Result<(), PlatformError> {
        let keys = scripts::send_keys_chord(chord)
            .ok_or_else(|| PlatformError::unsupported("this key in send_keys chords", self.platform_name()))?;
        uiautomation::inputs::Keyboard::new()
            .send_keys(&keys)
            .context("send_keys")?;
        Ok(())
    }

    fn running_processes(&self) -> Result<Vec<ProcessInfo>> {
        Ok(scripts::filter_processes(process::running_processes()))
    }

    fn foreground_process(&self) -> Result<ProcessInfo, PlatformError> {
        let out = self.powershell(&scripts::foreground())?;
        scripts::parse_foreground(&out.stdout)
            .ok_or_else(|| anyhow::anyhow!("unexpected foreground output {:?}", out.text()).into())
    }
}
