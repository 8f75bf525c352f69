//! macOS window platform backed by `osascript`.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use asg_core::keys::Chord;
use asg_core::platform::{PlatformError, WindowPlatform};
use asg_core::process::{self, ProcessInfo};
use asg_core::script::{self, ScriptOutput};
use asg_core::EngineSettings;

use crate::name_chain::{self, NameSteps};
use crate::scripts;

pub struct MacosPlatform {
    timeout: Duration,
}

impl MacosPlatform {
    pub fn new(settings: &EngineSettings) -> anyhow::Result<Self> {
        Ok(Self { timeout: settings.script_timeout() })
    }

    fn osascript(&self, source: &str) -> anyhow::Result<ScriptOutput> {
        let mut cmd = Command::new("osascript");
        cmd.args(["-e", source]);
        script::run(cmd, self.timeout)
    }

    /// Run a script that prints `true` on success.
    fn osascript_bool(&self, source: &str, what: &str) -> anyhow::Result<()> {
        let out = self.osascript(source)?;
        if !out.success {
            anyhow::bail!("{what}: osascript failed: {}", out.stderr.trim());
        }
        if out.text() != "true" {
            anyhow::bail!("{what}: application not found");
        }
        Ok(())
    }
}

impl NameSteps for MacosPlatform {
    fn activate_by_name_script(&self, name: &str) -> anyhow::Result<()> {
        self.osascript_bool(&scripts::activate_by_name(name), "activate by name")
    }

    fn running(&self) -> Vec<ProcessInfo> {
        process::running_processes()
    }

    fn activate_pid(&self, pid: u32) -> anyhow::Result<()> {
        self.osascript_bool(&scripts::activate_by_pid(pid), "activate by pid")
    }
}

impl WindowPlatform for MacosPlatform {
    fn platform_name(&self) -> &str {
        "macos-osascript"
    }

    fn activate_process(&self, name: &str) -> Result<(), PlatformError> {
        Ok(name_chain::activate_by_name(self, name)?)
    }

    fn activate_bundle_id(&self, bundle_id: &str) -> Result<(), PlatformError> {
        Ok(self.osascript_bool(&scripts::activate_by_bundle_id(bundle_id), "activate by bundle id")?)
    }

    fn activate_path(&self, path: &Path) -> Result<(), PlatformError> {
        let path = path.to_string_lossy();
        Ok(self.osascript_bool(&scripts::activate_by_path(&path), "activate by path")?)
    }

    fn send_chord(&self, chord: &Chord) -> Result<(), PlatformError> {
        let source = scripts::chord(chord)
            .ok_or_else(|| PlatformError::unsupported("this key in System Events chords", self.platform_name()))?;
        let out = self.osascript(&source)?;
        if !out.success {
            return Err(anyhow::anyhow!("keystroke failed: {}", out.stderr.trim()).into());
        }
        Ok(())
    }

    fn running_processes(&self) -> anyhow::Result<Vec<ProcessInfo>> {
        let out = self.osascript(scripts::LIST_PROCESSES)?;
        if !out.success {
            anyhow::bail!("failed to list applications: {}", out.stderr.trim());
        }
        Ok(scripts::parse_process_list(&out.stdout))
    }

    fn foreground_process(&self) -> Result<ProcessInfo, PlatformError> {
        let out = self.osascript(scripts::FOREGROUND_PROCESS)?;
        if !out.success {
            return Err(anyhow::anyhow!("failed to query frontmost app: {}", out.stderr.trim()).into());
        }
        scripts::parse_process_line(out.text())
            .ok_or_else(|| anyhow::anyhow!("unexpected frontmost app output {:?}", out.text()).into())
    }
}
