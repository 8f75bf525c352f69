//! WindowPlatform trait: OS-specific implementations live in separate crates.
//!
//! Everything that branches on the host OS (AppleScript, PowerShell/UI
//! Automation, xdotool) sits behind this trait. The activation chain in
//! [`crate::activation`] only sequences these capabilities.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context;
use thiserror::Error;

use crate::keys::Chord;
use crate::process::{ProcessInfo, WindowHandle};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{capability} is not supported on {platform}")]
    Unsupported {
        capability: &'static str,
        platform: String,
    },
    #[error("{0:#}")]
    Failed(#[from] anyhow::Error),
}

impl PlatformError {
    pub fn unsupported(capability: &'static str, platform: impl Into<String>) -> Self {
        Self::Unsupported {
            capability,
            platform: platform.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Cross-platform window/process capability trait.
///
/// Each platform crate (asg-macos, asg-windows, asg-linux) provides an
/// implementation. Unimplemented capabilities report
/// [`PlatformError::Unsupported`], which the activation chain records as a
/// failed step and moves past.
pub trait WindowPlatform: Send + Sync {
    /// Human-readable platform name (e.g. "macos-osascript", "windows-uia").
    fn platform_name(&self) -> &str;

    /// Bring one specific window to the foreground.
    fn activate_window(&self, handle: WindowHandle) -> Result<(), PlatformError> {
        let _ = handle;
        Err(PlatformError::unsupported("window handle activation", self.platform_name()))
    }

    /// Bring a process to the foreground by name, launching it if the
    /// platform knows how. Platform-specific sub-strategies run inside.
    fn activate_process(&self, name: &str) -> Result<(), PlatformError>;

    /// Activate by Apple bundle identifier.
    fn activate_bundle_id(&self, bundle_id: &str) -> Result<(), PlatformError> {
        let _ = bundle_id;
        Err(PlatformError::unsupported("bundle id activation", self.platform_name()))
    }

    /// Activate or launch the application at `path`.
    fn activate_path(&self, path: &Path) -> Result<(), PlatformError> {
        launch_detached(path)?;
        Ok(())
    }

    /// Native chord mechanism, tried before the generic toggle chord.
    fn send_chord(&self, chord: &Chord) -> Result<(), PlatformError> {
        let _ = chord;
        Err(PlatformError::unsupported("native key chords", self.platform_name()))
    }

    /// Running applications, as rich as the platform can describe them.
    fn running_processes(&self) -> anyhow::Result<Vec<ProcessInfo>> {
        Ok(crate::process::running_processes())
    }

    /// The application that currently owns the foreground window.
    fn foreground_process(&self) -> Result<ProcessInfo, PlatformError> {
        Err(PlatformError::unsupported("foreground query", self.platform_name()))
    }
}

/// Start `path` as a new process without waiting for it.
pub fn launch_detached(path: &Path) -> anyhow::Result<u32> {
    let child = Command::new(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to launch {}", path.display()))?;
    log::info!("Launched {} (pid {})", path.display(), child.id());
    Ok(child.id())
}

/// Platform used when no OS crate claims the host. Only path launching works.
pub struct FallbackPlatform;

impl WindowPlatform for FallbackPlatform {
    fn platform_name(&self) -> &str {
        "fallback"
    }

    fn activate_process(&self, _name: &str) -> Result<(), PlatformError> {
        Err(PlatformError::unsupported("process name activation", self.platform_name()))
    }
}

/// Function signature for an OS crate's platform factory.
///
/// Returns `None` when the crate does not target the host OS, letting the
/// next factory try.
pub type PlatformFactory =
    dyn Fn(&crate::settings::EngineSettings) -> Option<anyhow::Result<Box<dyn WindowPlatform>>>;

/// Pick the first platform whose factory claims the host; fall back to
/// [`FallbackPlatform`] when none does or the claiming factory fails.
pub fn create_platform(
    settings: &crate::settings::EngineSettings,
    factories: &[&PlatformFactory],
) -> Box<dyn WindowPlatform> {
    for factory in factories {
        match factory(settings) {
            Some(Ok(platform)) => {
                log::info!("Window platform: {}", platform.platform_name());
                return platform;
            }
            Some(Err(e)) => {
                log::error!("Window platform failed to initialize: {e:#}");
                break;
            }
            None => continue,
        }
    }
    log::warn!("No window platform for this OS; only app_path activation is available");
    Box::new(FallbackPlatform)
}
