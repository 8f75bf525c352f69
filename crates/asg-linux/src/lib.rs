//! asg-linux: X11 window platform for asg.
//!
//! Window activation, chords and foreground queries shell out to `xdotool`.
//! Bundle ids do not exist here and report unsupported.

pub mod name_chain;
#[cfg(target_os = "linux")]
mod platform;
pub mod xdotool;

/// Factory function that creates the X11 platform.
///
/// Returns `Some(Ok(platform))` on Linux, `None` on other platforms.
pub fn linux_platform_factory(
    settings: &asg_core::EngineSettings,
) -> Option<anyhow::Result<Box<dyn asg_core::WindowPlatform>>> {
    #[cfg(target_os = "linux")]
    {
        Some(
            platform::X11Platform::new(settings)
                .map(|p| Box::new(p) as Box<dyn asg_core::WindowPlatform>),
        )
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = settings;
        None
    }
}
