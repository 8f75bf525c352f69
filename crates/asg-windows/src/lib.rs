//! asg-windows: Windows window platform for asg.
//!
//! Uses PowerShell for Win32 window activation and the `uiautomation` crate
//! for window enumeration and key chords. All Windows-specific code is gated
//! behind `#[cfg(windows)]`.

pub mod name_chain;
#[cfg(windows)]
mod platform;
pub mod scripts;

/// Factory function that creates the Windows platform.
///
/// Returns `Some(Ok(platform))` on Windows, `None` on other platforms.
pub fn windows_platform_factory(
    settings: &asg_core::EngineSettings,
) -> Option<anyhow::Result<Box<dyn asg_core::WindowPlatform>>> {
    #[cfg(windows)]
    {
        Some(
            platform::WindowsPlatform::new(settings)
                .map(|p| Box::new(p) as Box<dyn asg_core::WindowPlatform>),
        )
    }
    #[cfg(not(windows))]
    {
        let _ = settings;
        None
    }
}
