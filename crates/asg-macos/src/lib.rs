//! asg-macos: macOS window platform for asg.
//!
//! Window and application control goes through AppleScript (System Events).
//! The platform itself is only compiled on macOS; the script builders are
//! plain string code and build everywhere.

pub mod name_chain;
#[cfg(target_os = "macos")]
mod platform;
pub mod scripts;

/// Factory function that creates the macOS platform.
///
/// Returns `Some(Ok(platform))` on macOS, `None` on other platforms.
pub fn macos_platform_factory(
    settings: &asg_core::EngineSettings,
) -> Option<anyhow::Result<Box<dyn asg_core::WindowPlatform>>> {
    #[cfg(target_os = "macos")]
    {
        Some(
            platform::MacosPlatform::new(settings)
                .map(|p| Box::new(p) as Box<dyn asg_core::WindowPlatform>),
        )
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = settings;
        None
    }
}
