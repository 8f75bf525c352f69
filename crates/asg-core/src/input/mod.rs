//! Input Driver: primitive mouse/keyboard synthesis plus screen and process queries.

pub mod enigo_driver;
#[cfg(feature = "screen")]
pub mod screen;

use std::path::Path;

use crate::action::MouseButton;
use crate::keys::{Modifier, NamedKey};

pub use enigo_driver::EnigoDriver;

/// Press or release for modifier toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Press,
    Release,
}

/// Platform binding for primitive input events.
///
/// Methods take `&mut self`: the host input subsystem is a single global
/// resource, and a run borrows its driver exclusively for its whole duration.
/// Not `Send`: some backends hold thread-affine OS event sources.
pub trait InputDriver {
    fn move_to(&mut self, x: i32, y: i32) -> anyhow::Result<()>;

    fn click(&mut self, button: MouseButton) -> anyhow::Result<()>;

    /// Type text verbatim, no escaping.
    fn type_text(&mut self, text: &str) -> anyhow::Result<()>;

    /// Press and release a named key.
    fn tap(&mut self, key: NamedKey) -> anyhow::Result<()>;

    fn toggle_modifier(&mut self, modifier: Modifier, direction: KeyDirection) -> anyhow::Result<()>;

    /// Screen pixel color at (x, y) as lowercase `rrggbb`.
    fn pixel_color(&mut self, x: i32, y: i32) -> anyhow::Result<String>;

    /// Locate a reference image on screen. Returns the screen point of the
    /// match centre, or `None` when the image is not visible.
    fn locate_image(&mut self, path: &Path) -> anyhow::Result<Option<(i32, i32)>>;

    /// Current pointer position in global screen coordinates.
    fn pointer_location(&mut self) -> anyhow::Result<(i32, i32)>;

    /// Names of all running OS processes.
    fn process_names(&mut self) -> anyhow::Result<Vec<String>>;

    /// Human-readable driver name (e.g. "enigo", "mock").
    fn name(&self) -> &str;
}
