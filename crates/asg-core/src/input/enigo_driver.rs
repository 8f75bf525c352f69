//! Enigo-backed input driver.

use std::path::Path;

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use super::{InputDriver, KeyDirection};
use crate::action::MouseButton;
use crate::keys::{Modifier, NamedKey};
use crate::settings::EngineSettings;

/// Drives the real desktop through `enigo`; screen reads go through xcap
/// when the `screen` feature is compiled in.
pub struct EnigoDriver {
    enigo: Enigo,
    #[cfg_attr(not(feature = "screen"), allow(dead_code))]
    image_match_tolerance: u8,
}

impl EnigoDriver {
    pub fn new(settings: &EngineSettings) -> anyhow::Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow::anyhow!("failed to init enigo: {e}"))?;
        log::debug!(
            "EnigoDriver: initialized (screen reads {})",
            if cfg!(feature = "screen") { "enabled" } else { "disabled" }
        );
        Ok(Self {
            enigo,
            image_match_tolerance: settings.image_match_tolerance,
        })
    }
}

fn button(b: MouseButton) -> Button {
    match b {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Center => Button::Middle,
    }
}

fn modifier_key(m: Modifier) -> Key {
    match m {
        Modifier::Command => Key::Meta,
        Modifier::Control => Key::Control,
        Modifier::Alt => Key::Alt,
        Modifier::Shift => Key::Shift,
    }
}

fn named_key(k: NamedKey) -> anyhow::Result<Key> {
    let key = match k {
        NamedKey::Enter | NamedKey::Return => Key::Return,
        NamedKey::Tab => Key::Tab,
        NamedKey::Space => Key::Space,
        NamedKey::Backspace => Key::Backspace,
        NamedKey::Delete => Key::Delete,
        NamedKey::Escape => Key::Escape,
        NamedKey::Up => Key::UpArrow,
        NamedKey::Down => Key::DownArrow,
        NamedKey::Left => Key::LeftArrow,
        NamedKey::Right => Key::RightArrow,
        NamedKey::Home => Key::Home,
        NamedKey::End => Key::End,
        NamedKey::PageUp => Key::PageUp,
        NamedKey::PageDown => Key::PageDown,
        NamedKey::Function(n) => match n {
            1 => Key::F1,
            2 => Key::F2,
            3 => Key::F3,
            4 => Key::F4,
            5 => Key::F5,
            6 => Key::F6,
            7 => Key::F7,
            8 => Key::F8,
            9 => Key::F9,
            10 => Key::F10,
            11 => Key::F11,
            12 => Key::F12,
            13 => Key::F13,
            14 => Key::F14,
            15 => Key::F15,
            16 => Key::F16,
            17 => Key::F17,
            18 => Key::F18,
            19 => Key::F19,
            20 => Key::F20,
            other => anyhow::bail!("no function key F{other}"),
        },
    };
    Ok(key)
}

impl InputDriver for EnigoDriver {
    fn move_to(&mut self, x: i32, y: i32) -> anyhow::Result<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| anyhow::anyhow!("failed to move mouse to ({x}, {y}): {e}"))
    }

    fn click(&mut self, b: MouseButton) -> anyhow::Result<()> {
        self.enigo
            .button(button(b), Direction::Click)
            .map_err(|e| anyhow::anyhow!("failed to click {b} button: {e}"))
    }

    fn type_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.enigo
            .text(text)
            .map_err(|e| anyhow::anyhow!("failed to type text: {e}"))?;
        log::debug!("EnigoDriver: typed {} chars", text.chars().count());
        Ok(())
    }

    fn tap(&mut self, key: NamedKey) -> anyhow::Result<()> {
        self.enigo
            .key(named_key(key)?, Direction::Click)
            .map_err(|e| anyhow::anyhow!("failed to tap {}: {e}", key.name()))
    }

    fn toggle_modifier(&mut self, modifier: Modifier, direction: KeyDirection) -> anyhow::Result<()> {
        let dir = match direction {
            KeyDirection::Press => Direction::Press,
            KeyDirection::Release => Direction::Release,
        };
        self.enigo
            .key(modifier_key(modifier), dir)
            .map_err(|e| anyhow::anyhow!("failed to {direction:?} {modifier}: {e}"))
    }

    #[cfg(feature = "screen")]
    fn pixel_color(&mut self, x: i32, y: i32) -> anyhow::Result<String> {
        super::screen::pixel_color(x, y)
    }

    #[cfg(not(feature = "screen"))]
    fn pixel_color(&mut self, _x: i32, _y: i32) -> anyhow::Result<String> {
        anyhow::bail!("pixel reads need the `screen` feature")
    }

    #[cfg(feature = "screen")]
    fn locate_image(&mut self, path: &Path) -> anyhow::Result<Option<(i32, i32)>> {
        super::screen::locate_image(path, self.image_match_tolerance)
    }

    #[cfg(not(feature = "screen"))]
    fn locate_image(&mut self, path: &Path) -> anyhow::Result<Option<(i32, i32)>> {
        anyhow::bail!(
            "cannot search for {}: image matching needs the `screen` feature",
            path.display()
        )
    }

    fn pointer_location(&mut self) -> anyhow::Result<(i32, i32)> {
        self.enigo
            .location()
            .map_err(|e| anyhow::anyhow!("failed to read pointer location: {e}"))
    }

    fn process_names(&mut self) -> anyhow::Result<Vec<String>> {
        Ok(crate::process::running_processes()
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    fn name(&self) -> &str {
        "enigo"
    }
}
