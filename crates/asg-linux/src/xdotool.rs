//! xdotool argument builders and output parsers.

use asg_core::keys::{Chord, ChordKey, Modifier, NamedKey};
use asg_core::process::WindowHandle;

fn modifier_keysym(m: Modifier) -> &'static str {
    match m {
        Modifier::Command => "super",
        Modifier::Control => "ctrl",
        Modifier::Alt => "alt",
        Modifier::Shift => "shift",
    }
}

fn named_keysym(k: NamedKey) -> String {
    match k {
        NamedKey::Enter | NamedKey::Return => "Return".into(),
        NamedKey::Tab => "Tab".into(),
        NamedKey::Space => "space".into(),
        NamedKey::Backspace => "BackSpace".into(),
        NamedKey::Delete => "Delete".into(),
        NamedKey::Escape => "Escape".into(),
        NamedKey::Up => "Up".into(),
        NamedKey::Down => "Down".into(),
        NamedKey::Left => "Left".into(),
        NamedKey::Right => "Right".into(),
        NamedKey::Home => "Home".into(),
        NamedKey::End => "End".into(),
        NamedKey::PageUp => "Prior".into(),
        NamedKey::PageDown => "Next".into(),
        NamedKey::Function(n) => format!("F{n}"),
    }
}

/// `xdotool key` argument such as `ctrl+shift+s`. Only named keys and single
/// ASCII alphanumerics have an unambiguous keysym; anything else returns
/// `None`.
pub fn chord_keysyms(chord: &Chord) -> Option<String> {
    let key = match &chord.key {
        ChordKey::Named(k) => named_keysym(*k),
        ChordKey::Text(t) => {
            let mut chars = t.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => c.to_string(),
                _ => return None,
            }
        }
    };
    let mut parts: Vec<String> = chord.modifiers.iter().map(|m| modifier_keysym(*m).to_string()).collect();
    parts.push(key);
    Some(parts.join("+"))
}

/// First window id in `xdotool search` output.
pub fn parse_window_id(output: &str) -> Option<WindowHandle> {
    output
        .lines()
        .find_map(|l| l.trim().parse::<i64>().ok())
        .filter(|id| *id != 0)
        .map(WindowHandle)
}
