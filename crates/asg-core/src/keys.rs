//! Key and modifier vocabulary for `key` actions.
//!
//! Modifier names are normalized case-insensitively to four canonical
//! modifiers. The main key is either one of a fixed set of named keys (tapped)
//! or an arbitrary string (typed).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("unknown modifier {0:?} (expected command, control, alt or shift)")]
    UnknownModifier(String),
    #[error("empty key name")]
    EmptyKey,
}

/// Canonical modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Command,
    Control,
    Alt,
    Shift,
}

impl Modifier {
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        match s.trim().to_lowercase().as_str() {
            "command" | "cmd" | "super" | "meta" | "win" => Ok(Self::Command),
            "control" | "ctrl" => Ok(Self::Control),
            "alt" | "option" => Ok(Self::Alt),
            "shift" => Ok(Self::Shift),
            _ => Err(KeyError::UnknownModifier(s.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Control => "control",
            Self::Alt => "alt",
            Self::Shift => "shift",
        }
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys that are tapped rather than typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Return,
    Tab,
    Space,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// F1 through F20.
    Function(u8),
}

impl NamedKey {
    /// Look up a named key. Matching is case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        let key = match lower.as_str() {
            "enter" => Self::Enter,
            "return" => Self::Return,
            "tab" => Self::Tab,
            "space" => Self::Space,
            "backspace" => Self::Backspace,
            "delete" => Self::Delete,
            "escape" => Self::Escape,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "home" => Self::Home,
            "end" => Self::End,
            "page_up" => Self::PageUp,
            "page_down" => Self::PageDown,
            other => {
                let n: u8 = other.strip_prefix('f')?.parse().ok()?;
                if !(1..=20).contains(&n) {
                    return None;
                }
                Self::Function(n)
            }
        };
        Some(key)
    }

    pub fn name(self) -> String {
        match self {
            Self::Enter => "enter".into(),
            Self::Return => "return".into(),
            Self::Tab => "tab".into(),
            Self::Space => "space".into(),
            Self::Backspace => "backspace".into(),
            Self::Delete => "delete".into(),
            Self::Escape => "escape".into(),
            Self::Up => "up".into(),
            Self::Down => "down".into(),
            Self::Left => "left".into(),
            Self::Right => "right".into(),
            Self::Home => "home".into(),
            Self::End => "end".into(),
            Self::PageUp => "page_up".into(),
            Self::PageDown => "page_down".into(),
            Self::Function(n) => format!("f{n}"),
        }
    }
}

/// The main key of a chord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordKey {
    Named(NamedKey),
    /// Typed verbatim.
    Text(String),
}

impl std::fmt::Display for ChordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChordKey::Named(k) => f.write_str(&k.name()),
            ChordKey::Text(t) => f.write_str(t),
        }
    }
}

/// A normalized key press: zero or more modifiers plus one main key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    /// In the order given by the action; pressed in this order, released in reverse.
    pub modifiers: Vec<Modifier>,
    pub key: ChordKey,
}

impl Chord {
    /// Normalize a `key` action's payload.
    pub fn normalize(key: &str, modifiers: &[String]) -> Result<Self, KeyError> {
        if key.is_empty() {
            return Err(KeyError::EmptyKey);
        }
        let modifiers = modifiers
            .iter()
            .map(|m| Modifier::parse(m))
            .collect::<Result<Vec<_>, _>>()?;
        let key = match NamedKey::parse(key) {
            Some(named) => ChordKey::Named(named),
            None => ChordKey::Text(key.to_string()),
        };
        Ok(Self { modifiers, key })
    }
}

impl std::fmt::Display for Chord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for m in &self.modifiers {
            write!(f, "{m}+")?;
        }
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_aliases_normalize() {
        assert_eq!(Modifier::parse("CMD").unwrap(), Modifier::Command);
        assert_eq!(Modifier::parse("super").unwrap(), Modifier::Command);
        assert_eq!(Modifier::parse("Ctrl").unwrap(), Modifier::Control);
        assert_eq!(Modifier::parse("option").unwrap(), Modifier::Alt);
        assert_eq!(Modifier::parse(" Shift ").unwrap(), Modifier::Shift);
    }

    #[test]
    fn unknown_modifier_errors() {
        assert_eq!(
            Modifier::parse("hyper"),
            Err(KeyError::UnknownModifier("hyper".into()))
        );
    }

    #[test]
    fn named_keys_cover_function_row() {
        assert_eq!(NamedKey::parse("F1"), Some(NamedKey::Function(1)));
        assert_eq!(NamedKey::parse("f20"), Some(NamedKey::Function(20)));
        assert_eq!(NamedKey::parse("f21"), None);
        assert_eq!(NamedKey::parse("f0"), None);
        assert_eq!(NamedKey::parse("f"), None);
        assert_eq!(NamedKey::parse("Page_Down"), Some(NamedKey::PageDown));
        assert_eq!(NamedKey::parse("return"), Some(NamedKey::Return));
    }

    #[test]
    fn chord_keeps_modifier_order_and_text_case() {
        let chord = Chord::normalize("A", &["shift".into(), "ctrl".into()]).unwrap();
        assert_eq!(chord.modifiers, vec![Modifier::Shift, Modifier::Control]);
        assert_eq!(chord.key, ChordKey::Text("A".into()));
        assert_eq!(chord.to_string(), "shift+control+A");
    }

    #[test]
    fn chord_recognizes_named_key() {
        let chord = Chord::normalize("Enter", &[]).unwrap();
        assert_eq!(chord.key, ChordKey::Named(NamedKey::Enter));
        assert!(chord.modifiers.is_empty());
    }

    #[test]
    fn chord_rejects_empty_key_and_bad_modifier() {
        assert_eq!(Chord::normalize("", &[]), Err(KeyError::EmptyKey));
        assert!(Chord::normalize("a", &["fn".into()]).is_err());
    }
}
