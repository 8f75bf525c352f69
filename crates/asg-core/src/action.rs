//! Action tree types: the JSON interchange form maps onto these.
//!
//! On the wire every action is a flat object tagged by `type`. Decoding never
//! fails on an unrecognised kind or a bad field value: those become
//! [`Action::Unknown`] / [`Action::Invalid`] nodes that the executor reports
//! and skips, so one bad node cannot reject a whole config.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::process::WindowHandle;

/// Mouse button for click actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Center,
}

impl MouseButton {
    /// Parse a button name. Empty means "unset" and resolves to the default.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" | "middle" => Some(Self::Center),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifying hints for an `activate` node. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationHints {
    pub window_handle: Option<WindowHandle>,
    pub process_name: Option<String>,
    pub bundle_id: Option<String>,
    pub app_path: Option<PathBuf>,
}

impl ActivationHints {
    pub fn is_empty(&self) -> bool {
        self.window_handle.is_none()
            && self.process_name.is_none()
            && self.bundle_id.is_none()
            && self.app_path.is_none()
    }
}

/// A node in the action tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireAction", into = "WireAction")]
pub enum Action {
    Move { x: i32, y: i32 },
    Click { button: MouseButton },
    Type { text: String },
    Key { key: String, modifiers: Vec<String> },
    /// Seconds; values ≤ 0 sleep for one second.
    Sleep { duration: f64 },
    Activate(ActivationHints),
    If {
        condition: String,
        then_actions: Vec<Action>,
        else_actions: Vec<Action>,
    },
    /// `count` is coerced to at least one iteration when executed.
    For { count: i64, loop_actions: Vec<Action> },
    FindImage { image_path: PathBuf },
    FindImageAndMove { image_path: PathBuf },
    FindImageAndClick { image_path: PathBuf, button: MouseButton },
    /// A `type` tag the engine does not know.
    Unknown { kind: String },
    /// A known kind whose payload could not be interpreted.
    Invalid { kind: String, reason: String },
}

impl Action {
    /// The wire `type` tag of this node.
    pub fn kind(&self) -> &str {
        match self {
            Action::Move { .. } => "move",
            Action::Click { .. } => "click",
            Action::Type { .. } => "type",
            Action::Key { .. } => "key",
            Action::Sleep { .. } => "sleep",
            Action::Activate(_) => "activate",
            Action::If { .. } => "if",
            Action::For { .. } => "for",
            Action::FindImage { .. } => "find_image",
            Action::FindImageAndMove { .. } => "find_image_and_move",
            Action::FindImageAndClick { .. } => "find_image_and_click",
            Action::Unknown { kind } | Action::Invalid { kind, .. } => kind,
        }
    }

    /// Child sequences owned by this node, in execution-relevant order.
    pub fn children(&self) -> Vec<&[Action]> {
        match self {
            Action::If { then_actions, else_actions, .. } => {
                vec![then_actions.as_slice(), else_actions.as_slice()]
            }
            Action::For { loop_actions, .. } => vec![loop_actions.as_slice()],
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Move { x, y } => write!(f, "move({x}, {y})"),
            Action::Click { button } => write!(f, "click({button})"),
            Action::Type { text } => write!(f, "type({text:?})"),
            Action::Key { key, modifiers } => {
                if modifiers.is_empty() {
                    write!(f, "key({key})")
                } else {
                    write!(f, "key({}+{key})", modifiers.join("+"))
                }
            }
            Action::Sleep { duration } => write!(f, "sleep({duration}s)"),
            Action::Activate(h) => {
                let mut parts = Vec::new();
                if let Some(handle) = h.window_handle {
                    parts.push(format!("handle={handle}"));
                }
                if let Some(name) = &h.process_name {
                    parts.push(format!("process={name:?}"));
                }
                if let Some(id) = &h.bundle_id {
                    parts.push(format!("bundle={id:?}"));
                }
                if let Some(path) = &h.app_path {
                    parts.push(format!("path={}", path.display()));
                }
                write!(f, "activate({})", parts.join(", "))
            }
            Action::If { condition, then_actions, else_actions } => write!(
                f,
                "if({condition:?}, then={}, else={})",
                then_actions.len(),
                else_actions.len()
            ),
            Action::For { count, loop_actions } => {
                write!(f, "for({count}x, body={})", loop_actions.len())
            }
            Action::FindImage { image_path } => write!(f, "find_image({})", image_path.display()),
            Action::FindImageAndMove { image_path } => {
                write!(f, "find_image_and_move({})", image_path.display())
            }
            Action::FindImageAndClick { image_path, button } => {
                write!(f, "find_image_and_click({}, {button})", image_path.display())
            }
            Action::Unknown { kind } => write!(f, "unknown({kind:?})"),
            Action::Invalid { kind, reason } => write!(f, "invalid {kind}: {reason}"),
        }
    }
}

// ── Wire form ──────────────────────────────────────────────────────────────

/// Flat JSON shape of one action. Absent fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireAction {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    button: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    process_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bundle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    window_handle: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    then_actions: Vec<Action>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    else_actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    loop_actions: Vec<Action>,
    #[serde(default, alias = "imagePath", skip_serializing_if = "Option::is_none")]
    image_path: Option<String>,
}

/// Generated trees often write `null` where a field is simply empty.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Empty strings on the wire mean "absent".
fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

impl From<WireAction> for Action {
    fn from(w: WireAction) -> Self {
        let kind = w.kind.trim().to_ascii_lowercase();
        let invalid = |reason: String| Action::Invalid { kind: kind.clone(), reason };
        let button = match w.button.as_deref().map(MouseButton::parse) {
            None => Ok(MouseButton::Left),
            Some(Some(b)) => Ok(b),
            Some(None) => Err(format!(
                "unknown mouse button {:?} (expected left, right, center)",
                w.button.clone().unwrap_or_default()
            )),
        };
        let image_path = non_empty(w.image_path).map(PathBuf::from);

        match kind.as_str() {
            "move" => Action::Move {
                x: w.x.unwrap_or(0),
                y: w.y.unwrap_or(0),
            },
            "click" => match button {
                Ok(button) => Action::Click { button },
                Err(reason) => invalid(reason),
            },
            "type" => Action::Type {
                text: w.text.unwrap_or_default(),
            },
            "key" => match non_empty(w.key) {
                Some(key) => Action::Key {
                    key,
                    modifiers: w.modifiers,
                },
                None => invalid("missing key".into()),
            },
            "sleep" => Action::Sleep {
                duration: w.duration.unwrap_or(0.0),
            },
            "activate" => Action::Activate(ActivationHints {
                window_handle: w.window_handle.filter(|h| *h != 0).map(WindowHandle),
                process_name: non_empty(w.process_name),
                bundle_id: non_empty(w.bundle_id),
                app_path: non_empty(w.app_path).map(PathBuf::from),
            }),
            "if" => Action::If {
                condition: w.condition.unwrap_or_default(),
                then_actions: w.then_actions,
                else_actions: w.else_actions,
            },
            "for" => Action::For {
                count: w.count.unwrap_or(0),
                loop_actions: w.loop_actions,
            },
            "find_image" | "find_image_and_move" | "find_image_and_click" => {
                let Some(image_path) = image_path else {
                    return invalid("missing image_path".into());
                };
                match kind.as_str() {
                    "find_image" => Action::FindImage { image_path },
                    "find_image_and_move" => Action::FindImageAndMove { image_path },
                    _ => match button {
                        Ok(button) => Action::FindImageAndClick { image_path, button },
                        Err(reason) => invalid(reason),
                    },
                }
            }
            _ => Action::Unknown { kind: w.kind },
        }
    }
}

impl From<Action> for WireAction {
    fn from(action: Action) -> Self {
        let kind = action.kind().to_string();
        let mut w = WireAction { kind, ..WireAction::default() };
        match action {
            Action::Move { x, y } => {
                w.x = Some(x);
                w.y = Some(y);
            }
            Action::Click { button } => w.button = Some(button.as_str().into()),
            Action::Type { text } => w.text = Some(text),
            Action::Key { key, modifiers } => {
                w.key = Some(key);
                w.modifiers = modifiers;
            }
            Action::Sleep { duration } => w.duration = Some(duration),
            Action::Activate(h) => {
                w.window_handle = h.window_handle.map(|h| h.0);
                w.process_name = h.process_name;
                w.bundle_id = h.bundle_id;
                w.app_path = h.app_path.map(|p| p.to_string_lossy().into_owned());
            }
            Action::If { condition, then_actions, else_actions } => {
                w.condition = Some(condition);
                w.then_actions = then_actions;
                w.else_actions = else_actions;
            }
            Action::For { count, loop_actions } => {
                w.count = Some(count);
                w.loop_actions = loop_actions;
            }
            Action::FindImage { image_path } | Action::FindImageAndMove { image_path } => {
                w.image_path = Some(image_path.to_string_lossy().into_owned());
            }
            Action::FindImageAndClick { image_path, button } => {
                w.image_path = Some(image_path.to_string_lossy().into_owned());
                w.button = Some(button.as_str().into());
            }
            Action::Unknown { .. } | Action::Invalid { .. } => {}
        }
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Action {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn click_defaults_to_left_button() {
        assert_eq!(parse(r#"{"type":"click"}"#), Action::Click { button: MouseButton::Left });
        assert_eq!(
            parse(r#"{"type":"click","button":"RIGHT"}"#),
            Action::Click { button: MouseButton::Right }
        );
    }

    #[test]
    fn unknown_button_is_invalid_not_a_parse_error() {
        match parse(r#"{"type":"click","button":"thumb"}"#) {
            Action::Invalid { kind, reason } => {
                assert_eq!(kind, "click");
                assert!(reason.contains("thumb"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_preserved() {
        assert_eq!(
            parse(r#"{"type":"teleport","x":1}"#),
            Action::Unknown { kind: "teleport".into() }
        );
    }

    #[test]
    fn activate_treats_zero_handle_and_empty_strings_as_absent() {
        let action = parse(r#"{"type":"activate","window_handle":0,"process_name":"","app_path":"  "}"#);
        match action {
            Action::Activate(hints) => assert!(hints.is_empty()),
            other => panic!("expected Activate, got {other:?}"),
        }
    }

    #[test]
    fn activate_collects_all_hints() {
        let action = parse(
            r#"{"type":"activate","window_handle":4242,"process_name":"Code","bundle_id":"com.microsoft.VSCode","app_path":"/Applications/Visual Studio Code.app"}"#,
        );
        let Action::Activate(h) = action else { panic!("expected Activate") };
        assert_eq!(h.window_handle, Some(WindowHandle(4242)));
        assert_eq!(h.process_name.as_deref(), Some("Code"));
        assert_eq!(h.bundle_id.as_deref(), Some("com.microsoft.VSCode"));
        assert_eq!(h.app_path, Some(PathBuf::from("/Applications/Visual Studio Code.app")));
    }

    #[test]
    fn nested_control_flow_parses_recursively() {
        let action = parse(
            r#"{"type":"if","condition":"window_exists:Safari",
                "then_actions":[{"type":"for","count":2,"loop_actions":[{"type":"click"}]}],
                "else_actions":[{"type":"sleep","duration":0.5}]}"#,
        );
        let Action::If { condition, then_actions, else_actions } = action else {
            panic!("expected If")
        };
        assert_eq!(condition, "window_exists:Safari");
        assert_eq!(
            then_actions,
            vec![Action::For { count: 2, loop_actions: vec![Action::Click { button: MouseButton::Left }] }]
        );
        assert_eq!(else_actions, vec![Action::Sleep { duration: 0.5 }]);
    }

    #[test]
    fn null_lists_decode_as_empty() {
        assert_eq!(
            parse(r#"{"type":"key","key":"a","modifiers":null}"#),
            Action::Key { key: "a".into(), modifiers: Vec::new() }
        );
        assert_eq!(
            parse(r#"{"type":"if","condition":"x","then_actions":[{"type":"click"}],"else_actions":null}"#),
            Action::If {
                condition: "x".into(),
                then_actions: vec![Action::Click { button: MouseButton::Left }],
                else_actions: Vec::new(),
            }
        );
        assert_eq!(
            parse(r#"{"type":"for","count":2,"loop_actions":null}"#),
            Action::For { count: 2, loop_actions: Vec::new() }
        );
    }

    #[test]
    fn image_path_accepts_camel_case_alias() {
        assert_eq!(
            parse(r#"{"type":"find_image_and_move","imagePath":"ok.png"}"#),
            Action::FindImageAndMove { image_path: PathBuf::from("ok.png") }
        );
        assert!(matches!(parse(r#"{"type":"find_image"}"#), Action::Invalid { .. }));
    }

    #[test]
    fn key_without_key_name_is_invalid() {
        assert!(matches!(parse(r#"{"type":"key","modifiers":["ctrl"]}"#), Action::Invalid { .. }));
    }

    #[test]
    fn serializes_back_to_flat_wire_form() {
        let action = Action::Key { key: "s".into(), modifiers: vec!["command".into()] };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value, serde_json::json!({"type":"key","key":"s","modifiers":["command"]}));
    }

    #[test]
    fn display_is_compact() {
        let action = Action::Key { key: "a".into(), modifiers: vec!["ctrl".into(), "shift".into()] };
        assert_eq!(action.to_string(), "key(ctrl+shift+a)");
        assert_eq!(Action::Move { x: 3, y: 4 }.to_string(), "move(3, 4)");
    }
}
