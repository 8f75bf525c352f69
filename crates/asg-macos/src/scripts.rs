//! AppleScript sources and parsers for System Events output.
//!
//! Kept free of `cfg(target_os)` so script generation and parsing are
//! tested on every host.

use std::path::PathBuf;

use asg_core::keys::{Chord, ChordKey, Modifier, NamedKey};
use asg_core::script::applescript_literal;
use asg_core::ProcessInfo;

/// Field separator used by the listing scripts.
const SEP: char = '\t';

/// Bring a running process forward by name, or launch the application of
/// that name. Prints `true` or `false`.
pub fn activate_by_name(name: &str) -> String {
    let name = applescript_literal(name);
    format!(
        r#"tell application "System Events"
    set appRunning to exists (processes where name is "{name}")
end tell
if appRunning then
    tell application "System Events" to set frontmost of process "{name}" to true
else
    try
        tell application "{name}" to activate
    on error
        return false
    end try
end if
return true"#
    )
}

pub fn activate_by_pid(pid: u32) -> String {
    format!(
        r#"tell application "System Events"
    set frontmost of (first process whose unix id is {pid}) to true
end tell
return true"#
    )
}

pub fn activate_by_bundle_id(bundle_id: &str) -> String {
    let bundle_id = applescript_literal(bundle_id);
    format!(
        r#"try
    tell application id "{bundle_id}" to activate
    return true
on error
    return false
end try"#
    )
}

pub fn activate_by_path(path: &str) -> String {
    let path = applescript_literal(path);
    format!(
        r#"try
    tell application "{path}" to activate
    return true
on error
    return false
end try"#
    )
}

/// Non-background processes, one per line: name, bundle id, path, pid.
pub const LIST_PROCESSES: &str = r#"set out to ""
tell application "System Events"
    repeat with p in (every process whose background only is false)
        set n to name of p
        try
            set b to (bundle identifier of p) as text
        on error
            set b to ""
        end try
        try
            set f to POSIX path of (application file of p as alias)
        on error
            set f to ""
        end try
        set out to out & n & tab & b & tab & f & tab & ((unix id of p) as text) & linefeed
    end repeat
end tell
return out"#;

/// Frontmost process on one line: name, bundle id, path, pid, window title.
pub const FOREGROUND_PROCESS: &str = r#"tell application "System Events"
    set p to first process whose frontmost is true
    set n to name of p
    try
        set b to (bundle identifier of p) as text
    on error
        set b to ""
    end try
    try
        set f to POSIX path of (application file of p as alias)
    on error
        set f to ""
    end try
    try
        set w to name of first window of p
    on error
        set w to ""
    end try
    return n & tab & b & tab & f & tab & ((unix id of p) as text) & tab & w
end tell"#;

/// Parse one line of [`LIST_PROCESSES`] or [`FOREGROUND_PROCESS`] output.
pub fn parse_process_line(line: &str) -> Option<ProcessInfo> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split(SEP);
    let name = fields.next()?.trim();
    if name.is_empty() {
        return None;
    }
    let non_empty = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    let bundle_id = non_empty(fields.next());
    let path = non_empty(fields.next()).map(PathBuf::from);
    let pid = fields.next().and_then(|p| p.trim().parse().ok());
    let window_title = non_empty(fields.next());
    Some(ProcessInfo {
        name: name.to_string(),
        bundle_id,
        path,
        pid,
        window_title,
        window_handle: None,
    })
}

pub fn parse_process_list(output: &str) -> Vec<ProcessInfo> {
    output.lines().filter_map(parse_process_line).collect()
}

fn modifier_clause(m: Modifier) -> &'static str {
    match m {
        Modifier::Command => "command down",
        Modifier::Control => "control down",
        Modifier::Alt => "option down",
        Modifier::Shift => "shift down",
    }
}

/// System Events virtual key code for a named key.
fn key_code(key: NamedKey) -> Option<u16> {
    let code = match key {
        NamedKey::Enter | NamedKey::Return => 36,
        NamedKey::Tab => 48,
        NamedKey::Space => 49,
        NamedKey::Backspace => 51,
        NamedKey::Escape => 53,
        NamedKey::Delete => 117,
        NamedKey::Left => 123,
        NamedKey::Right => 124,
        NamedKey::Down => 125,
        NamedKey::Up => 126,
        NamedKey::Home => 115,
        NamedKey::End => 119,
        NamedKey::PageUp => 116,
        NamedKey::PageDown => 121,
        NamedKey::Function(n) => match n {
            1 => 122,
            2 => 120,
            3 => 99,
            4 => 118,
            5 => 96,
            6 => 97,
            7 => 98,
            8 => 100,
            9 => 101,
            10 => 109,
            11 => 103,
            12 => 111,
            13 => 105,
            14 => 107,
            15 => 113,
            16 => 106,
            17 => 64,
            18 => 79,
            19 => 80,
            20 => 90,
            _ => return None,
        },
    };
    Some(code)
}

/// `keystroke`/`key code` script for a chord with at least one modifier.
pub fn chord(chord: &Chord) -> Option<String> {
    let using = chord
        .modifiers
        .iter()
        .map(|m| modifier_clause(*m))
        .collect::<Vec<_>>()
        .join(", ");
    let press = match &chord.key {
        ChordKey::Named(k) => format!("key code {}", key_code(*k)?),
        ChordKey::Text(t) => format!("keystroke \"{}\"", applescript_literal(t)),
    };
    Some(format!(
        "tell application \"System Events\" to {press} using {{{using}}}"
    ))
}
