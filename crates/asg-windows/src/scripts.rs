//! PowerShell sources, `send_keys` chord strings and process filtering.
//!
//! None of this touches Win32 directly, so it builds and is tested on every
//! host.

use std::collections::HashSet;
use std::path::PathBuf;

use asg_core::keys::{Chord, ChordKey, Modifier, NamedKey};
use asg_core::process::{strip_exe, ProcessInfo, WindowHandle};
use asg_core::script::powershell_literal;

/// Processes never offered as activation targets.
pub const SYSTEM_PROCESSES: &[&str] = &[
    "System Idle Process",
    "System",
    "Secure System",
    "Registry",
    "Memory Compression",
    "smss.exe",
    "csrss.exe",
    "wininit.exe",
    "services.exe",
    "LsaIso.exe",
    "lsass.exe",
    "svchost.exe",
    "fontdrvhost.exe",
    "WUDFHost.exe",
    "winlogon.exe",
    "dwm.exe",
    "conhost.exe",
    "WmiPrvSE.exe",
    "ShellExperienceHost.exe",
    "SearchHost.exe",
    "RuntimeBroker.exe",
    "SecurityHealthService.exe",
    "WindowsTerminal.exe",
    "powershell.exe",
    "wsl.exe",
    "wslhost.exe",
    "vmcompute.exe",
    "audiodg.exe",
    "tasklist.exe",
    "WMIC.exe",
];

pub fn is_system_process(name: &str) -> bool {
    SYSTEM_PROCESSES.iter().any(|s| s.eq_ignore_ascii_case(name))
}

/// Drop system processes and keep the first entry for each name.
pub fn filter_processes(processes: Vec<ProcessInfo>) -> Vec<ProcessInfo> {
    let mut seen = HashSet::new();
    processes
        .into_iter()
        .filter(|p| !is_system_process(&p.name))
        .filter(|p| seen.insert(p.name.to_ascii_lowercase()))
        .collect()
}

/// Win32 bindings shared by every script. The here-string terminator must
/// stay in column 0.
const PRELUDE: &str = r#"Add-Type @"
using System;
using System.Text;
using System.Runtime.InteropServices;
public class AsgWin {
    [DllImport("user32.dll")] public static extern bool SetForegroundWindow(IntPtr hWnd);
    [DllImport("user32.dll")] public static extern bool ShowWindow(IntPtr hWnd, int nCmdShow);
    [DllImport("user32.dll")] public static extern bool IsWindow(IntPtr hWnd);
    [DllImport("user32.dll")] public static extern IntPtr GetForegroundWindow();
    [DllImport("user32.dll")] public static extern int GetWindowThreadProcessId(IntPtr hWnd, out int processId);
    [DllImport("user32.dll")] public static extern int GetWindowText(IntPtr hWnd, StringBuilder text, int count);
}
"@
"#;

/// SW_RESTORE
const SHOW_RESTORE: i32 = 9;

/// Prints `Activated`, `Refused` or `Invalid`.
pub fn activate_handle(handle: WindowHandle) -> String {
    format!(
        r#"{PRELUDE}$hwnd = [IntPtr]::new({handle})
if (-not [AsgWin]::IsWindow($hwnd)) {{ Write-Output "Invalid"; exit }}
[void][AsgWin]::ShowWindow($hwnd, {SHOW_RESTORE})
if ([AsgWin]::SetForegroundWindow($hwnd)) {{ Write-Output "Activated" }} else {{ Write-Output "Refused" }}
"#
    )
}

/// Activate the main window of the first process called `name`. Prints
/// `Activated:<pid>` or `NoWindow`.
pub fn activate_main_window(name: &str) -> String {
    let stem = powershell_literal(strip_exe(name));
    format!(
        r#"{PRELUDE}$p = Get-Process -Name '{stem}' -ErrorAction SilentlyContinue | Where-Object {{ $_.MainWindowHandle -ne [IntPtr]::Zero }} | Select-Object -First 1
if ($p) {{
    [void][AsgWin]::ShowWindow($p.MainWindowHandle, {SHOW_RESTORE})
    [void][AsgWin]::SetForegroundWindow($p.MainWindowHandle)
    Write-Output "Activated:$($p.Id)"
}} else {{
    Write-Output "NoWindow"
}}
"#
    )
}

/// Prints `Started` or `Failed:<message>`.
pub fn start_process(name: &str) -> String {
    let name = powershell_literal(name);
    format!(
        r#"try {{ Start-Process '{name}' -ErrorAction Stop; Write-Output "Started" }} catch {{ Write-Output "Failed:$($_.Exception.Message)" }}
"#
    )
}

/// Prints name, pid, path, title and handle of the foreground window,
/// tab-separated.
pub fn foreground() -> String {
    format!(
        r#"{PRELUDE}$hwnd = [AsgWin]::GetForegroundWindow()
$procId = 0
[void][AsgWin]::GetWindowThreadProcessId($hwnd, [ref]$procId)
$title = New-Object System.Text.StringBuilder 512
[void][AsgWin]::GetWindowText($hwnd, $title, 512)
$p = Get-Process -Id $procId -ErrorAction SilentlyContinue
$name = if ($p) {{ $p.ProcessName }} else {{ "" }}
$path = if ($p -and $p.Path) {{ $p.Path }} else {{ "" }}
Write-Output ("{{0}}`t{{1}}`t{{2}}`t{{3}}`t{{4}}" -f $name, $procId, $path, $title.ToString(), $hwnd.ToInt64())
"#
    )
}

pub fn parse_foreground(output: &str) -> Option<ProcessInfo> {
    let line = output.lines().map(str::trim_end).rfind(|l| !l.is_empty())?;
    let fields: Vec<&str> = line.split('\t').collect();
    let [name, pid, path, title, hwnd] = fields.as_slice() else {
        return None;
    };
    if name.trim().is_empty() {
        return None;
    }
    let non_empty = |s: &str| Some(s.trim()).filter(|s| !s.is_empty()).map(String::from);
    Some(ProcessInfo {
        name: format!("{}.exe", name.trim()),
        bundle_id: None,
        path: non_empty(*path).map(PathBuf::from),
        pid: pid.trim().parse().ok(),
        window_title: non_empty(*title),
        window_handle: hwnd.trim().parse().ok().filter(|h| *h != 0).map(WindowHandle),
    })
}

fn named_key(key: NamedKey) -> String {
    match key {
        NamedKey::Enter | NamedKey::Return => "{enter}".into(),
        NamedKey::Tab => "{tab}".into(),
        NamedKey::Space => " ".into(),
        NamedKey::Backspace => "{back}".into(),
        NamedKey::Delete => "{delete}".into(),
        NamedKey::Escape => "{esc}".into(),
        NamedKey::Up => "{up}".into(),
        NamedKey::Down => "{down}".into(),
        NamedKey::Left => "{left}".into(),
        NamedKey::Right => "{right}".into(),
        NamedKey::Home => "{home}".into(),
        NamedKey::End => "{end}".into(),
        NamedKey::PageUp => "{pgup}".into(),
        NamedKey::PageDown => "{pgdn}".into(),
        NamedKey::Function(n) => format!("{{F{n}}}"),
    }
}

fn modifier_key(m: Modifier) -> &'static str {
    match m {
        Modifier::Command => "{win}",
        Modifier::Control => "{ctrl}",
        Modifier::Alt => "{alt}",
        Modifier::Shift => "{shift}",
    }
}

/// `Keyboard::send_keys` string holding each modifier around the main key,
/// e.g. `{ctrl}({shift}(s))`. Text containing send_keys syntax characters is
/// left to the generic chord path.
pub fn send_keys_chord(chord: &Chord) -> Option<String> {
    let mut keys = match &chord.key {
        ChordKey::Named(k) => named_key(*k),
        ChordKey::Text(t) if t.contains(['{', '}', '(', ')']) => return None,
        ChordKey::Text(t) => t.clone(),
    };
    for m in chord.modifiers.iter().rev() {
        keys = format!("{}({keys})", modifier_key(*m));
    }
    Some(keys)
}
