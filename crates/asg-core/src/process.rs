//! Running-process identity and enumeration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sysinfo::{ProcessesToUpdate, System};

/// Opaque platform window handle (HWND value on Windows, X11 window id on Linux).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub i64);

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolved identity of a running application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_handle: Option<WindowHandle>,
}

impl ProcessInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive name comparison, the way every lookup in the engine matches names.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Snapshot every process visible to the current user.
///
/// Sorted by pid so that "first match" lookups are stable between calls.
pub fn running_processes() -> Vec<ProcessInfo> {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let mut processes: Vec<ProcessInfo> = system
        .processes()
        .iter()
        .map(|(pid, process)| ProcessInfo {
            name: process.name().to_string_lossy().into_owned(),
            path: process.exe().map(|p| p.to_path_buf()),
            pid: Some(pid.as_u32()),
            ..ProcessInfo::default()
        })
        .collect();
    processes.sort_by_key(|p| p.pid);
    log::debug!("Enumerated {} processes", processes.len());
    processes
}

/// All running processes whose name matches `name` (case-insensitive).
///
/// A trailing `.exe` on either side is ignored so that `notepad` and
/// `notepad.exe` resolve to the same process.
pub fn find_by_name<'a>(processes: &'a [ProcessInfo], name: &str) -> Vec<&'a ProcessInfo> {
    let wanted = strip_exe(name);
    processes
        .iter()
        .filter(|p| strip_exe(&p.name).eq_ignore_ascii_case(wanted))
        .collect()
}

/// Drop a case-insensitive `.exe` suffix.
pub fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}
