//! Process-name activation order on X11: a visible window of each matching
//! pid in turn, or a fresh launch when nothing matches.

use asg_core::process::{self, ProcessInfo};

pub trait NameSteps {
    fn running(&self) -> Vec<ProcessInfo>;
    /// Activate a visible window owned by `pid`.
    fn focus_pid(&self, pid: u32) -> anyhow::Result<()>;
    /// Spawn `name` as an executable from `PATH`.
    fn launch_by_name(&self, name: &str) -> anyhow::Result<()>;
}

pub fn activate_by_name(steps: &dyn NameSteps, name: &str) -> anyhow::Result<()> {
    let processes = steps.running();
    let matches = process::find_by_name(&processes, name);
    if matches.is_empty() {
        log::debug!("{name:?} is not running, launching it");
        return steps.launch_by_name(name);
    }
    for pid in matches.iter().filter_map(|p| p.pid) {
        match steps.focus_pid(pid) {
            Ok(()) => return Ok(()),
            Err(e) => log::debug!("{e:#}"),
        }
    }
    anyhow::bail!("{name:?} is running but has no visible window")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        processes: Vec<ProcessInfo>,
        window_pid: Option<u32>,
        steps: RefCell<Vec<String>>,
    }

    impl NameSteps for Recorder {
        fn running(&self) -> Vec<ProcessInfo> {
            self.processes.clone()
        }

        fn focus_pid(&self, pid: u32) -> anyhow::Result<()> {
            self.steps.borrow_mut().push(format!("focus {pid}"));
            if self.window_pid == Some(pid) {
                Ok(())
            } else {
                anyhow::bail!("no visible window for pid {pid}")
            }
        }

        fn launch_by_name(&self, name: &str) -> anyhow::Result<()> {
            self.steps.borrow_mut().push(format!("launch {name}"));
            Ok(())
        }
    }

    fn gedit(pid: u32) -> ProcessInfo {
        ProcessInfo { pid: Some(pid), ..ProcessInfo::named("gedit") }
    }

    #[test]
    fn launches_when_not_running() {
        let steps = Recorder::default();
        activate_by_name(&steps, "gedit").unwrap();
        assert_eq!(*steps.steps.borrow(), vec!["launch gedit"]);
    }

    #[test]
    fn focuses_first_pid_with_a_window() {
        let steps = Recorder {
            processes: vec![gedit(3), gedit(4)],
            window_pid: Some(4),
            ..Recorder::default()
        };
        activate_by_name(&steps, "GEdit").unwrap();
        assert_eq!(*steps.steps.borrow(), vec!["focus 3", "focus 4"]);
    }

    #[test]
    fn running_without_window_fails_without_launching() {
        let steps = Recorder { processes: vec![gedit(3)], ..Recorder::default() };
        let err = activate_by_name(&steps, "gedit").unwrap_err();
        assert!(err.to_string().contains("no visible window"));
        assert_eq!(*steps.steps.borrow(), vec!["focus 3"]);
    }
}
