//! Order of the steps behind process-name activation on macOS: System
//! Events by name first, then the first matching process by pid.

use anyhow::Context;
use asg_core::process::{self, ProcessInfo};

pub trait NameSteps {
    /// `tell application <name> to activate`, launching it when not running.
    fn activate_by_name_script(&self, name: &str) -> anyhow::Result<()>;
    fn running(&self) -> Vec<ProcessInfo>;
    /// Bring the process with `pid` to the front.
    fn activate_pid(&self, pid: u32) -> anyhow::Result<()>;
}

pub fn activate_by_name(steps: &dyn NameSteps, name: &str) -> anyhow::Result<()> {
    let script_err = match steps.activate_by_name_script(name) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    log::debug!("System Events activation of {name:?} failed ({script_err:#}), trying pid");

    let processes = steps.running();
    let pid = process::find_by_name(&processes, name)
        .into_iter()
        .find_map(|p| p.pid)
        .with_context(|| format!("no running process named {name:?} ({script_err:#})"))?;
    log::debug!("Activating {name:?} by pid {pid}");
    steps.activate_pid(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Step {
        Script,
        Pid(u32),
    }

    #[derive(Default)]
    struct Recorder {
        script_ok: bool,
        processes: Vec<ProcessInfo>,
        steps: RefCell<Vec<Step>>,
    }

    impl NameSteps for Recorder {
        fn activate_by_name_script(&self, _name: &str) -> anyhow::Result<()> {
            self.steps.borrow_mut().push(Step::Script);
            if self.script_ok {
                Ok(())
            } else {
                anyhow::bail!("osascript failed")
            }
        }

        fn running(&self) -> Vec<ProcessInfo> {
            self.processes.clone()
        }

        fn activate_pid(&self, pid: u32) -> anyhow::Result<()> {
            self.steps.borrow_mut().push(Step::Pid(pid));
            Ok(())
        }
    }

    fn safari(pid: u32) -> ProcessInfo {
        ProcessInfo { pid: Some(pid), ..ProcessInfo::named("Safari") }
    }

    #[test]
    fn script_success_skips_pid_lookup() {
        let steps = Recorder { script_ok: true, processes: vec![safari(7)], ..Recorder::default() };
        activate_by_name(&steps, "Safari").unwrap();
        assert_eq!(*steps.steps.borrow(), vec![Step::Script]);
    }

    #[test]
    fn script_failure_falls_back_to_first_pid() {
        let steps = Recorder { processes: vec![safari(7), safari(9)], ..Recorder::default() };
        activate_by_name(&steps, "safari").unwrap();
        assert_eq!(*steps.steps.borrow(), vec![Step::Script, Step::Pid(7)]);
    }

    #[test]
    fn script_failure_without_process_is_an_error() {
        let steps = Recorder::default();
        let err = activate_by_name(&steps, "Safari").unwrap_err();
        assert!(err.to_string().contains("no running process named"));
        assert_eq!(*steps.steps.borrow(), vec![Step::Script]);
    }
}
