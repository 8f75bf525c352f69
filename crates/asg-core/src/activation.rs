//! Window activation chain.
//!
//! Strategies run in a fixed order, each at most once, and the first success
//! wins: window handle, process name, bundle id, application path. Steps
//! whose hint is absent are recorded as skipped, not failed.

use std::fmt;

use thiserror::Error;

use crate::action::ActivationHints;
use crate::platform::WindowPlatform;
use crate::process::ProcessInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    WindowHandle,
    ProcessName,
    BundleId,
    AppPath,
}

impl Strategy {
    pub const ORDER: [Strategy; 4] = [
        Strategy::WindowHandle,
        Strategy::ProcessName,
        Strategy::BundleId,
        Strategy::AppPath,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WindowHandle => "window_handle",
            Self::ProcessName => "process_name",
            Self::BundleId => "bundle_id",
            Self::AppPath => "app_path",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
    /// The hint for this strategy was absent.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationStep {
    pub strategy: Strategy,
    pub outcome: StepOutcome,
}

impl fmt::Display for ActivationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            StepOutcome::Succeeded => write!(f, "{}: ok", self.strategy),
            StepOutcome::Failed(reason) => write!(f, "{}: {reason}", self.strategy),
            StepOutcome::Skipped => write!(f, "{}: not given", self.strategy),
        }
    }
}

/// Which strategy brought the target forward, plus every step tried on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub strategy: Strategy,
    pub steps: Vec<ActivationStep>,
}

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("activate needs at least one of window_handle, process_name, bundle_id or app_path")]
    MissingIdentifier,
    #[error("could not activate target ({})", join_steps(.steps))]
    Exhausted { steps: Vec<ActivationStep> },
}

fn join_steps(steps: &[ActivationStep]) -> String {
    steps
        .iter()
        .filter(|s| s.outcome != StepOutcome::Skipped)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Bring the target described by `hints` to the foreground.
pub fn activate(
    platform: &dyn WindowPlatform,
    hints: &ActivationHints,
) -> Result<ActivationReport, ActivationError> {
    if hints.is_empty() {
        return Err(ActivationError::MissingIdentifier);
    }

    let mut steps = Vec::with_capacity(Strategy::ORDER.len());
    for strategy in Strategy::ORDER {
        let attempt = match strategy {
            Strategy::WindowHandle => hints.window_handle.map(|h| platform.activate_window(h)),
            Strategy::ProcessName => hints.process_name.as_deref().map(|n| platform.activate_process(n)),
            Strategy::BundleId => hints.bundle_id.as_deref().map(|b| platform.activate_bundle_id(b)),
            Strategy::AppPath => hints.app_path.as_deref().map(|p| platform.activate_path(p)),
        };
        let outcome = match attempt {
            None => StepOutcome::Skipped,
            Some(Ok(())) => StepOutcome::Succeeded,
            Some(Err(e)) => {
                log::warn!("Activation by {strategy} failed: {e}");
                StepOutcome::Failed(e.to_string())
            }
        };
        let done = outcome == StepOutcome::Succeeded;
        steps.push(ActivationStep { strategy, outcome });
        if done {
            log::info!("Activated target via {strategy} on {}", platform.platform_name());
            return Ok(ActivationReport { strategy, steps });
        }
    }

    Err(ActivationError::Exhausted { steps })
}

/// Hints that re-target `info` through a single strategy, or `None` when
/// the process does not carry that identifier.
pub fn hints_for(info: &ProcessInfo, strategy: Strategy) -> Option<ActivationHints> {
    let mut hints = ActivationHints::default();
    match strategy {
        Strategy::WindowHandle => hints.window_handle = Some(info.window_handle?),
        Strategy::ProcessName => {
            hints.process_name = Some(info.name.clone()).filter(|n| !n.is_empty())
        }
        Strategy::BundleId => hints.bundle_id = Some(info.bundle_id.clone()?),
        Strategy::AppPath => hints.app_path = Some(info.path.clone()?),
    }
    (!hints.is_empty()).then_some(hints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPlatform, PlatformCall};
    use crate::process::WindowHandle;
    use std::path::PathBuf;

    fn all_hints() -> ActivationHints {
        ActivationHints {
            window_handle: Some(WindowHandle(77)),
            process_name: Some("Notes".into()),
            bundle_id: Some("com.apple.Notes".into()),
            app_path: Some(PathBuf::from("/Applications/Notes.app")),
        }
    }

    #[test]
    fn hints_for_picks_one_identifier() {
        let info = ProcessInfo {
            name: "Notes".into(),
            bundle_id: Some("com.apple.Notes".into()),
            ..ProcessInfo::default()
        };
        let hints = hints_for(&info, Strategy::BundleId).unwrap();
        assert_eq!(hints.bundle_id.as_deref(), Some("com.apple.Notes"));
        assert!(hints.process_name.is_none());
        assert!(hints_for(&info, Strategy::WindowHandle).is_none());
        assert!(hints_for(&ProcessInfo::default(), Strategy::ProcessName).is_none());
    }

    #[test]
    fn empty_hints_is_missing_identifier() {
        let platform = MockPlatform::new();
        let err = activate(&platform, &ActivationHints::default()).unwrap_err();
        assert!(matches!(err, ActivationError::MissingIdentifier));
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn handle_success_stops_the_chain() {
        let platform = MockPlatform::new().succeed(Strategy::WindowHandle);
        let report = activate(&platform, &all_hints()).unwrap();
        assert_eq!(report.strategy, Strategy::WindowHandle);
        assert_eq!(platform.calls(), vec![PlatformCall::ActivateWindow(WindowHandle(77))]);
    }

    #[test]
    fn falls_through_to_bundle_after_handle_and_name_fail() {
        let platform = MockPlatform::new().succeed(Strategy::BundleId);
        let report = activate(&platform, &all_hints()).unwrap();
        assert_eq!(report.strategy, Strategy::BundleId);
        assert_eq!(
            platform.calls(),
            vec![
                PlatformCall::ActivateWindow(WindowHandle(77)),
                PlatformCall::ActivateProcess("Notes".into()),
                PlatformCall::ActivateBundle("com.apple.Notes".into()),
            ]
        );
    }

    #[test]
    fn bundle_failure_reaches_path_without_retrying_name() {
        let platform = MockPlatform::new().succeed(Strategy::AppPath);
        let report = activate(&platform, &all_hints()).unwrap();
        assert_eq!(report.strategy, Strategy::AppPath);
        let name_attempts = platform
            .calls()
            .into_iter()
            .filter(|c| matches!(c, PlatformCall::ActivateProcess(_)))
            .count();
        assert_eq!(name_attempts, 1);
    }

    #[test]
    fn absent_hints_are_skipped_not_failed() {
        let platform = MockPlatform::new().succeed(Strategy::AppPath);
        let hints = ActivationHints {
            app_path: Some(PathBuf::from("/usr/bin/true")),
            ..ActivationHints::default()
        };
        let report = activate(&platform, &hints).unwrap();
        assert_eq!(report.steps.len(), 4);
        assert!(report.steps[..3].iter().all(|s| s.outcome == StepOutcome::Skipped));
        assert_eq!(report.steps[3].outcome, StepOutcome::Succeeded);
    }

    #[test]
    fn exhausted_reports_every_attempt() {
        let platform = MockPlatform::new();
        let hints = ActivationHints {
            process_name: Some("Ghost".into()),
            bundle_id: Some("com.example.ghost".into()),
            ..ActivationHints::default()
        };
        let err = activate(&platform, &hints).unwrap_err();
        let ActivationError::Exhausted { steps } = &err else {
            panic!("expected Exhausted, got {err:?}");
        };
        let failed: Vec<_> = steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed(_)))
            .map(|s| s.strategy)
            .collect();
        assert_eq!(failed, vec![Strategy::ProcessName, Strategy::BundleId]);
        let msg = err.to_string();
        assert!(msg.contains("process_name"));
        assert!(!msg.contains("window_handle"));
    }
}
