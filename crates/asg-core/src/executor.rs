//! Executor: walks an action tree depth-first against an input driver and a
//! window platform.
//!
//! A node failure is logged, reported to the progress sink and then skipped:
//! siblings and later nodes still run. Nothing a node does can abort the run.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::action::Action;
use crate::activation::{self, ActivationError};
use crate::condition;
use crate::context::{CancelToken, ExecutionContext, RunSummary};
use crate::input::{InputDriver, KeyDirection};
use crate::keys::{Chord, ChordKey, KeyError};
use crate::platform::WindowPlatform;
use crate::progress::{Branch, NoProgress, ProgressEvent, ProgressSink};
use crate::settings::EngineSettings;

/// Longest uninterrupted slice of a `sleep` when a cancel token is attached.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("unknown action type {0:?}")]
    UnknownKind(String),
    #[error("invalid {kind} action: {reason}")]
    Invalid { kind: String, reason: String },
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error("nesting deeper than {max} levels")]
    DepthExceeded { max: usize },
    #[error("{0:#}")]
    Input(#[from] anyhow::Error),
}

pub struct Executor<'a> {
    driver: &'a mut dyn InputDriver,
    platform: &'a dyn WindowPlatform,
    settings: &'a EngineSettings,
    progress: &'a dyn ProgressSink,
    cancel: Option<CancelToken>,
}

impl<'a> Executor<'a> {
    pub fn new(
        driver: &'a mut dyn InputDriver,
        platform: &'a dyn WindowPlatform,
        settings: &'a EngineSettings,
    ) -> Self {
        Self {
            driver,
            platform,
            settings,
            progress: &NoProgress,
            cancel: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run `actions` in order. Never fails; see [`RunSummary`] for counts.
    pub fn execute(&mut self, actions: &[Action]) -> RunSummary {
        let started = Instant::now();
        let mut ctx = ExecutionContext::default();
        log::info!(
            "Executing {} action(s) with driver={}, platform={}",
            actions.len(),
            self.driver.name(),
            self.platform.platform_name()
        );
        self.run_sequence(actions, &mut ctx);
        let summary = ctx.summary();
        log::info!(
            "Run finished in {:.2?}: {} attempted, {} failed{}",
            started.elapsed(),
            summary.attempted,
            summary.failed,
            if summary.cancelled { ", cancelled" } else { "" }
        );
        self.progress.on_event(ProgressEvent::RunFinished {
            attempted: summary.attempted,
            failed: summary.failed,
        });
        summary
    }

    fn is_cancelled(&self, ctx: &mut ExecutionContext) -> bool {
        if ctx.cancelled {
            return true;
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            ctx.cancelled = true;
            let path = ctx.path_label();
            log::info!("Run cancelled before node {path}");
            self.progress.on_event(ProgressEvent::Cancelled { path });
            return true;
        }
        false
    }

    fn run_sequence(&mut self, actions: &[Action], ctx: &mut ExecutionContext) {
        for (i, action) in actions.iter().enumerate() {
            ctx.path.push(i + 1);
            if self.is_cancelled(ctx) {
                ctx.path.pop();
                return;
            }
            let path = ctx.path_label();
            log::info!("[{path}] {action}");
            self.progress.on_event(ProgressEvent::ActionStarted {
                path: path.clone(),
                action: action.to_string(),
            });
            ctx.attempted += 1;
            if let Err(e) = self.run_node(action, ctx) {
                ctx.failed += 1;
                log::error!("[{path}] {} failed: {e}", action.kind());
                self.progress.on_event(ProgressEvent::ActionFailed {
                    path,
                    kind: action.kind().to_string(),
                    error: e.to_string(),
                });
            }
            ctx.path.pop();
        }
    }

    fn run_node(&mut self, action: &Action, ctx: &mut ExecutionContext) -> Result<(), NodeError> {
        match action {
            Action::Move { x, y } => self.driver.move_to(*x, *y)?,
            Action::Click { button } => self.driver.click(*button)?,
            Action::Type { text } => self.driver.type_text(text)?,
            Action::Key { key, modifiers } => {
                let chord = Chord::normalize(key, modifiers)?;
                self.press_chord(&chord)?;
            }
            Action::Sleep { duration } => self.sleep(*duration)?,
            Action::Activate(hints) => {
                let report = activation::activate(self.platform, hints)?;
                log::debug!("Activation steps: {:?}", report.steps);
            }
            Action::If { condition, then_actions, else_actions } => {
                self.enter(ctx)?;
                let result = condition::evaluate(condition, &mut *self.driver, self.settings, ctx);
                log::info!("Condition {condition:?} -> {result}");
                self.progress.on_event(ProgressEvent::ConditionEvaluated {
                    condition: condition.clone(),
                    result,
                });
                let (branch, body) = match (result, else_actions.is_empty()) {
                    (true, _) => (Branch::Then, then_actions.as_slice()),
                    (false, false) => (Branch::Else, else_actions.as_slice()),
                    (false, true) => (Branch::None, &[][..]),
                };
                self.progress.on_event(ProgressEvent::BranchTaken(branch));
                self.run_sequence(body, ctx);
                ctx.depth -= 1;
            }
            Action::For { count, loop_actions } => {
                self.enter(ctx)?;
                let count = (*count).max(1) as u64;
                for iteration in 1..=count {
                    if self.is_cancelled(ctx) {
                        break;
                    }
                    log::debug!("Loop iteration {iteration}/{count}");
                    self.progress.on_event(ProgressEvent::LoopIteration { iteration, count });
                    self.run_sequence(loop_actions, ctx);
                }
                ctx.depth -= 1;
            }
            Action::FindImage { image_path } => {
                condition::locate_image(&mut *self.driver, image_path, ctx)?;
            }
            Action::FindImageAndMove { image_path } => {
                condition::move_to_image(&mut *self.driver, image_path, ctx)?;
            }
            Action::FindImageAndClick { image_path, button } => {
                condition::click_image(&mut *self.driver, image_path, *button, self.settings, ctx)?;
            }
            Action::Unknown { kind } => return Err(NodeError::UnknownKind(kind.clone())),
            Action::Invalid { kind, reason } => {
                return Err(NodeError::Invalid { kind: kind.clone(), reason: reason.clone() })
            }
        }
        Ok(())
    }

    /// Descend one nesting level, refusing past `max_depth`.
    fn enter(&self, ctx: &mut ExecutionContext) -> Result<(), NodeError> {
        if ctx.depth >= self.settings.max_depth {
            return Err(NodeError::DepthExceeded { max: self.settings.max_depth });
        }
        ctx.depth += 1;
        Ok(())
    }

    fn sleep(&self, seconds: f64) -> Result<(), NodeError> {
        let seconds = if seconds > 0.0 { seconds } else { 1.0 };
        let total = Duration::try_from_secs_f64(seconds).map_err(|e| NodeError::Invalid {
            kind: "sleep".into(),
            reason: format!("duration {seconds}: {e}"),
        })?;
        let Some(token) = &self.cancel else {
            std::thread::sleep(total);
            return Ok(());
        };
        let deadline = Instant::now() + total;
        loop {
            let now = Instant::now();
            if now >= deadline || token.is_cancelled() {
                return Ok(());
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }

    fn strike(&mut self, key: &ChordKey) -> anyhow::Result<()> {
        match key {
            ChordKey::Named(named) => self.driver.tap(*named),
            ChordKey::Text(text) => self.driver.type_text(text),
        }
    }

    fn press_chord(&mut self, chord: &Chord) -> anyhow::Result<()> {
        if chord.modifiers.is_empty() {
            return self.strike(&chord.key);
        }
        match self.platform.send_chord(chord) {
            Ok(()) => {
                log::debug!("Sent {chord} via {}", self.platform.platform_name());
                return Ok(());
            }
            Err(e) => log::debug!("Native chord unavailable ({e}), toggling modifiers"),
        }
        self.toggle_chord(chord)
    }

    /// Press modifiers in order, strike the key, release in reverse order.
    /// Every modifier that went down is released, whatever else failed.
    fn toggle_chord(&mut self, chord: &Chord) -> anyhow::Result<()> {
        let settle = self.settings.chord_settle();
        let mut pressed = Vec::with_capacity(chord.modifiers.len());
        let mut result = Ok(());

        for modifier in &chord.modifiers {
            match self.driver.toggle_modifier(*modifier, KeyDirection::Press) {
                Ok(()) => pressed.push(*modifier),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        if result.is_ok() {
            std::thread::sleep(settle);
            result = self.strike(&chord.key);
            std::thread::sleep(settle);
        }

        for modifier in pressed.iter().rev() {
            if let Err(e) = self.driver.toggle_modifier(*modifier, KeyDirection::Release) {
                log::warn!("Failed to release {modifier}: {e:#}");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActivationHints, MouseButton};
    use crate::activation::Strategy;
    use crate::keys::{Modifier, NamedKey};
    use crate::mock::{InputCall, MockDriver, MockPlatform, PlatformCall};
    use crate::progress::ChannelProgress;
    use std::sync::mpsc;

    fn fast() -> EngineSettings {
        EngineSettings {
            chord_settle_ms: 0,
            image_click_settle_ms: 0,
            ..EngineSettings::default()
        }
    }

    fn run(actions: &[Action], driver: &mut MockDriver, platform: &MockPlatform) -> RunSummary {
        let settings = fast();
        Executor::new(driver, platform, &settings).execute(actions)
    }

    fn parse(json: &str) -> Vec<Action> {
        serde_json::from_str(json).unwrap()
    }

    fn key(key: &str, modifiers: &[&str]) -> Action {
        Action::Key {
            key: key.into(),
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn primitives_forward_to_driver() {
        let mut driver = MockDriver::new();
        let actions = parse(
            r#"[{"type":"move","x":-5,"y":99999},{"type":"click","button":"center"},{"type":"type","text":"a\tb"}]"#,
        );
        let summary = run(&actions, &mut driver, &MockPlatform::new());
        assert_eq!(summary, RunSummary { attempted: 3, failed: 0, cancelled: false });
        assert_eq!(
            driver.calls,
            vec![
                InputCall::Move(-5, 99999),
                InputCall::Click(MouseButton::Center),
                InputCall::Type("a\tb".into()),
            ]
        );
    }

    #[test]
    fn key_without_modifiers_taps_named_or_types_text() {
        let mut driver = MockDriver::new();
        run(&[key("Enter", &[]), key("hello", &[])], &mut driver, &MockPlatform::new());
        assert_eq!(
            driver.calls,
            vec![InputCall::Tap(NamedKey::Enter), InputCall::Type("hello".into())]
        );
    }

    #[test]
    fn toggle_chord_releases_in_reverse_order() {
        let mut driver = MockDriver::new();
        run(&[key("s", &["ctrl", "shift"])], &mut driver, &MockPlatform::new());
        assert_eq!(
            driver.calls,
            vec![
                InputCall::Toggle(Modifier::Control, KeyDirection::Press),
                InputCall::Toggle(Modifier::Shift, KeyDirection::Press),
                InputCall::Type("s".into()),
                InputCall::Toggle(Modifier::Shift, KeyDirection::Release),
                InputCall::Toggle(Modifier::Control, KeyDirection::Release),
            ]
        );
    }

    #[test]
    fn native_chord_skips_toggling() {
        let mut driver = MockDriver::new();
        let platform = MockPlatform::new().with_native_chords();
        run(&[key("tab", &["cmd"])], &mut driver, &platform);
        assert!(driver.calls.is_empty());
        assert_eq!(platform.calls(), vec![PlatformCall::SendChord("command+tab".into())]);
    }

    #[test]
    fn failed_modifier_press_releases_those_already_down() {
        let mut driver = MockDriver::new().failing_modifier(Modifier::Alt);
        let summary = run(&[key("x", &["ctrl", "alt", "shift"])], &mut driver, &MockPlatform::new());
        assert_eq!(summary.failed, 1);
        assert_eq!(
            driver.calls,
            vec![
                InputCall::Toggle(Modifier::Control, KeyDirection::Press),
                InputCall::Toggle(Modifier::Control, KeyDirection::Release),
            ]
        );
    }

    #[test]
    fn unknown_modifier_fails_only_that_node() {
        let mut driver = MockDriver::new();
        let summary = run(&[key("a", &["hyper"]), Action::Click { button: MouseButton::Left }], &mut driver, &MockPlatform::new());
        assert_eq!(summary.failed, 1);
        assert_eq!(driver.calls, vec![InputCall::Click(MouseButton::Left)]);
    }

    #[test]
    fn for_loop_coerces_count_and_repeats_in_order() {
        for (count, expected) in [(-4, 1), (0, 1), (3, 3)] {
            let mut driver = MockDriver::new();
            let actions = vec![Action::For {
                count,
                loop_actions: vec![Action::Click { button: MouseButton::Left }],
            }];
            run(&actions, &mut driver, &MockPlatform::new());
            assert_eq!(driver.calls.len(), expected, "count {count}");
        }
    }

    #[test]
    fn if_runs_exactly_one_branch() {
        let mut driver = MockDriver::new().with_processes(&["Finder"]);
        let actions = parse(
            r#"[{"type":"if","condition":"window_exists:finder",
                 "then_actions":[{"type":"type","text":"then"}],
                 "else_actions":[{"type":"type","text":"else"}]},
                {"type":"if","condition":"window_exists:Nope",
                 "then_actions":[{"type":"type","text":"then"}],
                 "else_actions":[{"type":"type","text":"else"}]},
                {"type":"if","condition":"window_exists:Nope",
                 "then_actions":[{"type":"type","text":"then"}]}]"#,
        );
        run(&actions, &mut driver, &MockPlatform::new());
        assert_eq!(
            driver.input_calls(),
            vec![InputCall::Type("then".into()), InputCall::Type("else".into())]
        );
    }

    #[test]
    fn failures_do_not_stop_siblings() {
        let mut driver = MockDriver::new().failing_clicks();
        let actions = parse(
            r#"[{"type":"click"},{"type":"teleport"},{"type":"activate"},{"type":"type","text":"after"}]"#,
        );
        let summary = run(&actions, &mut driver, &MockPlatform::new());
        assert_eq!(summary.attempted, 4);
        assert_eq!(summary.failed, 3);
        assert_eq!(driver.calls.last(), Some(&InputCall::Type("after".into())));
    }

    #[test]
    fn activate_with_only_name_does_not_try_bundle_or_path() {
        let mut driver = MockDriver::new();
        let platform = MockPlatform::new();
        let actions = vec![Action::Activate(ActivationHints {
            process_name: Some("Ghost".into()),
            ..ActivationHints::default()
        })];
        let summary = run(&actions, &mut driver, &platform);
        assert_eq!(summary.failed, 1);
        assert_eq!(platform.calls(), vec![PlatformCall::ActivateProcess("Ghost".into())]);
    }

    #[test]
    fn activate_success_is_not_a_failure() {
        let mut driver = MockDriver::new();
        let platform = MockPlatform::new().succeed(Strategy::ProcessName);
        let actions = parse(r#"[{"type":"activate","process_name":"Notes"}]"#);
        assert_eq!(run(&actions, &mut driver, &platform).failed, 0);
    }

    #[test]
    fn depth_limit_stops_descent() {
        let mut nested = vec![Action::Click { button: MouseButton::Left }];
        for _ in 0..5 {
            nested = vec![Action::For { count: 1, loop_actions: nested }];
        }
        let settings = EngineSettings { max_depth: 3, ..fast() };
        let mut driver = MockDriver::new();
        let platform = MockPlatform::new();
        let summary = Executor::new(&mut driver, &platform, &settings).execute(&nested);
        assert_eq!(summary.failed, 1);
        assert!(driver.calls.is_empty());
    }

    #[test]
    fn find_image_and_click_action_uses_found_centre() {
        let mut driver = MockDriver::new().with_image("ok.png", (12, 34));
        let actions = parse(r#"[{"type":"find_image_and_click","image_path":"ok.png","button":"right"}]"#);
        run(&actions, &mut driver, &MockPlatform::new());
        assert_eq!(
            driver.input_calls(),
            vec![InputCall::Move(12, 34), InputCall::Click(MouseButton::Right)]
        );
    }

    #[test]
    fn zero_sleep_waits_about_one_second() {
        let mut driver = MockDriver::new();
        let started = Instant::now();
        run(&[Action::Sleep { duration: 0.0 }], &mut driver, &MockPlatform::new());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(950), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "{elapsed:?}");
    }

    #[test]
    fn infinite_sleep_is_invalid() {
        let mut driver = MockDriver::new();
        let summary = run(&[Action::Sleep { duration: f64::INFINITY }], &mut driver, &MockPlatform::new());
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn cancelled_token_stops_before_next_node() {
        let mut driver = MockDriver::new();
        let platform = MockPlatform::new();
        let settings = fast();
        let token = CancelToken::new();
        token.cancel();
        let summary = Executor::new(&mut driver, &platform, &settings)
            .with_cancel(token)
            .execute(&[Action::Click { button: MouseButton::Left }]);
        assert!(summary.cancelled);
        assert_eq!(summary.attempted, 0);
        assert!(driver.calls.is_empty());
    }

    #[test]
    fn progress_events_follow_the_walk() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelProgress(tx);
        let mut driver = MockDriver::new();
        let platform = MockPlatform::new();
        let settings = fast();
        let actions = parse(
            r#"[{"type":"if","condition":"mystery","then_actions":[{"type":"teleport"}]}]"#,
        );
        Executor::new(&mut driver, &platform, &settings)
            .with_progress(&sink)
            .execute(&actions);
        drop(sink);
        let events: Vec<_> = rx.iter().collect();
        assert!(matches!(&events[0], ProgressEvent::ActionStarted { path, .. } if path == "1"));
        assert_eq!(
            events[1],
            ProgressEvent::ConditionEvaluated { condition: "mystery".into(), result: true }
        );
        assert_eq!(events[2], ProgressEvent::BranchTaken(Branch::Then));
        assert!(matches!(&events[3], ProgressEvent::ActionStarted { path, .. } if path == "1.1"));
        assert!(matches!(&events[4], ProgressEvent::ActionFailed { kind, .. } if kind == "teleport"));
        assert_eq!(events[5], ProgressEvent::RunFinished { attempted: 2, failed: 1 });
    }
}
