//! Progress events emitted while a tree executes.

use std::sync::mpsc::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Then,
    Else,
    /// Condition was false and there is no else branch.
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    RunStarted { name: String, description: String },
    ActionStarted { path: String, action: String },
    ActionFailed { path: String, kind: String, error: String },
    ConditionEvaluated { condition: String, result: bool },
    BranchTaken(Branch),
    LoopIteration { iteration: u64, count: u64 },
    Cancelled { path: String },
    RunFinished { attempted: usize, failed: usize },
}

/// Receives events synchronously on the executing thread.
pub trait ProgressSink {
    fn on_event(&self, event: ProgressEvent);
}

/// Discards every event. The executor logs on its own.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Forwards events over a channel, e.g. to a UI thread.
pub struct ChannelProgress(pub Sender<ProgressEvent>);

impl ProgressSink for ChannelProgress {
    fn on_event(&self, event: ProgressEvent) {
        // Receiver gone means nobody is watching; the run carries on.
        let _ = self.0.send(event);
    }
}
