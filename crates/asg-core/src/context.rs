//! Per-run mutable state and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag shared between the caller and a running executor.
///
/// Checked between sibling nodes and before each loop iteration; a primitive
/// already in flight (a chord, a sleep slice) finishes first.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// State owned by one `execute` call and dropped with it.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    /// Centre of the last image found by an image condition or action.
    pub last_image: Option<(i32, i32)>,
    /// Current `if`/`for` nesting level; 0 at the root sequence.
    pub depth: usize,
    /// 1-based index of each node on the way down to the current one.
    pub path: Vec<usize>,
    pub attempted: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl ExecutionContext {
    /// Dotted label such as `2.1.3` for log lines and progress events.
    pub fn path_label(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            attempted: self.attempted,
            failed: self.failed,
            cancelled: self.cancelled,
        }
    }
}

/// Counts reported when a run ends. A run never fails as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub failed: usize,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn path_label_joins_indices() {
        let ctx = ExecutionContext { path: vec![2, 1, 3], ..Default::default() };
        assert_eq!(ctx.path_label(), "2.1.3");
        assert_eq!(ExecutionContext::default().path_label(), "");
    }
}
