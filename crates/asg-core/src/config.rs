//! Config: the top-level unit handed to the executor for one run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Action;

/// The only failures that abort a whole run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, deserialize_with = "crate::action::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::action::null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "crate::action::null_as_default")]
    pub actions: Vec<Action>,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_json(&text)?;
        log::debug!("Loaded config {:?} ({} root actions) from {:?}", cfg.name, cfg.actions.len(), path);
        Ok(cfg)
    }

    /// Total number of nodes in the tree, including nested bodies.
    pub fn node_count(&self) -> usize {
        fn count(actions: &[Action]) -> usize {
            actions
                .iter()
                .map(|a| 1 + a.children().into_iter().map(count).sum::<usize>())
                .sum()
        }
        count(&self.actions)
    }

    /// Indented one-line-per-node outline of the tree.
    pub fn outline(&self) -> String {
        fn walk(actions: &[Action], depth: usize, out: &mut String) {
            for (i, action) in actions.iter().enumerate() {
                out.push_str(&"  ".repeat(depth));
                out.push_str(&format!("{}. {action}\n", i + 1));
                match action {
                    Action::If { then_actions, else_actions, .. } => {
                        if !then_actions.is_empty() {
                            out.push_str(&"  ".repeat(depth + 1));
                            out.push_str("then:\n");
                            walk(then_actions, depth + 2, out);
                        }
                        if !else_actions.is_empty() {
                            out.push_str(&"  ".repeat(depth + 1));
                            out.push_str("else:\n");
                            walk(else_actions, depth + 2, out);
                        }
                    }
                    Action::For { loop_actions, .. } => walk(loop_actions, depth + 1, out),
                    _ => {}
                }
            }
        }
        let mut out = String::new();
        walk(&self.actions, 0, &mut out);
        out
    }
}
