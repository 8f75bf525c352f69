//! asg-core: action tree interpreter for desktop automation.
//!
//! Parses JSON action trees, walks them against an [`InputDriver`] and a
//! [`WindowPlatform`], evaluates `if` predicates and brings windows forward
//! through an ordered activation chain. OS-specific window work lives in the
//! `asg-macos`, `asg-windows` and `asg-linux` crates.

pub mod action;
pub mod activation;
pub mod condition;
pub mod config;
pub mod context;
pub mod executor;
pub mod input;
pub mod keys;
pub mod mock;
pub mod platform;
pub mod process;
pub mod progress;
pub mod runner;
pub mod script;
pub mod settings;

pub use action::{Action, ActivationHints, MouseButton};
pub use activation::{activate, ActivationError, ActivationReport, Strategy};
pub use condition::Predicate;
pub use config::{Config, ConfigError};
pub use context::{CancelToken, ExecutionContext, RunSummary};
pub use executor::{Executor, NodeError};
pub use input::InputDriver;
pub use platform::{PlatformError, WindowPlatform};
pub use process::{ProcessInfo, WindowHandle};
pub use progress::{ProgressEvent, ProgressSink};
pub use runner::Runner;
pub use settings::EngineSettings;
