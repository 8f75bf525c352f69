//! Runner: wires a config file to the input driver and window platform.

use std::path::Path;

use crate::config::{Config, ConfigError};
use crate::context::{CancelToken, RunSummary};
use crate::executor::Executor;
use crate::input::{EnigoDriver, InputDriver};
use crate::platform::{PlatformFactory, WindowPlatform};
use crate::progress::{NoProgress, ProgressEvent, ProgressSink};
use crate::settings::EngineSettings;

pub struct Runner {
    pub driver: Box<dyn InputDriver>,
    pub platform: Box<dyn WindowPlatform>,
    pub settings: EngineSettings,
    progress: Box<dyn ProgressSink>,
    cancel: Option<CancelToken>,
}

impl Runner {
    pub fn new(
        driver: Box<dyn InputDriver>,
        platform: Box<dyn WindowPlatform>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            driver,
            platform,
            settings,
            progress: Box::new(NoProgress),
            cancel: None,
        }
    }

    /// Build a runner on the real desktop: enigo input plus the first
    /// platform factory that claims this OS.
    pub fn from_settings(
        settings: EngineSettings,
        platform_factories: &[&PlatformFactory],
    ) -> anyhow::Result<Self> {
        let driver = EnigoDriver::new(&settings)?;
        let platform = crate::platform::create_platform(&settings, platform_factories);
        log::info!(
            "Runner: driver={}, platform={}, max_depth={}",
            driver.name(),
            platform.platform_name(),
            settings.max_depth
        );
        Ok(Self::new(Box::new(driver), platform, settings))
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Execute one config. Node failures are counted, never returned.
    pub fn run(&mut self, cfg: &Config) -> RunSummary {
        log::info!("Running config {:?}: {}", cfg.name, cfg.description);
        self.progress.on_event(ProgressEvent::RunStarted {
            name: cfg.name.clone(),
            description: cfg.description.clone(),
        });
        let mut executor = Executor::new(&mut *self.driver, &*self.platform, &self.settings)
            .with_progress(&*self.progress);
        if let Some(token) = &self.cancel {
            executor = executor.with_cancel(token.clone());
        }
        executor.execute(&cfg.actions)
    }

    /// Load and execute a config file. Only loading can fail.
    pub fn run_file(&mut self, path: &Path) -> Result<RunSummary, ConfigError> {
        let cfg = Config::load(path)?;
        Ok(self.run(&cfg))
    }
}
