//! Process-wide launcher context.
//!
//! Owns the settings store and the signal bus for the lifetime of the
//! application. Created once at startup and torn down with
//! [`shutdown`](LauncherContext::shutdown).

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::settings::ConfigStore;
use crate::signal::{SignalBus, QUIT};

pub struct LauncherContext {
    config: Config,
    settings_file: PathBuf,
    store: Arc<ConfigStore>,
    signals: Arc<SignalBus>,
}

impl LauncherContext {
    /// Load the persisted settings named by `config`.
    pub fn init(config: Config) -> Result<Self> {
        let settings_file = config.settings_file();
        let store = ConfigStore::load(&settings_file, config.kickstarts_dir())?;
        tracing::debug!("Launcher context ready, settings at {:?}", settings_file);
        Ok(Self {
            config,
            settings_file,
            store: Arc::new(store),
            signals: Arc::new(SignalBus::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn signals(&self) -> &Arc<SignalBus> {
        &self.signals
    }

    /// Persist the settings store without shutting down.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.settings_file)?;
        Ok(())
    }

    /// Publish [`QUIT`] and persist the settings store.
    pub fn shutdown(self) -> Result<()> {
        tracing::info!("Shutting down");
        self.signals.notify(QUIT);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::keys;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.general.base_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_init_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let context = LauncherContext::init(config_in(dir.path())).unwrap();

        assert!(context.store().snapshot().is_empty());
        assert_eq!(context.store().kickstarts_dir(), dir.path().join("Kickstarts"));
    }

    #[test]
    fn test_shutdown_signals_quit_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let context = LauncherContext::init(config_in(dir.path())).unwrap();
        context.store().set(keys::KICKSTART_FILE, "internal");

        let quit = Arc::new(AtomicBool::new(false));
        let flag = quit.clone();
        context.signals().add_listener(QUIT, move || {
            flag.store(true, Ordering::SeqCst);
        });

        context.shutdown().unwrap();
        assert!(quit.load(Ordering::SeqCst));

        let reloaded = LauncherContext::init(config_in(dir.path())).unwrap();
        assert_eq!(reloaded.store().get(keys::KICKSTART_FILE), "internal");
    }
}
