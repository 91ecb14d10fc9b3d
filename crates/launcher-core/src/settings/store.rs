//! Observable key/value settings store.
//!
//! Every launcher setting is a string under a string key. Widgets read and
//! write through the store and subscribe to change notifications to keep
//! their displayed state in sync. Notifications are delivered synchronously
//! on the thread that made the change, after the store's locks are released,
//! and only for keys whose value actually changed.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::SettingsError;
use crate::signal::ListenerId;

/// Well-known setting keys.
pub mod keys {
    /// Selected kickstart: `""` (model default), `"internal"`, or a ROM path
    pub const KICKSTART_FILE: &str = "kickstart_file";
    /// Selected extended ROM: `""` (model default) or a ROM path
    pub const KICKSTART_EXT_FILE: &str = "kickstart_ext_file";
    /// Remembered custom kickstart, restored when switching back to custom
    pub const X_KICKSTART_FILE: &str = "x_kickstart_file";
    pub const X_KICKSTART_FILE_SHA1: &str = "x_kickstart_file_sha1";
    /// Remembered custom extended ROM
    pub const X_KICKSTART_EXT_FILE: &str = "x_kickstart_ext_file";
    pub const X_KICKSTART_EXT_FILE_SHA1: &str = "x_kickstart_ext_file_sha1";
    /// Resolved kickstart location, derived by `update_kickstart`
    pub const X_KICKSTART_PATH: &str = "x_kickstart_path";
    /// Resolved extended ROM location, derived by `update_kickstart`
    pub const X_KICKSTART_EXT_PATH: &str = "x_kickstart_ext_path";
}

/// Special kickstart value selecting the emulator's built-in replacement ROM.
pub const INTERNAL_KICKSTART: &str = "internal";

/// Receives `(key, value)` change notifications from a [`ConfigStore`].
pub trait ConfigListener: Send + Sync {
    fn on_config(&self, key: &str, value: &str);
}

/// Shared launcher settings with change notification.
pub struct ConfigStore {
    values: Mutex<BTreeMap<String, String>>,
    listeners: Mutex<Vec<(ListenerId, Arc<dyn ConfigListener>)>>,
    next_listener: AtomicU64,
    kickstarts_dir: PathBuf,
}

impl ConfigStore {
    /// Create an empty store. Bare ROM file names resolve against `kickstarts_dir`.
    pub fn new(kickstarts_dir: PathBuf) -> Self {
        Self::with_values(kickstarts_dir, BTreeMap::new())
    }

    fn with_values(kickstarts_dir: PathBuf, values: BTreeMap<String, String>) -> Self {
        Self {
            values: Mutex::new(values),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            kickstarts_dir,
        }
    }

    /// Load a store persisted with [`save`](Self::save).
    ///
    /// A missing file yields an empty store.
    pub fn load(path: &Path, kickstarts_dir: PathBuf) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::new(kickstarts_dir));
            }
            Err(e) => return Err(persist_error(path, e)),
        };
        let values: BTreeMap<String, String> =
            toml::from_str(&content).map_err(|e| persist_error(path, e))?;
        tracing::debug!("Loaded {} setting(s) from {:?}", values.len(), path);
        Ok(Self::with_values(kickstarts_dir, values))
    }

    /// Write every setting to `path` as a flat TOML table.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = toml::to_string(&self.snapshot()).map_err(|e| persist_error(path, e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| persist_error(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| persist_error(path, e))
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(ListenerId, Arc<dyn ConfigListener>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Directory that bare kickstart file names live in.
    pub fn kickstarts_dir(&self) -> &Path {
        &self.kickstarts_dir
    }

    /// Current value of `key`; unset keys read as the empty string.
    pub fn get(&self, key: &str) -> String {
        self.values().get(key).cloned().unwrap_or_default()
    }

    /// Copy of every setting.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values().clone()
    }

    /// Set one key, notifying listeners if the value changed.
    pub fn set(&self, key: &str, value: &str) {
        self.set_multiple([(key, value)]);
    }

    /// Set several keys at once, then notify listeners of each change in order.
    pub fn set_multiple<I, K, V>(&self, items: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut changed = Vec::new();
        {
            let mut values = self.values();
            for (key, value) in items {
                let (key, value) = (key.as_ref(), value.as_ref());
                if values.get(key).map(String::as_str).unwrap_or("") == value {
                    continue;
                }
                if value.is_empty() {
                    values.remove(key);
                } else {
                    values.insert(key.to_string(), value.to_string());
                }
                changed.push((key.to_string(), value.to_string()));
            }
        }
        if changed.is_empty() {
            return;
        }

        let listeners: Vec<Arc<dyn ConfigListener>> =
            self.listeners().iter().map(|(_, l)| l.clone()).collect();
        for (key, value) in &changed {
            tracing::trace!("Config {} = {:?}", key, value);
            for listener in &listeners {
                listener.on_config(key, value);
            }
        }
    }

    /// Subscribe to change notifications.
    pub fn add_listener(&self, listener: Arc<dyn ConfigListener>) -> ListenerId {
        let id = ListenerId::new(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, listener));
        id
    }

    /// Unsubscribe. Returns whether the listener was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        listeners.len() != before
    }

    /// Recompute the derived kickstart locations from the current selection.
    ///
    /// `""` and `"internal"` pass through, bare file names are joined onto
    /// the kickstarts directory, anything else is used as given.
    pub fn update_kickstart(&self) {
        let kickstart = self.resolve_rom(&self.get(keys::KICKSTART_FILE));
        let extended = self.resolve_rom(&self.get(keys::KICKSTART_EXT_FILE));
        self.set_multiple([
            (keys::X_KICKSTART_PATH, kickstart),
            (keys::X_KICKSTART_EXT_PATH, extended),
        ]);
    }

    fn resolve_rom(&self, value: &str) -> String {
        if value.is_empty() || value == INTERNAL_KICKSTART {
            return value.to_string();
        }
        let path = Path::new(value);
        let bare_name = matches!(
            path.components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
        if bare_name {
            self.kickstarts_dir.join(path).to_string_lossy().into_owned()
        } else {
            value.to_string()
        }
    }
}

fn persist_error(path: &Path, err: impl std::fmt::Display) -> SettingsError {
    SettingsError::Persist {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
