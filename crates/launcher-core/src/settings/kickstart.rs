//! Kickstart ROM settings panel.
//!
//! Headless model of the "Kickstart ROM" group: a mode choice and file label
//! for the main kickstart (default / custom / internal) and for the extended
//! ROM (default / custom). The panel writes user choices to the
//! [`ConfigStore`] and follows store changes made elsewhere.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::checksum::RomChecksum;
use super::store::{keys, ConfigListener, ConfigStore, INTERNAL_KICKSTART};
use crate::error::SettingsError;
use crate::signal::ListenerId;

pub const HEADING: &str = "Kickstart ROM";
pub const EXTENDED_LABEL: &str = "Extended ROM:";

/// Kickstart selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KickstartMode {
    /// Whatever the selected Amiga model ships with
    #[default]
    Default,
    /// A user-chosen ROM file
    Custom,
    /// The emulator's built-in replacement ROM
    Internal,
}

impl KickstartMode {
    pub const ALL: [KickstartMode; 3] = [Self::Default, Self::Custom, Self::Internal];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Custom => "Custom",
            Self::Internal => "Internal",
        }
    }
}

/// Extended ROM selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtRomMode {
    #[default]
    Default,
    Custom,
}

impl ExtRomMode {
    pub const ALL: [ExtRomMode; 2] = [Self::Default, Self::Custom];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Custom => "Custom",
        }
    }
}

/// Which ROM a file browse targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomSlot {
    Kickstart,
    Extended,
}

impl RomSlot {
    fn title(self) -> &'static str {
        match self {
            Self::Kickstart => "Choose Kickstart ROM",
            Self::Extended => "Choose Extended ROM",
        }
    }

    /// `(selected, remembered, remembered checksum)` keys for this slot.
    fn keys(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Kickstart => (
                keys::KICKSTART_FILE,
                keys::X_KICKSTART_FILE,
                keys::X_KICKSTART_FILE_SHA1,
            ),
            Self::Extended => (
                keys::KICKSTART_EXT_FILE,
                keys::X_KICKSTART_EXT_FILE,
                keys::X_KICKSTART_EXT_FILE_SHA1,
            ),
        }
    }
}

/// Lets the user pick a ROM file.
pub trait FilePicker {
    /// Show a picker titled `title`, starting from `current`.
    /// `None` means the user cancelled.
    fn pick(&self, title: &str, current: &str) -> Option<PathBuf>;
}

/// What the panel currently displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KickstartState {
    pub mode: KickstartMode,
    pub file_label: String,
    pub ext_mode: ExtRomMode,
    pub ext_file_label: String,
}

/// Display state, registered with the store as a listener.
#[derive(Default)]
struct PanelView {
    state: Mutex<KickstartState>,
}

impl PanelView {
    fn state(&self) -> MutexGuard<'_, KickstartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigListener for PanelView {
    fn on_config(&self, key: &str, value: &str) {
        let mut state = self.state();
        if key == keys::KICKSTART_FILE {
            if value == INTERNAL_KICKSTART {
                state.file_label.clear();
                state.mode = KickstartMode::Internal;
            } else if !value.is_empty() {
                state.file_label = file_name(value);
                state.mode = KickstartMode::Custom;
            } else {
                state.file_label.clear();
                state.mode = KickstartMode::Default;
            }
        } else if key == keys::KICKSTART_EXT_FILE {
            if !value.is_empty() {
                state.ext_file_label = file_name(value);
                state.ext_mode = ExtRomMode::Custom;
            } else {
                state.ext_file_label.clear();
                state.ext_mode = ExtRomMode::Default;
            }
        }
    }
}

/// The kickstart settings panel, bound to a store for its whole lifetime.
///
/// Subscribes on construction and unsubscribes on drop.
pub struct KickstartPanel {
    store: Arc<ConfigStore>,
    view: Arc<PanelView>,
    listener: ListenerId,
}

impl KickstartPanel {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        let view = Arc::new(PanelView::default());
        view.on_config(keys::KICKSTART_FILE, &store.get(keys::KICKSTART_FILE));
        view.on_config(keys::KICKSTART_EXT_FILE, &store.get(keys::KICKSTART_EXT_FILE));
        let listener = store.add_listener(view.clone());
        Self {
            store,
            view,
            listener,
        }
    }

    /// Snapshot of the displayed state.
    pub fn state(&self) -> KickstartState {
        self.view.state().clone()
    }

    /// The user picked a kickstart mode.
    pub fn select_mode(&self, mode: KickstartMode) {
        self.view.state().mode = mode;
        match mode {
            KickstartMode::Default => {
                if self.store.get(keys::KICKSTART_FILE).is_empty() {
                    return;
                }
                self.store.set(keys::KICKSTART_FILE, "");
            }
            KickstartMode::Internal => {
                if self.store.get(keys::KICKSTART_FILE) == INTERNAL_KICKSTART {
                    return;
                }
                self.store.set(keys::KICKSTART_FILE, INTERNAL_KICKSTART);
            }
            KickstartMode::Custom => {
                let remembered = self.store.get(keys::X_KICKSTART_FILE);
                self.store.set(keys::KICKSTART_FILE, &remembered);
            }
        }
        self.store.update_kickstart();
    }

    /// The user picked an extended ROM mode.
    pub fn select_ext_mode(&self, mode: ExtRomMode) {
        self.view.state().ext_mode = mode;
        match mode {
            ExtRomMode::Default => {
                if self.store.get(keys::KICKSTART_EXT_FILE).is_empty() {
                    return;
                }
                self.store.set(keys::KICKSTART_EXT_FILE, "");
            }
            ExtRomMode::Custom => {
                let remembered = self.store.get(keys::X_KICKSTART_EXT_FILE);
                self.store.set(keys::KICKSTART_EXT_FILE, &remembered);
            }
        }
        self.store.update_kickstart();
    }

    /// Let the user browse for a ROM file for `slot`.
    ///
    /// Returns `Ok(false)` if the picker was cancelled. ROMs inside the
    /// kickstarts directory are stored by bare file name.
    pub fn browse(
        &self,
        slot: RomSlot,
        picker: &dyn FilePicker,
        checksum: &dyn RomChecksum,
    ) -> Result<bool, SettingsError> {
        let (key, _, _) = slot.keys();
        let Some(path) = picker.pick(slot.title(), &self.store.get(key)) else {
            tracing::debug!("{} cancelled", slot.title());
            return Ok(false);
        };
        self.choose(slot, &path, checksum)?;
        Ok(true)
    }

    /// Select `path` as the ROM for `slot`, as if picked in the file dialog.
    pub fn choose(
        &self,
        slot: RomSlot,
        path: &Path,
        checksum: &dyn RomChecksum,
    ) -> Result<(), SettingsError> {
        let (key, remembered_key, sha1_key) = slot.keys();
        // Relative paths are relative to the working directory, not the kickstarts dir.
        let path = &std::path::absolute(path).map_err(|source| SettingsError::Checksum {
            path: path.to_path_buf(),
            source,
        })?;
        let sha1 = checksum.checksum_rom(path)?;

        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        {
            let mut state = self.view.state();
            match slot {
                RomSlot::Kickstart => state.file_label = label.clone(),
                RomSlot::Extended => state.ext_file_label = label.clone(),
            }
        }

        let in_kickstarts_dir = path
            .parent()
            .is_some_and(|dir| same_dir(dir, self.store.kickstarts_dir()));
        let stored = if in_kickstarts_dir {
            label
        } else {
            path.to_string_lossy().into_owned()
        };

        tracing::info!("Selected {} ({})", stored, sha1);
        self.store.set_multiple([
            (key, stored.as_str()),
            (remembered_key, stored.as_str()),
            (sha1_key, sha1.as_str()),
        ]);
        Ok(())
    }
}

impl Drop for KickstartPanel {
    fn drop(&mut self) {
        self.store.remove_listener(self.listener);
    }
}

fn file_name(value: &str) -> String {
    Path::new(value)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lexical directory comparison (`.`/`..` folded, case-insensitive on Windows).
fn same_dir(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}

fn normalize(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    let out = out.to_string_lossy().into_owned();
    if cfg!(windows) {
        out.to_lowercase()
    } else {
        out
    }
}
