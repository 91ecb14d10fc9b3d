//! Launcher settings: the observable key/value store and the kickstart ROM
//! panel that edits it.

pub mod checksum;
pub mod kickstart;
pub mod store;

pub use checksum::{RomChecksum, Sha1Checksum};
pub use kickstart::{
    ExtRomMode, FilePicker, KickstartMode, KickstartPanel, KickstartState, RomSlot,
};
pub use store::{keys, ConfigListener, ConfigStore, INTERNAL_KICKSTART};
