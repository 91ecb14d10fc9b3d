//! The `launcher kickstart` command.
//!
//! Drives the kickstart settings panel against the persisted settings file,
//! the same way the settings dialog would.

use clap::{Args, Subcommand, ValueEnum};
use launcher_core::settings::{
    keys, ExtRomMode, FilePicker, KickstartMode, KickstartPanel, KickstartState, RomSlot,
    Sha1Checksum,
};
use launcher_core::{Config, LauncherContext};
use std::path::{Path, PathBuf};

/// Arguments for the `kickstart` command.
#[derive(Args, Debug)]
pub struct KickstartArgs {
    #[command(subcommand)]
    pub command: KickstartCommand,
}

/// Subcommands for the kickstart ROM selection.
#[derive(Subcommand, Debug)]
pub enum KickstartCommand {
    /// Show the current selection and resolved ROM paths
    Show,

    /// Switch the kickstart (or extended ROM) mode
    Mode {
        mode: ModeArg,

        /// Apply to the extended ROM instead
        #[arg(long)]
        ext: bool,
    },

    /// Select a ROM file
    Choose {
        file: PathBuf,

        /// Select the extended ROM instead
        #[arg(long)]
        ext: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Default,
    Custom,
    Internal,
}

/// Picker that "picks" a file given on the command line.
struct GivenFile(PathBuf);

impl FilePicker for GivenFile {
    fn pick(&self, title: &str, current: &str) -> Option<PathBuf> {
        tracing::debug!("{} (was {:?}): {:?}", title, current, self.0);
        Some(self.0.clone())
    }
}

/// Execute the kickstart command.
pub fn execute(args: KickstartArgs, config: Config) -> anyhow::Result<()> {
    let context = LauncherContext::init(config)?;
    let summary = run(args.command, &context)?;
    context.save()?;
    print!("{summary}");
    Ok(())
}

/// Apply `command` to the context's store and describe the resulting state.
fn run(command: KickstartCommand, context: &LauncherContext) -> anyhow::Result<String> {
    let panel = KickstartPanel::new(context.store().clone());

    match command {
        KickstartCommand::Show => {}

        KickstartCommand::Mode { mode, ext: false } => {
            panel.select_mode(match mode {
                ModeArg::Default => KickstartMode::Default,
                ModeArg::Custom => KickstartMode::Custom,
                ModeArg::Internal => KickstartMode::Internal,
            });
        }

        KickstartCommand::Mode { mode, ext: true } => {
            let mode = match mode {
                ModeArg::Default => ExtRomMode::Default,
                ModeArg::Custom => ExtRomMode::Custom,
                ModeArg::Internal => {
                    anyhow::bail!("The extended ROM has no internal replacement")
                }
            };
            panel.select_ext_mode(mode);
        }

        KickstartCommand::Choose { file, ext } => {
            let file = expand(&file);
            if !file.is_file() {
                anyhow::bail!("ROM file not found: {}", file.display());
            }
            let slot = if ext { RomSlot::Extended } else { RomSlot::Kickstart };
            panel.browse(slot, &GivenFile(file), &Sha1Checksum)?;
            context.store().update_kickstart();
        }
    }

    Ok(describe(&panel.state(), context))
}

fn describe(state: &KickstartState, context: &LauncherContext) -> String {
    let store = context.store();
    let mut out = String::new();
    out.push_str(&format!(
        "Kickstart:    {}{}\n",
        state.mode.label(),
        label_suffix(&state.file_label)
    ));
    out.push_str(&format!("  path:       {}\n", store.get(keys::X_KICKSTART_PATH)));
    out.push_str(&format!(
        "Extended ROM: {}{}\n",
        state.ext_mode.label(),
        label_suffix(&state.ext_file_label)
    ));
    out.push_str(&format!("  path:       {}\n", store.get(keys::X_KICKSTART_EXT_PATH)));
    out
}

fn label_suffix(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!(" ({label})")
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_in(dir: &Path) -> LauncherContext {
        let mut config = Config::default();
        config.general.base_dir = dir.to_path_buf();
        LauncherContext::init(config).unwrap()
    }

    #[test]
    fn test_choose_rom_in_kickstarts_dir() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_in(dir.path());
        let kickstarts = context.config().kickstarts_dir();
        std::fs::create_dir_all(&kickstarts).unwrap();
        let rom = kickstarts.join("kick40068.A1200");
        std::fs::write(&rom, b"abc").unwrap();

        let summary = run(
            KickstartCommand::Choose {
                file: rom.clone(),
                ext: false,
            },
            &context,
        )
        .unwrap();

        let store = context.store();
        assert_eq!(store.get(keys::KICKSTART_FILE), "kick40068.A1200");
        assert_eq!(
            store.get(keys::X_KICKSTART_FILE_SHA1),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(store.get(keys::X_KICKSTART_PATH), rom.to_string_lossy());
        assert!(summary.starts_with("Kickstart:    Custom (kick40068.A1200)"));
    }

    #[test]
    fn test_mode_internal_then_show_persists() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_in(dir.path());
        run(
            KickstartCommand::Mode {
                mode: ModeArg::Internal,
                ext: false,
            },
            &context,
        )
        .unwrap();
        context.save().unwrap();

        let reloaded = context_in(dir.path());
        let summary = run(KickstartCommand::Show, &reloaded).unwrap();
        assert!(summary.starts_with("Kickstart:    Internal\n  path:       internal\n"));
    }

    #[test]
    fn test_ext_internal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_in(dir.path());
        let result = run(
            KickstartCommand::Mode {
                mode: ModeArg::Internal,
                ext: true,
            },
            &context,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_choose_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_in(dir.path());
        let result = run(
            KickstartCommand::Choose {
                file: dir.path().join("missing.rom"),
                ext: true,
            },
            &context,
        );
        assert!(result.is_err());
        assert!(context.store().snapshot().is_empty());
    }
}
