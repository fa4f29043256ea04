use std::sync::LazyLock;

use byte_unit::{Byte, UnitType};

use crate::{
    prelude::{Error, StrictPath},
    scan::relocate::RelocationStatus,
};

pub static TRANSLATOR: LazyLock<Translator> = LazyLock::new(Translator::default);

#[derive(Clone, Copy, Debug, Default)]
pub struct Translator {}

impl Translator {
    pub fn handle_error(&self, error: &Error) -> String {
        match error {
            Error::ConfigInvalid { why } => self.config_is_invalid(why),
            Error::ManifestDirNotFound => self.manifest_dir_not_found(),
            Error::NewBaseInvalid { path } => self.new_base_is_invalid(path),
            Error::CliUnrecognizedGame { name } => self.cli_unrecognized_game(name),
            Error::CliUnableToRequestConfirmation => self.cli_unable_to_request_confirmation(),
            Error::SomeEntriesFailed => self.some_entries_failed(),
            Error::CannotPrepareBackupTarget { path } => self.cannot_prepare_backup_target(path),
            Error::CannotRemoveManifest { path } => self.cannot_remove_manifest(path),
        }
    }

    pub fn config_is_invalid(&self, why: &str) -> String {
        format!("Error: The config file is invalid.\n{}", why)
    }

    pub fn manifest_dir_not_found(&self) -> String {
        "Error: Epic Games Launcher does not seem to be installed. Unable to find its manifest directory; use --path to specify it.".to_string()
    }

    pub fn new_base_is_invalid(&self, path: &StrictPath) -> String {
        format!("Error: The new game location is not a directory: {}", path.render())
    }

    pub fn cli_unrecognized_game(&self, name: &str) -> String {
        format!("No manifest matches this game name:\n  - {}", name)
    }

    pub fn cli_unable_to_request_confirmation(&self) -> String {
        #[cfg(target_os = "windows")]
        let extra_note = " If you are using a Bash emulator (like Git Bash), try running winpty.";

        #[cfg(not(target_os = "windows"))]
        let extra_note = "";

        format!(
            "Error: Unable to request confirmation. Use --force to skip it.{}",
            extra_note
        )
    }

    pub fn some_entries_failed(&self) -> String {
        "Some entries failed to process; look for [FAILED] in the output for details.".to_string()
    }

    pub fn cannot_prepare_backup_target(&self, target: &StrictPath) -> String {
        format!("Error: Unable to prepare backup target: {}", target.render())
    }

    pub fn cannot_remove_manifest(&self, path: &StrictPath) -> String {
        format!("Error: Unable to remove manifest: {}", path.render())
    }

    pub fn cli_confirm_removal(&self, name: &str, path: &StrictPath) -> String {
        format!(
            "Remove the manifest for {}? The launcher will forget this game.\n  {}",
            name,
            path.render()
        )
    }

    fn label(&self, text: &str) -> String {
        format!("[{}]", text)
    }

    pub fn label_failed(&self) -> String {
        self.label("FAILED")
    }

    pub fn label_preview(&self) -> String {
        self.label("PREVIEW")
    }

    pub fn label_missing(&self) -> String {
        self.label("MISSING")
    }

    pub fn relocation_status(&self, status: RelocationStatus) -> String {
        match status {
            RelocationStatus::Updated => "updated",
            RelocationStatus::AlreadyThere => "already at this location",
            RelocationStatus::NotFound => "not found in new location",
            RelocationStatus::Incomplete => "missing required fields",
            RelocationStatus::Failed => "failed",
        }
        .to_string()
    }

    pub fn cli_game_header(&self, name: &str, bytes: u64, installed: bool) -> String {
        if installed {
            format!("{} [{}]:", name, self.adjusted_size(bytes))
        } else {
            format!("{} {}:", name, self.label_missing())
        }
    }

    pub fn cli_game_line_item(&self, item: &str, successful: bool) -> String {
        if successful {
            format!("  - {}", item)
        } else {
            format!("  - {} {}", self.label_failed(), item)
        }
    }

    pub fn cli_scan_summary(&self, dir: &StrictPath, games: usize, skipped: usize, bytes: u64) -> String {
        format!(
            "Overall:\n  Games: {}\n  Skipped manifests: {}\n  Size: {}\n  Location: {}",
            games,
            skipped,
            self.adjusted_size(bytes),
            dir.render(),
        )
    }

    pub fn cli_relocation_summary(
        &self,
        preview: bool,
        new_base: &StrictPath,
        updated: usize,
        skipped: usize,
        failed: usize,
    ) -> String {
        format!(
            "Overall{}:\n  Updated: {}\n  Skipped: {}\n  Errors: {}\n  New location: {}",
            if preview {
                format!(" {}", self.label_preview())
            } else {
                "".to_string()
            },
            updated,
            skipped,
            failed,
            new_base.render(),
        )
    }

    pub fn cli_cache_summary(&self, cleaned: usize) -> String {
        format!("Cleaned cache folders: {}", cleaned)
    }

    pub fn adjusted_size(&self, bytes: u64) -> String {
        let byte = Byte::from_u64(bytes);
        let adjusted_byte = byte.get_appropriate_unit(UnitType::Binary);
        format!("{adjusted_byte:.2}")
    }
}
