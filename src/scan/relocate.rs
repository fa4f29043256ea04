use crate::{
    prelude::{Error, StrictPath},
    resource::config::GameFolder,
    scan::{
        backup::{restore_manifest, BackupPolicy},
        library::{GameRecord, ScanOutcome},
        manifest::{same_location, GameManifest, InstallPaths, ManifestError},
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelocateOptions {
    pub preview: bool,
    pub backup: BackupPolicy,
    pub game_folder: GameFolder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelocationStatus {
    Updated,
    /// The game folder is already where the manifest says.
    AlreadyThere,
    /// No folder with the game's name under the new base.
    NotFound,
    /// The manifest lacks fields needed to relocate it.
    Incomplete,
    Failed,
}

impl RelocationStatus {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::AlreadyThere | Self::NotFound | Self::Incomplete)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocationEntry {
    pub file: StrictPath,
    pub name: Option<String>,
    pub status: RelocationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<InstallPaths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<StrictPath>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelocationEntry {
    fn new(file: StrictPath, name: Option<String>, status: RelocationStatus) -> Self {
        Self {
            file,
            name,
            status,
            from: None,
            to: None,
            backup: None,
            warnings: vec![],
            error: None,
        }
    }

    fn failed(mut self, error: impl ToString) -> Self {
        self.status = RelocationStatus::Failed;
        self.error = Some(error.to_string());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocationReport {
    pub preview: bool,
    pub entries: Vec<RelocationEntry>,
}

impl RelocationReport {
    pub fn updated(&self) -> usize {
        self.count(|x| x == RelocationStatus::Updated)
    }

    pub fn skipped(&self) -> usize {
        self.count(|x| x.is_skip())
    }

    pub fn failed(&self) -> usize {
        self.count(|x| x == RelocationStatus::Failed)
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    fn count(&self, predicate: impl Fn(RelocationStatus) -> bool) -> usize {
        self.entries.iter().filter(|x| predicate(x.status)).count()
    }
}

/// Point every scanned manifest whose game folder now lives under
/// `new_base` at that folder. Each manifest is handled on its own;
/// a failure is recorded and the rest still run.
pub fn relocate(
    scan: &mut ScanOutcome,
    new_base: &StrictPath,
    options: &RelocateOptions,
    now: &chrono::DateTime<chrono::Local>,
) -> Result<RelocationReport, Error> {
    if !new_base.is_dir() {
        return Err(Error::NewBaseInvalid { path: new_base.clone() });
    }
    let base = new_base.absolute();

    let mut report = RelocationReport {
        preview: options.preview,
        entries: Vec::with_capacity(scan.total()),
    };

    for skipped in &scan.skipped {
        let status = if skipped.error.is_incomplete() {
            RelocationStatus::Incomplete
        } else {
            RelocationStatus::Failed
        };
        let mut entry = RelocationEntry::new(skipped.file.clone(), None, status);
        entry.error = Some(skipped.error.to_string());
        report.entries.push(entry);
    }

    for record in &mut scan.games {
        let entry = relocate_game(record, &base, options, now);
        log::debug!(
            "Relocation of {:?}: {:?}{}",
            &record.display_name,
            entry.status,
            entry.error.as_ref().map(|x| format!(" | {x}")).unwrap_or_default()
        );
        report.entries.push(entry);
    }

    log::info!(
        "Relocation to {:?} complete: {} updated, {} skipped, {} failed",
        &base,
        report.updated(),
        report.skipped(),
        report.failed()
    );
    Ok(report)
}

fn relocate_game(
    record: &mut GameRecord,
    base: &str,
    options: &RelocateOptions,
    now: &chrono::DateTime<chrono::Local>,
) -> RelocationEntry {
    let file = record.manifest_file.clone();
    let mut entry = RelocationEntry::new(
        file.clone(),
        Some(record.display_name.clone()),
        RelocationStatus::NotFound,
    );

    // Reread so that the rewrite starts from what is on disk right now.
    let mut manifest = match GameManifest::load(&file).and_then(|x| x.validate().map(|_| x)) {
        Ok(x) => x,
        Err(e @ ManifestError::MissingFields { .. }) => {
            entry.status = RelocationStatus::Incomplete;
            entry.error = Some(e.to_string());
            return entry;
        }
        Err(e) => return entry.failed(e),
    };

    let old = manifest.install_location().to_string();
    entry.from = Some(old.clone());

    let Some(paths) = InstallPaths::relocated(&old, base) else {
        entry.status = RelocationStatus::Incomplete;
        entry.error = Some(format!("no folder name in install location: {old}"));
        return entry;
    };

    let candidate = StrictPath::new(paths.install.clone());
    if !candidate.is_dir() {
        log::info!("Skipping {}: not found in new location {:?}", &record.display_name, &paths.install);
        return entry;
    }

    if same_location(&old, &paths.install) || StrictPath::new(old.clone()).same_file(&candidate) {
        entry.status = RelocationStatus::AlreadyThere;
        return entry;
    }

    if !options.game_folder.looks_like_game(&candidate) {
        entry
            .warnings
            .push(format!("{} does not look like a game folder", &paths.install));
    }

    entry.status = RelocationStatus::Updated;
    entry.to = Some(paths.clone());

    if options.preview {
        return entry;
    }

    match options.backup.safeguard(&file, &record.app_name, now) {
        Ok(safeguard) => {
            entry.backup = safeguard.backup;
            entry.warnings.extend(safeguard.warning);
        }
        Err(e) => return entry.failed(format!("backup failed: {e}")),
    }

    manifest.set_install_paths(&paths);
    if let Err(e) = manifest.save(&file) {
        if let Some(backup) = &entry.backup {
            if let Err(restore_error) = restore_manifest(backup, &file) {
                log::error!("Failed to restore {:?} from backup: {restore_error:?}", file.raw());
            }
        }
        return entry.failed(e);
    }

    log::info!("Updated manifest for {} to {:?}", &record.display_name, &paths.install);
    record.install_path = paths.install;
    record.installed = true;
    record.updated = true;
    entry
}
