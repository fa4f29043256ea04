use crate::{
    prelude::{debugging, StrictPath},
    resource::config::GameFolder,
    scan::manifest::{GameManifest, ManifestError, EXTENSION},
};

/// An installed game as described by its manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub app_name: String,
    pub display_name: String,
    pub manifest_file: StrictPath,
    /// `InstallLocation` exactly as written in the manifest.
    pub install_path: String,
    pub size: u64,
    pub installed: bool,
    #[serde(skip_serializing_if = "crate::serialization::is_false")]
    pub updated: bool,
}

impl GameRecord {
    pub fn from_manifest(manifest: &GameManifest, manifest_file: StrictPath) -> Self {
        let install_path = manifest.install_location().to_string();
        let folder = StrictPath::new(install_path.clone());
        let installed = folder.is_dir();
        let size = if installed { folder.size() } else { 0 };

        Self {
            app_name: manifest.app_name().to_string(),
            display_name: manifest.display_name().to_string(),
            manifest_file,
            install_path,
            size,
            installed,
            updated: false,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.display_name.eq_ignore_ascii_case(name) || self.app_name.eq_ignore_ascii_case(name)
    }
}

/// A manifest file that could not be turned into a [`GameRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedManifest {
    pub file: StrictPath,
    pub error: ManifestError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub games: Vec<GameRecord>,
    pub skipped: Vec<SkippedManifest>,
}

impl ScanOutcome {
    pub fn total(&self) -> usize {
        self.games.len() + self.skipped.len()
    }

    pub fn find(&self, name: &str) -> Option<&GameRecord> {
        self.games.iter().find(|x| x.matches_name(name))
    }

    pub fn installed(&self) -> impl Iterator<Item = &GameRecord> {
        self.games.iter().filter(|x| x.installed)
    }

    pub fn missing(&self) -> impl Iterator<Item = &GameRecord> {
        self.games.iter().filter(|x| !x.installed)
    }
}

fn is_manifest_file(path: &std::path::Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|x| x.to_string_lossy().eq_ignore_ascii_case(EXTENSION))
            .unwrap_or(false)
}

/// All `.item` files directly inside `dir`, sorted by name.
pub fn manifest_files(dir: &StrictPath) -> Vec<StrictPath> {
    let entries = match std::fs::read_dir(dir.interpret()) {
        Ok(x) => x,
        Err(e) => {
            log::warn!("Unable to list manifest directory {:?}: {e:?}", dir.raw());
            return vec![];
        }
    };

    let mut files: Vec<_> = entries
        .filter_map(|x| x.ok())
        .map(|x| x.path())
        .filter(|x| is_manifest_file(x))
        .collect();
    files.sort();
    files.into_iter().map(StrictPath::from).collect()
}

/// Load one manifest and check that it names a game.
pub fn load_game(file: &StrictPath) -> Result<(GameManifest, GameRecord), ManifestError> {
    let manifest = GameManifest::load(file)?;
    manifest.validate()?;
    let record = GameRecord::from_manifest(&manifest, file.clone());
    Ok((manifest, record))
}

pub fn scan_manifests(dir: &StrictPath) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    if !dir.is_dir() {
        log::warn!("Manifest directory does not exist: {:?}", dir.raw());
        return outcome;
    }

    for file in manifest_files(dir) {
        match load_game(&file) {
            Ok((_, record)) => {
                log::debug!("Found game: {} | app: {}", &record.display_name, &record.app_name);
                outcome.games.push(record);
            }
            Err(error) => {
                if error.is_incomplete() {
                    log::warn!("Skipping manifest {:?}: {}", file.raw(), error);
                } else {
                    log::error!("Skipping manifest {:?}: {}", file.raw(), error);
                }
                if debugging() {
                    eprintln!("Skipping manifest {}: {}", file.render(), error);
                }
                outcome.skipped.push(SkippedManifest { file, error });
            }
        }
    }

    log::info!(
        "Scanned {} manifests: {} games, {} skipped",
        outcome.total(),
        outcome.games.len(),
        outcome.skipped.len()
    );
    outcome
}

/// A folder that looks like an Epic installation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FoundFolder {
    pub name: String,
    pub path: StrictPath,
    pub size: u64,
}

/// Immediate subfolders of `dir` that satisfy the game folder predicate.
pub fn find_game_folders(dir: &StrictPath, predicate: &GameFolder) -> Vec<FoundFolder> {
    let entries = match std::fs::read_dir(dir.interpret()) {
        Ok(x) => x,
        Err(e) => {
            log::warn!("Unable to list directory {:?}: {e:?}", dir.raw());
            return vec![];
        }
    };

    let mut folders: Vec<_> = entries
        .filter_map(|x| x.ok())
        .map(|x| x.path())
        .filter(|x| x.is_dir())
        .collect();
    folders.sort();

    folders
        .into_iter()
        .filter_map(|folder| {
            let name = folder.file_name()?.to_string_lossy().to_string();
            let path = StrictPath::from(folder);
            if !predicate.looks_like_game(&path) {
                log::trace!("Not a game folder: {:?}", path.raw());
                return None;
            }
            let size = path.size();
            log::debug!("Found game folder: {} ({} bytes)", &name, size);
            Some(FoundFolder { name, path, size })
        })
        .collect()
}
