use crate::prelude::StrictPath;

/// Where the launcher keeps `.item` files, in order of preference.
pub mod candidates {
    pub const WINDOWS: &[&str] = &[
        "C:/ProgramData/Epic/EpicGamesLauncher/Data/Manifests",
        "D:/ProgramData/Epic/EpicGamesLauncher/Data/Manifests",
        "~/AppData/Local/EpicGamesLauncher/Saved/Config/Windows",
    ];

    pub const MAC: &[&str] = &["~/Library/Application Support/Epic/EpicGamesLauncher/Data/Manifests"];

    pub const LINUX: &[&str] = &["~/.config/Epic/EpicGamesLauncher/Data/Manifests"];

    pub fn host() -> &'static [&'static str] {
        if cfg!(target_os = "windows") {
            WINDOWS
        } else if cfg!(target_os = "macos") {
            MAC
        } else {
            LINUX
        }
    }
}

/// Return the first candidate that is an existing directory.
pub fn locate(candidates: &[&str]) -> Option<StrictPath> {
    candidates
        .iter()
        .map(|raw| StrictPath::new(raw.to_string()))
        .find(|path| {
            let found = path.is_dir();
            log::trace!("Manifest directory candidate {:?} exists: {}", path.raw(), found);
            found
        })
}

/// Resolve the manifest directory, trying an explicit override first.
pub fn find_manifest_dir(preferred: Option<&StrictPath>, candidates: &[&str]) -> Option<StrictPath> {
    if let Some(preferred) = preferred {
        if preferred.is_dir() {
            return Some(preferred.clone());
        }
        log::warn!("Configured manifest directory does not exist: {:?}", preferred.raw());
    }

    let found = locate(candidates);
    match &found {
        Some(dir) => log::info!("Found manifest directory: {}", dir.render()),
        None => log::warn!("No manifest directory found among {} candidates", candidates.len()),
    }
    found
}
