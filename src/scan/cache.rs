use crate::prelude::StrictPath;

/// Launcher folders that only hold disposable data.
pub mod candidates {
    pub const WINDOWS: &[&str] = &[
        "~/AppData/Local/EpicGamesLauncher/Saved/webcache",
        "~/AppData/Local/EpicGamesLauncher/Saved/Logs",
    ];

    pub const MAC: &[&str] = &[
        "~/Library/Application Support/Epic/EpicGamesLauncher/Saved/webcache",
        "~/Library/Application Support/Epic/EpicGamesLauncher/Saved/Logs",
    ];

    pub const LINUX: &[&str] = &[
        "~/.config/Epic/EpicGamesLauncher/Saved/webcache",
        "~/.config/Epic/EpicGamesLauncher/Saved/Logs",
    ];

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

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CacheFailure {
    pub path: StrictPath,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanOutcome {
    pub cleaned: Vec<StrictPath>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<CacheFailure>,
}

/// Delete each cache folder that exists. A folder that cannot be deleted
/// is recorded and the rest are still attempted.
pub fn clean_cache(paths: &[StrictPath]) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();

    for path in paths {
        if !path.exists() {
            log::debug!("Cache folder does not exist: {:?}", path.raw());
            continue;
        }

        match path.remove() {
            Ok(()) => {
                log::info!("Cleaned cache folder {:?}", path.raw());
                outcome.cleaned.push(path.clone());
            }
            Err(e) => {
                log::error!("Unable to clean cache folder {:?}: {e:?}", path.raw());
                outcome.failed.push(CacheFailure {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}
