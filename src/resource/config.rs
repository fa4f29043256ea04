use crate::{
    prelude::{app_dir, Error, StrictPath},
    resource::{ResourceFile, SaveableResourceFile},
    scan::backup::BackupPolicy,
};

pub const DEFAULT_LAUNCHER_PROCESSES: &[&str] = &[
    "EpicGamesLauncher",
    "EpicWebHelper",
    "UnrealEngineLauncher",
    "EpicOnlineServices",
];

pub const DEFAULT_GAME_MARKERS: &[&str] = &[".egstore"];

fn default_backup_dir() -> StrictPath {
    app_dir().joined("backups")
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub manifests: ManifestsConfig,
    pub backup: BackupConfig,
    pub game_folder: GameFolder,
    pub launcher: LauncherConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManifestsConfig {
    /// Takes precedence over the built-in candidate locations.
    pub path: Option<StrictPath>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackupConfig {
    /// Where per-manifest backups are stored.
    pub path: Option<StrictPath>,
    pub enabled: bool,
    /// When set, a manifest is left untouched if its backup cannot be made.
    pub required: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            path: None,
            enabled: true,
            required: false,
        }
    }
}

impl BackupConfig {
    pub fn dir(&self) -> StrictPath {
        self.path.clone().unwrap_or_else(default_backup_dir)
    }

    pub fn policy(&self) -> BackupPolicy {
        BackupPolicy {
            enabled: self.enabled,
            required: self.required,
            dir: self.dir(),
        }
    }
}

/// Decides whether a folder looks like an Epic installation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameFolder {
    /// Entries whose presence inside a folder marks it as a game.
    pub markers: Vec<String>,
    /// File extensions that also mark a folder as a game, checked only
    /// among the folder's immediate children.
    pub fallback_extensions: Vec<String>,
}

impl Default for GameFolder {
    fn default() -> Self {
        Self {
            markers: DEFAULT_GAME_MARKERS.iter().map(|x| x.to_string()).collect(),
            fallback_extensions: vec![],
        }
    }
}

impl GameFolder {
    pub fn looks_like_game(&self, folder: &StrictPath) -> bool {
        if !folder.is_dir() {
            return false;
        }

        if self.markers.iter().any(|marker| folder.joined(marker).exists()) {
            return true;
        }

        if self.fallback_extensions.is_empty() {
            return false;
        }

        let Ok(entries) = std::fs::read_dir(folder.interpret()) else {
            return false;
        };
        entries.filter_map(|x| x.ok()).any(|entry| {
            let path = entry.path();
            path.is_file()
                && path
                    .extension()
                    .map(|ext| {
                        let ext = ext.to_string_lossy();
                        self.fallback_extensions
                            .iter()
                            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(&ext))
                    })
                    .unwrap_or(false)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LauncherConfig {
    /// Substrings of process names to close, matched case-insensitively.
    pub processes: Vec<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            processes: DEFAULT_LAUNCHER_PROCESSES.iter().map(|x| x.to_string()).collect(),
        }
    }
}

impl ResourceFile for Config {
    const FILE_NAME: &'static str = "config.yaml";

    fn migrate(mut self) -> Self {
        self.game_folder.markers.retain(|x| !x.trim().is_empty());
        self.game_folder.fallback_extensions.retain(|x| !x.trim().is_empty());
        self.launcher.processes.retain(|x| !x.trim().is_empty());
        if self
            .manifests
            .path
            .as_ref()
            .map(|x| x.raw().trim().is_empty())
            .unwrap_or(false)
        {
            self.manifests.path = None;
        }
        self
    }
}

impl SaveableResourceFile for Config {}

impl Config {
    pub fn load() -> Result<Self, Error> {
        ResourceFile::load().map_err(|e| Error::ConfigInvalid { why: format!("{}", e) })
    }
}
