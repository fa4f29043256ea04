use std::{
    path::PathBuf,
    sync::{LazyLock, Mutex},
};

pub use crate::path::StrictPath;

const APP_DIR_NAME: &str = "egsmend";
const PORTABLE_FLAG_FILE_NAME: &str = "egsmend.portable";

pub const ENV_DEBUG: &str = "EGSMEND_DEBUG";

pub static VERSION: LazyLock<&'static str> =
    LazyLock::new(|| option_env!("EGSMEND_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")));

pub static CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

pub type AnyError = Box<dyn std::error::Error>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("The config file is invalid: {why:?}")]
    ConfigInvalid { why: String },

    #[error("Unable to find the Epic Games Launcher manifest directory")]
    ManifestDirNotFound,

    #[error("The new game location is not a directory")]
    NewBaseInvalid { path: StrictPath },

    #[error("Unrecognized game: {name}")]
    CliUnrecognizedGame { name: String },

    #[error("Unable to request confirmation")]
    CliUnableToRequestConfirmation,

    #[error("Some entries failed")]
    SomeEntriesFailed,

    #[error("Cannot prepare the backup target")]
    CannotPrepareBackupTarget { path: StrictPath },

    #[error("Unable to remove the manifest")]
    CannotRemoveManifest { path: StrictPath },
}

pub fn app_dir() -> StrictPath {
    if let Ok(guard) = CONFIG_DIR.lock() {
        if let Some(dir) = guard.as_ref() {
            return StrictPath::from_std_path_buf(dir);
        }
    }

    if let Ok(mut flag) = std::env::current_exe() {
        flag.pop();
        flag.push(PORTABLE_FLAG_FILE_NAME);
        if flag.exists() {
            flag.pop();
            return StrictPath::from_std_path_buf(&flag);
        }
    }

    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR_NAME);
    StrictPath::from_std_path_buf(&path)
}

/// Timestamp used in backup names: `YYYYMMDD_HHMMSS`, local time.
pub fn timestamp(when: &chrono::DateTime<chrono::Local>) -> String {
    when.format("%Y%m%d_%H%M%S").to_string()
}

pub fn filter_map_walkdir(e: Result<walkdir::DirEntry, walkdir::Error>) -> Option<walkdir::DirEntry> {
    if let Err(e) = &e {
        log::warn!("failed to walk: {:?} | {e:?}", e.path());
    }
    e.ok()
}

/// Whether skipped items should also be echoed to stderr.
pub fn debugging() -> bool {
    std::env::var(ENV_DEBUG).is_ok()
}
