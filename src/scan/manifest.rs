use serde_json::{Map, Value};

use crate::prelude::StrictPath;

pub const EXTENSION: &str = "item";

pub mod field {
    pub const APP_NAME: &str = "AppName";
    pub const DISPLAY_NAME: &str = "DisplayName";
    pub const INSTALL_LOCATION: &str = "InstallLocation";
    pub const MANIFEST_LOCATION: &str = "ManifestLocation";
    pub const STAGING_LOCATION: &str = "StagingLocation";
    pub const INSTALL_SIZE: &str = "InstallSize";
    pub const INCOMPLETE_INSTALL: &str = "bIsIncompleteInstall";
    pub const NEEDS_VALIDATION: &str = "bNeedsValidation";
}

pub const REQUIRED_FIELDS: &[&str] = &[field::APP_NAME, field::DISPLAY_NAME, field::INSTALL_LOCATION];

/// Folder inside an installation where the launcher keeps its own data.
pub const EGSTORE: &str = ".egstore";
/// Folder inside `.egstore` used while applying patches.
pub const STAGING: &str = "bps";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("unable to read file: {why}")]
    Unreadable { why: String },

    #[error("invalid JSON: {why}")]
    InvalidJson { why: String },

    #[error("not a JSON object")]
    NotAnObject,

    #[error("missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("unable to write file: {why}")]
    Unwritable { why: String },
}

impl ManifestError {
    /// Whether the file exists and is JSON, but cannot be used as a game.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::MissingFields { .. })
    }
}

/// The three locations the launcher uses to find an installation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallPaths {
    pub install: String,
    pub manifest: String,
    pub staging: String,
}

fn separator_of(path: &str) -> char {
    if path.contains('\\') {
        '\\'
    } else if path.contains('/') {
        '/'
    } else {
        std::path::MAIN_SEPARATOR
    }
}

fn trim_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        path
    } else {
        trimmed
    }
}

/// Final component of a path string, ignoring trailing separators of either style.
pub fn folder_name(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches(['/', '\\']);
    let name = trimmed.rsplit(['/', '\\']).next()?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Append `child` to `base` using the separator style that `base` already uses.
pub fn join_native(base: &str, child: &str) -> String {
    let sep = separator_of(base);
    format!("{}{}{}", trim_separators(base), sep, child)
}

impl InstallPaths {
    pub fn derive(install: &str) -> Self {
        let install = trim_separators(install).to_string();
        let manifest = join_native(&install, EGSTORE);
        let staging = join_native(&manifest, STAGING);
        Self {
            install,
            manifest,
            staging,
        }
    }

    /// Location of the game after moving its folder under `new_base`.
    pub fn relocated(old_install: &str, new_base: &str) -> Option<Self> {
        let folder = folder_name(old_install)?;
        Some(Self::derive(&join_native(new_base, folder)))
    }
}

pub fn same_location(a: &str, b: &str) -> bool {
    trim_separators(a) == trim_separators(b)
}

/// A single `.item` document. Fields are kept in their original order
/// and anything this tool doesn't know about is written back untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameManifest(Map<String, Value>);

impl GameManifest {
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(ManifestError::NotAnObject),
            Err(e) => Err(ManifestError::InvalidJson { why: e.to_string() }),
        }
    }

    pub fn load(path: &StrictPath) -> Result<Self, ManifestError> {
        let content = path
            .try_read()
            .map_err(|e| ManifestError::Unreadable { why: e.to_string() })?;
        Self::parse(&content)
    }

    pub fn save(&self, path: &StrictPath) -> Result<(), ManifestError> {
        path.write_atomically(self.serialize().as_bytes())
            .map_err(|e| ManifestError::Unwritable { why: e.to_string() })
    }

    pub fn serialize(&self) -> String {
        // A map of JSON values always serializes.
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }

    pub fn missing_fields(&self) -> Vec<String> {
        REQUIRED_FIELDS
            .iter()
            .filter(|key| self.text(key).map(|x| x.trim().is_empty()).unwrap_or(true))
            .map(|x| x.to_string())
            .collect()
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        let fields = self.missing_fields();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ManifestError::MissingFields { fields })
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|x| x.as_str())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(|x| x.as_bool()).unwrap_or(false)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn app_name(&self) -> &str {
        self.text(field::APP_NAME).unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.text(field::DISPLAY_NAME).unwrap_or_default()
    }

    pub fn install_location(&self) -> &str {
        self.text(field::INSTALL_LOCATION).unwrap_or_default()
    }

    pub fn install_size(&self) -> Option<u64> {
        self.0.get(field::INSTALL_SIZE).and_then(|x| x.as_u64())
    }

    /// Overwrite only the three location fields. Keys that already exist
    /// keep their position.
    pub fn set_install_paths(&mut self, paths: &InstallPaths) {
        self.0
            .insert(field::INSTALL_LOCATION.to_string(), Value::String(paths.install.clone()));
        self.0
            .insert(field::MANIFEST_LOCATION.to_string(), Value::String(paths.manifest.clone()));
        self.0
            .insert(field::STAGING_LOCATION.to_string(), Value::String(paths.staging.clone()));
    }

    /// Insert `value` only when `key` is absent. Returns whether it was inserted.
    pub fn insert_missing(&mut self, key: &str, value: Value) -> bool {
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.to_string(), value);
        true
    }

    /// Whether the derived locations agree with `InstallLocation`.
    pub fn paths_consistent(&self) -> bool {
        let expected = InstallPaths::derive(self.install_location());
        let matches = |key: &str, wanted: &str| self.text(key).map(|x| same_location(x, wanted)).unwrap_or(false);
        matches(field::MANIFEST_LOCATION, &expected.manifest) && matches(field::STAGING_LOCATION, &expected.staging)
    }
}
