use serde_json::Value;

use crate::{
    prelude::{Error, StrictPath},
    scan::{
        backup::{BackupPolicy, Safeguard},
        library::GameRecord,
        manifest::{field, GameManifest, InstallPaths},
    },
};

/// Default for a key the launcher expects in every manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultValue {
    Text(&'static str),
    Flag(bool),
    Number(u64),
    EmptyList,
}

impl DefaultValue {
    pub fn to_json(self) -> Value {
        match self {
            Self::Text(x) => Value::String(x.to_string()),
            Self::Flag(x) => Value::Bool(x),
            Self::Number(x) => Value::from(x),
            Self::EmptyList => Value::Array(vec![]),
        }
    }
}

pub const LAUNCHER_DEFAULTS: &[(&str, DefaultValue)] = &[
    ("CatalogNamespace", DefaultValue::Text("unknown")),
    ("CatalogItemId", DefaultValue::Text("unknown")),
    ("AppVersionString", DefaultValue::Text("1.0")),
    (field::INSTALL_SIZE, DefaultValue::Number(0)),
    (field::INCOMPLETE_INSTALL, DefaultValue::Flag(false)),
    ("LaunchCommand", DefaultValue::Text("")),
    ("LaunchParameters", DefaultValue::Text("")),
    ("ManifestHash", DefaultValue::Text("")),
    ("ManifestFileVersion", DefaultValue::Text("18")),
    ("AppCategories", DefaultValue::EmptyList),
    ("ChunkDbs", DefaultValue::EmptyList),
    ("CompatibleApps", DefaultValue::EmptyList),
    ("InstallationGuid", DefaultValue::Text("")),
    ("InstallSessionId", DefaultValue::Text("")),
    ("PrereqIds", DefaultValue::EmptyList),
    ("TechnicalType", DefaultValue::Text("normal")),
    ("VaultThumbnailUrl", DefaultValue::Text("")),
    ("VaultTitleText", DefaultValue::Text("")),
    ("bCanRunOffline", DefaultValue::Flag(true)),
    ("bIsApplication", DefaultValue::Flag(true)),
    ("bIsExecutable", DefaultValue::Flag(true)),
    ("bIsManaged", DefaultValue::Flag(true)),
    (field::NEEDS_VALIDATION, DefaultValue::Flag(false)),
    ("bRequiresAuth", DefaultValue::Flag(true)),
];

/// Union-merge the default table into `manifest`. Present keys are never
/// touched. Returns the keys that were added, in insertion order.
pub fn fill_missing_fields(manifest: &mut GameManifest, defaults: &[(&str, DefaultValue)]) -> Vec<String> {
    let mut added = vec![];

    let derived = InstallPaths::derive(manifest.install_location());
    for (key, value) in [
        (field::MANIFEST_LOCATION, derived.manifest),
        (field::STAGING_LOCATION, derived.staging),
    ] {
        if manifest.insert_missing(key, Value::String(value)) {
            added.push(key.to_string());
        }
    }

    for (key, value) in defaults {
        if manifest.insert_missing(key, value.to_json()) {
            added.push(key.to_string());
        }
    }

    added
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairOutcome {
    pub name: String,
    pub file: StrictPath,
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<StrictPath>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RepairOutcome {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Fill in missing launcher fields for one game and write it back.
/// Nothing is written when the manifest is already complete.
pub fn repair_game(
    record: &GameRecord,
    policy: &BackupPolicy,
    now: &chrono::DateTime<chrono::Local>,
) -> RepairOutcome {
    let file = &record.manifest_file;
    let mut outcome = RepairOutcome {
        name: record.display_name.clone(),
        file: file.clone(),
        ..Default::default()
    };

    let mut manifest = match GameManifest::load(file).and_then(|x| x.validate().map(|_| x)) {
        Ok(x) => x,
        Err(e) => {
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    let added = fill_missing_fields(&mut manifest, LAUNCHER_DEFAULTS);
    if added.is_empty() {
        log::debug!("Manifest for {} is already complete", &record.display_name);
        return outcome;
    }

    match policy.safeguard(file, &record.app_name, now) {
        Ok(safeguard) => {
            outcome.backup = safeguard.backup;
            outcome.warnings.extend(safeguard.warning);
        }
        Err(e) => {
            log::error!("Not repairing {} because its backup failed", &record.display_name);
            outcome.error = Some(format!("backup failed: {e}"));
            return outcome;
        }
    }

    if let Err(e) = manifest.save(file) {
        log::error!("Failed to repair manifest for {}: {e}", &record.display_name);
        outcome.error = Some(e.to_string());
        return outcome;
    }

    log::info!("Repaired manifest for {}: added {:?}", &record.display_name, &added);
    outcome.added = added;
    outcome
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub file: StrictPath,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a manifest without changing it.
pub fn validate_manifest(file: &StrictPath) -> Validation {
    let mut validation = Validation {
        file: file.clone(),
        ..Default::default()
    };

    if !file.is_file() {
        validation.errors.push("manifest file does not exist".to_string());
        return validation;
    }

    let manifest = match GameManifest::load(file) {
        Ok(x) => x,
        Err(e) => {
            validation.errors.push(e.to_string());
            return validation;
        }
    };

    for missing in manifest.missing_fields() {
        validation.errors.push(format!("missing required field: {missing}"));
    }

    let install = manifest.install_location();
    if !install.is_empty() {
        if !StrictPath::new(install.to_string()).is_dir() {
            validation
                .warnings
                .push(format!("install location does not exist: {install}"));
        }
        if !manifest.paths_consistent() {
            validation
                .warnings
                .push("manifest and staging locations do not match the install location".to_string());
        }
    }

    if manifest.flag(field::INCOMPLETE_INSTALL) {
        validation.warnings.push("installation is marked as incomplete".to_string());
    }
    if manifest.flag(field::NEEDS_VALIDATION) {
        validation.warnings.push("installation needs validation".to_string());
    }

    validation
}

/// Back up a manifest and delete it, so the launcher forgets the game.
/// A manifest that is already gone counts as removed.
pub fn remove_manifest(
    record: &GameRecord,
    policy: &BackupPolicy,
    now: &chrono::DateTime<chrono::Local>,
) -> Result<Safeguard, Error> {
    let file = &record.manifest_file;
    if !file.exists() {
        log::warn!("Manifest for {} does not exist", &record.display_name);
        return Ok(Safeguard::default());
    }

    let safeguard = policy.safeguard(file, &record.app_name, now)?;

    file.remove().map_err(|e| {
        log::error!("Failed to remove manifest for {}: {e:?}", &record.display_name);
        Error::CannotRemoveManifest { path: file.clone() }
    })?;
    log::info!("Removed manifest for {}", &record.display_name);
    Ok(safeguard)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        scan::library::load_game,
        testing::{make_game_folder, native, s, write_raw},
    };

    fn now() -> chrono::DateTime<chrono::Local> {
        chrono::Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn policy(dir: StrictPath, required: bool) -> BackupPolicy {
        BackupPolicy {
            enabled: true,
            required,
            dir,
        }
    }

    fn foo_record(dir: &std::path::Path) -> GameRecord {
        let file = write_raw(
            dir,
            "foo.item",
            r#"{"AppName":"Foo","DisplayName":"Foo Game","InstallLocation":"/g/Foo"}"#,
        );
        load_game(&file).unwrap().1
    }

    #[test]
    fn merges_defaults_without_overwriting() {
        let mut manifest = GameManifest::parse(
            r#"{"AppName":"Foo","DisplayName":"Foo","InstallLocation":"C:\\Games\\Foo","bCanRunOffline":false,"TechnicalType":"custom"}"#,
        )
        .unwrap();

        let added = fill_missing_fields(&mut manifest, LAUNCHER_DEFAULTS);

        assert_eq!(Some(false), manifest.get("bCanRunOffline").and_then(|x| x.as_bool()));
        assert_eq!(Some("custom"), manifest.text("TechnicalType"));
        assert_eq!(Some("C:\\Games\\Foo\\.egstore"), manifest.text("ManifestLocation"));
        assert_eq!(Some("C:\\Games\\Foo\\.egstore\\bps"), manifest.text("StagingLocation"));
        assert_eq!(Some(&serde_json::json!([])), manifest.get("ChunkDbs"));
        assert!(!added.contains(&s("bCanRunOffline")));
        assert!(!added.contains(&s("TechnicalType")));
        // Two defaults were already present, two locations were derived.
        assert_eq!(LAUNCHER_DEFAULTS.len(), added.len());
    }

    #[test]
    fn merge_is_idempotent() {
        let mut manifest = GameManifest::parse(r#"{"AppName":"Foo","DisplayName":"Foo","InstallLocation":"/g/Foo"}"#).unwrap();
        fill_missing_fields(&mut manifest, LAUNCHER_DEFAULTS);
        let once = manifest.clone();

        assert_eq!(Vec::<String>::new(), fill_missing_fields(&mut manifest, LAUNCHER_DEFAULTS));
        assert_eq!(once, manifest);
    }

    #[test]
    fn repairs_game_on_disk_with_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write_raw(
            tmp.path(),
            "foo.item",
            r#"{"AppName":"Foo","DisplayName":"Foo Game","InstallLocation":"/g/Foo","Custom":7}"#,
        );
        let (_, record) = load_game(&file).unwrap();
        let backups = StrictPath::from(tmp.path().join("backups"));

        let outcome = repair_game(&record, &policy(backups, false), &now());

        assert!(!outcome.failed());
        assert!(outcome.added.contains(&s("CatalogNamespace")));
        assert!(outcome.backup.as_ref().unwrap().is_file());
        let repaired = GameManifest::load(&file).unwrap();
        assert_eq!(Some(&serde_json::json!(7)), repaired.get("Custom"));
        assert_eq!(Some("18"), repaired.text("ManifestFileVersion"));
        let keys: Vec<_> = repaired.keys().take(4).cloned().collect();
        assert_eq!(vec![s("AppName"), s("DisplayName"), s("InstallLocation"), s("Custom")], keys);
    }

    #[test]
    fn complete_manifest_is_not_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let mut manifest = GameManifest::parse(r#"{"AppName":"Foo","DisplayName":"Foo","InstallLocation":"/g/Foo"}"#).unwrap();
        fill_missing_fields(&mut manifest, LAUNCHER_DEFAULTS);
        let file = write_raw(tmp.path(), "foo.item", &manifest.serialize());
        let before = file.try_read_bytes().unwrap();
        let (_, record) = load_game(&file).unwrap();
        let backups = StrictPath::from(tmp.path().join("backups"));

        let outcome = repair_game(&record, &policy(backups, false), &now());

        assert!(outcome.added.is_empty());
        assert!(outcome.backup.is_none());
        assert_eq!(before, file.try_read_bytes().unwrap());
    }

    #[test]
    fn validates_healthy_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = make_game_folder(tmp.path(), "Foo");
        let mut manifest = GameManifest::parse(&format!(
            r#"{{"AppName":"Foo","DisplayName":"Foo","InstallLocation":{}}}"#,
            serde_json::json!(native(&folder))
        ))
        .unwrap();
        fill_missing_fields(&mut manifest, LAUNCHER_DEFAULTS);
        let file = write_raw(tmp.path(), "foo.item", &manifest.serialize());

        let validation = validate_manifest(&file);

        assert!(validation.valid());
        assert_eq!(Vec::<String>::new(), validation.warnings);
    }

    #[test]
    fn validation_reports_problems() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write_raw(
            tmp.path(),
            "foo.item",
            r#"{"AppName":"Foo","InstallLocation":"/no/such/Foo","bIsIncompleteInstall":true,"bNeedsValidation":true}"#,
        );

        let validation = validate_manifest(&file);

        assert_eq!(vec![s("missing required field: DisplayName")], validation.errors);
        assert_eq!(
            vec![
                s("install location does not exist: /no/such/Foo"),
                s("manifest and staging locations do not match the install location"),
                s("installation is marked as incomplete"),
                s("installation needs validation"),
            ],
            validation.warnings,
        );
    }

    #[test]
    fn validation_reports_missing_and_corrupt_files() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!validate_manifest(&StrictPath::from(tmp.path().join("nope.item"))).valid());
        let corrupt = write_raw(tmp.path(), "bad.item", "{");
        assert!(!validate_manifest(&corrupt).valid());
    }

    #[test]
    fn repair_goes_ahead_with_warning_when_optional_backup_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let record = foo_record(tmp.path());
        let blocker = write_raw(tmp.path(), "blocker", "");

        let outcome = repair_game(&record, &policy(blocker.joined("backups"), false), &now());

        assert!(!outcome.failed());
        assert!(!outcome.added.is_empty());
        assert_eq!(None, outcome.backup);
        assert!(outcome.warnings[0].starts_with("backup failed"));
    }

    #[test]
    fn repair_is_aborted_when_required_backup_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let record = foo_record(tmp.path());
        let before = record.manifest_file.try_read_bytes().unwrap();
        let blocker = write_raw(tmp.path(), "blocker", "");

        let outcome = repair_game(&record, &policy(blocker.joined("backups"), true), &now());

        assert!(outcome.failed());
        assert!(outcome.added.is_empty());
        assert_eq!(before, record.manifest_file.try_read_bytes().unwrap());
    }

    #[test]
    fn removes_manifest_after_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let record = foo_record(tmp.path());
        let backups = policy(StrictPath::from(tmp.path().join("backups")), false);

        let safeguard = remove_manifest(&record, &backups, &now()).unwrap();

        assert!(!record.manifest_file.exists());
        assert!(safeguard.backup.unwrap().is_file());
        assert_eq!(Ok(Safeguard::default()), remove_manifest(&record, &backups, &now()));
    }

    #[test]
    fn removal_keeps_manifest_when_required_backup_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let record = foo_record(tmp.path());
        let blocker = write_raw(tmp.path(), "blocker", "");

        let result = remove_manifest(&record, &policy(blocker.joined("backups"), true), &now());

        assert!(matches!(result, Err(Error::CannotPrepareBackupTarget { .. })));
        assert!(record.manifest_file.is_file());
    }

    #[test]
    fn removal_reports_optional_backup_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let record = foo_record(tmp.path());
        let blocker = write_raw(tmp.path(), "blocker", "");

        let safeguard = remove_manifest(&record, &policy(blocker.joined("backups"), false), &now()).unwrap();

        assert!(!record.manifest_file.exists());
        assert_eq!(None, safeguard.backup);
        assert!(safeguard.warning.unwrap().starts_with("backup failed"));
    }
}
