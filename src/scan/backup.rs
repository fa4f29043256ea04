use crate::{
    prelude::{timestamp, Error, StrictPath},
    scan::manifest::EXTENSION,
};

/// How manifests are protected before they are changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupPolicy {
    pub enabled: bool,
    /// Leave a manifest untouched when its backup fails.
    pub required: bool,
    pub dir: StrictPath,
}

/// What happened when backing up a manifest ahead of a change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Safeguard {
    pub backup: Option<StrictPath>,
    /// Set when the backup failed but the change may still go ahead.
    pub warning: Option<String>,
}

impl BackupPolicy {
    /// Back up `file` if enabled. This only fails when the backup is
    /// required and could not be made.
    pub fn safeguard(
        &self,
        file: &StrictPath,
        app_name: &str,
        now: &chrono::DateTime<chrono::Local>,
    ) -> Result<Safeguard, Error> {
        if !self.enabled {
            return Ok(Safeguard::default());
        }

        match back_up_manifest(file, &self.dir, app_name, now) {
            Ok(backup) => Ok(Safeguard {
                backup: Some(backup),
                warning: None,
            }),
            Err(e) if self.required => Err(e),
            Err(e) => {
                log::warn!("Failed to back up {:?}, proceeding anyway", file.raw());
                Ok(Safeguard {
                    backup: None,
                    warning: Some(format!("backup failed: {e}")),
                })
            }
        }
    }
}

/// Pick `<stem>_<stamp><suffix>` inside `dir`, adding `_2`, `_3`, ...
/// when earlier names are already taken.
fn unique_target(dir: &StrictPath, stem: &str, stamp: &str, suffix: &str) -> StrictPath {
    let mut candidate = dir.joined(&format!("{stem}_{stamp}{suffix}"));
    let mut n = 2;
    while candidate.exists() {
        candidate = dir.joined(&format!("{stem}_{stamp}_{n}{suffix}"));
        n += 1;
    }
    candidate
}

fn safe_file_stem(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.trim().is_empty() {
        "manifest".to_string()
    } else {
        cleaned
    }
}

/// Copy one manifest byte for byte to `<backup_dir>/<app_name>_<YYYYMMDD_HHMMSS>.item`.
pub fn back_up_manifest(
    file: &StrictPath,
    backup_dir: &StrictPath,
    app_name: &str,
    now: &chrono::DateTime<chrono::Local>,
) -> Result<StrictPath, Error> {
    if let Err(e) = backup_dir.create_dirs() {
        log::error!("Unable to create backup directory {:?}: {e:?}", backup_dir.raw());
        return Err(Error::CannotPrepareBackupTarget {
            path: backup_dir.clone(),
        });
    }

    let target = unique_target(
        backup_dir,
        &safe_file_stem(app_name),
        &timestamp(now),
        &format!(".{EXTENSION}"),
    );

    match file.copy_to(&target) {
        Ok(_) => {
            log::info!("Backed up manifest {:?} to {:?}", file.raw(), target.raw());
            Ok(target)
        }
        Err(e) => {
            log::error!("Unable to back up manifest {:?} to {:?}: {e:?}", file.raw(), target.raw());
            Err(Error::CannotPrepareBackupTarget { path: target })
        }
    }
}

/// Copy the whole manifest directory to a sibling named
/// `<DirName>_Backup_<YYYYMMDD_HHMMSS>`.
pub fn back_up_directory(dir: &StrictPath, now: &chrono::DateTime<chrono::Local>) -> Result<StrictPath, Error> {
    let (Some(parent), Some(name)) = (dir.parent(), dir.leaf()) else {
        return Err(Error::CannotPrepareBackupTarget { path: dir.clone() });
    };

    let target = unique_target(&parent, &format!("{name}_Backup"), &timestamp(now), "");

    match dir.copy_dir_to(&target) {
        Ok(()) => {
            log::info!("Backed up manifest directory {:?} to {:?}", dir.raw(), target.raw());
            Ok(target)
        }
        Err(e) => {
            log::error!(
                "Unable to back up manifest directory {:?} to {:?}: {e:?}",
                dir.raw(),
                target.raw()
            );
            Err(Error::CannotPrepareBackupTarget { path: target })
        }
    }
}

/// Put a backup back over the manifest it was taken from.
pub fn restore_manifest(backup: &StrictPath, file: &StrictPath) -> Result<(), std::io::Error> {
    let bytes = backup.try_read_bytes()?;
    file.write_atomically(&bytes)?;
    log::info!("Restored manifest {:?} from {:?}", file.raw(), backup.raw());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::write_raw;

    fn now() -> chrono::DateTime<chrono::Local> {
        chrono::Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn backs_up_manifest_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let content = "{ \"AppName\": \"Foo\", broken";
        let file = write_raw(&tmp.path().join("Manifests"), "a.item", content);
        let backups = StrictPath::from(tmp.path().join("backups"));

        let target = back_up_manifest(&file, &backups, "Foo", &now()).unwrap();

        assert_eq!(Some("Foo_20240102_030405.item".to_string()), target.leaf());
        assert_eq!(content, target.try_read().unwrap());
    }

    #[test]
    fn two_backups_in_the_same_second_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write_raw(&tmp.path().join("Manifests"), "a.item", "{}");
        let backups = StrictPath::from(tmp.path().join("backups"));

        let first = back_up_manifest(&file, &backups, "Foo", &now()).unwrap();
        let second = back_up_manifest(&file, &backups, "Foo", &now()).unwrap();

        assert_ne!(first, second);
        assert_eq!(Some("Foo_20240102_030405_2.item".to_string()), second.leaf());
        assert!(first.is_file());
        assert!(second.is_file());
    }

    #[test]
    fn sanitizes_app_name_for_file_name() {
        assert_eq!("a_b_c", safe_file_stem("a/b:c"));
        assert_eq!("manifest", safe_file_stem("  "));
    }

    #[test]
    fn backs_up_whole_directory_as_sibling() {
        let tmp = tempfile::tempdir().unwrap();
        let manifests = tmp.path().join("Manifests");
        write_raw(&manifests, "a.item", "a");
        write_raw(&manifests, "b.item", "b");
        let dir = StrictPath::from(manifests.as_path());

        let first = back_up_directory(&dir, &now()).unwrap();
        let second = back_up_directory(&dir, &now()).unwrap();

        assert_eq!(Some("Manifests_Backup_20240102_030405".to_string()), first.leaf());
        assert_eq!(Some("Manifests_Backup_20240102_030405_2".to_string()), second.leaf());
        assert_eq!("a", first.joined("a.item").try_read().unwrap());
        assert_eq!("b", second.joined("b.item").try_read().unwrap());
    }

    #[test]
    fn reports_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = StrictPath::from(tmp.path().join("missing.item"));
        let backups = StrictPath::from(tmp.path().join("backups"));

        assert!(matches!(
            back_up_manifest(&missing, &backups, "Foo", &now()),
            Err(Error::CannotPrepareBackupTarget { .. })
        ));
    }

    fn policy(dir: StrictPath, required: bool) -> BackupPolicy {
        BackupPolicy {
            enabled: true,
            required,
            dir,
        }
    }

    #[test]
    fn safeguard_skips_backup_when_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write_raw(tmp.path(), "a.item", "{}");
        let backups = StrictPath::from(tmp.path().join("backups"));
        let policy = BackupPolicy {
            enabled: false,
            ..policy(backups.clone(), true)
        };

        assert_eq!(Ok(Safeguard::default()), policy.safeguard(&file, "Foo", &now()));
        assert!(!backups.exists());
    }

    #[test]
    fn safeguard_turns_optional_failure_into_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write_raw(tmp.path(), "a.item", "{}");
        let blocker = write_raw(tmp.path(), "blocker", "");

        let safeguard = policy(blocker.joined("backups"), false)
            .safeguard(&file, "Foo", &now())
            .unwrap();

        assert_eq!(None, safeguard.backup);
        assert!(safeguard.warning.unwrap().starts_with("backup failed"));
    }

    #[test]
    fn safeguard_fails_when_backup_is_required() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write_raw(tmp.path(), "a.item", "{}");
        let blocker = write_raw(tmp.path(), "blocker", "");

        assert!(matches!(
            policy(blocker.joined("backups"), true).safeguard(&file, "Foo", &now()),
            Err(Error::CannotPrepareBackupTarget { .. })
        ));
    }

    #[test]
    fn restores_backup_over_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write_raw(tmp.path(), "a.item", "original");
        let backup = write_raw(tmp.path(), "a.bak", "backup");

        restore_manifest(&backup, &file).unwrap();

        assert_eq!("backup", file.try_read().unwrap());
    }
}
