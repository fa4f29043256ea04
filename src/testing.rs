use std::path::Path;

use crate::path::StrictPath;

pub fn repo() -> String {
    repo_raw().replace('\\', "/")
}

pub fn repo_raw() -> String {
    env!("CARGO_MANIFEST_DIR").to_string()
}

pub fn s(text: &str) -> String {
    text.to_string()
}

/// Native rendering of a filesystem path, as the launcher would store it.
pub fn native(path: &Path) -> String {
    path.display().to_string()
}

/// Write a `.item` file with the required fields pointing at `install`.
pub fn write_manifest(dir: &Path, file: &str, app: &str, install: &str) -> StrictPath {
    let content = serde_json::json!({
        "FormatVersion": 0,
        "AppName": app,
        "DisplayName": format!("{app} Game"),
        "InstallLocation": install,
        "CatalogItemId": "abc123",
        "InstallSize": 42,
    });
    write_raw(dir, file, &serde_json::to_string_pretty(&content).unwrap())
}

pub fn write_raw(dir: &Path, file: &str, content: &str) -> StrictPath {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(file);
    std::fs::write(&path, content).unwrap();
    StrictPath::from(path)
}

/// Create an installed game folder containing the launcher marker.
pub fn make_game_folder(base: &Path, name: &str) -> std::path::PathBuf {
    let folder = base.join(name);
    std::fs::create_dir_all(folder.join(".egstore")).unwrap();
    folder
}

/// Make `dir` read-only. Returns false, with permissions restored, when
/// writes still succeed there, as they do for a privileged user.
#[cfg(unix)]
pub fn make_read_only(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o555)).unwrap();
    let check = dir.join(".write-check");
    if std::fs::write(&check, "").is_ok() {
        let _ = std::fs::remove_file(&check);
        make_writable(dir);
        return false;
    }
    true
}

#[cfg(unix)]
pub fn make_writable(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).unwrap();
}
