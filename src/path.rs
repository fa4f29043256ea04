use std::io::Write;

use crate::prelude::{filter_map_walkdir, AnyError};

#[cfg(target_os = "windows")]
const TYPICAL_SEPARATOR: &str = "\\";
#[cfg(target_os = "windows")]
const ATYPICAL_SEPARATOR: &str = "/";

#[cfg(not(target_os = "windows"))]
const TYPICAL_SEPARATOR: &str = "/";
#[cfg(not(target_os = "windows"))]
const ATYPICAL_SEPARATOR: &str = "\\";

const UNC_PREFIX: &str = "\\\\?\\";

fn parse_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") || path.starts_with("~\\") {
        match dirs::home_dir() {
            Some(home) => path.replacen('~', &home.to_string_lossy(), 1),
            None => path.to_owned(),
        }
    } else {
        path.to_owned()
    }
}

fn normalize(path: &str) -> String {
    parse_home(path).replace(ATYPICAL_SEPARATOR, TYPICAL_SEPARATOR)
}

fn current_dir() -> std::path::PathBuf {
    std::env::current_dir().unwrap_or_default()
}

// Based on:
// https://github.com/rust-lang/cargo/blob/f84f3f8c630c75a1ec01b818ff469d3496228c6b/src/cargo/util/paths.rs#L61-L86
fn parse_dots(path: &str, basis: &str) -> String {
    let mut components = std::path::Path::new(&path).components().peekable();
    let mut ret = if let Some(c @ std::path::Component::Prefix(..)) = components.peek().cloned() {
        components.next();
        std::path::PathBuf::from(c.as_os_str())
    } else {
        std::path::PathBuf::from(basis)
    };

    for component in components {
        match component {
            std::path::Component::Prefix(..) => {}
            std::path::Component::RootDir => {
                ret.push(component.as_os_str());
            }
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                ret.pop();
            }
            std::path::Component::Normal(c) => {
                ret.push(c);
            }
        }
    }

    render_pathbuf(&ret)
}

/// Make a raw path absolute against `basis` (or the working directory)
/// without touching the filesystem. Returns the path and the basis used.
fn absolutize(path: &str, basis: &Option<String>) -> (String, String) {
    let normalized = normalize(path);
    let basis = match basis {
        None => current_dir(),
        Some(b) => std::path::Path::new(b).to_path_buf(),
    };
    let absolutized = if std::path::Path::new(&normalized).is_absolute() {
        normalized
    } else {
        render_pathbuf(&basis.join(normalized))
    };
    (absolutized, render_pathbuf(&basis))
}

/// Convert a raw, possibly user-provided path into a suitable form for internal use.
/// On Windows, this produces UNC paths.
fn interpret<P: Into<String>>(path: P, basis: &Option<String>) -> String {
    let (absolutized, basis) = absolutize(&path.into(), basis);
    match std::fs::canonicalize(&absolutized) {
        Ok(x) => render_pathbuf(&x),
        Err(_) => {
            let dedotted = parse_dots(&absolutized, &basis);
            format!(
                "{}{}",
                if cfg!(target_os = "windows") { UNC_PREFIX } else { "" },
                dedotted.replace(ATYPICAL_SEPARATOR, TYPICAL_SEPARATOR)
            )
        }
    }
}

/// Convert a path into a nice form for display and storage.
/// On Windows, this produces non-UNC paths.
fn render<P: Into<String>>(path: P) -> String {
    path.into().replace(UNC_PREFIX, "").replace('\\', "/")
}

fn render_pathbuf(value: &std::path::Path) -> String {
    value.display().to_string()
}

/// This is a wrapper around paths to make it more obvious when we're
/// converting between different representations. This also handles
/// things like `~`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StrictPath {
    raw: String,
    basis: Option<String>,
    interpreted: String,
}

impl StrictPath {
    pub fn new(raw: String) -> Self {
        let interpreted = interpret(&raw, &None);
        Self {
            raw,
            basis: None,
            interpreted,
        }
    }

    pub fn relative(raw: String, basis: Option<String>) -> Self {
        let interpreted = interpret(&raw, &basis);
        Self {
            raw,
            basis,
            interpreted,
        }
    }

    pub fn from_std_path_buf(path_buf: &std::path::Path) -> Self {
        Self::new(render_pathbuf(path_buf))
    }

    pub fn as_std_path_buf(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.interpret())
    }

    pub fn raw(&self) -> String {
        self.raw.to_string()
    }

    pub fn interpret(&self) -> String {
        self.interpreted.to_string()
    }

    pub fn render(&self) -> String {
        render(self.interpreted.to_string())
    }

    /// Absolute form of the path as it was given, with native separators.
    /// Links are not resolved and there is no UNC prefix, so this is what
    /// goes into files that other programs read.
    pub fn absolute(&self) -> String {
        let (absolutized, basis) = absolutize(&self.raw, &self.basis);
        parse_dots(&absolutized, &basis)
            .replace(ATYPICAL_SEPARATOR, TYPICAL_SEPARATOR)
            .replace(UNC_PREFIX, "")
    }

    pub fn is_file(&self) -> bool {
        std::path::Path::new(&self.interpreted).is_file()
    }

    pub fn is_dir(&self) -> bool {
        std::path::Path::new(&self.interpreted).is_dir()
    }

    pub fn exists(&self) -> bool {
        self.is_file() || self.is_dir()
    }

    pub fn joined(&self, other: &str) -> Self {
        Self::new(format!("{}{}{}", self.interpret(), TYPICAL_SEPARATOR, other))
    }

    /// Final path component, if any.
    pub fn leaf(&self) -> Option<String> {
        self.as_std_path_buf()
            .file_name()
            .map(|x| x.to_string_lossy().to_string())
    }

    pub fn parent(&self) -> Option<Self> {
        self.as_std_path_buf().parent().map(Self::from_std_path_buf)
    }

    pub fn same_file(&self, other: &Self) -> bool {
        match (
            std::fs::canonicalize(self.interpret()),
            std::fs::canonicalize(other.interpret()),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    pub fn try_read(&self) -> Result<String, AnyError> {
        Ok(std::fs::read_to_string(self.interpret())?)
    }

    pub fn try_read_bytes(&self) -> Result<Vec<u8>, std::io::Error> {
        std::fs::read(self.interpret())
    }

    pub fn create_dirs(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(self.interpret())
    }

    pub fn create_parent_dir(&self) -> Result<(), std::io::Error> {
        match self.as_std_path_buf().parent() {
            Some(parent) => std::fs::create_dir_all(parent),
            None => Ok(()),
        }
    }

    /// Replace the file's content by writing to a sibling temporary file,
    /// syncing it, and renaming it over the original.
    pub fn write_atomically(&self, content: &[u8]) -> Result<(), std::io::Error> {
        let target = self.as_std_path_buf();
        let dir = target.parent().map(|x| x.to_path_buf()).unwrap_or_else(current_dir);

        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(content)?;
        staged.as_file().sync_all()?;
        staged.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn copy_to(&self, target: &Self) -> Result<u64, std::io::Error> {
        std::fs::copy(self.interpret(), target.interpret())
    }

    /// Recursively copy a directory's contents byte for byte.
    pub fn copy_dir_to(&self, target: &Self) -> Result<(), std::io::Error> {
        let source = self.as_std_path_buf();
        let destination = target.as_std_path_buf();
        std::fs::create_dir_all(&destination)?;

        for entry in walkdir::WalkDir::new(&source).min_depth(1).follow_links(false) {
            let entry = entry.map_err(std::io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(&source)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            let out = destination.join(relative);
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&out)?;
            } else {
                std::fs::copy(entry.path(), &out)?;
            }
        }

        Ok(())
    }

    pub fn remove(&self) -> Result<(), std::io::Error> {
        if self.is_file() {
            std::fs::remove_file(&self.interpreted)?;
        } else if self.is_dir() {
            std::fs::remove_dir_all(&self.interpreted)?;
        }
        Ok(())
    }

    /// Total size in bytes of all files below this path.
    /// Unreadable entries are ignored.
    pub fn size(&self) -> u64 {
        if self.is_file() {
            return std::fs::metadata(&self.interpreted).map(|x| x.len()).unwrap_or(0);
        }

        walkdir::WalkDir::new(&self.interpreted)
            .follow_links(false)
            .into_iter()
            .filter_map(filter_map_walkdir)
            .filter(|x| x.file_type().is_file())
            .filter_map(|x| x.metadata().ok())
            .map(|x| x.len())
            .sum()
    }
}

impl From<&str> for StrictPath {
    fn from(source: &str) -> Self {
        StrictPath::new(source.to_string())
    }
}

impl From<String> for StrictPath {
    fn from(source: String) -> Self {
        StrictPath::new(source)
    }
}

impl From<std::path::PathBuf> for StrictPath {
    fn from(source: std::path::PathBuf) -> Self {
        StrictPath::from_std_path_buf(&source)
    }
}

impl From<&std::path::Path> for StrictPath {
    fn from(source: &std::path::Path) -> Self {
        StrictPath::from_std_path_buf(source)
    }
}

// Based on:
// https://github.com/serde-rs/serde/issues/751#issuecomment-277580700
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct StrictPathSerdeHelper(String);

impl serde::Serialize for StrictPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        StrictPathSerdeHelper(self.raw()).serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for StrictPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde::Deserialize::deserialize(deserializer).map(|StrictPathSerdeHelper(raw)| StrictPath::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::repo;

    mod strict_path {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn expands_relative_paths_from_specified_basis_dir() {
            #[cfg(target_os = "windows")]
            {
                let sp = StrictPath::relative("Cargo.toml".to_owned(), Some("C:\\tmp".to_string()));
                assert_eq!(sp.interpret(), "\\\\?\\C:\\tmp\\Cargo.toml");
            }
            #[cfg(target_os = "linux")]
            {
                let sp = StrictPath::relative("Cargo.toml".to_owned(), Some("/tmp".to_string()));
                assert_eq!(sp.interpret(), "/tmp/Cargo.toml");
            }
        }

        #[test]
        fn converts_double_dots_within_fake_path() {
            assert_eq!(
                StrictPath::new(format!("{}/fake/../fake.md", repo())).render(),
                format!("{}/fake.md", repo()).replace('\\', "/")
            );
        }

        #[test]
        fn converts_single_dot_within_real_path() {
            assert_eq!(
                StrictPath::new(format!("{}/./Cargo.toml", repo())).render(),
                format!("{}/Cargo.toml", repo()).replace('\\', "/")
            );
        }

        #[test]
        fn can_check_if_it_is_a_file() {
            assert!(StrictPath::new(format!("{}/Cargo.toml", repo())).is_file());
            assert!(!StrictPath::new(repo()).is_file());
        }

        #[test]
        fn can_check_if_it_exists() {
            assert!(StrictPath::new(repo()).exists());
            assert!(!StrictPath::new(format!("{}/fake", repo())).exists());
        }

        #[test]
        fn reports_leaf_component() {
            assert_eq!(
                Some("Cargo.toml".to_string()),
                StrictPath::new(format!("{}/Cargo.toml", repo())).leaf()
            );
        }

        #[test]
        fn absolute_form_keeps_dots_resolved_but_not_links() {
            assert_eq!(
                format!("{}/fake.md", repo()).replace('/', TYPICAL_SEPARATOR),
                StrictPath::new(format!("{}/fake/../fake.md", repo())).absolute()
            );
        }

        #[cfg(unix)]
        #[test]
        fn absolute_form_does_not_follow_symlinks() {
            let tmp = tempfile::tempdir().unwrap();
            let real = tmp.path().join("real");
            let link = tmp.path().join("link");
            std::fs::create_dir_all(&real).unwrap();
            std::os::unix::fs::symlink(&real, &link).unwrap();

            let path = StrictPath::from(link.as_path());

            assert_eq!(link.display().to_string(), path.absolute());
            assert!(path.same_file(&StrictPath::from(real.as_path())));
        }

        #[test]
        fn sums_size_of_nested_files() {
            let tmp = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(tmp.path().join("a/b")).unwrap();
            std::fs::write(tmp.path().join("a/one.bin"), [0u8; 10]).unwrap();
            std::fs::write(tmp.path().join("a/b/two.bin"), [0u8; 5]).unwrap();

            assert_eq!(15, StrictPath::from(tmp.path()).size());
            assert_eq!(0, StrictPath::from(tmp.path().join("missing")).size());
        }

        #[test]
        fn writes_atomically_over_existing_file() {
            let tmp = tempfile::tempdir().unwrap();
            let file = StrictPath::from(tmp.path().join("x.item"));
            std::fs::write(file.as_std_path_buf(), "old").unwrap();

            file.write_atomically(b"new").unwrap();

            assert_eq!("new", file.try_read().unwrap());
            assert_eq!(1, std::fs::read_dir(tmp.path()).unwrap().count());
        }

        #[test]
        fn copies_directory_tree() {
            let tmp = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(tmp.path().join("src/nested")).unwrap();
            std::fs::write(tmp.path().join("src/a.item"), "a").unwrap();
            std::fs::write(tmp.path().join("src/nested/b.item"), "b").unwrap();

            StrictPath::from(tmp.path().join("src"))
                .copy_dir_to(&StrictPath::from(tmp.path().join("dst")))
                .unwrap();

            assert_eq!("a", std::fs::read_to_string(tmp.path().join("dst/a.item")).unwrap());
            assert_eq!("b", std::fs::read_to_string(tmp.path().join("dst/nested/b.item")).unwrap());
        }
    }
}
