//! Convention-based unit discovery.
//!
//! # Responsibilities
//! - Enumerate a conventional directory through an injectable handle
//! - Apply exclusion predicates (`index`, dotfiles, reserved stems)
//! - Yield discovered units as a restartable, lazily filtered sequence
//!
//! # Design Decisions
//! - Discovery order is lexicographic by file name on every platform
//! - A directory that does not exist is empty, not an error
//! - Only regular files are units, reached through symlinks too;
//!   subdirectories are ignored

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A directory of plugin units.
pub trait PluginDirectory: Send + Sync {
    /// File names in the directory. `Ok(vec![])` if it does not exist.
    fn entries(&self) -> io::Result<Vec<String>>;
}

/// Filesystem-backed directory handle.
#[derive(Debug, Clone)]
pub struct FsDirectory {
    path: PathBuf,
}

impl FsDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PluginDirectory for FsDirectory {
    fn entries(&self) -> io::Result<Vec<String>> {
        let read = match fs::read_dir(&self.path) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in read {
            let entry = entry?;
            let path = entry.path();
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Unit file skipped, unreadable");
                    continue;
                }
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => {
                    tracing::warn!(name = ?name, dir = %self.path.display(), "Unit file skipped, name is not UTF-8")
                }
            }
        }
        Ok(names)
    }
}

/// Fixed in-memory directory listing.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    entries: Vec<String>,
}

impl MemoryDirectory {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }
}

impl PluginDirectory for MemoryDirectory {
    fn entries(&self) -> io::Result<Vec<String>> {
        Ok(self.entries.clone())
    }
}

/// File-name predicates that drop entries from discovery.
#[derive(Debug, Clone)]
pub struct Exclusions {
    stems: Vec<String>,
    dotfiles: bool,
}

impl Exclusions {
    /// Excludes `index` and dotfiles.
    pub fn standard() -> Self {
        Self {
            stems: vec!["index".to_string()],
            dotfiles: true,
        }
    }

    /// Also exclude files whose stem is `stem`.
    pub fn and_stem(mut self, stem: impl Into<String>) -> Self {
        self.stems.push(stem.into());
        self
    }

    pub fn excludes(&self, file_name: &str) -> bool {
        if self.dotfiles && file_name.starts_with('.') {
            return true;
        }
        let stem = file_stem(file_name);
        self.stems.iter().any(|s| s == stem)
    }
}

/// A unit found by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUnit {
    pub file_name: String,
    /// File name with its extension stripped.
    pub stem: String,
}

/// Result of enumerating a directory once.
///
/// `iter()` may be called any number of times; each call restarts from the
/// first entry.
#[derive(Debug, Clone)]
pub struct Discovered {
    entries: Vec<String>,
    exclusions: Exclusions,
}

impl Discovered {
    pub fn iter(&self) -> impl Iterator<Item = DiscoveredUnit> + '_ {
        self.entries
            .iter()
            .filter(|name| !self.exclusions.excludes(name))
            .map(|name| DiscoveredUnit {
                file_name: name.clone(),
                stem: file_stem(name).to_owned(),
            })
    }
}

/// Enumerate `dir`, sorted by file name, filtered by `exclusions`.
pub fn discover(dir: &dyn PluginDirectory, exclusions: Exclusions) -> io::Result<Discovered> {
    let mut entries = dir.entries()?;
    entries.sort();
    Ok(Discovered {
        entries,
        exclusions,
    })
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_index_dotfiles_and_extra_stems() {
        let dir = MemoryDirectory::new(["users.rs", "index.rs", ".keep", "errors.rs", "admin.rs"]);
        let found = discover(&dir, Exclusions::standard().and_stem("errors")).unwrap();
        let stems: Vec<_> = found.iter().map(|u| u.stem).collect();
        assert_eq!(stems, vec!["admin", "users"]);
    }

    #[test]
    fn iteration_is_restartable() {
        let dir = MemoryDirectory::new(["b.toml", "a.toml"]);
        let found = discover(&dir, Exclusions::standard()).unwrap();
        assert_eq!(found.iter().count(), 2);
        let first: Vec<_> = found.iter().map(|u| u.file_name).collect();
        assert_eq!(first, vec!["a.toml", "b.toml"]);
    }

    #[test]
    fn filesystem_directory_skips_subdirectories() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("mail.toml"), "").unwrap();
        fs::create_dir(root.path().join("nested")).unwrap();

        let found = discover(&FsDirectory::new(root.path()), Exclusions::standard()).unwrap();
        let names: Vec<_> = found.iter().map(|u| u.file_name).collect();
        assert_eq!(names, vec!["mail.toml"]);
    }

    #[cfg(unix)]
    #[test]
    fn filesystem_directory_follows_symlinks() {
        let root = tempfile::tempdir().unwrap();
        let shared = root.path().join("shared");
        fs::create_dir(&shared).unwrap();
        fs::write(shared.join("audit.rs"), "").unwrap();
        let units = root.path().join("providers");
        fs::create_dir(&units).unwrap();
        std::os::unix::fs::symlink(shared.join("audit.rs"), units.join("audit.rs")).unwrap();
        std::os::unix::fs::symlink(root.path().join("gone.rs"), units.join("dangling.rs")).unwrap();

        let found = discover(&FsDirectory::new(&units), Exclusions::standard()).unwrap();
        let names: Vec<_> = found.iter().map(|u| u.file_name).collect();
        assert_eq!(names, vec!["audit.rs"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let dir = FsDirectory::new(root.path().join("absent"));
        assert!(dir.entries().unwrap().is_empty());
    }

    #[test]
    fn unreadable_path_propagates() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("plain.txt");
        fs::write(&file, "").unwrap();
        assert!(FsDirectory::new(&file).entries().is_err());
    }
}
