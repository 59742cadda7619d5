//! In-memory mock filesystem for testing collectors without real `/proc`.
//!
//! This module provides `MockFs` which simulates a filesystem in memory,
//! allowing tests to run on macOS and in CI environments without Linux.

use crate::collector::traits::FileSystem;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files and directories in memory, allowing tests to simulate
/// various `/proc` filesystem states without needing actual Linux access.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Owner uid per path; unlisted existing paths are owned by root.
    owners: HashMap<PathBuf, u32>,
    /// Paths whose reads and owner lookups fail with this errno.
    failures: HashMap<PathBuf, i32>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    /// Sets the owner uid reported by `owner_uid`.
    pub fn set_owner(&mut self, path: impl AsRef<Path>, uid: u32) {
        self.owners.insert(path.as_ref().to_path_buf(), uid);
    }

    /// Makes reads of `path` fail with `PermissionDenied`, as `/proc/[pid]/environ`
    /// does for other users' processes.
    pub fn deny(&mut self, path: impl AsRef<Path>) {
        self.fail_with(path, libc::EACCES);
    }

    /// Makes every access to `path` fail with the OS error `errno`, e.g.
    /// `ESRCH` for a process reaped while its files are being read.
    pub fn fail_with(&mut self, path: impl AsRef<Path>, errno: i32) {
        self.failures.insert(path.as_ref().to_path_buf(), errno);
    }

    /// Removes a file or directory and everything below it, as if a
    /// process exited.
    pub fn remove(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.files.retain(|p, _| !p.starts_with(path));
        self.directories.retain(|p| !p.starts_with(path));
        self.owners.retain(|p, _| !p.starts_with(path));
    }

    /// Adds a process with its required `/proc/[pid]/` files.
    ///
    /// # Arguments
    /// * `pid` - Process ID
    /// * `uid` - Owner of `/proc/[pid]`
    /// * `stat` - Content of `/proc/[pid]/stat`
    /// * `status` - Content of `/proc/[pid]/status`
    ///
    /// Optional files (`cmdline`, `environ`, `statm`) are added with `add_file`.
    pub fn add_process(&mut self, pid: u32, uid: u32, stat: &str, status: &str) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(&base);
        self.set_owner(&base, uid);
        self.add_file(base.join("stat"), stat);
        self.add_file(base.join("status"), status);
    }

    /// Loads a copy of a `/proc` tree saved on disk, mounted at `/proc`.
    ///
    /// Lets a snapshot captured on one host be replayed against the
    /// collectors anywhere. Every entry is owned by root.
    pub fn from_snapshot(dir: &Path) -> io::Result<Self> {
        let mut fs = Self::new();
        load_directory_recursive(&mut fs, dir, Path::new("/proc"))?;
        Ok(fs)
    }

    fn check_failure(&self, path: &Path) -> io::Result<()> {
        match self.failures.get(path) {
            Some(errno) => Err(io::Error::from_raw_os_error(*errno)),
            None => Ok(()),
        }
    }
}

fn load_directory_recursive(
    fs: &mut MockFs,
    real_path: &Path,
    virtual_path: &Path,
) -> io::Result<()> {
    fs.add_dir(virtual_path);

    for entry in std::fs::read_dir(real_path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let real_child = entry.path();
        let virtual_child = virtual_path.join(&name);

        if file_type.is_dir() {
            load_directory_recursive(fs, &real_child, &virtual_child)?;
        } else if file_type.is_file() {
            let bytes = std::fs::read(&real_child)?;
            fs.add_file(&virtual_child, String::from_utf8_lossy(&bytes).into_owned());
        }
    }
    Ok(())
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.check_failure(path)?;
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    /// Entries come back sorted, so scenario tests see a stable order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.check_failure(path)?;
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = BTreeSet::new();

        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    fn owner_uid(&self, path: &Path) -> io::Result<u32> {
        self.check_failure(path)?;
        if !self.exists(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("path not found: {:?}", path),
            ));
        }
        Ok(self.owners.get(path).copied().unwrap_or(0))
    }
}
