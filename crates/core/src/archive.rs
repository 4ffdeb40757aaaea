//! Read-only access to jar artifacts.

use crate::error::{DiscoveryError, Result};
use crate::tracker::{ResourceGuard, ResourceKind, ResourceTracker};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

const MODULE_DESCRIPTOR: &str = "module-info.class";
const VERSIONED_PREFIX: &str = "META-INF/versions/";

/// An open artifact. The underlying file is closed when the handle drops.
pub struct ArchiveHandle {
    path: PathBuf,
    archive: ZipArchive<File>,
    _guard: ResourceGuard,
}

impl ArchiveHandle {
    pub fn open(path: &Path, tracker: &ResourceTracker) -> Result<Self> {
        let file = File::open(path).map_err(|e| DiscoveryError::io(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| archive_error(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
            _guard: tracker.acquire(ResourceKind::Archive),
        })
    }

    /// Opens `path`, runs `f` against it and closes the archive on every exit path.
    pub fn scoped<T>(
        path: &Path,
        tracker: &ResourceTracker,
        f: impl FnOnce(&mut ArchiveHandle) -> Result<T>,
    ) -> Result<T> {
        let mut handle = Self::open(path, tracker)?;
        f(&mut handle)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self, entry: &str) -> bool {
        self.archive.index_for_name(entry).is_some()
    }

    pub fn read_bytes(&mut self, entry: &str) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(DiscoveryError::NotFound {
                    artifact: self.path.clone(),
                    entry: entry.to_string(),
                });
            }
            Err(e) => return Err(archive_error(&self.path, e)),
        };

        // The declared size is untrusted header data.
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| DiscoveryError::io(&self.path, e))?;
        Ok(bytes)
    }

    /// Reads a text entry and splits it on `\n` / `\r\n`.
    pub fn read_lines(&mut self, entry: &str) -> Result<Vec<String>> {
        let bytes = self.read_bytes(entry)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            DiscoveryError::io(
                &self.path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        Ok(text.lines().map(str::to_string).collect())
    }

    /// Entry names from the central directory. No entry is opened, so
    /// encrypted or unsupported entries do not matter here.
    pub fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Whether the artifact is a named module, either at the root or in a
    /// multi-release version directory.
    pub fn has_module_descriptor(&self) -> bool {
        self.exists(MODULE_DESCRIPTOR)
            || self.archive.file_names().any(|name| {
                name.strip_prefix(VERSIONED_PREFIX)
                    .and_then(|rest| rest.split_once('/'))
                    .is_some_and(|(_, tail)| tail == MODULE_DESCRIPTOR)
            })
    }
}

fn archive_error(path: &Path, err: ZipError) -> DiscoveryError {
    match err {
        ZipError::Io(source) => DiscoveryError::io(path, source),
        source => DiscoveryError::Archive {
            path: path.to_path_buf(),
            source,
        },
    }
}
