//! Result resources: processed image bytes materialized into a backing store.
//!
//! A resource is materialized once, when it is built, so its content can be
//! read any number of times without going back to the network. Where the
//! bytes live is decided by a [`ResourceStore`]:
//!
//! - [`TempFileStore`] writes a uniquely named temporary file (the default
//!   for [`Pipeline::execute`](crate::pipeline::Pipeline::execute)). The file
//!   is removed when the resource is dropped unless it was
//!   [persisted](ImaginaryResource::persist).
//! - [`MemoryStore`] keeps the bytes in a buffer, for callers (and tests)
//!   that want no filesystem side effects.

use crate::error::{ImaginaryError, Result};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::NamedTempFile;

/// Where a resource's bytes live.
#[derive(Debug)]
pub enum Backing {
    File(NamedTempFile),
    Memory { id: String, data: Vec<u8> },
}

/// Stable identifier of a resource's backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation<'a> {
    File(&'a Path),
    Memory(&'a str),
}

impl fmt::Display for ResourceLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory(id) => f.write_str(id),
        }
    }
}

/// Materializes response bytes into a [`Backing`].
pub trait ResourceStore {
    fn materialize(&self, content: Vec<u8>) -> Result<Backing>;
}

/// Writes each resource to a fresh temporary file.
#[derive(Debug, Clone, Default)]
pub struct TempFileStore {
    dir: Option<PathBuf>,
}

impl TempFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create temporary files under `dir` instead of the system temp dir.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl ResourceStore for TempFileStore {
    fn materialize(&self, content: Vec<u8>) -> Result<Backing> {
        let mut file = match &self.dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        file.write_all(&content)?;
        file.flush()?;
        Ok(Backing::File(file))
    }
}

static NEXT_MEMORY_ID: AtomicU64 = AtomicU64::new(1);

/// Keeps each resource in memory under a unique `memory://N` id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore;

impl ResourceStore for MemoryStore {
    fn materialize(&self, content: Vec<u8>) -> Result<Backing> {
        let n = NEXT_MEMORY_ID.fetch_add(1, Ordering::Relaxed);
        Ok(Backing::Memory {
            id: format!("memory://{n}"),
            data: content,
        })
    }
}

/// A store picked at runtime, e.g. from configuration.
#[derive(Debug, Clone)]
pub enum AnyStore {
    TempFile(TempFileStore),
    Memory(MemoryStore),
}

impl ResourceStore for AnyStore {
    fn materialize(&self, content: Vec<u8>) -> Result<Backing> {
        match self {
            Self::TempFile(store) => store.materialize(content),
            Self::Memory(store) => store.materialize(content),
        }
    }
}

/// A processed image returned by the service.
#[derive(Debug)]
pub struct ImaginaryResource {
    backing: Backing,
}

impl ImaginaryResource {
    /// Materialize `content` through `store`.
    pub fn new(content: Vec<u8>, store: &impl ResourceStore) -> Result<Self> {
        Ok(Self {
            backing: store.materialize(content)?,
        })
    }

    /// The backing store, checked for usability.
    ///
    /// Fails when a file-backed resource's file is no longer on disk.
    pub fn resource(&self) -> Result<&Backing> {
        match &self.backing {
            Backing::File(file) if !file.path().is_file() => Err(ImaginaryError::Resource(
                "An error occurred while processing the image. File not received".into(),
            )),
            backing => Ok(backing),
        }
    }

    /// The whole payload.
    pub fn content(&self) -> Result<Vec<u8>> {
        match self.resource()? {
            Backing::File(file) => Ok(fs::read(file.path())?),
            Backing::Memory { data, .. } => Ok(data.clone()),
        }
    }

    pub fn location(&self) -> ResourceLocation<'_> {
        match &self.backing {
            Backing::File(file) => ResourceLocation::File(file.path()),
            Backing::Memory { id, .. } => ResourceLocation::Memory(id),
        }
    }

    /// Path of the processed file, for file-backed resources.
    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::File(file) => Some(file.path()),
            Backing::Memory { .. } => None,
        }
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> Result<u64> {
        match self.resource()? {
            Backing::File(file) => Ok(fs::metadata(file.path())?.len()),
            Backing::Memory { data, .. } => Ok(data.len() as u64),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Move the payload to `dest`, overwriting it. A temp file is renamed into
    /// place when possible and copied otherwise.
    pub fn persist(self, dest: impl AsRef<Path>) -> Result<PathBuf> {
        let dest = dest.as_ref();
        self.resource()?;
        match self.backing {
            Backing::File(file) => {
                if let Err(e) = file.persist(dest) {
                    // Rename fails across filesystems.
                    fs::copy(e.file.path(), dest)?;
                }
            }
            Backing::Memory { data, .. } => fs::write(dest, data)?,
        }
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn temp_file_holds_content() {
        let resource =
            ImaginaryResource::new(b"\x89PNG data".to_vec(), &TempFileStore::new()).unwrap();

        let path = resource.path().unwrap();
        assert!(path.is_file());
        assert_eq!(fs::read(path).unwrap(), b"\x89PNG data");
        assert_eq!(resource.content().unwrap(), b"\x89PNG data");
        assert_eq!(resource.len().unwrap(), 9);
    }

    #[test]
    fn content_can_be_read_repeatedly() {
        let resource = ImaginaryResource::new(b"abc".to_vec(), &TempFileStore::new()).unwrap();
        assert_eq!(resource.content().unwrap(), resource.content().unwrap());
    }

    #[test]
    fn temp_files_are_unique() {
        let store = TempFileStore::new();
        let a = ImaginaryResource::new(b"a".to_vec(), &store).unwrap();
        let b = ImaginaryResource::new(b"b".to_vec(), &store).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn temp_file_store_respects_dir() {
        let tmp = TempDir::new().unwrap();
        let store = TempFileStore::in_dir(tmp.path());
        let resource = ImaginaryResource::new(b"x".to_vec(), &store).unwrap();
        assert!(resource.path().unwrap().starts_with(tmp.path()));
    }

    #[test]
    fn temp_file_store_missing_dir_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let store = TempFileStore::in_dir(tmp.path().join("nope"));
        let err = ImaginaryResource::new(b"x".to_vec(), &store).unwrap_err();
        assert!(matches!(err, ImaginaryError::Io(_)));
    }

    #[test]
    fn vanished_file_is_resource_error() {
        let resource = ImaginaryResource::new(b"x".to_vec(), &TempFileStore::new()).unwrap();
        fs::remove_file(resource.path().unwrap()).unwrap();

        assert!(matches!(resource.resource(), Err(ImaginaryError::Resource(_))));
        assert!(matches!(resource.content(), Err(ImaginaryError::Resource(_))));
    }

    #[test]
    fn temp_file_removed_on_drop() {
        let resource = ImaginaryResource::new(b"x".to_vec(), &TempFileStore::new()).unwrap();
        let path = resource.path().unwrap().to_path_buf();
        drop(resource);
        assert!(!path.exists());
    }

    #[test]
    fn memory_store_has_no_path() {
        let resource = ImaginaryResource::new(b"mem".to_vec(), &MemoryStore).unwrap();
        assert_eq!(resource.path(), None);
        assert_eq!(resource.content().unwrap(), b"mem");
        assert!(matches!(
            resource.location(),
            ResourceLocation::Memory(id) if id.starts_with("memory://")
        ));
    }

    #[test]
    fn memory_ids_are_unique() {
        let a = ImaginaryResource::new(Vec::new(), &MemoryStore).unwrap();
        let b = ImaginaryResource::new(Vec::new(), &MemoryStore).unwrap();
        assert_ne!(a.location(), b.location());
        assert!(a.is_empty().unwrap());
    }

    #[test]
    fn location_displays_path() {
        let resource = ImaginaryResource::new(b"x".to_vec(), &TempFileStore::new()).unwrap();
        let shown = resource.location().to_string();
        assert_eq!(shown, resource.path().unwrap().display().to_string());
    }

    #[test]
    fn persist_moves_temp_file() {
        let tmp = TempDir::new().unwrap();
        let resource = ImaginaryResource::new(b"out".to_vec(), &TempFileStore::new()).unwrap();
        let source = resource.path().unwrap().to_path_buf();

        let dest = resource.persist(tmp.path().join("out.webp")).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"out");
        assert!(!source.exists());
    }

    #[test]
    fn persist_writes_memory_payload() {
        let tmp = TempDir::new().unwrap();
        let resource = ImaginaryResource::new(b"mem".to_vec(), &MemoryStore).unwrap();
        let dest = resource.persist(tmp.path().join("out.png")).unwrap();
        assert_eq!(fs::read(dest).unwrap(), b"mem");
    }
}
