//! Raw byte providers.
//!
//! The cache never touches the filesystem itself: it hands a resolved name to
//! a [`FileProvider`] and gets back an owned buffer, which it returns through
//! [`FileProvider::release`] once decoding is done (or has failed).

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, RsrcError};

/// Source of raw resource bytes.
pub trait FileProvider {
    /// Reads the whole resource called `name`.
    fn load(&self, name: &str) -> Result<Bytes>;

    /// Gives back a buffer obtained from [`FileProvider::load`].
    fn release(&self, buf: Bytes) {
        drop(buf);
    }
}

impl<F: FileProvider + ?Sized> FileProvider for Rc<F> {
    fn load(&self, name: &str) -> Result<Bytes> {
        (**self).load(name)
    }

    fn release(&self, buf: Bytes) {
        (**self).release(buf)
    }
}

/// Reads `<root>/<name>` from disk.
#[derive(Debug, Clone)]
pub struct DirProvider {
    root: PathBuf,
}

impl DirProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileProvider for DirProvider {
    fn load(&self, name: &str) -> Result<Bytes> {
        let path = self.root.join(name);
        let data = std::fs::read(&path).map_err(|e| RsrcError::IoFailure {
            name: name.to_string(),
            reason: format!("{}: {e}", path.display()),
        })?;
        debug!(path = %path.display(), bytes = data.len(), "Read resource file");
        Ok(Bytes::from(data))
    }
}

/// In-memory provider. Counts buffers handed out and not yet released.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    files: HashMap<String, Bytes>,
    outstanding: Cell<usize>,
    loads: Cell<usize>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.files.insert(name.into(), data.into());
    }

    pub fn with(mut self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(name, data);
        self
    }

    /// Buffers loaded and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    /// Successful loads so far.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl FileProvider for MemoryProvider {
    fn load(&self, name: &str) -> Result<Bytes> {
        let data = self.files.get(name).cloned().ok_or_else(|| RsrcError::IoFailure {
            name: name.to_string(),
            reason: "no such resource".to_string(),
        })?;
        self.outstanding.set(self.outstanding.get() + 1);
        self.loads.set(self.loads.get() + 1);
        Ok(data)
    }

    fn release(&self, buf: Bytes) {
        self.outstanding.set(self.outstanding.get().saturating_sub(1));
        drop(buf);
    }
}
