//! Scoped temporary copies of the input module.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::{Error, Result};

const TARGET: &str = "refasm::temp";

/// How many times allocation is attempted before giving up
pub const TEMP_COPY_ATTEMPTS: usize = 3;

/// Hands out fresh, uniquely named temporary files
pub trait TempAllocator {
    /// Creates a new empty temporary file whose name ends in `suffix`.
    ///
    /// # Errors
    /// An [`io::ErrorKind::AlreadyExists`] error signals a name collision and may be
    /// retried; anything else is final.
    fn allocate(&self, suffix: &str) -> io::Result<NamedTempFile>;
}

/// Allocates in the system temporary directory, or in a chosen directory
#[derive(Debug, Clone, Default)]
pub struct SystemTempAllocator {
    dir: Option<PathBuf>,
}

impl SystemTempAllocator {
    /// Allocates inside `dir` instead of the system temporary directory
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        SystemTempAllocator {
            dir: Some(dir.into()),
        }
    }
}

impl TempAllocator for SystemTempAllocator {
    fn allocate(&self, suffix: &str) -> io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("refasm-").suffix(suffix);
        match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

/// A temporary copy of a file, removed on drop unless persisted
#[derive(Debug)]
pub struct ScopedTempCopy {
    file: NamedTempFile,
}

impl ScopedTempCopy {
    /// Copies `source` into a freshly allocated temporary file.
    ///
    /// Name collisions are retried up to [`TEMP_COPY_ATTEMPTS`] times in total.
    ///
    /// # Errors
    /// [`Error::RetriesExhausted`] once every attempt collided, [`Error::FileError`] for
    /// any other allocation failure or if the copy fails.
    pub fn create(source: &Path, allocator: &dyn TempAllocator) -> Result<ScopedTempCopy> {
        let suffix = source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        for attempt in 1..=TEMP_COPY_ATTEMPTS {
            match allocator.allocate(&suffix) {
                Ok(file) => {
                    fs::copy(source, file.path())?;
                    debug!(
                        target: TARGET,
                        "copied {} to {}",
                        source.display(),
                        file.path().display()
                    );
                    return Ok(ScopedTempCopy { file });
                }
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                    warn!(
                        target: TARGET,
                        "temporary file collision ({attempt}/{TEMP_COPY_ATTEMPTS}): {error}"
                    );
                }
                Err(error) => return Err(Error::FileError(error)),
            }
        }

        Err(Error::RetriesExhausted {
            operation: "temporary copy allocation",
            attempts: TEMP_COPY_ATTEMPTS,
        })
    }

    /// Location of the copy
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Moves the copy to `dest`, replacing it.
    ///
    /// Tries an atomic rename first and falls back to copying when the rename fails, e.g.
    /// across file systems; the temporary file is removed either way.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if neither rename nor copy succeeds.
    pub fn persist(self, dest: &Path) -> Result<PathBuf> {
        match self.file.persist(dest) {
            Ok(_) => {}
            Err(error) => {
                debug!(
                    target: TARGET,
                    "rename to {} failed ({}), copying instead",
                    dest.display(),
                    error.error
                );
                let file = error.file;
                fs::copy(file.path(), dest)?;
            }
        }
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Collides `collisions` times, then allocates normally
    struct Colliding {
        collisions: usize,
        calls: Cell<usize>,
    }

    impl Colliding {
        fn new(collisions: usize) -> Self {
            Colliding {
                collisions,
                calls: Cell::new(0),
            }
        }
    }

    impl TempAllocator for Colliding {
        fn allocate(&self, suffix: &str) -> io::Result<NamedTempFile> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call <= self.collisions {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "taken"));
            }
            SystemTempAllocator::default().allocate(suffix)
        }
    }

    struct Denied;

    impl TempAllocator for Denied {
        fn allocate(&self, _suffix: &str) -> io::Result<NamedTempFile> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn source(dir: &Path) -> PathBuf {
        let path = dir.join("Acme.dll");
        fs::write(&path, b"module bytes").unwrap();
        path
    }

    #[test]
    fn copy_has_source_contents_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        let copy = ScopedTempCopy::create(&source, &SystemTempAllocator::default()).unwrap();
        assert_eq!(fs::read(copy.path()).unwrap(), b"module bytes");
        assert_eq!(copy.path().extension().unwrap(), "dll");
    }

    #[test]
    fn copy_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        let copy = ScopedTempCopy::create(&source, &SystemTempAllocator::in_dir(dir.path()))
            .unwrap();
        let path = copy.path().to_path_buf();
        assert!(path.exists());
        drop(copy);
        assert!(!path.exists());
    }

    #[test]
    fn two_collisions_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        let allocator = Colliding::new(2);
        assert!(ScopedTempCopy::create(&source, &allocator).is_ok());
        assert_eq!(allocator.calls.get(), 3);
    }

    #[test]
    fn three_collisions_exhaust_retries() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        let allocator = Colliding::new(3);
        let result = ScopedTempCopy::create(&source, &allocator);
        assert!(matches!(
            result,
            Err(Error::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(allocator.calls.get(), 3);
    }

    #[test]
    fn other_errors_are_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        let result = ScopedTempCopy::create(&source, &Denied);
        assert!(matches!(result, Err(Error::FileError(_))));
    }

    #[test]
    fn persist_moves_the_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = source(dir.path());
        let copy = ScopedTempCopy::create(&source, &SystemTempAllocator::in_dir(dir.path()))
            .unwrap();
        let temp_path = copy.path().to_path_buf();
        let dest = dir.path().join("out.dll");
        fs::write(&dest, b"stale").unwrap();

        assert_eq!(copy.persist(&dest).unwrap(), dest);
        assert_eq!(fs::read(&dest).unwrap(), b"module bytes");
        assert!(!temp_path.exists());
    }
}
