use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use crate::error::PathError;

/// Linux `PATH_MAX`, counting the terminating NUL.
pub const DEFAULT_MAX_PATH_LEN: usize = libc::PATH_MAX as usize;

/// The watched source directory and the directory its links live in.
///
/// Both paths are canonical and existing; built once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    source: PathBuf,
    target: PathBuf,
    max_path_len: usize,
}

impl WatchTarget {
    /// Canonicalize and validate both directories.
    ///
    /// Fails if either path does not resolve, is not a directory, or leaves
    /// no room under `max_path_len` for a separator and an entry name.
    pub fn new(source: &Path, target: &Path, max_path_len: usize) -> anyhow::Result<Self> {
        let source = resolve_dir(source)?;
        let target = resolve_dir(target)?;

        for dir in [&source, &target] {
            if dir.as_os_str().len() >= max_path_len.saturating_sub(1) {
                bail!(
                    "paths are too long: {} (limit {} bytes)",
                    dir.display(),
                    max_path_len
                );
            }
        }

        Ok(Self {
            source,
            target,
            max_path_len,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Path of the source entry a link points at.
    pub fn source_path(&self, name: &OsStr) -> Result<PathBuf, PathError> {
        build(&self.source, name, self.max_path_len)
    }

    /// Path of the link mirroring `name`.
    pub fn link_path(&self, name: &OsStr) -> Result<PathBuf, PathError> {
        build(&self.target, name, self.max_path_len)
    }
}

fn resolve_dir(path: &Path) -> anyhow::Result<PathBuf> {
    let resolved = std::fs::canonicalize(path)
        .with_context(|| format!("could not resolve path {}", path.display()))?;
    if !resolved.is_dir() {
        bail!("{} is not a directory", resolved.display());
    }
    Ok(resolved)
}

/// Join `dir` and a bare entry `name`.
///
/// `dir` must already be canonical and `name` must not contain a separator.
/// The result, plus its terminating NUL, has to fit in `max` bytes.
pub fn build(dir: &Path, name: &OsStr, max: usize) -> Result<PathBuf, PathError> {
    debug_assert!(!name.is_empty());
    debug_assert!(!name.as_bytes().contains(&b'/'));

    let len = dir.as_os_str().len() + 1 + name.len();
    if len >= max {
        return Err(PathError::TooLong {
            dir: dir.to_path_buf(),
            name: name.to_os_string(),
            len,
            max,
        });
    }
    Ok(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_joins_dir_and_name() {
        let path = build(Path::new("/src"), OsStr::new("a.txt"), 4096).unwrap();
        assert_eq!(path, PathBuf::from("/src/a.txt"));
    }

    #[test]
    fn test_build_rejects_overflow() {
        // "/src" + "/" + "abcd" = 9 bytes, which leaves no room for the NUL.
        let err = build(Path::new("/src"), OsStr::new("abcd"), 9).unwrap_err();
        match err {
            PathError::TooLong { len, max, .. } => {
                assert_eq!(len, 9);
                assert_eq!(max, 9);
            }
        }
        assert!(build(Path::new("/src"), OsStr::new("abc"), 9).is_ok());
    }

    #[test]
    fn test_watch_target_canonicalizes() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let nested = src.path().join("inner");
        std::fs::create_dir(&nested).unwrap();

        let dotted = nested.join("..");
        let target = WatchTarget::new(&dotted, dst.path(), DEFAULT_MAX_PATH_LEN).unwrap();
        assert_eq!(target.source(), src.path().canonicalize().unwrap());
        assert_eq!(target.target(), dst.path().canonicalize().unwrap());
    }

    #[test]
    fn test_watch_target_rejects_missing_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "x").unwrap();

        assert!(WatchTarget::new(&dir.path().join("nope"), dir.path(), 4096).is_err());
        assert!(WatchTarget::new(&file, dir.path(), 4096).is_err());
    }

    #[test]
    fn test_watch_target_rejects_long_dirs() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let len = src.path().canonicalize().unwrap().as_os_str().len();

        let err = WatchTarget::new(src.path(), dst.path(), len + 1).unwrap_err();
        assert!(err.to_string().contains("paths are too long"));
    }

    #[test]
    fn test_link_and_source_paths() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let target = WatchTarget::new(src.path(), dst.path(), DEFAULT_MAX_PATH_LEN).unwrap();

        let name = OsStr::new("b.txt");
        assert_eq!(
            target.source_path(name).unwrap(),
            src.path().canonicalize().unwrap().join("b.txt")
        );
        assert_eq!(
            target.link_path(name).unwrap(),
            dst.path().canonicalize().unwrap().join("b.txt")
        );
    }
}
