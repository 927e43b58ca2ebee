pub mod event;

use std::ffi::CString;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use anyhow::Context;

use crate::error::EngineError;
use event::{HEADER_SIZE, NAME_MAX};

/// Events registered on the source directory.
const WATCH_MASK: u32 = libc::IN_CREATE | libc::IN_DELETE | libc::IN_MOVE | libc::IN_ONLYDIR;

/// Bytes needed to hold `events` records with maximal names.
pub fn buffer_len(events: usize) -> usize {
    events.max(1) * (HEADER_SIZE + NAME_MAX + 1)
}

/// Anything that can hand the engine raw notification batches.
pub trait NotificationSource {
    /// Block until a batch is available and copy it into `buf`.
    ///
    /// Returns the number of valid bytes.
    fn read_batch(&mut self, buf: &mut [u8]) -> Result<usize, EngineError>;
}

/// An inotify instance holding a single watch. Dropping it removes the
/// watch and closes the descriptor.
pub struct Inotify {
    file: File,
    wd: libc::c_int,
}

impl Inotify {
    /// Open a notification channel and start watching `dir` for entries being
    /// created, deleted or moved.
    pub fn watch(dir: &Path) -> anyhow::Result<Self> {
        // SAFETY: no pointers are passed; the result is checked below.
        let fd = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error())
                .context("could not initialize notifications");
        }
        // SAFETY: `fd` was just returned by inotify_init1 and is owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };

        let c_path = CString::new(dir.as_os_str().as_bytes())
            .with_context(|| format!("path contains a NUL byte: {}", dir.display()))?;
        // SAFETY: `fd` is a live inotify descriptor and `c_path` is NUL-terminated.
        let wd = unsafe { libc::inotify_add_watch(fd.as_raw_fd(), c_path.as_ptr(), WATCH_MASK) };
        if wd < 0 {
            return Err(io::Error::last_os_error())
                .with_context(|| format!("could not listen to notifications in {}", dir.display()));
        }

        Ok(Self {
            file: File::from(fd),
            wd,
        })
    }
}

impl NotificationSource for Inotify {
    fn read_batch(&mut self, buf: &mut [u8]) -> Result<usize, EngineError> {
        loop {
            match self.file.read(buf) {
                Ok(0) => return Err(EngineError::ChannelClosed),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(EngineError::Read(err)),
            }
        }
    }
}

impl Drop for Inotify {
    fn drop(&mut self) {
        // SAFETY: the descriptor stays open until `file` is dropped after this.
        // A failure only means the kernel already dropped the watch.
        unsafe {
            libc::inotify_rm_watch(self.file.as_raw_fd(), self.wd);
        }
    }
}
