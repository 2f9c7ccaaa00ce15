//! Exclusive queue-file lock with backoff retry
//!
//! A durable queue holds `<file>.lock` for as long as it is open so that a
//! second queue instance cannot interleave writes into the same file.

use crate::error::QueueError;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Lock guard that releases on drop
#[derive(Debug)]
pub struct FileLock {
    #[cfg_attr(not(unix), allow(dead_code))]
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }

        #[cfg(not(unix))]
        {
            // The lock is the file's existence on these platforms
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Path of the lock file guarding `queue_path`
pub fn lock_path_for(queue_path: &Path) -> PathBuf {
    let mut name = queue_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Acquire an exclusive lock on a file with backoff retry
///
/// Waits 50ms, 100ms, 200ms, ... between attempts. Returns
/// `QueueError::LockTimeout` if the lock is still held after `max_retries`
/// retries.
pub fn acquire_lock(path: &Path, max_retries: u32) -> Result<FileLock, QueueError> {
    #[cfg(unix)]
    {
        unix_acquire_lock(path, max_retries)
    }

    #[cfg(not(unix))]
    {
        fallback_acquire_lock(path, max_retries)
    }
}

fn backoff(attempt: u32) {
    let wait_ms = 50u64 * (1 << attempt.min(10));
    std::thread::sleep(Duration::from_millis(wait_ms));
}

#[cfg(unix)]
fn unix_acquire_lock(path: &Path, max_retries: u32) -> Result<FileLock, QueueError> {
    use std::fs::OpenOptions;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| QueueError::io(path, e))?;

    let fd = file.as_raw_fd();

    for attempt in 0..=max_retries {
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };

        if result == 0 {
            return Ok(FileLock {
                file,
                path: path.to_path_buf(),
            });
        }

        let err = std::io::Error::last_os_error();
        let would_block = err.raw_os_error() == Some(libc::EWOULDBLOCK)
            || err.raw_os_error() == Some(libc::EAGAIN);

        if !would_block {
            return Err(QueueError::io(path, err));
        }

        if attempt < max_retries {
            backoff(attempt);
        }
    }

    Err(QueueError::LockTimeout {
        path: path.to_path_buf(),
        retries: max_retries,
    })
}

#[cfg(not(unix))]
fn fallback_acquire_lock(path: &Path, max_retries: u32) -> Result<FileLock, QueueError> {
    use std::fs::OpenOptions;

    for attempt in 0..=max_retries {
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => {
                return Ok(FileLock {
                    file,
                    path: path.to_path_buf(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if attempt < max_retries {
                    backoff(attempt);
                }
            }
            Err(e) => return Err(QueueError::io(path, e)),
        }
    }

    Err(QueueError::LockTimeout {
        path: path.to_path_buf(),
        retries: max_retries,
    })
}
