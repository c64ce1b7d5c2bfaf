use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lock file kept next to the stored blobs while a write is in flight
const LOCK_FILE: &str = ".lock";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive hold on a `FileStore` directory for one `set_item` or
/// `remove_item`. Released on drop.
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store at {dir} is busy: another td process is writing")]
    Timeout { dir: PathBuf },
}

impl StoreLock {
    /// Lock `store_dir`, waiting up to five seconds.
    pub fn acquire(store_dir: &Path) -> Result<Self, LockError> {
        Self::acquire_within(store_dir, DEFAULT_TIMEOUT)
    }

    pub fn acquire_within(store_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = store_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::CreateError {
                path: path.clone(),
                source: e,
            })?;

        let deadline = Instant::now() + timeout;
        while try_flock(&file).is_err() {
            if Instant::now() >= deadline {
                tracing::warn!(dir = %store_dir.display(), "timed out waiting for store lock");
                return Err(LockError::Timeout {
                    dir: store_dir.to_path_buf(),
                });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
        tracing::trace!(dir = %store_dir.display(), "store locked");
        Ok(StoreLock { _file: file, path })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_flock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_file_lives_only_while_held() {
        let tmp = TempDir::new().unwrap();

        let lock = StoreLock::acquire(tmp.path()).unwrap();
        assert!(tmp.path().join(LOCK_FILE).exists());
        drop(lock);
        assert!(!tmp.path().join(LOCK_FILE).exists());

        assert!(StoreLock::acquire(tmp.path()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn second_writer_times_out() {
        let tmp = TempDir::new().unwrap();
        let _held = StoreLock::acquire(tmp.path()).unwrap();

        let second = StoreLock::acquire_within(tmp.path(), Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }

    #[test]
    fn missing_store_dir() {
        let tmp = TempDir::new().unwrap();
        let lock = StoreLock::acquire(&tmp.path().join("nope"));
        assert!(matches!(lock, Err(LockError::CreateError { .. })));
    }
}
