use std::fs::{File, OpenOptions};
use std::io::Read;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::error::RunError;

/// Upper bound on the script file size: 1 GiB plus 64 KiB of slack. The
/// argument vector is sized from the actual contents, but an explicit ceiling
/// keeps an attacker-controlled file size from committing unbounded memory.
pub const MAX_SCRIPT_LEN: u64 = 1_073_807_360;

/// An opened script file: the descriptor, the path kept for diagnostics and
/// the deferred unlink, the stat-reported length, and whether the owner-write
/// permission bit was set at open time.
pub struct ScriptFile {
    file: File,
    path: PathBuf,
    len: u64,
    deletable: bool,
}

/// Carries the deletion decision out of the loader. `dispose` consumes the
/// token by value, so the unlink can fire at most once per run, on the
/// success path just before process replacement or in the failure funnel.
#[derive(Debug)]
pub struct ScriptDisposal {
    path: PathBuf,
    deletable: bool,
}

impl ScriptDisposal {
    /// Best-effort removal of the script when its owner-write bit was set at
    /// open time. Unlink failures are ignored: the file may already be gone,
    /// or the filesystem may refuse, and the launch does not depend on it.
    pub fn dispose(self) {
        if self.deletable {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl ScriptFile {
    /// Opens `path` read-only, refusing to follow a symbolic link at the
    /// final component, and samples the owner-write bit and file length.
    pub fn open(path: &Path) -> Result<ScriptFile, RunError> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOFOLLOW)
            .open(path)
            .map_err(|source| {
                if source.raw_os_error() == Some(libc::ELOOP) {
                    RunError::LinkNotAllowed {
                        path: path.to_path_buf(),
                    }
                } else {
                    RunError::Open {
                        path: path.to_path_buf(),
                        source,
                    }
                }
            })?;

        let meta = file.metadata().map_err(|source| RunError::Stat {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(ScriptFile {
            file,
            path: path.to_path_buf(),
            len: meta.len(),
            deletable: meta.permissions().mode() & (libc::S_IWUSR as u32) != 0,
        })
    }

    #[cfg(test)]
    pub fn is_deletable(&self) -> bool {
        self.deletable
    }

    /// Validates the size ceiling and reads the whole file into an owned
    /// buffer, closing the descriptor as soon as the bytes are in. The
    /// disposal token comes back on both paths: once the permission bit has
    /// been sampled, validation and read failures still owe the cleanup
    /// decision. A zero-length file yields an empty buffer.
    pub fn into_contents(mut self) -> (Result<Vec<u8>, RunError>, ScriptDisposal) {
        let disposal = ScriptDisposal {
            path: self.path.clone(),
            deletable: self.deletable,
        };
        let contents = self.read_to_buffer();
        (contents, disposal)
    }

    fn read_to_buffer(&mut self) -> Result<Vec<u8>, RunError> {
        if self.len > MAX_SCRIPT_LEN {
            return Err(RunError::SizeLimitExceeded {
                path: self.path.clone(),
                len: self.len,
                limit: MAX_SCRIPT_LEN,
            });
        }
        let len = usize::try_from(self.len).map_err(|_| RunError::Allocation { bytes: self.len })?;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| RunError::Allocation { bytes: self.len })?;
        buffer.resize(len, 0);

        // read_exact turns a short read into UnexpectedEof, so a file that
        // shrank between stat and read is still a hard error.
        self.file
            .read_exact(&mut buffer)
            .map_err(|source| RunError::Read {
                path: self.path.clone(),
                source,
            })?;
        Ok(buffer)
    }
}
