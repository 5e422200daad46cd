use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for one launcher run. Every variant is terminal: the
/// process reports it once on stderr and exits with `exit_code()`. Nothing is
/// retried; this is a one-shot launcher.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("missing operands: expected <program> [..<args>] <script>")]
    Usage,

    #[error("open path '{}': symbolic links may not be used as a script", path.display())]
    LinkNotAllowed { path: PathBuf },

    #[error("open path '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("stat path '{}': {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    #[error("script file is too big (size={len}, limit={limit}): '{}'", path.display())]
    SizeLimitExceeded { path: PathBuf, len: u64, limit: u64 },

    #[error("read path '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot allocate {bytes} bytes")]
    Allocation { bytes: u64 },

    #[error("argument count {count} exceeds the {ceiling} ceiling")]
    ArgCountExceeded { count: usize, ceiling: usize },

    #[error("exec {program:?}: {source}")]
    Exec { program: OsString, source: io::Error },
}

impl RunError {
    /// Exit status for this failure. Syscall-backed errors surface the
    /// underlying errno; the rest map to fixed codes. A sentinel of 1 covers
    /// errors with no representable OS code.
    pub fn exit_code(&self) -> u8 {
        let code = match self {
            RunError::Usage => libc::EAGAIN,
            RunError::LinkNotAllowed { .. } => libc::ELOOP,
            RunError::SizeLimitExceeded { .. } => libc::EFBIG,
            RunError::Allocation { .. } => libc::ENOMEM,
            RunError::ArgCountExceeded { .. } => libc::E2BIG,
            RunError::Open { source, .. }
            | RunError::Stat { source, .. }
            | RunError::Read { source, .. }
            | RunError::Exec { source, .. } => source.raw_os_error().unwrap_or(0),
        };
        u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
    }
}
