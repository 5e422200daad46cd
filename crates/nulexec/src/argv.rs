use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

use crate::error::RunError;

/// Ceiling on the number of entries in the materialized vector. The vector is
/// sized from the scanned file, so without a ceiling a script of nothing but
/// zero bytes could demand one entry per byte of a gigabyte-sized file.
pub const MAX_ARGS: usize = 2_097_152;

/// The ordered argv for the replacement image: program name, caller-supplied
/// leading arguments, then the script tokens in file order. Tokens borrow
/// straight from the script buffer, so the buffer must outlive the vector.
/// Built once at exact capacity and never mutated afterwards; the terminating
/// NUL pointer of the underlying argv is supplied by the exec call itself.
pub struct ArgumentVector<'a> {
    entries: Vec<&'a OsStr>,
}

impl<'a> ArgumentVector<'a> {
    /// Two-pass construction. Pass 1 sizes the vector exactly: each zero byte
    /// closes one token, and a non-zero final byte leaves one unterminated
    /// trailing token that is included as the last argument. Pass 2 fills the
    /// vector at that capacity, preserving empty tokens (two adjacent zero
    /// bytes are a legal zero-length argument). Scanning twice is cheaper
    /// than reallocating; the file read dominates either way.
    pub fn build(
        program: &'a OsStr,
        leading: &'a [OsString],
        buffer: &'a [u8],
    ) -> Result<ArgumentVector<'a>, RunError> {
        let zero_bytes = buffer.iter().filter(|b| **b == 0).count();
        let trailing = usize::from(buffer.last().is_some_and(|b| *b != 0));
        let capacity = 1 + leading.len() + zero_bytes + trailing;
        if capacity > MAX_ARGS {
            return Err(RunError::ArgCountExceeded {
                count: capacity,
                ceiling: MAX_ARGS,
            });
        }

        let mut entries = Vec::new();
        entries
            .try_reserve_exact(capacity)
            .map_err(|_| RunError::Allocation {
                bytes: (capacity * std::mem::size_of::<&OsStr>()) as u64,
            })?;

        entries.push(program);
        for arg in leading {
            entries.push(arg.as_os_str());
        }

        let mut start = 0;
        for (i, byte) in buffer.iter().enumerate() {
            if *byte == 0 {
                entries.push(OsStr::from_bytes(&buffer[start..i]));
                start = i + 1;
            }
        }
        if start < buffer.len() {
            entries.push(OsStr::from_bytes(&buffer[start..]));
        }
        debug_assert_eq!(entries.len(), capacity);

        Ok(ArgumentVector { entries })
    }

    pub fn program(&self) -> &'a OsStr {
        self.entries[0]
    }

    /// Everything after the program name, in final order.
    pub fn tail(&self) -> &[&'a OsStr] {
        &self.entries[1..]
    }
}
