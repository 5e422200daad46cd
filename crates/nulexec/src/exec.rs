use std::os::unix::process::CommandExt as _;
use std::process::Command;

use crate::argv::ArgumentVector;
use crate::error::RunError;

/// Replaces the current process image with `vector`'s program, execvp-style:
/// the program name is resolved through PATH, and the environment and open
/// descriptors are inherited. This is an irreversible control transfer; it
/// returns only when the replacement failed, carrying the underlying errno.
pub fn replace(vector: &ArgumentVector<'_>) -> RunError {
    let mut command = Command::new(vector.program());
    command.args(vector.tail());
    let source = command.exec();
    RunError::Exec {
        program: vector.program().to_os_string(),
        source,
    }
}
