use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;

mod elf;

/// Exit status for files that open fine but are not an acceptable ELF.
const EXIT_REJECTED: u8 = 1;

#[derive(Parser)]
#[command(name = "is-elf")]
#[command(about = "Check whether a file starts with an acceptable ELF header.")]
#[command(
    after_help = "Accepted files are echoed to stdout as <path>NUL so the output composes \
with xargs -0; anything else exits nonzero with no output."
)]
struct Cli {
    /// File meant to be ELF.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

#[derive(Debug, Error)]
enum ProbeError {
    #[error("expected exactly one <file> operand")]
    Usage,

    #[error("open path '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("stat path '{}': {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    #[error("read path '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

impl ProbeError {
    fn exit_code(&self) -> u8 {
        let code = match self {
            ProbeError::Usage => libc::EINVAL,
            ProbeError::Open { source, .. }
            | ProbeError::Stat { source, .. }
            | ProbeError::Read { source, .. } => source.raw_os_error().unwrap_or(0),
        };
        u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
    }
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("is-elf: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn try_main() -> Result<ExitCode, ProbeError> {
    let mut files = Cli::parse().files;

    if files.is_empty() {
        print_usage(&mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }
    if files.len() > 1 {
        print_usage(&mut io::stderr());
        return Err(ProbeError::Usage);
    }
    let path = files.remove(0);

    let mut file = File::open(&path).map_err(|source| ProbeError::Open {
        path: path.clone(),
        source,
    })?;
    let meta = file.metadata().map_err(|source| ProbeError::Stat {
        path: path.clone(),
        source,
    })?;
    if meta.len() < elf::PROBE_LEN as u64 {
        return Ok(ExitCode::from(EXIT_REJECTED));
    }

    let mut header = [0u8; elf::PROBE_LEN];
    file.read_exact(&mut header)
        .map_err(|source| ProbeError::Read {
            path: path.clone(),
            source,
        })?;
    drop(file);

    if !elf::is_acceptable(&header) {
        return Ok(ExitCode::from(EXIT_REJECTED));
    }

    let mut stdout = io::stdout();
    let _ = stdout.write_all(path.as_os_str().as_bytes());
    let _ = stdout.write_all(b"\0");
    Ok(ExitCode::SUCCESS)
}

fn print_usage(out: &mut dyn Write) {
    use clap::CommandFactory as _;
    let mut command = Cli::command();
    let _ = write!(out, "{}", command.render_help());
}
