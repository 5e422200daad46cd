use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

mod argv;
mod error;
mod exec;
mod script;

use argv::ArgumentVector;
use error::RunError;
use script::ScriptFile;

/// The operands are taken verbatim: no flag parsing happens between the
/// program name and the script path, so anything starting with a hyphen is
/// forwarded to the target program untouched.
#[derive(Parser)]
#[command(name = "nulexec")]
#[command(about = "Exec a program with extra arguments read from a NUL-separated script file.")]
#[command(after_help = "The script file is DELETED after a successful launch if its owner-write \
permission bit was set when it was opened.")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Program to execute, any leading arguments to forward verbatim, then
    /// the script path as the final operand.
    #[arg(value_name = "PROGRAM [ARGS]... SCRIPT", trailing_var_arg = true, allow_hyphen_values = true)]
    operands: Vec<OsString>,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("nulexec: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn try_main() -> Result<ExitCode, RunError> {
    let mut operands = Cli::parse().operands;

    // A bare invocation is a help request, not an error.
    if operands.is_empty() {
        print_usage(&mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }
    if operands.len() < 2 {
        print_usage(&mut std::io::stderr());
        return Err(RunError::Usage);
    }

    // The script path is always the final operand; everything between the
    // program name and it is forwarded as leading arguments.
    let script_path = match operands.pop() {
        Some(last) => PathBuf::from(last),
        None => return Err(RunError::Usage),
    };
    let program = operands.remove(0);
    let leading = operands;

    let script = ScriptFile::open(&script_path)?;
    Err(launch(&program, &leading, script))
}

/// Loader -> Builder -> Trampoline, strictly linear. Does not return on a
/// successful launch; every failure path disposes of the script exactly once
/// before reporting back.
fn launch(program: &OsStr, leading: &[OsString], script: ScriptFile) -> RunError {
    let (contents, disposal) = script.into_contents();
    let buffer = match contents {
        Ok(buffer) => buffer,
        Err(err) => {
            disposal.dispose();
            return err;
        }
    };

    let vector = match ArgumentVector::build(program, leading, &buffer) {
        Ok(vector) => vector,
        Err(err) => {
            disposal.dispose();
            return err;
        }
    };

    // The deletion must happen strictly before the exec: nothing after a
    // successful process replacement ever runs.
    disposal.dispose();
    exec::replace(&vector)
}

fn print_usage(out: &mut dyn std::io::Write) {
    use clap::CommandFactory as _;
    let mut command = Cli::command();
    let _ = write!(out, "{}", command.render_help());
}
