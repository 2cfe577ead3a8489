//! Command implementations

pub mod configure;
pub mod deploy;
pub mod run;
pub mod shell;
pub mod status;
pub mod supervisorctl;

use std::process::{ExitCode, ExitStatus};

/// Map a remote session's exit status onto this process's exit code.
///
/// A session killed by a signal has no code and maps to failure.
#[must_use]
pub fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}
