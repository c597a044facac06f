//! External process execution for backends.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};

/// Run `program` with `args` in `cwd` and return its standard output.
///
/// A non-zero exit status is reported as [`Error::Tool`] carrying the
/// captured standard error.
pub fn run<I, S>(program: &str, args: I, cwd: &Path) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).current_dir(cwd);
    run_command(program, &mut command)
}

/// Run a prepared command, naming it `tool` in errors.
pub fn run_command(tool: &str, command: &mut Command) -> Result<String> {
    debug!("Running {:?}", command);
    let output = command.output().map_err(|e| Error::Tool {
        tool: tool.to_string(),
        message: format!("failed to start: {}", e),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(Error::Tool {
            tool: tool.to_string(),
            message: format!("exited with {}: {}", output.status, detail),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
