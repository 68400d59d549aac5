//! Local entry invocation.
//!
//! Runs `interpreter script ARGS...` as a child process with the caller's
//! environment and standard streams, waits for it exactly once, and hands
//! back its exit code. There is no retry, timeout, or restart.

use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};

use scriptpack_core::EntrypointDescriptor;

/// Exit code the shell reports for a command that cannot be found.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code the shell reports for a command that cannot be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

/// Launches the script described by an [`EntrypointDescriptor`].
pub struct EntryInvoker<'a> {
    entry: &'a EntrypointDescriptor,
}

impl<'a> EntryInvoker<'a> {
    pub fn new(entry: &'a EntrypointDescriptor) -> Self {
        Self { entry }
    }

    /// Run the script with `args` forwarded verbatim and return its exit code.
    ///
    /// A child killed by signal `S` yields `128 + S`, the same code a
    /// container engine reports.
    pub async fn invoke(&self, args: &[OsString]) -> Result<i32, InvokeError> {
        let program = self.entry.interpreter();
        tracing::debug!(
            interpreter = %program.display(),
            script = %self.entry.script().display(),
            argc = args.len(),
            "invoking entry script"
        );

        let child = tokio::process::Command::new(program)
            .arg(self.entry.script())
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| InvokeError::Spawn {
                program: program.display().to_string(),
                source: e,
            })?;

        let status = wait_for_exit(child)
            .await
            .map_err(|e| InvokeError::Wait { source: e })?;

        let code = exit_code_of(status);
        tracing::debug!(code, "entry script exited");
        Ok(code)
    }
}

/// Wait for `child` to exit.
///
/// Interrupts delivered to the terminal's process group reach the child
/// directly; the parent keeps waiting so the child's own exit code is what
/// gets reported.
pub(crate) async fn wait_for_exit(
    mut child: tokio::process::Child,
) -> std::io::Result<ExitStatus> {
    loop {
        tokio::select! {
            status = child.wait() => return status,
            interrupted = tokio::signal::ctrl_c() => {
                if let Err(e) = interrupted {
                    tracing::warn!("failed to listen for interrupts: {e}");
                    return child.wait().await;
                }
                tracing::debug!("interrupt received, waiting for child to exit");
            }
        }
    }
}

/// Exit code of a finished process, with signal terminations mapped to `128 + signal`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("failed to launch {program}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("failed waiting for the entry script to exit")]
    Wait { source: std::io::Error },
}

impl InvokeError {
    /// Exit code to report when the script could not be run at all.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                EXIT_NOT_FOUND
            }
            Self::Spawn { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                EXIT_NOT_EXECUTABLE
            }
            _ => 1,
        }
    }
}
