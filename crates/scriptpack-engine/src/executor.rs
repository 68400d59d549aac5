use std::ffi::OsString;
use std::process::Stdio;

use crate::engine::EngineError;
use crate::invoker::{exit_code_of, wait_for_exit};

/// Abstraction over container engine CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait EngineExecutor: Send + Sync {
    /// Execute an engine command and capture stdout.
    async fn exec(&self, args: &[String]) -> Result<String, EngineError>;

    /// Execute an engine command, streaming output to the terminal.
    async fn exec_streaming(&self, args: &[String]) -> Result<(), EngineError>;

    /// Execute an engine command with inherited stdio and return its exit
    /// code untranslated.
    async fn exec_passthrough(&self, args: &[OsString]) -> Result<i32, EngineError>;
}

/// Real engine CLI executor.
pub struct RealExecutor {
    binary: String,
}

impl RealExecutor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> tokio::process::Command {
        tokio::process::Command::new(&self.binary)
    }

    fn not_found(&self, source: std::io::Error) -> EngineError {
        EngineError::NotFound {
            binary: self.binary.clone(),
            source,
        }
    }
}

impl Default for RealExecutor {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl EngineExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, EngineError> {
        tracing::debug!(binary = %self.binary, ?args, "exec");

        let output = self
            .command()
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.not_found(e))?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| EngineError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(EngineError::CommandFailed {
                args: args.to_vec(),
                stderr,
            })
        }
    }

    async fn exec_streaming(&self, args: &[String]) -> Result<(), EngineError> {
        tracing::debug!(binary = %self.binary, ?args, "exec (streaming)");

        let status = self
            .command()
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.not_found(e))?;

        if status.success() {
            Ok(())
        } else {
            Err(EngineError::Exited {
                args: args.to_vec(),
                code: exit_code_of(status),
            })
        }
    }

    async fn exec_passthrough(&self, args: &[OsString]) -> Result<i32, EngineError> {
        tracing::debug!(binary = %self.binary, ?args, "exec (passthrough)");

        let child = self
            .command()
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| self.not_found(e))?;

        let status = wait_for_exit(child)
            .await
            .map_err(|e| EngineError::Wait { source: e })?;

        Ok(exit_code_of(status))
    }
}
