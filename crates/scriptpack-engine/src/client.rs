use std::ffi::OsString;
use std::path::Path;

use crate::engine::EngineError;
use crate::executor::{EngineExecutor, RealExecutor};
use scriptpack_core::ProvisionPlan;

/// Container engine operations, parameterized over the executor for testability.
pub struct EngineClient<E: EngineExecutor = RealExecutor> {
    executor: E,
}

impl EngineClient<RealExecutor> {
    pub fn new(binary: &str) -> Self {
        Self {
            executor: RealExecutor::new(binary),
        }
    }
}

impl Default for EngineClient<RealExecutor> {
    fn default() -> Self {
        Self {
            executor: RealExecutor::default(),
        }
    }
}

impl<E: EngineExecutor> EngineClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Doctor ──

    /// Check that the engine CLI is installed and its daemon reachable.
    pub async fn check_engine(&self) -> CheckResult {
        match self
            .executor
            .exec(&args(["version", "--format", "{{.Server.Version}}"]))
            .await
        {
            Ok(v) if !v.trim().is_empty() => CheckResult::ok(v.trim()),
            Ok(_) => CheckResult::fail("engine reported no server version"),
            Err(EngineError::NotFound { binary, .. }) => {
                CheckResult::fail(&format!("'{binary}' not found"))
            }
            Err(e) => CheckResult::fail(&first_line(&e.to_string())),
        }
    }

    // ── Build ──

    /// Build and tag an image from an assembled context directory.
    ///
    /// Output is streamed to the terminal. A failing build step makes the
    /// engine exit non-zero, which is surfaced as [`BuildError::Failed`];
    /// the engine does not tag an image in that case.
    pub async fn build_image(&self, context_dir: &Path, image_ref: &str) -> Result<(), BuildError> {
        let context = context_dir
            .to_str()
            .ok_or_else(|| BuildError::InvalidPath(context_dir.to_path_buf()))?;

        self.executor
            .exec_streaming(&args(["build", "--tag", image_ref, context]))
            .await
            .map_err(|e| match e {
                EngineError::Exited { code, .. } => BuildError::Failed {
                    image: image_ref.to_owned(),
                    code,
                },
                other => BuildError::Engine { source: other },
            })
    }

    /// Whether `image_ref` exists locally.
    ///
    /// Only a failing inspect means "absent"; a missing or unreachable
    /// engine is an error.
    pub async fn image_exists(&self, image_ref: &str) -> Result<bool, EngineError> {
        match self
            .executor
            .exec(&args(["image", "inspect", "--format", "{{.Id}}", image_ref]))
            .await
        {
            Ok(_) => Ok(true),
            Err(EngineError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ── Run ──

    /// Run the packaged image once, forwarding `script_args` verbatim after the
    /// image reference, and return the container's exit code.
    pub async fn run_image(
        &self,
        image_ref: &str,
        script_args: &[OsString],
    ) -> Result<i32, EngineError> {
        let mut run_args: Vec<OsString> = ["run", "--rm", "-i", image_ref]
            .iter()
            .map(OsString::from)
            .collect();
        run_args.extend(script_args.iter().cloned());

        self.executor.exec_passthrough(&run_args).await
    }

    // ── Verify ──

    /// Entrypoint recorded in the image configuration.
    pub async fn inspect_entrypoint(&self, image_ref: &str) -> Result<Vec<String>, VerifyError> {
        let output = self
            .executor
            .exec(&args([
                "image",
                "inspect",
                "--format",
                "{{json .Config.Entrypoint}}",
                image_ref,
            ]))
            .await
            .map_err(|e| VerifyError::Inspect {
                image: image_ref.to_owned(),
                source: e,
            })?;

        let entrypoint: Option<Vec<String>> =
            serde_json::from_str(output.trim()).map_err(|e| VerifyError::Decode {
                output: output.trim().to_owned(),
                source: e,
            })?;

        Ok(entrypoint.unwrap_or_default())
    }

    /// Whether `command --version` runs inside the image.
    pub async fn has_command(&self, image_ref: &str, command: &str) -> Result<bool, VerifyError> {
        match self
            .executor
            .exec(&args([
                "run",
                "--rm",
                "--entrypoint",
                command,
                image_ref,
                "--version",
            ]))
            .await
        {
            Ok(_) => Ok(true),
            Err(EngineError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(VerifyError::Probe {
                image: image_ref.to_owned(),
                source: e,
            }),
        }
    }

    /// Check a built image against the plan it was built from.
    pub async fn verify(
        &self,
        image_ref: &str,
        plan: &ProvisionPlan,
    ) -> Result<VerifyReport, VerifyError> {
        let recorded = self.inspect_entrypoint(image_ref).await?;
        let entrypoint = if plan.entrypoint.matches(&recorded) {
            CheckResult::ok(&plan.entrypoint.exec_form())
        } else {
            CheckResult::fail(&format!(
                "expected {}, found {recorded:?}",
                plan.entrypoint.exec_form()
            ))
        };

        let present = self.has_command(image_ref, &plan.vcs_command).await?;
        let vcs_client = match (plan.install_vcs_client, present) {
            (true, true) => CheckResult::ok(&format!("{} installed", plan.vcs_command)),
            (false, false) => CheckResult::ok(&format!("{} absent", plan.vcs_command)),
            (true, false) => CheckResult::fail(&format!(
                "{} expected but not found on PATH",
                plan.vcs_command
            )),
            (false, true) => CheckResult::fail(&format!(
                "{} present although install_vcs_client is disabled",
                plan.vcs_command
            )),
        };

        Ok(VerifyReport {
            entrypoint,
            vcs_client,
        })
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

fn first_line(s: &str) -> String {
    s.lines().next().unwrap_or(s).to_owned()
}

// ── Report types ──

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub engine: CheckResult,
    pub config_file: CheckResult,
    pub manifest: CheckResult,
    pub script: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.engine.passed && self.config_file.passed && self.manifest.passed && self.script.passed
    }
}

impl std::fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows = [
            ("Engine", &self.engine),
            ("Config", &self.config_file),
            ("Manifest", &self.manifest),
            ("Script", &self.script),
        ];
        for (label, check) in rows {
            writeln!(f, "  [{}] {label:<10} {}", check.icon(), check.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct VerifyReport {
    pub entrypoint: CheckResult,
    pub vcs_client: CheckResult,
}

impl VerifyReport {
    pub fn all_passed(&self) -> bool {
        self.entrypoint.passed && self.vcs_client.passed
    }
}

impl std::fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "  [{}] {:<10} {}",
            self.entrypoint.icon(),
            "Entrypoint",
            self.entrypoint.detail
        )?;
        writeln!(
            f,
            "  [{}] {:<10} {}",
            self.vcs_client.icon(),
            "VCS client",
            self.vcs_client.detail
        )
    }
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build context path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),

    #[error("image build for {image} failed with exit code {code}; no image was tagged")]
    Failed { image: String, code: i32 },

    #[error("image build could not be started")]
    Engine { source: EngineError },
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("failed to inspect image {image}")]
    Inspect { image: String, source: EngineError },

    #[error("unexpected entrypoint format: {output}")]
    Decode {
        output: String,
        source: serde_json::Error,
    },

    #[error("failed to probe image {image}")]
    Probe { image: String, source: EngineError },
}
