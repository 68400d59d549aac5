use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::ScriptpackConfig;

/// Directory the isolated environment is created at inside the image.
pub const VENV_DIR: &str = "/opt/venv";

/// The fixed `(interpreter, script)` pair a packaged image runs on start.
///
/// Constructed once from configuration and never modified afterwards; all
/// per-run variability comes from the arguments passed to
/// [`command_line`](Self::command_line).
///
/// # Examples
///
/// ```
/// use scriptpack_core::{EntrypointDescriptor, ScriptpackConfig};
///
/// let config = ScriptpackConfig::default();
/// let entry = EntrypointDescriptor::for_image(&config);
/// assert_eq!(entry.interpreter().to_str(), Some("/opt/venv/bin/python"));
/// assert_eq!(entry.script().to_str(), Some("/app/main.py"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrypointDescriptor {
    interpreter: PathBuf,
    script: PathBuf,
}

impl EntrypointDescriptor {
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }

    /// Descriptor burned into the image: the environment's interpreter and
    /// the script copied under `workdir` at its project-relative path.
    pub fn for_image(config: &ScriptpackConfig) -> Self {
        let entry = &config.entrypoint;
        let interpreter = Path::new(VENV_DIR).join("bin").join(&entry.interpreter);
        let script = Path::new(&entry.workdir).join(&entry.script);
        Self::new(interpreter, script)
    }

    /// Descriptor for running the script directly from the project directory,
    /// with the interpreter resolved from `PATH`.
    pub fn for_local(config: &ScriptpackConfig, project_dir: &Path) -> Self {
        let entry = &config.entrypoint;
        Self::new(&entry.interpreter, project_dir.join(&entry.script))
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// `[interpreter, script, args...]`, arguments appended unmodified and in order.
    pub fn command_line<I, S>(&self, args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut line = vec![
            self.interpreter.clone().into_os_string(),
            self.script.clone().into_os_string(),
        ];
        line.extend(args.into_iter().map(Into::into));
        line
    }

    /// JSON array for an `ENTRYPOINT` instruction in exec form.
    pub fn exec_form(&self) -> String {
        serde_json::json!([
            self.interpreter.to_string_lossy(),
            self.script.to_string_lossy(),
        ])
        .to_string()
    }

    /// Whether an image's recorded entrypoint matches this descriptor.
    pub fn matches(&self, entrypoint: &[String]) -> bool {
        matches!(
            entrypoint,
            [interpreter, script]
                if Path::new(interpreter) == self.interpreter.as_path()
                    && Path::new(script) == self.script.as_path()
        )
    }
}
