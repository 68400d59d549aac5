#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("container engine '{binary}' not found; install docker or set [engine].binary")]
    NotFound {
        binary: String,
        source: std::io::Error,
    },

    #[error("engine command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("engine command {args:?} exited with code {code}")]
    Exited { args: Vec<String>, code: i32 },

    #[error("failed waiting for the engine to exit")]
    Wait { source: std::io::Error },

    #[error("engine output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },
}
