use scriptpack_core::{EntrypointDescriptor, ScriptpackConfig};
use scriptpack_engine::EntryInvoker;
use std::ffi::OsString;
use std::path::Path;

/// Run the script locally, the way the image's entrypoint would, and
/// return its exit code.
pub async fn exec(project_dir: &Path, args: &[OsString]) -> anyhow::Result<i32> {
    let config = ScriptpackConfig::load(project_dir)?;
    let entry = EntrypointDescriptor::for_local(&config, project_dir);

    match EntryInvoker::new(&entry).invoke(args).await {
        Ok(code) => Ok(code),
        Err(e) => {
            let code = e.exit_code();
            eprintln!("Error: {:#}", anyhow::Error::from(e));
            Ok(code)
        }
    }
}
