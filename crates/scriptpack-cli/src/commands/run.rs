use scriptpack_core::ScriptpackConfig;
use scriptpack_engine::EngineClient;
use std::ffi::OsString;
use std::path::Path;

/// Run the built image once and return the container's exit code.
pub async fn run(
    project_dir: &Path,
    tag: Option<String>,
    args: &[OsString],
) -> anyhow::Result<i32> {
    let config = ScriptpackConfig::load(project_dir)?;
    let image_ref = tag.unwrap_or_else(|| config.image_ref(project_dir));

    let client = EngineClient::new(&config.engine.binary);
    let code = client.run_image(&image_ref, args).await?;
    Ok(code)
}
