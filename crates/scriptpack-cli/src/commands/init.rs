use scriptpack_core::{CONFIG_FILE, ScriptpackConfig};
use std::path::Path;

/// Initialize scriptpack in an existing script project.
pub async fn init_project(project_dir: &Path) -> anyhow::Result<()> {
    let mut created = Vec::new();

    // scriptpack.toml
    let config_path = project_dir.join(CONFIG_FILE);
    if config_path.exists() {
        eprintln!("{CONFIG_FILE} already exists, skipping");
    } else {
        std::fs::write(&config_path, super::SCRIPTPACK_TOML_TEMPLATE)?;
        created.push(CONFIG_FILE.to_owned());
    }

    // Dependency manifest, under whatever name the config declares
    let manifest = ScriptpackConfig::load(project_dir)?.entrypoint.manifest;
    let manifest_path = project_dir.join(&manifest);
    if manifest_path.exists() {
        eprintln!("{manifest} already exists, skipping");
    } else {
        if let Some(parent) = manifest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&manifest_path, "# One requirement per line, e.g.\n# requests==2.31.0\n")?;
        created.push(manifest.clone());
    }

    if created.is_empty() {
        println!("Nothing to create; already initialized.");
    } else {
        for f in &created {
            println!("Created {f}");
        }
    }

    println!();
    println!("Next steps:");
    println!();
    println!("  1. Declare dependencies in {manifest}");
    println!("  2. Check them:          scriptpack lint");
    println!("  3. Build the image:     scriptpack build");
    println!("  4. Run it:              scriptpack run -- --help");

    Ok(())
}
