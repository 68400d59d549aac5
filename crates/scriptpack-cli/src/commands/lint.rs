use scriptpack_core::{DependencyManifest, ProvisionPlan, ScriptpackConfig};
use std::path::Path;

/// Parse the dependency manifest and report what would be installed.
pub async fn lint(project_dir: &Path) -> anyhow::Result<()> {
    let config = ScriptpackConfig::load(project_dir)?;
    let manifest = DependencyManifest::load(&project_dir.join(&config.entrypoint.manifest))?;

    println!(
        "{}: {} requirement(s), {} installer option(s)",
        config.entrypoint.manifest,
        manifest.requirements.len(),
        manifest.options.len()
    );
    for req in &manifest.requirements {
        let constraint = req.constraint.as_deref().unwrap_or("(any)");
        if req.extras.is_empty() {
            println!("  {} {constraint}", req.name);
        } else {
            println!("  {}[{}] {constraint}", req.name, req.extras.join(","));
        }
    }

    for warning in manifest.warnings() {
        eprintln!("warning: {warning}");
    }
    for path in ProvisionPlan::from_config(&config).undeclared_manifest_inputs(&manifest) {
        eprintln!("warning: {path} is not listed in [entrypoint].manifest_inputs");
    }

    Ok(())
}
