mod commands;

use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "scriptpack",
    about = "Package a Python script and its requirements into a runnable container image"
)]
#[command(version)]
struct Cli {
    /// Project directory containing the script and scriptpack.toml
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add scriptpack to an existing script project
    Init,
    /// Parse the dependency manifest and report its requirements
    Lint,
    /// Print the generated Dockerfile
    Render {
        #[command(flatten)]
        vcs: VcsToggle,
    },
    /// Eject Dockerfile for manual customization
    Eject {
        #[command(flatten)]
        vcs: VcsToggle,
    },
    /// Build the container image
    Build {
        /// Image reference to tag (default: <name>:<tag> from scriptpack.toml)
        #[arg(long, short = 't')]
        tag: Option<String>,
        #[command(flatten)]
        vcs: VcsToggle,
    },
    /// Run the built image once, forwarding arguments to the script
    Run {
        /// Image reference to run
        #[arg(long, short = 't')]
        tag: Option<String>,
        /// Arguments passed to the script
        #[arg(last = true)]
        args: Vec<OsString>,
    },
    /// Run the script locally the way the image entrypoint does
    #[command(disable_help_flag = true)]
    Exec {
        /// Arguments passed to the script, verbatim
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
    /// Check a built image's entrypoint and installed tools
    Verify {
        /// Image reference to check
        #[arg(long, short = 't')]
        tag: Option<String>,
        #[command(flatten)]
        vcs: VcsToggle,
    },
    /// Check engine availability and project readiness
    Doctor,
}

#[derive(Args)]
struct VcsToggle {
    /// Install the version-control client in the image
    #[arg(long, overrides_with = "no_vcs_client")]
    vcs_client: bool,
    /// Do not install the version-control client
    #[arg(long, overrides_with = "vcs_client")]
    no_vcs_client: bool,
}

impl VcsToggle {
    fn resolve(&self) -> Option<bool> {
        match (self.vcs_client, self.no_vcs_client) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let dir = cli.project_dir.as_path();

    match cli.command {
        Commands::Init => commands::init_project(dir).await?,
        Commands::Lint => commands::lint(dir).await?,
        Commands::Render { vcs } => commands::render(dir, vcs.resolve()).await?,
        Commands::Eject { vcs } => commands::eject(dir, vcs.resolve()).await?,
        Commands::Build { tag, vcs } => commands::build(dir, tag, vcs.resolve()).await?,
        Commands::Run { tag, args } => {
            let code = commands::run(dir, tag, &args).await?;
            std::process::exit(code);
        }
        Commands::Exec { args } => {
            let code = commands::exec(dir, &args).await?;
            std::process::exit(code);
        }
        Commands::Verify { tag, vcs } => commands::verify(dir, tag, vcs.resolve()).await?,
        Commands::Doctor => commands::doctor(dir).await?,
    }

    Ok(())
}
