//! propack CLI
//!
//! Build resource pack projects and inspect built archives.

use clap::{Parser, Subcommand};
use propack::{load_resources, Builder, LocalHosting, Project};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "propack")]
#[command(author, version, about = "Build Minecraft resource packs with stable custom model data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a project
    Build {
        /// Project name; the project is read from <DIR>/<NAME>/project.json
        name: String,

        /// Directory holding the projects
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Copy the archive into this directory after packaging
        #[arg(long, requires = "base_url")]
        host_dir: Option<PathBuf>,

        /// Base URL the host directory is served from
        #[arg(long, requires = "host_dir")]
        base_url: Option<String>,
    },

    /// Show what a built archive declares
    Info {
        /// Path to a .propack archive
        archive: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Build {
            name,
            dir,
            host_dir,
            base_url,
        } => build(&name, &dir, host_dir.zip(base_url)),
        Commands::Info { archive } => show_info(&archive),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn build(
    name: &str,
    dir: &PathBuf,
    hosting: Option<(PathBuf, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = Project::load(dir.join(name))?;
    let hosting = hosting.map(|(directory, base_url)| LocalHosting::new(directory, base_url));

    let mut builder = Builder::new(&project);
    if let Some(hosting) = &hosting {
        builder = builder.with_hosting(hosting);
    }
    let built = builder.build()?;

    if let (Some(archive), Some(digest)) = (&built.archive, &built.digest) {
        println!("{} ({})", archive.display(), digest);
    }
    if let Some(uploaded) = &built.uploaded {
        println!("Uploaded to {}", uploaded.url);
    }
    Ok(())
}

fn show_info(archive: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let resources = load_resources(archive)?;
    let assets = resources.assets();

    println!("Resource pack '{}'", resources.name());
    println!("  Pack format: {}", resources.pack_format());
    println!("  Item models: {}", assets.item_models().len());
    println!("  Sounds: {}", assets.sounds().len());
    println!("  Armor textures: {}", assets.armor_textures().len());
    println!("  Fonts: {}", assets.fonts().len());

    let mapping = resources.mesh_mapping();
    println!("  Mapped meshes: {}", mapping.len());
    for entry in mapping.entries() {
        println!("    {} {} -> {}", entry.item, entry.id, entry.mesh);
    }
    Ok(())
}
