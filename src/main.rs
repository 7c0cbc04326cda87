//! Replays scripted mesh-change scenes through the classification runtime.

mod scenario;

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use scenario::Scene;

#[derive(Parser, Debug)]
#[command(name = "scanmesh")]
#[command(about = "Replays a mesh-change scene and reports the class submeshes it produces")]
struct Args {
    /// Scene script (TOML).
    #[arg(short, long)]
    scene: PathBuf,

    /// Log filter, e.g. `debug` or `mesh_events=trace`. RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str()))
        .init();

    log::info!("loading scene {}", args.scene.display());
    let scene = Scene::from_path(&args.scene)?;
    log::info!(
        "{} meshes, {} notifications, {} class templates",
        scene.meshes.len(),
        scene.steps.len(),
        scene.templates.configured_count()
    );

    let mut replay = scene.replay();
    replay.print_summary();
    let released = replay.runtime.shutdown();
    log::debug!("shutdown released {} meshes", released);
    Ok(())
}
