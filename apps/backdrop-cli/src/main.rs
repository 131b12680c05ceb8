use backdrop_common::{Euler, SurfaceSize};
use backdrop_render::{BackdropConfig, HeadlessHost, SceneRenderer};
use backdrop_render::DebugTextSurface;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "backdrop-cli", about = "Headless tool for the rotating computer backdrop")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the model summary
    Info,
    /// Run the frame loop without a GPU and dump the last frame
    Simulate {
        /// Number of frames to deliver
        #[arg(short, long, default_value = "100")]
        frames: u64,
        /// Viewport width in pixels
        #[arg(long, default_value = "800")]
        width: u32,
        /// Viewport height in pixels
        #[arg(long, default_value = "600")]
        height: u32,
        /// Resize the viewport to WxH halfway through the run
        #[arg(long, value_parser = parse_size)]
        resize: Option<SurfaceSize>,
        /// Run without a mount point
        #[arg(long)]
        detached: bool,
        /// Print a JSON report instead of the frame dump
        #[arg(long)]
        json: bool,
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn parse_size(s: &str) -> Result<SurfaceSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let height = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    Ok(SurfaceSize::new(width, height))
}

#[derive(Serialize)]
struct PartReport {
    name: String,
    position: [f32; 3],
    opacity: f32,
}

#[derive(Serialize)]
struct FrameReport {
    frames: u64,
    width: u32,
    height: u32,
    attached: bool,
    mount: Option<String>,
    aspect: f32,
    rotation: Euler,
    lights: usize,
    parts: Vec<PartReport>,
}

impl FrameReport {
    fn capture(renderer: &SceneRenderer<DebugTextSurface>) -> Self {
        let surface = renderer.surface();
        let size = surface.options().size;
        let rotation = renderer
            .computer()
            .map(|c| c.rotation())
            .unwrap_or_default();
        let parts = renderer
            .scene()
            .draw_list()
            .into_iter()
            .map(|item| PartReport {
                name: item.name.to_string(),
                position: item.world.w_axis.truncate().to_array(),
                opacity: item.material.effective_opacity(),
            })
            .collect();

        Self {
            frames: renderer.frame_count(),
            width: size.width,
            height: size.height,
            attached: renderer.is_attached(),
            mount: surface.attached_to().map(str::to_string),
            aspect: renderer.camera().aspect,
            rotation,
            lights: renderer.scene().lights().len(),
            parts,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            let model = backdrop_scene::computer_model();
            println!("backdrop-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", backdrop_render::crate_info());
            println!(
                "model: {} with {} parts at {}",
                model.name(),
                model.part_count(),
                model.position()
            );
            println!("lights: {}", backdrop_scene::lighting_rig().len());
            println!("mount: {}", backdrop_render::DEFAULT_MOUNT_ID);
        }
        Commands::Simulate {
            frames,
            width,
            height,
            resize,
            detached,
            json,
            config,
        } => {
            let config = match config {
                Some(path) => BackdropConfig::load(path)?,
                None => BackdropConfig::default(),
            };

            let mut host = HeadlessHost::new(SurfaceSize::new(width, height));
            if !detached {
                host = host.with_mount(config.mount_id.clone());
            }
            let mut renderer = SceneRenderer::initialize(&mut host, &config)?;

            let delivered = match resize {
                Some(size) => {
                    let first = host.run(&mut renderer, frames / 2)?;
                    host.set_viewport(size);
                    first + host.run(&mut renderer, frames - frames / 2)?
                }
                None => host.run(&mut renderer, frames)?,
            };
            tracing::debug!("delivered {delivered} frames");

            if json {
                let report = FrameReport::capture(&renderer);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", renderer.surface().last_frame());
            }

            renderer.destroy(&mut host);
        }
    }

    Ok(())
}
