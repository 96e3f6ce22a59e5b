use anyhow::Context;
use clap::Parser;
use log::{debug, info};
use sdf_scene::{render_frame, Config, Scene};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with `render` and `scene` sections.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Render a single frame at this time in milliseconds.
    #[arg(short, long)]
    time: Option<f64>,

    /// Number of frames to render.
    #[arg(short = 'n', long)]
    frames: Option<u64>,

    #[arg(long)]
    start_frame: Option<u64>,

    #[arg(long)]
    fps: Option<f64>,

    #[arg(short, long)]
    antialias: Option<u32>,

    #[arg(long, default_value_t = false)]
    jitter: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        let r = &mut config.render;
        if let Some(width) = self.width {
            r.width = width;
        }
        if let Some(height) = self.height {
            r.height = height;
        }
        if let Some(frames) = self.frames {
            r.frames = frames;
        }
        if let Some(start_frame) = self.start_frame {
            r.start_frame = start_frame;
        }
        if let Some(fps) = self.fps {
            r.fps = fps;
        }
        if let Some(antialias) = self.antialias {
            r.antialias = antialias;
        }
        if self.jitter {
            r.jitter = true;
        }
        if let Some(seed) = self.seed {
            r.seed = seed;
        }
        if let Some(out) = &self.out {
            r.output = out.clone();
        }
        if self.time.is_some() {
            r.frames = 1;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate().context("invalid settings")?;
    debug!("{:?}", config);

    let render = &config.render;
    let scene = Scene::new(&config.scene);
    info!(
        "rendering {} frame(s) at {}x{}, {}x{} samples per pixel",
        render.frames, render.width, render.height, render.antialias, render.antialias
    );

    let start = Instant::now();
    for frame in render.start_frame..render.start_frame + render.frames {
        let t = args.time.unwrap_or_else(|| render.frame_time(frame));
        let img = render_frame(&scene, render.resolution(), t, render.sampling());
        let path = render.frame_path(frame);
        img.save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("frame {} (t={:.1}ms) -> {}", frame, t, path.display());
    }
    info!("Render took {} s", start.elapsed().as_secs_f32());
    Ok(())
}
