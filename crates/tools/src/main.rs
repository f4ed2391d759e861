use std::fs::{self, File};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use formats::{decode_grid_json, read_grid_csv};
use foundation::math::Vec2;
use gpu::{DrawFrame, RenderBackend};
use serde::Serialize;
use streaming::cache::GridData;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viewer::{TooltipState, Viewer, ViewerOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and pick gridded point data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Grid file (.csv, or .json array of records)
    grid: PathBuf,

    /// Viewer options as JSON
    #[arg(long)]
    options: Option<PathBuf>,

    /// Cell size in data units; overrides the options file
    #[arg(long)]
    resolution: Option<f64>,

    /// Field used for coloring; overrides the options file
    #[arg(long)]
    color_field: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a grid and print a summary of the initial view
    Inspect {
        #[command(flatten)]
        grid: GridArgs,
    },

    /// Load a grid, click at a pixel and print the tooltip
    Pick {
        #[command(flatten)]
        grid: GridArgs,

        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,

        /// Region id service; when set, the NUTS/LAU lookup URLs are listed
        #[arg(long)]
        lookup_base: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    cells: usize,
    fields: Vec<String>,
    resolution: f64,
    bounds: Option<[[f64; 2]; 2]>,
    color_field: String,
    color_domain: Vec<f64>,
    camera: [f64; 3],
    transform: [f64; 3],
    scale: f64,
    frames_drawn: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PickReport {
    tooltip: TooltipState,
    highlight: Option<usize>,
    lookups: Vec<String>,
}

/// Backend that only counts frames and the points they carried.
#[derive(Default)]
struct CountingBackend {
    frames: usize,
    points: usize,
}

impl RenderBackend for CountingBackend {
    fn draw(&mut self, frame: &DrawFrame<'_>) {
        self.frames += 1;
        self.points = frame.buffers.len();
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { grid } => {
            let mut viewer = open(&grid)?;
            let summary = summarize(&mut viewer)?;
            print_json(&summary)
        }
        Command::Pick {
            grid,
            x,
            y,
            lookup_base,
        } => {
            let mut viewer = open(&grid)?;
            let tooltip = viewer.click(x, y).clone();
            let lookups = match (tooltip.tooltip(), lookup_base.as_deref()) {
                (Some(t), Some(base)) => t.secondary_lookups(base).map_err(|e| e.to_string())?,
                _ => Vec::new(),
            };
            print_json(&PickReport {
                tooltip,
                highlight: viewer.highlight().map(|h| h.index),
                lookups,
            })
        }
    }
}

fn open(args: &GridArgs) -> Result<Viewer, String> {
    let mut options = match &args.options {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            ViewerOptions::from_json(&json).map_err(|e| e.to_string())?
        }
        None => ViewerOptions::default(),
    };
    if let Some(field) = &args.color_field {
        options.color_field = field.clone();
    }
    if let Some(r) = args.resolution {
        options.resolution = Some(r);
    }
    let resolution = options
        .resolution
        .ok_or("a resolution is required (--resolution or options file)")?;
    let config = options.validate().map_err(|e| e.to_string())?;

    let data = read_grid(&args.grid)?;
    info!(path = %args.grid.display(), rows = data.len(), resolution, "grid decoded");

    let mut viewer = Viewer::new(config);
    viewer.load(resolution, data).map_err(|e| e.to_string())?;
    Ok(viewer)
}

fn read_grid(path: &Path) -> Result<GridData, String> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let decoded = if is_json {
        File::open(path)
            .map_err(|e| format!("failed to open {}: {e}", path.display()))
            .and_then(|f| decode_grid_json(f).map_err(|e| e.to_string()))
    } else {
        read_grid_csv(path).map_err(|e| e.to_string())
    };
    decoded.map_err(|e| format!("{}: {e}", path.display()))
}

fn summarize(viewer: &mut Viewer) -> Result<Summary, String> {
    let mut backend = CountingBackend::default();
    viewer.render(&mut backend);

    let layer = viewer.active_layer().ok_or("no grid is active")?;
    let space = layer.space;
    let bounds = layer.bounds().map(|b| {
        let min = space.to_external(Vec2::new(b.min[0], b.min[1]));
        let max = space.to_external(Vec2::new(b.max[0], b.max[1]));
        [[min.x, min.y], [max.x, max.y]]
    });
    let camera = viewer.camera().position;
    let t = viewer.transform();
    info!(points = backend.points, "frame drawn");

    Ok(Summary {
        cells: layer.len(),
        fields: layer.fields.clone(),
        resolution: layer.source_resolution,
        bounds,
        color_field: viewer.scale_config().color_field.clone(),
        color_domain: viewer
            .scales()
            .map(|s| s.color.domain())
            .unwrap_or_default(),
        camera: [camera.x, camera.y, camera.z],
        transform: [t.x, t.y, t.k],
        scale: viewer.controller().scale(),
        frames_drawn: backend.frames,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let out = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}
