use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;

#[derive(Parser, Debug)]
#[command(name = "g2dtask", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a scene and print the task the device would receive.
    Encode(EncodeArgs),
    /// Print the bandwidth reservation for a performance request.
    Estimate(EstimateArgs),
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Hardware generation selecting the format table.
    #[arg(long, value_enum, default_value_t = GenerationChoice::Gen2)]
    generation: GenerationChoice,

    /// Submit through the legacy task layout.
    #[arg(long)]
    legacy: bool,

    /// Optional HDR library JSON (layer map and coefficient sets).
    #[arg(long)]
    hdr: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct EstimateArgs {
    /// Input performance request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GenerationChoice {
    Gen1,
    Gen2,
}

#[derive(serde::Deserialize)]
struct HdrInput {
    layer_map: [u32; g2d_compose::MAX_HDR_SET],
    sets: Vec<g2d_compose::HdrCoefficientSet>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Encode(args) => cmd_encode(args),
        Command::Estimate(args) => cmd_estimate(args),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON"))
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let mut scene: g2d_compose::Scene = read_json(&args.in_path, "scene")?;

    let mut hdr = g2d_compose::HdrLibrary::new();
    if let Some(path) = &args.hdr {
        let input: HdrInput = read_json(path, "HDR library")?;
        hdr.set_coefficients(input.layer_map, input.sets)?;
    }

    let device = if args.legacy {
        g2d_compose::LoopbackDevice::with_version(0)
    } else {
        g2d_compose::LoopbackDevice::new()
    };
    let opts = g2d_compose::CompositorOpts {
        generation: match args.generation {
            GenerationChoice::Gen1 => g2d_compose::HwGeneration::Gen1,
            GenerationChoice::Gen2 => g2d_compose::HwGeneration::Gen2,
        },
        ..Default::default()
    };
    let mut compositor = g2d_compose::Compositor::new(device, opts)?;

    let mut fences = vec![None; scene.layers.len() + 1];
    compositor
        .execute(&mut scene, &hdr, &mut fences)
        .with_context(|| format!("encode '{}'", args.in_path.display()))?;

    let task = compositor
        .device()
        .last_task()
        .context("device recorded no task")?;
    println!("{}", serde_json::to_string_pretty(task)?);
    Ok(())
}

fn cmd_estimate(args: EstimateArgs) -> anyhow::Result<()> {
    let request: g2d_compose::PerformanceRequest = read_json(&args.in_path, "performance request")?;
    let data = g2d_compose::perf::estimate::estimate(&request)?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
