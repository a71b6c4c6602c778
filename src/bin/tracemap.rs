use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tracemap", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a track over map tiles per the project configuration.
    Render(RenderArgs),
    /// Print a default project configuration as JSON.
    ExampleConfig,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Project configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Track JSON file(s), each sorted by time; repeat to merge sources.
    #[arg(long = "track", required = true)]
    tracks: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::ExampleConfig => {
            println!(
                "{}",
                serde_json::to_string_pretty(&tracemap::RenderConfig::default())?
            );
            Ok(())
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = read_config(&args.config)?;

    let mut sources = Vec::with_capacity(args.tracks.len());
    for path in &args.tracks {
        let mut points = read_track(path)?;
        // Each source must be individually sorted for the streaming merge.
        points.sort_by_key(tracemap::Position::time);
        eprintln!("loaded {} points from {}", points.len(), path.display());
        sources.push(points);
    }

    let points: Vec<_> =
        tracemap::merge_all(sources, |a, b| a.time() < b.time()).collect();

    let stats = tracemap::render_track(points, &config)?;
    eprintln!(
        "rendered {} points, {} frames, {:.1} km",
        stats.point_count,
        stats.frames_written,
        stats.total_distance_meters / 1000.0
    );
    Ok(())
}

fn read_config(path: &Path) -> anyhow::Result<tracemap::RenderConfig> {
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let config: tracemap::RenderConfig =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse config JSON")?;
    Ok(config)
}

fn read_track(path: &Path) -> anyhow::Result<Vec<tracemap::Position>> {
    let f = File::open(path).with_context(|| format!("open track '{}'", path.display()))?;
    let points: Vec<tracemap::TrackPoint> = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse track JSON '{}'", path.display()))?;
    Ok(points
        .into_iter()
        .map(tracemap::TrackPoint::into_position)
        .collect())
}
