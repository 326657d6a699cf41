use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use karel_app::{
    Pager, RunReport, RunSummary, help_text, latest, load_config, load_script, load_world,
};
use karel_core::{
    BeeperBag, Direction, EdgePolicy, Karel, KarelConfig, Position, Preset, World, WorldSource,
};
use karel_render::{
    AsciiRenderer, DEFAULT_CELL_PX, MAX_CELL_PX, MIN_CELL_PX, PngRenderer, render_world,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "karel",
    version,
    about = "Run Karel command scripts on a grid world",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a command script and show the recorded frames.
    Run(RunArgs),
    /// List every command and condition.
    Help,
    /// List the world presets with a preview.
    Presets,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Script file, one command per line.
    script: PathBuf,
    /// JSON configuration file; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Preset name (unknown names use the default grid).
    #[arg(long, conflicts_with = "world_file")]
    world: Option<String>,
    /// Text grid file: `.` open, `#` wall, digits for beepers, top row first.
    #[arg(long)]
    world_file: Option<PathBuf>,
    /// Starting column.
    #[arg(long)]
    x: Option<u32>,
    /// Starting row (row 0 is the bottom).
    #[arg(long)]
    y: Option<u32>,
    /// Starting direction (east, north, west, south).
    #[arg(long, value_parser = parse_direction)]
    facing: Option<Direction>,
    /// Carry a finite number of beepers instead of an unlimited supply.
    #[arg(long)]
    beepers: Option<u32>,
    /// Make the front sensor report the far edges too.
    #[arg(long)]
    strict_edges: bool,
    /// Maximum number of frames kept.
    #[arg(long, conflicts_with = "unbounded_history")]
    history: Option<usize>,
    /// Keep every frame.
    #[arg(long)]
    unbounded_history: bool,
    /// Frames per page.
    #[arg(long, default_value_t = 10)]
    page_size: usize,
    /// Page to show (clamped to the last page).
    #[arg(long)]
    page: Option<usize>,
    /// Only show the last frame.
    #[arg(long)]
    last: bool,
    /// Render PNG frames into this directory instead of text.
    #[arg(long)]
    png_dir: Option<PathBuf>,
    /// PNG cell size in pixels.
    #[arg(
        long,
        default_value_t = DEFAULT_CELL_PX,
        value_parser = clap::value_parser!(u32).range(i64::from(MIN_CELL_PX)..=i64::from(MAX_CELL_PX))
    )]
    cell_px: u32,
    /// Print a JSON summary instead of text frames.
    #[arg(long, conflicts_with = "png_dir")]
    json: bool,
}

fn parse_direction(value: &str) -> Result<Direction, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(&args),
        Command::Help => {
            print!("{}", help_text());
            Ok(())
        }
        Command::Presets => {
            for preset in Preset::ALL {
                let world = World::preset(preset);
                println!(
                    "{} ({}) {}x{}",
                    preset.name(),
                    preset.alias(),
                    world.width(),
                    world.height()
                );
                println!("{}", render_world(&world));
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_config(args: &RunArgs) -> Result<KarelConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => KarelConfig::default(),
    };
    if let Some(path) = &args.world_file {
        config.world = WorldSource::Custom(load_world(path)?);
    } else if let Some(name) = &args.world {
        config.world = WorldSource::Preset(name.clone());
    }
    if let Some(x) = args.x {
        config.start.x = x;
    }
    if let Some(y) = args.y {
        config.start.y = y;
    }
    if let Some(facing) = args.facing {
        config.facing = facing;
    }
    if let Some(count) = args.beepers {
        config.bag = BeeperBag::Counted(count);
    }
    if args.strict_edges {
        config.edge_policy = EdgePolicy::Strict;
    }
    if args.unbounded_history {
        config.history_capacity = None;
    } else if let Some(capacity) = args.history {
        config.history_capacity = Some(capacity);
    }
    config.validate().context("invalid run configuration")?;
    Ok(config)
}

fn run(args: &RunArgs) -> Result<()> {
    let script = load_script(&args.script)?;
    let config = build_config(args)?;
    if script.is_empty() {
        warn!(script = %args.script.display(), "script has no commands");
    }

    match &args.png_dir {
        Some(dir) => {
            let mut karel = Karel::new(config, PngRenderer::new(args.cell_px))
                .context("failed to place Karel")?;
            let report = script.run(&mut karel);
            write_png_frames(&karel, dir)?;
            print_queries(&report);
            finish(&report, karel.position(), karel.direction())
        }
        None => {
            let mut karel =
                Karel::new(config, AsciiRenderer).context("failed to place Karel")?;
            let report = script.run(&mut karel);
            if args.json {
                let summary = RunSummary::collect(&karel, &report, String::clone);
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_queries(&report);
                print_frames(&karel, args);
            }
            finish(&report, karel.position(), karel.direction())
        }
    }
}

fn print_queries(report: &RunReport) {
    for record in &report.queries {
        println!("line {}: {:?} = {}", record.line, record.query, record.answer);
    }
}

fn print_frames(karel: &Karel<AsciiRenderer>, args: &RunArgs) {
    let history = karel.history();
    if args.last {
        if let Some(frame) = latest(history) {
            println!("{}\n", frame.artifact);
        }
        return;
    }
    let pager = Pager::new(args.page_size);
    let page = match args.page {
        Some(index) => pager.page(history, index),
        None => pager.last_page(history),
    };
    for frame in &page.frames {
        println!("{}\n", frame.artifact);
    }
    if page.total_pages > 1 {
        println!("page {} of {}", page.index + 1, page.total_pages);
    }
}

fn write_png_frames(karel: &Karel<PngRenderer>, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create frame directory {}", dir.display()))?;
    for frame in karel.history() {
        let path = dir.join(format!("step_{:04}.png", frame.step.0));
        fs::write(&path, &frame.artifact)
            .with_context(|| format!("failed to write frame {}", path.display()))?;
    }
    info!(
        frames = karel.history().len(),
        evicted = karel.history().evicted(),
        dir = %dir.display(),
        "wrote PNG frames"
    );
    Ok(())
}

fn finish(report: &RunReport, position: Position, direction: Direction) -> Result<()> {
    info!(
        executed = report.executed,
        position = %position,
        direction = %direction,
        "script finished"
    );
    match &report.failure {
        Some(failure) => bail!("line {}: {}", failure.line, failure.error),
        None => Ok(()),
    }
}
