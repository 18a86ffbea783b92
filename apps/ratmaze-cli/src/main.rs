use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use ratmaze_input::{Action, InputMap, InputState};
use ratmaze_kernel::{GameConfig, GameEvent, GameSession, MazeGrid, SeededRandom};
use ratmaze_render::{AsciiRenderer, CameraRig, RecordingSink, Renderer, SceneBuilder, ViewMode};
use ratmaze_tools::{Autopilot, MazeInspector};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ratmaze-cli", about = "Generate, validate and simulate rat mazes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML game configuration; missing fields use defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Maze width in cells
    #[arg(long, global = true)]
    width: Option<i64>,

    /// Maze height in cells
    #[arg(long, global = true)]
    height: Option<i64>,

    /// RNG seed
    #[arg(short, long, global = true)]
    seed: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Generate a maze and print it
    Generate {
        /// Emit the maze as JSON instead of a map
        #[arg(long)]
        json: bool,
    },
    /// Generate mazes over a range of seeds and check their topology
    Validate {
        /// Number of consecutive seeds to check
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,
    },
    /// Let the autopilot collect every cheese and escape
    Simulate {
        /// Tick budget
        #[arg(short, long, default_value = "20000")]
        ticks: u64,
        /// Seconds per tick
        #[arg(long, default_value = "0.016")]
        dt: f64,
        /// Camera used for the final frame
        #[arg(long, value_enum, default_value = "top")]
        view: ViewArg,
        /// Print the map every N ticks (0 disables)
        #[arg(long, default_value = "0")]
        render_every: u64,
    },
    /// Drive the rat from a key script: one line per hold, e.g. `KeyW KeyA x30`
    Drive {
        /// Script file; stdin when omitted
        script: Option<PathBuf>,
        /// Extra bindings as `key=action`
        #[arg(short, long)]
        bind: Vec<String>,
        /// Seconds per tick
        #[arg(long, default_value = "0.016")]
        dt: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Top,
    Observation,
    Rat,
}

impl From<ViewArg> for ViewMode {
    fn from(v: ViewArg) -> Self {
        match v {
            ViewArg::Top => ViewMode::Top,
            ViewArg::Observation => ViewMode::Observation,
            ViewArg::Rat => ViewMode::Rat,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(w) = cli.width {
        config.width = w;
    }
    if let Some(h) = cli.height {
        config.height = h;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;
    Ok(config)
}

fn print_events(session: &mut GameSession) {
    for event in session.drain_events() {
        match event {
            GameEvent::CollectiblePicked { index, cell, tick } => {
                println!("[tick {tick}] cheese #{index} collected at {cell}")
            }
            GameEvent::PortalActivated { tick } => println!("[tick {tick}] exit portal open"),
            GameEvent::Escaped { tick } => println!("[tick {tick}] escaped!"),
        }
    }
}

fn render(session: &GameSession, view: ViewMode) -> String {
    let camera = CameraRig::new(view).camera(session);
    AsciiRenderer::new().render(session, &camera)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Info => {
            println!("ratmaze-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", ratmaze_common::crate_info());
            println!("kernel: {}", ratmaze_kernel::crate_info());
            println!("input: {}", ratmaze_input::crate_info());
            println!("render: {}", ratmaze_render::crate_info());
            println!("tools: {}", ratmaze_tools::crate_info());
            println!(
                "config: {}x{} seed={:?} cheese<={}",
                config.width, config.height, config.seed, config.max_collectibles
            );
        }
        Commands::Generate { json } => {
            let session = GameSession::new(config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(session.maze())?);
            } else {
                print!("{}", render(&session, ViewMode::Top));
                println!("{}", MazeInspector::report(session.maze()));
            }
        }
        Commands::Validate { count } => {
            let base = config.seed.unwrap_or(0);
            let mut failures = 0;
            for offset in 0..count {
                let seed = base.wrapping_add(offset);
                let maze = MazeGrid::generate(config.width, config.height, &mut SeededRandom::new(seed))?;
                if let Err(e) = MazeInspector::validate(&maze) {
                    failures += 1;
                    println!("seed {seed}: {e}");
                }
            }
            println!(
                "Checked {count} mazes of {}x{}: {} valid, {failures} invalid",
                config.width,
                config.height,
                count - failures
            );
            if failures > 0 {
                bail!("{failures} invalid mazes");
            }
        }
        Commands::Simulate {
            ticks,
            dt,
            view,
            render_every,
        } => {
            let mut session = GameSession::new(config)?;
            let mut pilot = Autopilot::new();
            println!("{}", MazeInspector::summary(&session));
            while session.tick() < ticks && !session.is_complete() {
                let intent = pilot.intent(&session);
                session.step(intent, dt);
                print_events(&mut session);
                if render_every > 0 && session.tick() % render_every == 0 {
                    print!("{}", render(&session, ViewMode::Top));
                }
            }
            let view = ViewMode::from(view);
            let mut sink = RecordingSink::default();
            let stats = SceneBuilder::new(view)
                .with_performance_mode(true)
                .build(&session, &mut sink);
            print!("{}", render(&session, view));
            println!("{}", MazeInspector::summary(&session));
            println!(
                "Scene: cells={} lines={} quads={} props={} replans={}",
                stats.cells,
                stats.lines,
                stats.quads,
                stats.props,
                pilot.replans()
            );
            if !session.is_complete() {
                bail!("rat did not escape within {ticks} ticks");
            }
        }
        Commands::Drive { script, bind, dt } => {
            let mut map = InputMap::default();
            for spec in &bind {
                map.bind_spec(spec)
                    .with_context(|| format!("binding '{spec}'"))?;
            }
            let mut input = InputState::new(map);
            let mut session = GameSession::new(config)?;
            let mut view = ViewMode::Top;

            let reader: Box<dyn BufRead> = match &script {
                Some(path) => Box::new(std::io::BufReader::new(
                    std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
                )),
                None => Box::new(std::io::stdin().lock()),
            };
            for (number, line) in reader.lines().enumerate() {
                let line = line?;
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let mut repeat = 1u64;
                let mut keys = Vec::new();
                for word in line.split_whitespace() {
                    match word.strip_prefix('x').map(str::parse::<u64>) {
                        Some(Ok(n)) => repeat = n,
                        _ => keys.push(word),
                    }
                }
                for key in &keys {
                    match input.key_down(key) {
                        Some(Action::TopView) => view = ViewMode::Top,
                        Some(Action::ObservationView) => view = ViewMode::Observation,
                        Some(Action::RatView) => view = ViewMode::Rat,
                        Some(_) => {}
                        None => tracing::warn!(line = number + 1, key, "unbound key"),
                    }
                }
                for _ in 0..repeat {
                    session.step(input.intent(), dt);
                }
                for key in &keys {
                    input.key_up(key);
                }
                print_events(&mut session);
                if session.is_complete() {
                    break;
                }
            }
            print!("{}", render(&session, view));
            println!("{}", MazeInspector::summary(&session));
        }
    }

    Ok(())
}
