use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::event::KeyEventKind;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hidetop::app::{App, CycleRequest, Effect, FLASH_DURATION};
use hidetop::config::{self, Config, load_config, load_config_from_path};
use hidetop::event::{Event, EventHandler};
use hidetop::system::collector::SnapshotCollector;
use hidetop::ui;

#[derive(Parser)]
#[command(
    name = "hidetop",
    version,
    about = "Live terminal dashboard for CPU, memory, load, processes and GPU"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refresh rate in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Maximum number of processes listed (0 = all)
    #[arg(long)]
    process_limit: Option<usize>,

    /// Initial sort: cpu, memory, pid
    #[arg(long)]
    sort: Option<String>,

    /// Color support: auto, 256, truecolor, mono
    #[arg(long)]
    color: Option<String>,

    /// Write diagnostics to this file (filter with HIDETOP_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Collect one snapshot, print it as JSON and exit.
    #[arg(long, default_value_t = false, conflicts_with = "print_frame")]
    json: bool,

    /// Render one frame without a terminal, print it as text and exit.
    #[arg(long, default_value_t = false)]
    print_frame: bool,

    /// Frame width for --print-frame.
    #[arg(long, default_value_t = 100)]
    width: u16,

    /// Frame height for --print-frame.
    #[arg(long, default_value_t = 40)]
    height: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_tracing(path)?;
    }
    let config = load_config_for_cli(&cli);

    if cli.json {
        return print_json(&config).await;
    }
    if cli.print_frame {
        return print_frame(&config, cli.width, cli.height).await;
    }

    let mut terminal = match ratatui::try_init() {
        Ok(terminal) => terminal,
        Err(err) => {
            eprintln!("hidetop: {err}");
            std::process::exit(1);
        }
    };

    let result = run(&mut terminal, &config).await;
    ratatui::restore();
    result
}

async fn run(terminal: &mut ratatui::DefaultTerminal, config: &Config) -> Result<()> {
    let mut app = App::new(config);
    let collector = SnapshotCollector::new();
    let mut events = EventHandler::new(app.view.refresh_interval);
    info!(
        interval_ms = app.view.refresh_interval.as_millis() as u64,
        "dashboard started"
    );

    // Populate the first frame without waiting a full interval.
    spawn_cycle(&collector, app.begin_cycle(), events.sender());
    terminal.draw(|frame| ui::draw(frame, &app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        let should_draw = match event {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let action = app.map_key(key);
                if let Some(effect) = app.dispatch(action) {
                    apply_effect(effect, &collector, &events);
                }
                true
            }
            Event::Resize => true,
            Event::Tick => {
                spawn_cycle(&collector, app.begin_cycle(), events.sender());
                false
            }
            Event::Collected { seq, snapshot } => app.apply_snapshot(seq, *snapshot),
            Event::FlashExpired(generation) => app.clear_interval_flash(generation),
        };
        if should_draw {
            terminal.draw(|frame| ui::draw(frame, &app))?;
        }
    }

    info!("dashboard stopped");
    Ok(())
}

fn apply_effect(effect: Effect, collector: &SnapshotCollector, events: &EventHandler) {
    match effect {
        Effect::Collect(request) => spawn_cycle(collector, request, events.sender()),
        Effect::Retime { interval, flash } => {
            events.set_tick_rate(interval);
            let tx = events.sender();
            tokio::spawn(async move {
                tokio::time::sleep(FLASH_DURATION).await;
                let _ = tx.send(Event::FlashExpired(flash));
            });
        }
    }
}

/// Runs one collection cycle off the loop and reports back with its number.
fn spawn_cycle(collector: &SnapshotCollector, request: CycleRequest, tx: UnboundedSender<Event>) {
    let collector = collector.clone();
    tokio::spawn(async move {
        let snapshot = collector.collect(request.params).await;
        let _ = tx.send(Event::Collected {
            seq: request.seq,
            snapshot: Box::new(snapshot),
        });
    });
}

async fn collect_once(app: &mut App) {
    let collector = SnapshotCollector::new();
    // Process CPU usage needs an earlier sample to diff against.
    collector.collect(app.cycle_params()).await;
    let request = app.begin_cycle();
    let snapshot = collector.collect(request.params).await;
    app.apply_snapshot(request.seq, snapshot);
}

async fn print_json(config: &Config) -> Result<()> {
    let mut app = App::new(config);
    collect_once(&mut app).await;
    println!("{}", serde_json::to_string_pretty(&app.snapshot)?);
    Ok(())
}

async fn print_frame(config: &Config, width: u16, height: u16) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(eyre!("--width and --height must be greater than 0"));
    }
    let mut app = App::new(config);
    collect_once(&mut app).await;

    let backend = ratatui::backend::TestBackend::new(width, height);
    let mut terminal = ratatui::Terminal::new(backend)?;
    terminal.draw(|frame| ui::draw(frame, &app))?;

    let buffer = terminal.backend().buffer();
    for y in 0..buffer.area.height {
        let line: String = (0..buffer.area.width)
            .filter_map(|x| buffer.cell((x, y)))
            .map(|cell| cell.symbol())
            .collect();
        println!("{}", line.trim_end());
    }
    Ok(())
}

fn init_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("HIDETOP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.refresh_rate {
        config.general.refresh_rate_ms = rate;
    }
    if let Some(limit) = cli.process_limit {
        config.general.process_limit = limit;
    }
    if let Some(ref sort) = cli.sort {
        config.general.default_sort = sort.clone();
    }
    if let Some(ref support) = cli.color {
        config.general.color_support = support.clone();
    }

    config
}
