//! gridview - headless replay of recorded editor redraw sessions
//!
//! Feeds a replay file through the inbound queue from a producer thread,
//! applies it on the consumer side, renders every flushed frame through the
//! glyph atlas and prints the default grid as text.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use log::{debug, info, warn};

use gridview::config::Config;
use gridview::constants::DEFAULT_GRID_ID;
use gridview::font::{self, BoxRasterizer, CellSize, FontdueRasterizer, GlyphRasterizer};
use gridview::protocol::load_replay;
use gridview::ui::{batch_queue, build_frame, UiState, WindowHandler};

/// Consumer poll interval while the producer is still running
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Window collaborator that only logs
#[derive(Default)]
struct LogWindow {
    size: Option<(u32, u32)>,
}

impl WindowHandler for LogWindow {
    fn set_title(&mut self, title: &str) {
        info!("Title: {}", title);
    }

    fn request_resize(&mut self, width: u32, height: u32) {
        info!("Window resize requested: {}x{}", width, height);
        self.size = Some((width, height));
    }

    fn bell(&mut self, visual: bool) {
        debug!("Bell (visual={})", visual);
    }
}

/// Print help message
fn print_help() {
    println!(
        r#"gridview {} - headless replay for the editor screen model

USAGE:
    gridview [OPTIONS] REPLAY.toml

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -c, --config PATH       Load settings from PATH
    --init-config           Write the default config file and exit

ENVIRONMENT:
    GRIDVIEW_CONFIG         Config file path
    GRIDVIEW_FONT           Font file path
    RUST_LOG                Log filter (default: warn)"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Command line after flag handling
struct Args {
    config: Option<PathBuf>,
    replay: PathBuf,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config = None;
    let mut replay = None;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().ok_or_else(|| anyhow!("{} needs a path", arg))?;
                config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => bail!("Unknown option: {}", flag),
            path => {
                if replay.is_some() {
                    bail!("Only one replay file is supported");
                }
                replay = Some(PathBuf::from(path));
            }
        }
    }
    let replay = replay.ok_or_else(|| anyhow!("Missing replay file (see --help)"))?;
    Ok(Args { config, replay })
}

/// Fontdue rasterizer for the configured or system font, boxes otherwise
fn create_rasterizer(config: &Config) -> Box<dyn GlyphRasterizer> {
    let size = config.font.clamped_size();
    let data = if config.font.main.is_empty() {
        font::load_system_font()
    } else {
        font::load_font_file(Path::new(&config.font.main))
    };

    match data.and_then(|data| FontdueRasterizer::new(&data, size, config.font.linespace)) {
        Ok(rasterizer) => Box::new(rasterizer),
        Err(e) => {
            warn!("Font unavailable ({}), using box glyphs", e);
            Box::new(BoxRasterizer::new(CellSize {
                width: (size * 0.6).ceil(),
                height: (size * 1.2).ceil() + config.font.linespace as f32,
            }))
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("gridview {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|a| a == "--init-config") {
        let path = Config::write_default_config()?;
        println!("Config written: {}", path.display());
        return Ok(());
    }

    let args = parse_args(&args)?;
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load(),
    };

    let batches = load_replay(&args.replay)?;
    info!("Replaying {} batches from {}", batches.len(), args.replay.display());

    let mut rasterizer = create_rasterizer(&config);
    let mut ui = UiState::new(&config, rasterizer.cell_size());
    let mut window = LogWindow::default();

    let (sender, receiver) = batch_queue(config.queue.high_water_mark);
    let producer = thread::Builder::new()
        .name("replay".to_string())
        .spawn(move || {
            for params in &batches {
                sender.send_notification(params);
            }
        })?;

    let mut frames = 0usize;
    loop {
        let finished = producer.is_finished();
        let now = Instant::now();
        let outcome = ui.process_queue(&receiver, &mut window, now);
        if ui.frame_ready() {
            let frame = build_frame(&mut ui, rasterizer.as_mut(), now);
            frames += 1;
            debug!(
                "Frame {}: {} cells, atlas reset={}",
                frames,
                frame.cells.len(),
                frame.atlas_reset
            );
        }
        // The final drain must happen after the producer is known to be done
        if finished && outcome.applied == 0 && receiver.is_empty() && ui.deferred_len() == 0 {
            break;
        }
        if outcome.applied == 0 {
            thread::sleep(POLL_INTERVAL);
        }
    }
    producer
        .join()
        .map_err(|_| anyhow!("Replay producer panicked"))?;

    info!(
        "Replay done: {} frames, {} glyphs in atlas (generation {})",
        frames,
        ui.atlas().len(),
        ui.atlas().generation()
    );
    if let Some((width, height)) = window.size {
        info!("Final window size: {}x{}", width, height);
    }

    if !ui.title().is_empty() {
        println!("# {}", ui.title());
    }
    match ui.grids().grid(DEFAULT_GRID_ID) {
        Some(grid) => {
            for row in 0..grid.rows() {
                println!("{}", grid.row_text(row));
            }
        }
        None => warn!("Replay never created the default grid"),
    }

    Ok(())
}
