//! `annotator`: annotate plain text with `<id>…</id>` anchors in the terminal.
//!
//! ## Reading guide
//! - **`main()` / `run()`**: parses arguments, loads `annotator.toml`, sets up logging and
//!   hands over to the terminal host.
//! - **`tui`**: the crossterm host. It owns an [`annotator::Annotator`] and implements its
//!   callbacks (clipboard, status line, highlight colors).
//! - Everything else (cursor, viewport, key handling, anchors) lives in the library.

mod tui;

use annotator::{Config, EditMode};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tui::Options;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

const HELP: &str = "\
annotator - annotate text in the terminal

USAGE:
    annotator [FILE] [OPTIONS]

OPTIONS:
    --mode MODE       Start in highlight, semi or raw mode
    --config PATH     Read settings from PATH instead of ./annotator.toml
    --line N          Scroll to display line N
    --anchor ID       Scroll to the anchor ID
    --log PATH        Write a log to PATH
    -h, --help        Show this help message
    -v, --version     Show version information

KEYS:
    F1 / F2 / F3      Highlight / semi / raw mode
    F5                Anchor the selection
    F6                Remove anchors under the selection
    Ctrl+C/X/V/A      Copy / cut / paste / select all
    Ctrl+S            Save
    Ctrl+Q            Quit";

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    path: Option<PathBuf>,
    mode: Option<EditMode>,
    config: Option<PathBuf>,
    line: Option<usize>,
    anchor: Option<String>,
    log: Option<PathBuf>,
    help: bool,
    version: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut out = Args::default();
        let mut it = args.into_iter();
        while let Some(arg) = it.next() {
            let mut value = |flag: &str| {
                it.next()
                    .with_context(|| format!("'{flag}' needs a value"))
            };
            match arg.as_str() {
                "-h" | "--help" => out.help = true,
                "-v" | "--version" => out.version = true,
                "--mode" => {
                    let name = value("--mode")?;
                    let mode = EditMode::from_name(&name)
                        .with_context(|| format!("Unknown mode '{name}'"))?;
                    out.mode = Some(mode);
                }
                "--config" => out.config = Some(PathBuf::from(value("--config")?)),
                "--line" => {
                    let n = value("--line")?;
                    out.line = Some(n.parse().with_context(|| format!("Bad line number '{n}'"))?);
                }
                "--anchor" => out.anchor = Some(value("--anchor")?),
                "--log" => out.log = Some(PathBuf::from(value("--log")?)),
                flag if flag.starts_with('-') => {
                    bail!("Unknown flag '{flag}'. Try 'annotator --help' for more information.")
                }
                path => {
                    if out.path.is_some() {
                        bail!("Only one file can be opened");
                    }
                    out.path = Some(PathBuf::from(path));
                }
            }
        }
        Ok(out)
    }
}

/// Route `tracing` output to a file. The terminal belongs to the UI, so without a file
/// nothing is logged. Keep the guard alive until exit to flush the writer.
fn init_logging(config: &Config, cli_log: Option<PathBuf>) -> Result<Option<WorkerGuard>> {
    let Some(path) = cli_log.or_else(|| config.log.file.clone()) else {
        return Ok(None);
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Opening log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = match &config.log.filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("Bad log filter '{directives}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn run() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{HELP}");
        return Ok(());
    }
    if args.version {
        println!("annotator v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;
    let _log = init_logging(&config, args.log)?;

    let opts = Options {
        path: args.path,
        mode: args.mode,
        line: args.line,
        anchor: args.anchor,
    };
    tui::run(opts, config)
}
