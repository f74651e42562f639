//! Flick bubble replay host
//!
//! Replays a scripted gesture trace against the bubble engine on a headless
//! window manager and prints every engine event as one JSON object per line.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flick_bubble::replay::{self, Script, FRAME};
use flick_bubble::BubbleConfig;

#[derive(Parser, Debug)]
#[command(name = "flick-bubble")]
#[command(about = "Replay a gesture script against the Flick floating bubble", long_about = None)]
struct Args {
    /// Gesture script (TOML)
    script: PathBuf,

    /// Bubble configuration (TOML), defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,

    /// Pace frames at 16ms of wall time instead of running flat out
    #[arg(short, long)]
    realtime: bool,
}

fn log_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("flick")
}

fn main() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    // Log panics to crash.log before the process dies
    let crash_log = log_dir.join("crash.log");
    std::panic::set_hook(Box::new(move |panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Ok(mut f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&crash_log)
        {
            let _ = writeln!(f, "[{}] PANIC: {}", chrono::Local::now(), panic_info);
        }
    }));

    let args = Args::parse();

    let file_appender = rolling::daily(&log_dir, "bubble.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Quiet by default, verbose with --debug
    let default_filter = if args.debug {
        "debug,flick_bubble=debug"
    } else {
        "warn,flick_bubble=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!(log_path = %log_dir.display(), "Flick bubble replay starting");

    let config = match &args.config {
        Some(path) => BubbleConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BubbleConfig::default(),
    };
    let script = Script::load(&args.script)
        .with_context(|| format!("Failed to load script {}", args.script.display()))?;

    let interval = if args.realtime { FRAME } else { Duration::ZERO };
    let events = replay::run(&script, &config, interval)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for event in &events {
        writeln!(out, "{}", serde_json::to_string(event)?)?;
    }

    info!(events = events.len(), "replay complete");
    Ok(())
}
