use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use portal_theme::{
    CHANGE_EVENT, Config, Document, MemoryStore, PreferenceStore, SignalSource, SqliteStore,
    ThemeChange, ThemeResolver, logging, watch,
};

#[derive(Parser)]
#[command(name = "portal-theme", about = "Resolve and persist the portal light/dark theme")]
struct Cli {
    /// Config file (defaults to <config_dir>/portal-theme/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override where the OS dark-mode signal is read from
    #[arg(long, value_enum)]
    signal: Option<SignalSource>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the stored preference and the theme it resolves to
    Status,
    /// Store a preference: light, dark or auto
    Set { value: String },
    /// Advance light -> dark -> auto -> light
    Cycle,
    /// Follow OS color-scheme changes and print each theme change
    Watch,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    #[serde(flatten)]
    change: ThemeChange,
    system_prefers_dark: bool,
    theme_color: Option<&'a str>,
    persistent: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let _log_guard = config
        .log_path()
        .and_then(|path| logging::init(&path, cli.verbose));

    let signal = cli.signal.unwrap_or(config.signal);
    let mut resolver = ThemeResolver::new(open_store(&config), signal.probe(), Document::new())
        .with_storage_key(config.storage_key.clone())
        .with_theme_colors(config.theme_color.clone());
    resolver.initialize();

    match cli.command.unwrap_or(Command::Status) {
        Command::Status => {}
        Command::Set { value } => {
            resolver.set_preference(&value)?;
        }
        Command::Cycle => {
            resolver.cycle_preference();
        }
        Command::Watch => {
            info!(source = ?signal, "watching system color scheme");
            print_status(&resolver)?;
            resolver.subscribe(Box::new(|change| {
                if let Err(e) = print_json(&serde_json::json!({ "event": CHANGE_EVENT, "detail": change })) {
                    warn!(error = %e, "failed to write change event");
                }
            }));
            let mut events = resolver.signal_events(config.poll_interval());
            watch::run(&mut resolver, &mut events).await;
            return Ok(());
        }
    }

    print_status(&resolver)
}

/// Open the preference database, falling back to a session-only store.
fn open_store(config: &Config) -> Box<dyn PreferenceStore> {
    let Some(path) = config.database_path() else {
        warn!("no data directory; theme preference is session-only");
        return Box::new(MemoryStore::new());
    };
    match SqliteStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "storage unavailable; theme preference is session-only");
            Box::new(MemoryStore::new())
        }
    }
}

fn print_status(resolver: &ThemeResolver) -> Result<()> {
    print_json(&Status {
        change: ThemeChange {
            preference: resolver.preference(),
            effective_theme: resolver.effective_theme(),
        },
        system_prefers_dark: resolver.system_prefers_dark(),
        theme_color: resolver.document().theme_color(),
        persistent: resolver.is_persistent(),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("Failed to serialize output")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}
