//! Ferry CLI - build artifact synchronization over SSH
//!
//! Usage: ferry <COMMAND>
//!
//! Commands:
//!   watch   Watch the build output directory and sync continuously
//!   sync    Upload the current build output once and disconnect
//!   init    Write a starter ferry.toml

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use ferry::events::{EventSink, SyncEvent};
use ferry::{watch, Config, SessionController, SessionState, SshConnector, WatchOptions};

/// Ferry - build artifact synchronization over SSH
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output events as NDJSON for CI
    #[arg(long, default_value = "false")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the build output directory and sync continuously
    Watch {
        /// Build output directory
        #[arg(short, long, default_value = "dist")]
        source: PathBuf,

        /// Path to the config file
        #[arg(short, long, default_value = "ferry.toml")]
        config: PathBuf,
    },

    /// Upload the current build output once and disconnect
    Sync {
        /// Build output directory
        #[arg(short, long, default_value = "dist")]
        source: PathBuf,

        /// Path to the config file
        #[arg(short, long, default_value = "ferry.toml")]
        config: PathBuf,
    },

    /// Write a starter ferry.toml
    Init {
        /// Overwrite an existing ferry.toml
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { source, config } => cmd_watch(&source, &config, cli.json),
        Commands::Sync { source, config } => cmd_sync(&source, &config, cli.json),
        Commands::Init { force } => cmd_init(force),
    }
}

fn cmd_watch(source: &PathBuf, config_path: &PathBuf, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let source = source.canonicalize().unwrap_or_else(|_| source.clone());
    let sink = make_sink(json);

    if !json {
        println!("⛴  Ferry Watch");
        println!("Source: {}", source.display());
        println!("Press Ctrl+C to stop\n");
    }

    let mut controller = SessionController::new(config, Box::new(SshConnector), sink.clone());
    controller.start(&source);
    if controller.state() != SessionState::Connected {
        // Warnings already went through the sink; sync is best-effort.
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    watch(&WatchOptions::new(source), &mut controller, running, sink)?;

    Ok(())
}

fn cmd_sync(source: &PathBuf, config_path: &PathBuf, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let source = source.canonicalize().unwrap_or_else(|_| source.clone());
    let sink = make_sink(json);

    if !json {
        println!("⛴  Ferry Sync");
        println!("Source: {}\n", source.display());
    }

    let mut controller = SessionController::new(config, Box::new(SshConnector), sink);
    controller.start(&source);
    if controller.state() != SessionState::Connected {
        return Ok(());
    }

    ferry::sync_once(&WatchOptions::new(source), &mut controller)?;

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"mode = "development"

[connection]
host = ""
port = 22
username = ""
private_key = "~/.ssh/id_ed25519"
# passphrase = ""

[upload]
path = ""
manifest = false

[preview]
# domain = "myapp.test"
open = false
"#;

fn cmd_init(force: bool) -> Result<()> {
    let path = PathBuf::from("ferry.toml");
    if path.exists() && !force {
        anyhow::bail!("ferry.toml already exists (use --force to overwrite)");
    }
    std::fs::write(&path, CONFIG_TEMPLATE)?;
    println!("✓ Wrote {}", path.display());
    Ok(())
}

fn make_sink(json: bool) -> EventSink {
    Arc::new(move |event| {
        if json {
            println!("{}", event.to_json());
        } else {
            render(&event);
        }
    })
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn render(event: &SyncEvent) {
    let ts = timestamp();
    match event {
        SyncEvent::Connected { host } => {
            println!("🔌 [{ts}] Connected to {host}");
        }
        SyncEvent::ConnectionError { message } => {
            eprintln!("✗ [{ts}] Connection failed: {message}");
        }
        SyncEvent::ConfigWarning { field } => {
            eprintln!("⚠ Missing configuration option: {field}");
        }
        SyncEvent::ModeWarning { mode } => {
            eprintln!("⚠ Ferry only runs in development mode (mode is '{mode}')");
        }
        SyncEvent::AuthWarning { message } => {
            eprintln!("⚠ {message}");
        }
        SyncEvent::UploadStarted { artifact } => {
            println!("⬆ [{ts}] Uploading {artifact}...");
        }
        SyncEvent::UploadComplete { artifact } => {
            println!("✓ [{ts}] Upload complete: {artifact}");
        }
        SyncEvent::UploadError { artifact, message } => {
            eprintln!("✗ [{ts}] Upload error for {artifact}: {message}");
        }
        SyncEvent::Disposed => {
            println!("🔌 [{ts}] Connection closed");
        }
        SyncEvent::WatchStarted { source } => {
            println!("👀 [{ts}] Watching: {source}");
        }
        SyncEvent::BuildDetected { artifacts } => {
            println!("🔄 [{ts}] Build detected: {artifacts} changed artifacts");
        }
        SyncEvent::Error { message } => {
            eprintln!("✗ [{ts}] {message}");
        }
        SyncEvent::Shutdown => {
            println!("\n👋 Shutting down...");
        }
    }
}
