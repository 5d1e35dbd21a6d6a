//! Tail a server console and print status changes.
//!
//! Demonstrates:
//! - Building a connection from a session token and server id
//! - Observing readiness, status and reconnects
//! - Starting the console stream before the socket is ready
//!
//! Usage:
//!   ATERNOS_SESSION=... ATERNOS_SERVER=... cargo run --example console_tail
//!   ATERNOS_SESSION=... ATERNOS_SERVER=... cargo run --example console_tail -- --debug

// ============================================================================
// Imports
// ============================================================================

use aternos_hermes::{Connection, Error, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|a| a == "--debug");
    let filter = if debug {
        "aternos_hermes=debug"
    } else {
        "aternos_hermes=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let token = env("ATERNOS_SESSION")?;
    let server_id = env("ATERNOS_SERVER")?;

    let connection = Connection::builder()
        .token(token)
        .server_id(server_id)
        .build()?;

    connection.on_ready(|| println!("[hermes] ready"));
    connection.on_close(|| println!("[hermes] closed"));
    connection.on_status(|status| {
        println!(
            "[status] {} ({}/{} players)",
            status.label.as_deref().unwrap_or("?"),
            status.players.unwrap_or(0),
            status.max_players.unwrap_or(0),
        );
    });

    let console = connection.stream("console")?;
    console.on_data("line", |line| {
        if let Some(line) = line.and_then(|l| l.as_str()) {
            println!("{}", line.trim_end());
        }
    });
    console.start(None);

    connection.connect();

    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await?;

    console.stop();
    connection.disconnect();
    Ok(())
}

fn env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::config(format!("{name} is not set")))
}
