//! The deckhand server binary.

use clap::Parser;
use deckhand::{run_admin_loop, DeckhandError, Server, ServerConfig};
use deckhand_protocol::DEFAULT_PORT;

#[derive(Debug, Parser)]
#[command(name = "deckhand", about = "Hidden-hand coordination server for card games")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value_t = format!("0.0.0.0:{DEFAULT_PORT}"))]
    bind: String,

    /// Maximum number of concurrently connected players.
    #[arg(long, default_value_t = 512)]
    max_players: usize,

    /// Fixed RNG seed for every game. Only useful for reproducing runs;
    /// leave unset in production.
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), DeckhandError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let server = Server::bind(ServerConfig {
        bind_addr: args.bind,
        max_players: args.max_players,
        rng_seed: args.rng_seed,
    })
    .await?;

    // Admin input: a single `quit` line on stdin triggers shutdown.
    tokio::spawn(run_admin_loop(server.shutdown_handle()));

    server.run().await
}
