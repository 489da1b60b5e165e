// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, read the connection defaults from
//   the environment and hand them to the UI loop.
// - Log lines go to stderr and default to `warn` so they stay out of the
//   menu; set `RUST_LOG=cloudshell_rest=debug` to see every request.

use cloudshell_rest::{config::ClientConfig, ui};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env()?;

    // Blocks until the user picks "Exit".
    ui::run(config)?;
    Ok(())
}
