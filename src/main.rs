mod api;
mod auth;
mod cli;
mod config;
mod error;
mod handlers;
mod play;
mod printer;
mod process;
mod prompt;
mod visualizer;

use anyhow::Result;
use cli::{AdminCommand, Command};
use config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(verbose: bool) {
    // RUST_LOG wins over --verbose
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);

    let cfg = Config::load();
    tracing::debug!(config = %cfg.config_path.display(), "configuration loaded");

    match args.command {
        Command::Login { token } => handlers::account::login(&cfg, token).await,
        Command::Register { name, email } => handlers::account::register(&cfg, name, email).await,
        Command::Logout => handlers::account::logout(&cfg),
        Command::Download => handlers::download::run(&cfg).await,
        Command::Admin(AdminCommand::Leaderboard) => handlers::admin::leaderboard(&cfg).await,
        Command::Admin(AdminCommand::User) => handlers::admin::user(&cfg).await,
        Command::Play(play_args) => {
            // A failing container step exits with the child's own code.
            let code = match handlers::play::run(&cfg, &play_args).await {
                Ok(outcome) => outcome.exit_code(),
                Err(e) if e.is_precondition() => {
                    printer::error(&e.to_string());
                    e.exit_code()
                }
                Err(e) => {
                    printer::error(&format!("Error: {e}"));
                    e.exit_code()
                }
            };
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
    }
}
