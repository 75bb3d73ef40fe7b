use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "mm", about = "MechMania command-line client", version)]
pub struct Cli {
    /// Print debug diagnostics to stderr (RUST_LOG takes precedence).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in to your team with its token.
    Login {
        /// Team token; prompted for when omitted.
        #[arg(long)]
        token: Option<String>,
    },

    /// Create a new team.
    Register {
        /// Team name; prompted for when omitted.
        #[arg(long)]
        name: Option<String>,
        /// Contact email; prompted for when omitted.
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored team.
    Logout,

    /// Watch your bot play against the default AI bot.
    Play(PlayArgs),

    /// Download the appropriate visualizer for your operating system.
    Download,

    /// Competition administration (hidden).
    #[command(subcommand)]
    #[command(hide = true)]
    Admin(AdminCommand),
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("visualizer_switch").args(["visualizer", "no_visualizer"]).multiple(false)))]
pub struct PlayArgs {
    /// Path to your bot's directory.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// EXPERIMENTAL: build and test your bot in the cloud.
    #[arg(long)]
    pub remote: bool,

    /// Start the visualizer after the game (default).
    #[arg(long)]
    pub visualizer: bool,
    /// Just build and save the logfile without starting the visualizer.
    #[arg(long = "no-visualizer")]
    pub no_visualizer: bool,

    /// Also write the game engine output to this file (usable as visualizer input).
    #[arg(long, value_name = "PATH")]
    pub logfile: Option<PathBuf>,
}

impl PlayArgs {
    pub fn visualize(&self) -> bool {
        !self.no_visualizer
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommand {
    /// Rank every team with a submitted script.
    Leaderboard,
    /// Inspect one team's stats, info, versions or matches.
    User,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
