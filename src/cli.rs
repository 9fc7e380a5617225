use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Weekly meal planner with chat and SMS follow-ups",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch this week's plan, generating it if none is stored
    Generate {
        /// Any date in the target week (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        week: Option<String>,
        /// Regenerate even if a plan is already stored
        #[arg(short, long)]
        force: bool,
    },
    /// Print today's meals
    Today {
        /// Also text them to TARGET_PHONE_NUMBER
        #[arg(long)]
        send: bool,
    },
    /// Scheduled job: generate on Sunday, otherwise send today's plan
    Daily,
    /// List stored weeks, newest first
    Weeks,
    /// Store a free-text plan and show what was read from it
    ImportText {
        file: PathBuf,
        /// Any date in the target week (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        week: Option<String>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
