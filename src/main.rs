use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fire_tracker::api::{self, OutputFormat, TrackArgs};

#[derive(Parser, Debug)]
#[command(
    name = "fire-tracker",
    about = "FIRE progress tracker (goal, years to FI and net worth trajectory)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the FIRE goal and net worth projection once.
    Project {
        #[command(flatten)]
        args: TrackArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Serve the tracker as an HTTP JSON API.
    Serve {
        #[arg(long, env = "FIRE_TRACKER_PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    match Cli::parse().command {
        Command::Project { args, format } => {
            print!("{}", api::run_project(args, format)?);
        }
        Command::Serve { port } => {
            api::run_http_server(port).await?;
        }
    }
    Ok(())
}
