use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mapbridge::bridge::CommandId;
use mapbridge::config::BridgeConfig;
use mapbridge::replay;

#[derive(Parser, Debug)]
#[command(
    name = "mapbridge",
    version,
    about = "Host tree to map surface bridge",
    arg_required_else_help = true
)]
struct Cli {
    /// Bridge configuration (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the command table exposed to the host
    Commands,
    /// Run a JSON step script against a headless surface
    Replay {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    mapbridge::init(&config);

    match cli.command {
        Command::Commands => print_command_table(),
        Command::Replay { script } => {
            let steps = replay::load_script(&script)?;
            for line in replay::replay(steps, &config) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn print_command_table() {
    println!("{:>3}  {:<30} RESOLVES WITH", "ID", "COMMAND");
    for id in CommandId::ALL {
        println!("{:>3}  {:<30} {}", id.raw(), id.name(), id.result_shape());
    }
}
