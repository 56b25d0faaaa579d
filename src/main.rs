mod config;
mod list;
mod logging;
mod replay;
mod ui;

use std::io::stdout;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "shoplist")]
struct Cli {
    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a script of JSON intents and print the resulting list as JSON
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Print every intermediate snapshot as one JSON line
    #[arg(long, default_value_t = false)]
    each: bool,

    #[arg(value_name = "SCRIPT")]
    script: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    logging::init(&config.log)?;

    if let Some(command) = cli.command {
        match command {
            Command::Replay(args) => {
                replay::replay_file(&args.script, args.each, &mut stdout().lock())?;
                return Ok(());
            }
        }
    }

    tracing::info!(config = %config.config_path.display(), "starting shopping list");
    let mut app = ui::app::App::new(&config);
    app.run()?;

    Ok(())
}
