use std::env;
use std::process;

use position_ledger::csv::{read_commands, write_report};
use position_ledger::{LedgerConfig, PositionLedger};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: position-ledger <commands.csv> [config.toml]");
        process::exit(2);
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = match args.next() {
        Some(config_path) => match LedgerConfig::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = config_path, "{e}");
                process::exit(1);
            }
        },
        None => LedgerConfig::default(),
    };

    let mut ledger = match PositionLedger::new(config) {
        Ok(ledger) => ledger,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    // the reader moves into the spawned task
    let commands = match read_commands(path.clone()) {
        Ok(commands) => commands,
        Err(e) => {
            error!(path, "{e}");
            process::exit(1);
        }
    };

    let (command_sender, command_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in commands {
            match result {
                Ok(command) => {
                    if command_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    ledger.run(ReceiverStream::new(command_receiver)).await;

    if let Err(e) = write_report(&ledger, std::io::stdout().lock()) {
        error!("failed to write report: {e}");
        process::exit(1);
    }
}
