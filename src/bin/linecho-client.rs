//! linecho-client: send console lines to a linecho server and print each
//! reply until `Exit` is typed.

use linecho::client::Client;
use linecho::config::ClientConfig;
use linecho::{logging, Error};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("linecho-client: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.log_level);

    info!(connect = %config.connect, "Starting linecho client");

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Client failed");
            eprintln!("linecho-client: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ClientConfig) -> Result<(), Error> {
    let client = Client::connect(config)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    client.run(&mut stdin.lock(), &mut stdout.lock())?;
    Ok(())
}
