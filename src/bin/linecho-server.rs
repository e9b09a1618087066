//! linecho-server: serve exactly one client, echoing each line as
//! `Sent: <line>` until the client sends `Exit`.

use linecho::config::ServerConfig;
use linecho::server::Server;
use linecho::{logging, Error};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("linecho-server: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.log_level);

    info!(listen = %config.listen, "Starting linecho server");

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            eprintln!("linecho-server: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ServerConfig) -> Result<(), Error> {
    let server = Server::bind(config)?;
    let stdout = std::io::stdout();
    server.run(&mut stdout.lock())?;
    Ok(())
}
