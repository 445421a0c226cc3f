//! hopgate CLI.
//!
//! - `hopgate run -c hopgate.toml` - run from a config file
//! - `hopgate tunnel <IP:PORT> <HOST:PORT> [CHAIN]...` - fixed tunnel
//! - `hopgate proxy <socks5|https>://<IP:PORT> [CHAIN]...` - proxy front end

use std::process::ExitCode;

use clap::Parser;
use hopgate_gateway::cli::GatewayArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = GatewayArgs::parse();

    match hopgate_gateway::cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
