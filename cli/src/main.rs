mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, ping};
use terminal::{logging, print};
use tracing::error;

const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    print::initialize();

    match ping::ping(&commands).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
