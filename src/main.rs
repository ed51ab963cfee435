//! Binary entry point: wires the dispatch loop to the process's real stdio
//! streams and installs structured logging.

use std::io::{self, Write};
use std::process::ExitCode;

use bridge_worker::config::Config;
use bridge_worker::dispatcher::Dispatcher;

fn main() -> ExitCode {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!(debug = config.debug, "bridge worker starting");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();

    let mut dispatcher = Dispatcher::new(config);
    match dispatcher.run(&mut input, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "fatal I/O error on the output stream");
            let _ = writeln!(io::stderr(), "bridge-worker: fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
