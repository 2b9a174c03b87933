use std::process::ExitCode;

use anyhow::Result;

use modpoll::{
    cli::{
        self,
        actions::poll_once,
        config::{PollConfig, Transport},
    },
    poll::PollLoop,
    protocol::TcpClient,
    signal::SignalController,
    tui::{input::spawn_input_pump, surface::CrosstermSurface},
};

fn main() -> ExitCode {
    env_logger::init();
    let matches = cli::parse_args();

    let config = match PollConfig::from_matches(&matches) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if config.transport != Transport::Tcp {
        eprintln!("{} mode is not yet supported.", config.transport.label());
        return ExitCode::SUCCESS;
    }

    let result = if matches.get_flag("once") {
        poll_once(&config)
    } else {
        run_dashboard(config)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The dashboard is torn down by now; stderr is safe to use.
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_dashboard(config: PollConfig) -> Result<()> {
    log::info!(
        "polling {} slave {} at {}:{} ({} x{}, every {} ms)",
        config.transport.label(),
        config.slave_id,
        config.host,
        config.port,
        config.register_kind.label(),
        config.count,
        config.poll_interval.as_millis()
    );

    let signals = SignalController::new();
    signals.install()?;
    spawn_input_pump(signals.sender());

    let client = TcpClient::new(&config.host, config.port);
    let surface = CrosstermSurface::new();

    let reason = PollLoop::new(config, client, surface, signals).run()?;
    eprintln!("Stopped by {reason}.");
    Ok(())
}
