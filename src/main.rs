use std::{
    env,
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use testspec_launch::{
    command::{self, ERROR_EXIT_CODE},
    config::{Cli, Config},
    error::ProducerError,
    logging,
};

fn resolve(cli: &Cli) -> Result<(PathBuf, Config), ProducerError> {
    let cwd = env::current_dir()?;
    let config = Config::resolve(cli, &cwd)?;
    Ok((cwd, config))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (cwd, config) = match resolve(&cli) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("testspec-launch: {e}");
            return ExitCode::from(ERROR_EXIT_CODE);
        }
    };

    if let Err(e) = logging::init(&config.log_level) {
        eprintln!("testspec-launch: {e}");
    }
    log::debug!("config={config:#?}");
    log::debug!("command={:#?}", cli.command);

    let mut stdout = std::io::stdout().lock();
    match command::handle(&cli.command, &config, &cwd, &mut stdout) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("testspec-launch: {e}");
            ExitCode::from(ERROR_EXIT_CODE)
        }
    }
}
