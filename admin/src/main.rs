use admin::{Config, Form, Outcome, Site};
use anyhow::{anyhow, Context, Result};
use camino::Utf8PathBuf;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{env::args, process::ExitCode};

fn main() -> Result<ExitCode> {
    // Log to stderr; stdout carries the outcome
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .context("failed to initialize logger")?;

    let mut args = args().skip(1);

    // Read configuration
    let config_path = Utf8PathBuf::from(
        args.next()
            .ok_or_else(|| anyhow!("usage: admin <config.toml> <action> [name=value]..."))?,
    );
    let config = Config::from_path(&config_path).context("failed to read configuration file")?;

    // Handle request
    let outcome = match Form::from_args(args) {
        Ok(form) => Site::new(&config).respond(&form),
        Err(err) => Outcome::from_error(&err),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?
    );

    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
