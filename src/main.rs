mod body;
mod config;
mod core;
mod error;
mod field;
mod grid;
mod render;
mod types;
mod ui;

use std::{error::Error, fs::File, path::Path};

use clap::Parser;
use env_logger::{Env, Target};
use log::info;

use crate::config::{Cli, Settings};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref(), cli.headless)?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_cli(&cli)?;
    info!(
        "{} bodies, {} fields, {:.0} ticks/s",
        settings.bodies + settings.placements.len(),
        settings.fields.len(),
        settings.fps
    );

    if cli.headless {
        ui::run_headless(&settings, cli.ticks)
    } else {
        ui::run(&settings, cli.ticks)
    }
}

/// `RUST_LOG` wins when set. Otherwise the terminal front-end stays quiet
/// unless a log file is given, since stderr shares the screen.
fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<(), Box<dyn Error>> {
    let default_filter = if log_file.is_some() || headless {
        "info"
    } else {
        "off"
    };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        builder.target(Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}
