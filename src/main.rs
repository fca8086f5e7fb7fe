use std::{io::stdout, process::ExitCode};

use clap::Parser;
use log::{error, info};

use quicknotes::{App, Cli, Config, FileStore, NotesStore, Result, StoreEvent, StoreOptions};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let backend = FileStore::open(&config.data_dir)?;

    let mut store = NotesStore::open(backend, StoreOptions::from(&config));
    store.subscribe(Box::new(|event: &StoreEvent| match event {
        StoreEvent::Created { .. } => eprintln!("{}", console::style("New note created").green()),
        StoreEvent::Deleted { .. } => eprintln!("{}", console::style("Note deleted").green()),
        StoreEvent::Updated { .. } => {}
    }));

    let mut app = App::new(store, config, stdout());
    app.run(cli.command)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");
    match run(cli) {
        Ok(()) => {
            info!("Application shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{} {}", console::style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
