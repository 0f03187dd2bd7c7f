mod info;
mod menu;
mod render;
mod storage;

use anyhow::{Context, Result};
use cagebound_game::{GameRng, ProgressionEngine};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use std::io::{stdin, stdout};
use std::path::PathBuf;

use menu::{Menu, SessionEnd};
use storage::JsonFileStorage;

#[derive(Debug, Parser)]
#[command(name = "cagebound-cli", version)]
#[command(about = "Turn-based caging progression game for the terminal")]
struct Args {
    /// Directory holding one JSON file per profile
    #[arg(long, default_value = "Data/Users")]
    data_dir: PathBuf,

    /// Profile to open; prompted for when omitted
    #[arg(long)]
    user: Option<String>,

    /// Seed for a reproducible random stream
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let rng = args
        .seed
        .map_or_else(GameRng::from_entropy, GameRng::from_user_seed);
    let storage = JsonFileStorage::new(&args.data_dir);
    let mut engine = ProgressionEngine::new(storage, rng);
    let mut menu = Menu::new(stdin().lock(), stdout());

    let name = match args.user {
        Some(name) => name,
        None => match menu.prompt_name()? {
            Some(name) => name,
            None => return Ok(()),
        },
    };
    let mut session = engine.load_or_create(&name).with_context(|| {
        format!(
            "could not open profile {name:?} in {}",
            engine.storage().root().display()
        )
    })?;
    menu.greet(&session)?;

    let end = menu.run(&mut engine, &mut session, || Local::now().naive_local())?;
    log::info!(
        "session for {} ended ({end:?}) after {} draws",
        session.profile().name(),
        engine.rng().draws()
    );
    if end == SessionEnd::Eliminated {
        println!("{}", "Game over.".red().bold());
    }
    Ok(())
}

fn announce_banner() {
    println!("{}", "Cagebound".bright_cyan().bold());
    println!("{}", "=========".cyan());
}
