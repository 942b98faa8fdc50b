#![forbid(unsafe_code)]
//! # Execution Module
//!
//! The entry point which aggregates the game, scheduling, storage, and
//! evaluation modules into the `gauntlet` command. Subcommand executors
//! stay thin: they wire files, the backend, and the driver together and
//! leave all game semantics to the library modules.

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;

use std::process;

use crate::game::GameKind;
use crate::interface::cli::*;
use crate::model::Question;
use crate::schedule::backend::HttpBackend;
use crate::schedule::backend::Sampling;
use crate::store::Store;

/* MODULES */

mod eval;
mod game;
mod interface;
mod model;
mod schedule;
mod store;

/* PROGRAM ENTRY */

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let ret = match &cli.command {
        Commands::Run(args) => run(args),
        Commands::Score(args) => score(args),
        Commands::Info(args) => info(args),
    };
    if let Err(e) = ret {
        if !cli.quiet {
            eprintln!("{e:#}");
        }
        process::exit(exitcode::USAGE)
    }
    process::exit(exitcode::OK)
}

/* SUBCOMMAND EXECUTORS */

fn run(args: &RunArgs) -> Result<()> {
    let questions = model::load_questions(&args.questions)?;
    let kind = file_kind(&questions)?;

    let backend = HttpBackend::new(
        &args.backend,
        &args.model,
        Sampling {
            max_tokens: args.max_new_token,
            temperature: args.temperature,
            stop: args.stop.clone(),
            seed: args.seed,
        },
    );
    let mut store = Store::open(&args.answers)?;
    let options = schedule::Options {
        max_round: args.max_round,
        think_mode: args.think_mode,
    };

    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to start the async runtime.")?;
    runtime.block_on(schedule::run(
        args.category,
        &questions,
        &backend,
        &mut store,
        &options,
    ))?;

    store::compact(&args.answers)?;
    let transcripts = store::recover(&args.answers)?;
    let report = eval::score(kind, &questions, &transcripts);
    eval::write_report(&report, &args.evaluation)?;
    eval::print_summary(&report);
    Ok(())
}

fn score(args: &ScoreArgs) -> Result<()> {
    let questions = model::load_questions(&args.questions)?;
    let kind = file_kind(&questions)?;

    let transcripts = store::recover(&args.answers)?;
    let report = eval::score(kind, &questions, &transcripts);
    eval::write_report(&report, &args.evaluation)?;
    eval::print_summary(&report);
    Ok(())
}

fn info(args: &InfoArgs) -> Result<()> {
    interface::print_offerings(args.category);
    Ok(())
}

/* UTILITY */

/// A question file holds one game kind; resolve and verify it.
fn file_kind(questions: &[Question]) -> Result<GameKind> {
    let Some(first) = questions.first() else {
        bail!("The question file contains no questions.");
    };
    let kind = GameKind::from_title(&first.title)?;
    for question in questions {
        let other = GameKind::from_title(&question.title)?;
        if other != kind {
            bail!(
                "The question file mixes game kinds ({} and {}).",
                kind.name(),
                other.name(),
            );
        }
    }
    Ok(kind)
}
