//! # Command Line Module
//!
//! This module offers UNIX-like CLI tooling for driving and scoring
//! evaluation runs. This uses the
//! [clap](https://docs.rs/clap/latest/clap/) crate to provide standard
//! behavior.

use clap::Args;
use clap::Parser;
use clap::Subcommand;

use std::path::PathBuf;

use crate::model::Category;

/* CLI DEFINITIONS */

/// Evaluation harness for interactive, multi-turn reasoning games.
#[derive(Parser)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /* REQUIRED COMMANDS */
    /// Available subcommands for the main 'gauntlet' command.
    #[command(subcommand)]
    pub command: Commands,

    /* DEFAULTS PROVIDED */
    /// Send no output to STDOUT during successful execution.
    #[arg(short, long, group = "output")]
    pub quiet: bool,
}

/// Subcommand choices, specified as `gauntlet <subcommand>`.
#[derive(Subcommand)]
pub enum Commands {
    /// Drive a question file to completion and score the transcripts.
    Run(RunArgs),

    /// Score an existing transcript file without generating anything.
    Score(ScoreArgs),

    /// Provides information about the system's game offerings.
    Info(InfoArgs),
}

/* ARGUMENT AND OPTION DEFINITIONS */

/// Options controlling a full evaluation run.
#[derive(Args)]
pub struct RunArgs {
    /* REQUIRED ARGUMENTS */
    /// Newline-delimited question file to evaluate.
    #[arg(long)]
    pub questions: PathBuf,

    /// Answer file receiving one transcript record per session write.
    #[arg(long)]
    pub answers: PathBuf,

    /// Evaluation report destination (single JSON document).
    #[arg(long)]
    pub evaluation: PathBuf,

    /// Scheduling category of the question file.
    #[arg(long, value_enum)]
    pub category: Category,

    /// Base URL of the generation backend.
    #[arg(long, default_value = "http://localhost:8000")]
    pub backend: String,

    /// Model identifier forwarded to the backend.
    #[arg(long)]
    pub model: String,

    /* OPTIONAL ARGUMENTS */
    /// Round cap for non-strategic categories.
    #[arg(long, default_value_t = 10)]
    pub max_round: u64,

    /// Seed each prompt with an opening think tag.
    #[arg(long)]
    pub think_mode: bool,

    /// Maximum number of new tokens per completion.
    #[arg(long, default_value_t = 16384)]
    pub max_new_token: u32,

    /// Sampling temperature forwarded to the backend.
    #[arg(long, default_value_t = 0.0)]
    pub temperature: f64,

    /// Sampling seed forwarded to the backend.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop sequences forwarded to the backend.
    #[arg(long, value_delimiter = ',')]
    pub stop: Vec<String>,
}

/// Options controlling post-hoc scoring.
#[derive(Args)]
pub struct ScoreArgs {
    /// Newline-delimited question file the transcripts answer.
    #[arg(long)]
    pub questions: PathBuf,

    /// Answer file holding the transcripts to score.
    #[arg(long)]
    pub answers: PathBuf,

    /// Evaluation report destination (single JSON document).
    #[arg(long)]
    pub evaluation: PathBuf,
}

/// Options controlling the offerings listing.
#[derive(Args)]
pub struct InfoArgs {
    /// Restrict the listing to one category.
    #[arg(long, value_enum)]
    pub category: Option<Category>,
}
