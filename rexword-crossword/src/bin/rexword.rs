//! Command-line interface for rexword.
//!
//! Usage:
//!   rexword validate [FILE] [--challenges]      - Report patterns that fail to parse
//!   rexword tally [FILE] [--challenges]         - Count syntax node kinds
//!   rexword sizes PATTERN --max N [--min N]     - Decompose a pattern by match length
//!   rexword reverse PATTERN                     - Print the pattern for reversed strings
//!
//! Without a FILE, puzzle commands run over the built-in MIT puzzle.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use log::{LevelFilter, info};
use rexword::reverse;
use rexword_crossword::{
    Puzzle, SyntaxError, decompose, group_by_message, load_challenges, load_puzzles, mit_puzzle,
    prepare,
};

#[derive(Parser)]
#[command(name = "rexword", version, about = "Length analysis for regex crossword patterns")]
struct Cli {
    /// Log more; repeat for more detail. RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report patterns that fail to parse, grouped by error
    Validate(Source),
    /// Count syntax node kinds over every parsable pattern
    Tally(Source),
    /// Decompose a pattern into one sub-pattern per match length in [min, max)
    Sizes {
        pattern: String,
        #[arg(long, default_value_t = 0)]
        min: usize,
        #[arg(long)]
        max: usize,
        /// Decompose the reversed pattern instead; patterns with
        /// backreferences are rejected
        #[arg(long)]
        reverse: bool,
    },
    /// Print the pattern that matches exactly the reversed strings
    Reverse { pattern: String },
}

#[derive(Args)]
struct Source {
    /// JSON file with an array of puzzles
    file: Option<PathBuf>,
    /// The file holds an array of challenges instead
    #[arg(long)]
    challenges: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::Validate(source) => validate(&load(&source)?),
        Command::Tally(source) => {
            tally(&load(&source)?);
            Ok(())
        }
        Command::Sizes {
            pattern,
            min,
            max,
            reverse: reversed,
        } => sizes(&pattern, min, max, reversed),
        Command::Reverse { pattern } => {
            println!("{}", reverse(&prepare(&pattern)?)?);
            Ok(())
        }
    }
}

fn load(source: &Source) -> Result<Vec<Puzzle>> {
    let Some(path) = &source.file else {
        return Ok(vec![mit_puzzle()]);
    };
    let puzzles = if source.challenges {
        load_challenges(path)?
            .into_iter()
            .flat_map(|challenge| challenge.puzzles)
            .collect()
    } else {
        load_puzzles(path)?
    };
    info!("{} puzzles from {}", puzzles.len(), path.display());
    Ok(puzzles)
}

fn validate(puzzles: &[Puzzle]) -> Result<()> {
    let errors: Vec<SyntaxError> = puzzles.iter().flat_map(Puzzle::validate_patterns).collect();
    for (message, patterns) in group_by_message(&errors) {
        println!("{} ({})", message, patterns.len());
        for pattern in patterns {
            println!("    {}", pattern);
        }
    }
    if !errors.is_empty() {
        bail!("{} patterns failed to parse", errors.len());
    }
    let checked: usize = puzzles.iter().map(|puzzle| puzzle.patterns().count()).sum();
    println!("all {} patterns parse", checked);
    Ok(())
}

fn tally(puzzles: &[Puzzle]) {
    let mut counts = IndexMap::new();
    for puzzle in puzzles {
        puzzle.tally_node_kinds(&mut counts);
    }
    counts.sort_by(|_, a, _, b| b.cmp(a));
    for (kind, count) in &counts {
        println!("{:<18} {}", kind.as_str(), count);
    }
}

fn sizes(pattern: &str, min: usize, max: usize, reversed: bool) -> Result<()> {
    let sized = decompose(pattern, min, max, reversed)?;
    if sized.is_empty() {
        println!("no match with length in [{}, {})", min, max);
    }
    for (len, fragment) in sized.iter() {
        println!("{:>4}  {}", len, fragment);
    }
    Ok(())
}
