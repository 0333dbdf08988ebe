use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ropescore_tally::config::{self, Config};
use ropescore_tally::output;
use ropescore_tally::scoresheet::{load_mark_scoresheet, load_scoresheet, save_scoresheet};
use ropescore_tally::{
    JudgeMeta, JudgeSession, JudgeType, Mark, MarkGenerator, MarkScoresheet, Scoresheet, TallyError,
};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_TALLY: i32 = 3;
const EXIT_CONFIG: i32 = 4;

/// A scoresheet names a judge type the config does not define
#[derive(Debug, thiserror::Error)]
#[error("judge type '{0}' is not configured")]
struct UnknownJudgeType(String);

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured judge types with their fields
    Judges,
    /// Check the config file and print every problem found
    Validate,
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Tally a scoresheet
    Tally {
        /// Scoresheet JSON file (marks or tally)
        file: PathBuf,
        /// Feed marks through the incremental reducer instead of a single pass
        #[arg(long)]
        incremental: bool,
        /// Print the tally scoresheet as JSON
        #[arg(long)]
        json: bool,
    },
    /// Tally a scoresheet and summarize it into the judge's result
    Result {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the tally after every mark of a mark scoresheet
    Replay { file: PathBuf },
    /// Append one mark to a mark scoresheet
    #[command(group(ArgGroup::new("action").required(true).args(["schema", "undo", "clear"])))]
    Mark {
        /// Mark scoresheet JSON file, created when missing
        file: PathBuf,
        /// Schema of the mark to record
        #[arg(long)]
        schema: Option<String>,
        /// Explicit value for the mark (scale judges)
        #[arg(long, requires = "schema", allow_negative_numbers = true)]
        value: Option<f64>,
        /// Undo the mark with this sequence number
        #[arg(long)]
        undo: Option<u64>,
        /// Clear every earlier mark
        #[arg(long)]
        clear: bool,
        /// Judge type for a new scoresheet
        #[arg(long)]
        judge_type: Option<String>,
        /// Judge id for a new scoresheet
        #[arg(long, default_value = "1")]
        judge_id: String,
    },
}

#[derive(Parser, Debug)]
#[command(name = "ropescore")]
#[command(about = "Tally judge mark streams for rope skipping scoresheets", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/ropescore/judges.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Init { force } = cli.command {
        let path = cli.config.unwrap_or_else(config::get_config_path);
        if let Err(e) = config::write_default_config(&path, force) {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        println!("Wrote starter config to {}", path.display());
        std::process::exit(EXIT_SUCCESS);
    }

    // An explicit --config must exist; the default path falls back to built-in judges
    let loaded = match cli.config {
        Some(path) => config::load_config(Some(path)),
        None => config::load_config_or_default(None),
    };
    let config = match loaded {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate judge definitions at startup
    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let use_colors = output::should_use_colors();

    let outcome = match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Judges => {
            println!("{}", output::format_judge_list(&config.judge_types(), use_colors));
            Ok(())
        }
        Commands::Validate => {
            println!("Config OK: {} judge types", config.judges.len());
            Ok(())
        }
        Commands::Tally { file, incremental, json } => {
            run_tally(&config, &file, incremental, json, use_colors)
        }
        Commands::Result { file, json } => run_result(&config, &file, json, use_colors),
        Commands::Replay { file } => run_replay(&config, &file, use_colors),
        Commands::Mark {
            file,
            schema,
            value,
            undo,
            clear,
            judge_type,
            judge_id,
        } => {
            // clap guarantees exactly one of --schema, --undo, --clear
            let action = match (schema, undo) {
                (Some(schema), _) => MarkAction::Record { schema, value },
                (None, Some(target)) => MarkAction::Undo(target),
                (None, None) => {
                    debug_assert!(clear);
                    MarkAction::Clear
                }
            };
            run_mark(&config, &file, action, judge_type, judge_id, use_colors)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }

    std::process::exit(EXIT_SUCCESS);
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<TallyError>().is_some() {
        EXIT_TALLY
    } else if err.downcast_ref::<UnknownJudgeType>().is_some() {
        EXIT_CONFIG
    } else {
        EXIT_INPUT
    }
}

fn find_judge_type(config: &Config, id: &str) -> Result<JudgeType> {
    config
        .find_judge(id)
        .map(|j| j.build())
        .ok_or_else(|| UnknownJudgeType(id.to_string()).into())
}

fn run_tally(config: &Config, file: &Path, incremental: bool, json: bool, use_colors: bool) -> Result<()> {
    let sheet = load_scoresheet(file)?;
    let judge = find_judge_type(config, &sheet.meta().judge_type_id)?;

    let tally = match sheet {
        Scoresheet::Marks(marks) if incremental => JudgeSession::resume(&judge, marks)?.tally_scoresheet(),
        sheet => judge.tally_scoresheet(&sheet)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tally).context("Failed to serialize tally")?);
    } else {
        println!("{}", output::format_tally(&judge, &tally.meta, &tally.tally, use_colors));
    }
    Ok(())
}

fn run_result(config: &Config, file: &Path, json: bool, use_colors: bool) -> Result<()> {
    let sheet = load_scoresheet(file)?;
    let judge = find_judge_type(config, &sheet.meta().judge_type_id)?;

    let tally = judge.tally_scoresheet(&sheet)?;
    let result = judge.calculate_judge_result(&tally)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result).context("Failed to serialize result")?);
    } else {
        println!("{}", output::format_judge_result(&result, use_colors));
    }
    Ok(())
}

fn run_replay(config: &Config, file: &Path, use_colors: bool) -> Result<()> {
    let Scoresheet::Marks(sheet) = load_scoresheet(file)? else {
        anyhow::bail!("{} holds a tally scoresheet, there are no marks to replay", file.display());
    };
    let judge = find_judge_type(config, &sheet.meta.judge_type_id)?;
    judge.check_meta(&sheet.meta)?;

    let mut reducer = judge.create_seeded_reducer(sheet.tally.clone().unwrap_or_default());

    let first_timestamp = sheet.marks.first().map(Mark::timestamp);
    for mark in &sheet.marks {
        reducer.add_mark(mark)?;
        let elapsed_ms = first_timestamp
            .map(|start| mark.timestamp().saturating_sub(start).max(0))
            .unwrap_or(0);
        println!(
            "{}",
            output::format_replay_line(
                mark,
                Duration::from_millis(elapsed_ms as u64),
                &reducer.current_tally(),
                use_colors
            )
        );
    }
    Ok(())
}

enum MarkAction {
    Record { schema: String, value: Option<f64> },
    Undo(u64),
    Clear,
}

fn run_mark(
    config: &Config,
    file: &Path,
    action: MarkAction,
    judge_type: Option<String>,
    judge_id: String,
    use_colors: bool,
) -> Result<()> {
    let sheet = match load_mark_scoresheet(file)? {
        Some(sheet) => sheet,
        None => {
            let Some(ref judge_type) = judge_type else {
                anyhow::bail!("{} does not exist, pass --judge-type to create it", file.display());
            };
            MarkScoresheet::new(JudgeMeta::new(judge_id, judge_type.as_str()))
        }
    };

    let judge = find_judge_type(config, &sheet.meta.judge_type_id)?;
    if let Some(requested) = judge_type {
        find_judge_type(config, &requested)?.check_meta(&sheet.meta)?;
    }

    let mut session = JudgeSession::resume(&judge, sheet)?;
    let mut generator = MarkGenerator::starting_at(session.next_sequence());
    let mark = match action {
        MarkAction::Record { schema, value } => {
            if !judge.accepts_schema(&schema) {
                anyhow::bail!("judge type {} has no mark '{}'", judge.id, schema);
            }
            match value {
                Some(value) => generator.mark_value(schema, value),
                None => generator.mark(schema),
            }
        }
        MarkAction::Undo(target) => generator.undo(target),
        MarkAction::Clear => generator.clear(),
    };
    tracing::debug!(sequence = mark.sequence(), schema = mark.schema(), "recording mark");

    session.record(mark)?;
    let tally = session.tally_scoresheet();
    save_scoresheet(file, &Scoresheet::Marks(session.into_mark_scoresheet()))?;

    println!("{}", output::format_tally(&judge, &tally.meta, &tally.tally, use_colors));
    Ok(())
}
