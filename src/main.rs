use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use riichi::config::BotConfig;
use riichi::consts::{MAX_VERSION, obs_shape};
use riichi::mjai::{Bot, Event};

#[derive(Parser)]
#[command(name = "riichi-bot")]
#[command(about = "Replays mjai logs through the decision core of a riichi bot")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow one seat through an mjai log and report every decision point
    Replay {
        /// Input mjai log, one event per line (.json or .json.gz)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Absolute seat to follow
        #[arg(short, long, default_value_t = 0)]
        seat: u8,

        /// Observation encoding version
        #[arg(long, default_value_t = MAX_VERSION)]
        version: u32,

        /// Dump the tracked state at every decision point
        #[arg(short, long)]
        brief: bool,
    },
    /// Print the observation shape of an encoding version
    Shape {
        #[arg(default_value_t = MAX_VERSION)]
        version: u32,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::Replay {
            input,
            seat,
            version,
            brief,
        } => replay(&input, BotConfig::new(seat, version), brief),
        Command::Shape { version } => {
            let (channels, width) = obs_shape(version)?;
            println!("{channels}x{width}");
            Ok(())
        }
    }
}

fn open_log(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let is_gz = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with("gz"));
    let reader: Box<dyn Read> = if is_gz {
        Box::new(flate2::read::GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

fn replay(input: &Path, config: BotConfig, brief: bool) -> Result<()> {
    let mut bot = Bot::from_config(config)?;
    let lines = open_log(input)?
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("failed to read {}", input.display()))?;
    let lines: Vec<_> = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();

    let mut decisions = 0;
    let mut illegal = 0;
    for (i, line) in lines.iter().enumerate() {
        let cans = bot
            .react(line)
            .with_context(|| format!("at line {}", i + 1))?;
        let Some(cans) = cans else {
            continue;
        };
        decisions += 1;

        if brief {
            println!("{}", bot.state().brief_info());
        }
        let candidates = bot.state().candidates()?;
        println!("line {}: {} candidates", i + 1, candidates.len());
        for candidate in &candidates {
            println!("  {}", serde_json::to_string(candidate)?);
        }

        // whatever the seat did next in the log, or a pass if it did nothing.
        // Logs leave the actor out of an abortive draw.
        let pass = Event::None {
            actor: Some(config.player_id),
        };
        let taken = match lines.get(i + 1) {
            Some(next) => match serde_json::from_str(next)? {
                Event::Ryukyoku { actor: None, deltas } if cans.can_ryukyoku => Event::Ryukyoku {
                    actor: Some(config.player_id),
                    deltas,
                },
                event if event.actor() == Some(config.player_id) => event,
                _ => pass,
            },
            None => pass,
        };
        match bot.state().validate_reaction(&taken) {
            Ok(()) => println!("  taken: {}", serde_json::to_string(&taken)?),
            Err(err) => {
                illegal += 1;
                println!("  taken: {} (illegal: {err})", serde_json::to_string(&taken)?);
            }
        }
    }

    info!(
        "replayed {} events for seat {}: {decisions} decisions, {illegal} illegal",
        lines.len(),
        config.player_id,
    );
    Ok(())
}
