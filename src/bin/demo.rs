//! Runs a single scenario to completion, printing a round-by-round summary,
//! then writes the full battle log to a file or stdout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, ValueEnum};
use pawscale::cli_support::{self, ScenarioFile};
use pawscale::{BattleLoop, BattleLog, JsonScriptSource, RoundOutcome, ScriptSource};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Jsonl,
}

/// Run one scripted battle and show what happened.
#[derive(Parser)]
#[command(name = "pawscale_demo")]
struct Cli {
    /// Path to a scenario JSON file (teams, creatures, seed).
    scenario: PathBuf,

    /// Path to an ability-pack JSON file (abilities, auras).
    #[arg(short, long)]
    ability_pack: PathBuf,

    /// Battle log format.
    #[arg(short, long, value_enum, default_value = "text")]
    format: LogFormat,

    /// Write the battle log here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let run_id = uuid::Uuid::new_v4();
    println!("run {run_id}");

    let scenario_text = fs::read_to_string(&cli.scenario).expect("failed to read scenario file");
    let scenario: ScenarioFile = serde_json::from_str(&scenario_text).expect("failed to parse scenario");

    let pack_text = fs::read_to_string(&cli.ability_pack).expect("failed to read ability pack");
    let scripts: Rc<dyn ScriptSource> =
        Rc::new(JsonScriptSource::from_str(&pack_text).expect("failed to parse ability pack"));

    let mut ctx = scenario.build_context(scripts);
    let (team0_id, team1_id) = scenario.team_ids();

    loop {
        let action0 = cli_support::first_legal_action(&ctx, team0_id);
        let action1 = cli_support::first_legal_action(&ctx, team1_id);
        println!(
            "round {}: team {} -> {:?}, team {} -> {:?}",
            ctx.round.round_number + 1,
            team0_id,
            action0,
            team1_id,
            action1
        );
        let outcome = BattleLoop::run_round(&mut ctx, team0_id, team1_id, action0, action1);
        match outcome {
            RoundOutcome::Ongoing => continue,
            RoundOutcome::TeamWon(id) => {
                println!("team {id} wins after {} rounds", ctx.round.round_number);
                break;
            }
            RoundOutcome::Draw => {
                println!("draw after {} rounds", ctx.round.round_number);
                break;
            }
        }
    }

    write_log(&ctx.log, cli.format, cli.output.as_deref())
}

fn write_log(log: &BattleLog, format: LogFormat, output: Option<&Path>) -> io::Result<()> {
    match output {
        Some(path) => {
            let file = fs::File::create(path)?;
            match format {
                LogFormat::Text => log.write_text(file),
                LogFormat::Jsonl => log.write_jsonl(file),
            }
        }
        None => {
            let stdout = io::stdout();
            let handle = stdout.lock();
            match format {
                LogFormat::Text => log.write_text(handle),
                LogFormat::Jsonl => log.write_jsonl(handle),
            }
        }
    }
}
