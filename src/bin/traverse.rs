//! Generates one battle log per pet: every pet in a roster fights the same
//! dummy opponent in isolation, and the resulting battle log is written to
//! its own file under an output directory. Useful for spot-checking a whole
//! ability pack without hand-building a scenario file per matchup.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use pawscale::cli_support::{self, one_v_one_scenario, CreatureSpec};
use pawscale::{JsonScriptSource, RoundOutcome, ScriptSource};

/// Run every pet in a roster against a fixed dummy opponent and dump one
/// battle log per pet.
#[derive(Parser)]
#[command(name = "pawscale_traverse")]
struct Cli {
    /// Path to a JSON array of pet roster entries.
    pets: PathBuf,

    /// Path to an ability-pack JSON file (abilities, auras).
    #[arg(short, long)]
    ability_pack: PathBuf,

    /// Directory to write `by_pet/pet_<id>.txt` (and, with `--events`,
    /// `events/by_pet/pet_<id>.jsonl`) into.
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Pet id to use as the stationary opponent; defaults to the
    /// lowest-numbered pet in the roster not otherwise under test.
    #[arg(short, long)]
    dummy_pet_id: Option<i64>,

    /// Base seed; pet `id` fights with seed `seed_base + id`.
    #[arg(short, long, default_value_t = 0)]
    seed_base: u64,

    /// Round cap per matchup.
    #[arg(short, long, default_value_t = 100)]
    max_rounds: u32,

    /// Cap the number of pets processed (roster order).
    #[arg(long)]
    max_pets: Option<usize>,

    /// Also write newline-delimited JSON event logs alongside the text logs.
    #[arg(long)]
    events: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let pets_text = fs::read_to_string(&cli.pets).expect("failed to read pet roster");
    let mut roster: Vec<CreatureSpec> = serde_json::from_str(&pets_text).expect("failed to parse pet roster");
    if roster.is_empty() {
        panic!("pet roster is empty");
    }
    if let Some(max_pets) = cli.max_pets {
        roster.truncate(max_pets);
    }

    let dummy_id = cli.dummy_pet_id.unwrap_or_else(|| roster.iter().map(|p| p.id).min().unwrap());
    let dummy = roster
        .iter()
        .find(|p| p.id == dummy_id)
        .unwrap_or_else(|| panic!("dummy pet id {dummy_id} not found in roster"))
        .clone();

    let pack_text = fs::read_to_string(&cli.ability_pack).expect("failed to read ability pack");

    let by_pet_dir = cli.output_dir.join("by_pet");
    fs::create_dir_all(&by_pet_dir).expect("failed to create output directory");
    let by_pet_event_dir = cli.output_dir.join("events").join("by_pet");
    if cli.events {
        fs::create_dir_all(&by_pet_event_dir).expect("failed to create events directory");
    }

    for attacker in &roster {
        if attacker.id == dummy_id {
            continue;
        }

        let scripts: Rc<dyn ScriptSource> =
            Rc::new(JsonScriptSource::from_str(&pack_text).expect("failed to parse ability pack"));
        let seed = cli.seed_base.wrapping_add(attacker.id as u64);
        let scenario = one_v_one_scenario(attacker.clone(), dummy.clone(), seed, cli.max_rounds);
        let mut ctx = scenario.build_context(scripts);
        let (team0_id, team1_id) = scenario.team_ids();

        let run_id = uuid::Uuid::new_v4();
        let outcome = cli_support::run_to_completion(&mut ctx, team0_id, team1_id);
        println!(
            "pet {} (run {run_id}): {} after {} rounds",
            attacker.id,
            outcome_label(outcome),
            ctx.round.round_number
        );

        let text_path = by_pet_dir.join(format!("pet_{}.txt", attacker.id));
        let text_file = fs::File::create(&text_path).expect("failed to create text log");
        ctx.log.write_text(text_file).expect("failed to write text log");

        if cli.events {
            let jsonl_path = by_pet_event_dir.join(format!("pet_{}.jsonl", attacker.id));
            let jsonl_file = fs::File::create(&jsonl_path).expect("failed to create event log");
            ctx.log.write_jsonl(jsonl_file).expect("failed to write event log");
        }
    }
}

fn outcome_label(outcome: RoundOutcome) -> &'static str {
    match outcome {
        RoundOutcome::Ongoing => "ONGOING",
        RoundOutcome::TeamWon(_) => "WON",
        RoundOutcome::Draw => "DRAW",
    }
}
