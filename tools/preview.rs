/// Preview - interactive encounter shell for playtesting templates.
///
/// Usage: preview --templates <path> [--seed <n>]
///
/// Commands:
///   start <action> <archetype> [location_type] [time]  - open an encounter
///   choices                    - list the current stage's choices
///   pick <n>                   - resolve a choice
///   next                       - generate the next stage
///   state                      - show meters, player pools and analysis
///   skill <name> <level>       - set a player skill
///   help                       - list commands
///   quit                       - exit
///
/// Set RUST_LOG to change log verbosity (default: encounter_engine=info).

use encounter_engine::core::context::EncounterSite;
use encounter_engine::core::encounter::EncounterStatus;
use encounter_engine::core::pipeline::{AdvanceOutcome, EncounterEngine, GameSession};
use encounter_engine::core::processor::ExecutionOutcome;
use encounter_engine::schema::player::PlayerState;
use encounter_engine::schema::world::{ActionType, LocationArchetype, LocationType, SkillType, TimeSlot};
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encounter_engine=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut templates_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--templates" if i + 1 < args.len() => {
                i += 1;
                templates_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = EncounterEngine::builder().seed(seed);
    if let Some(ref path) = templates_path {
        builder = if Path::new(path).is_dir() {
            builder.templates_dir(path)
        } else {
            builder.templates_file(path)
        };
    }
    let engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loaded {} templates", engine.library().len());
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let mut session = GameSession::new(engine, PlayerState::default());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "start" => {
                if parts.len() < 3 {
                    println!("Usage: start <action> <archetype> [location_type] [time]");
                    continue;
                }
                let Some(action) = parse_action(parts[1]) else {
                    println!("Unknown action: {}", parts[1]);
                    continue;
                };
                let Some(archetype) = parse_archetype(parts[2]) else {
                    println!("Unknown archetype: {}", parts[2]);
                    continue;
                };
                let location_type = match parts.get(3) {
                    Some(s) => match parse_location_type(s) {
                        Some(t) => t,
                        None => {
                            println!("Unknown location type: {}", s);
                            continue;
                        }
                    },
                    None => default_location_type(archetype),
                };
                let time = match parts.get(4) {
                    Some(s) => match parse_time(s) {
                        Some(t) => t,
                        None => {
                            println!("Unknown time: {}", s);
                            continue;
                        }
                    },
                    None => TimeSlot::Morning,
                };

                let site = EncounterSite::new(action, location_type, archetype).at(time);
                match session.start_encounter(site) {
                    Ok(outcome) => {
                        report_advance(outcome);
                        print_choices(&session);
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "choices" | "c" => print_choices(&session),
            "pick" | "p" => {
                let Some(index) = parts.get(1).and_then(|s| s.parse::<usize>().ok()) else {
                    println!("Usage: pick <n>");
                    continue;
                };
                match session.choose(index) {
                    Ok(ExecutionOutcome::Applied(summary)) => {
                        println!("\n--- {} ---", summary.choice_name);
                        for message in summary.messages() {
                            println!("  {}", message);
                        }
                        println!();
                    }
                    Ok(ExecutionOutcome::RequirementsUnmet(unmet)) => {
                        for requirement in unmet {
                            println!("  Not met: {}", requirement.description());
                        }
                    }
                    Ok(ExecutionOutcome::Uncalculated) => println!("Choice has no calculated consequences."),
                    Err(e) => println!("ERROR: {}", e),
                }
                if session.encounter().is_none() {
                    if let Some(last) = session.concluded().last() {
                        print_status(last.status());
                    }
                }
            }
            "next" | "n" => match session.advance() {
                Ok(outcome) => {
                    report_advance(outcome);
                    if matches!(outcome, AdvanceOutcome::Advanced(_)) {
                        print_choices(&session);
                    } else if let Some(last) = session.concluded().last() {
                        print_status(last.status());
                    }
                }
                Err(e) => println!("ERROR: {}", e),
            },
            "state" | "s" => print_state(&session),
            "skill" => {
                let skill = parts.get(1).and_then(|s| parse_skill(s));
                let level = parts.get(2).and_then(|s| s.parse::<i32>().ok());
                match (skill, level) {
                    (Some(skill), Some(level)) => {
                        session.player_mut().skills.insert(skill, level);
                        println!("{} set to {}", skill.label(), level);
                    }
                    _ => println!("Usage: skill <name> <level>"),
                }
            }
            _ => println!("Unknown command: {}. Type 'help' for commands.", cmd),
        }
    }
}

fn report_advance(outcome: AdvanceOutcome) {
    match outcome {
        AdvanceOutcome::Advanced(n) => println!("\n=== Stage {} ===", n),
        AdvanceOutcome::NoChoices => println!("No template fits the current situation."),
        AdvanceOutcome::Refused(reason) => println!("Cannot continue: {:?}", reason),
    }
}

fn print_status(status: EncounterStatus) {
    match status {
        EncounterStatus::Active => {}
        EncounterStatus::Succeeded => println!("The encounter is a success."),
        EncounterStatus::Failed(termination) => println!("{}", termination.message()),
    }
}

fn print_choices(session: &GameSession) {
    let Some(encounter) = session.encounter() else {
        println!("No active encounter.");
        return;
    };
    let Some(stage) = encounter.current_stage() else {
        println!("No stage yet. Use 'next'.");
        return;
    };
    println!("{}", stage.situation);
    for choice in &stage.choices {
        let unmet = choice.unmet_requirements(session.player(), encounter.site.time_slot);
        let marker = match stage.resolved {
            Some(resolved) if resolved == choice.index => "*",
            Some(_) => "-",
            None if unmet.is_empty() => " ",
            None => "x",
        };
        println!("  [{}]{} {} - {}", choice.index, marker, choice.name, choice.description);
        if let Some(consequences) = &choice.consequences {
            for line in consequences.preview_lines() {
                println!("        {}", line);
            }
        }
    }
    if stage.is_resolved() {
        println!("Stage resolved. Use 'next'.");
    }
    println!();
}

fn print_state(session: &GameSession) {
    let p = session.player();
    println!(
        "Player: health {} | energy P{} F{} S{} | reputation {} | coins {} | stress {}",
        p.health, p.physical_energy, p.focus_energy, p.social_energy, p.reputation, p.coins, p.stress
    );
    let Some(encounter) = session.encounter() else {
        println!("No active encounter.");
        return;
    };
    let v = encounter.values;
    println!(
        "Meters: outcome {} | pressure {} | insight {} | resonance {}",
        v.outcome, v.pressure, v.insight, v.resonance
    );
    if let Ok(a) = session.analysis() {
        println!(
            "Analysis: critical={} escape={} winnable={} escalate={} safe_left={} must_be_safe={}",
            a.is_critical,
            a.has_escape_route,
            a.is_winnable,
            a.requires_escalation,
            a.safe_choices_remaining,
            a.must_provide_safe_choice
        );
    }
}

fn parse_action(s: &str) -> Option<ActionType> {
    ActionType::all()
        .into_iter()
        .find(|a| a.label().eq_ignore_ascii_case(s))
}

fn parse_archetype(s: &str) -> Option<LocationArchetype> {
    LocationArchetype::all()
        .into_iter()
        .find(|a| a.label().eq_ignore_ascii_case(s))
}

fn parse_location_type(s: &str) -> Option<LocationType> {
    match s.to_lowercase().as_str() {
        "industrial" => Some(LocationType::Industrial),
        "social" => Some(LocationType::Social),
        "nature" => Some(LocationType::Nature),
        "commercial" => Some(LocationType::Commercial),
        "residential" => Some(LocationType::Residential),
        "sacred" => Some(LocationType::Sacred),
        _ => None,
    }
}

fn default_location_type(archetype: LocationArchetype) -> LocationType {
    match archetype {
        LocationArchetype::Workshop | LocationArchetype::Docks => LocationType::Industrial,
        LocationArchetype::Tavern => LocationType::Social,
        LocationArchetype::Forest | LocationArchetype::Farm => LocationType::Nature,
        LocationArchetype::Market => LocationType::Commercial,
        LocationArchetype::Library | LocationArchetype::Road => LocationType::Residential,
        LocationArchetype::Temple => LocationType::Sacred,
    }
}

fn parse_time(s: &str) -> Option<TimeSlot> {
    match s.to_lowercase().as_str() {
        "morning" => Some(TimeSlot::Morning),
        "afternoon" => Some(TimeSlot::Afternoon),
        "evening" => Some(TimeSlot::Evening),
        "night" => Some(TimeSlot::Night),
        _ => None,
    }
}

fn parse_skill(s: &str) -> Option<SkillType> {
    [
        SkillType::Strength,
        SkillType::Endurance,
        SkillType::Perception,
        SkillType::Scholarship,
        SkillType::Charisma,
        SkillType::Haggling,
        SkillType::Service,
    ]
    .into_iter()
    .find(|skill| skill.label().eq_ignore_ascii_case(s))
}

fn print_usage() {
    println!("Usage: preview --templates <path> [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  start <action> <archetype> [location_type] [time]  - open an encounter");
    println!("  choices                    - list the current stage's choices");
    println!("  pick <n>                   - resolve a choice");
    println!("  next                       - generate the next stage");
    println!("  state                      - show meters, player pools and analysis");
    println!("  skill <name> <level>       - set a player skill");
    println!("  help                       - list commands");
    println!("  quit                       - exit");
}
