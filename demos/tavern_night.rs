/// A scripted night at the tavern: the player always takes the available
/// choice with the best projected outcome until the encounter ends.
///
/// Run with: cargo run --example tavern_night

use encounter_engine::core::context::EncounterSite;
use encounter_engine::core::pipeline::{AdvanceOutcome, EncounterEngine, GameSession, PipelineError};
use encounter_engine::schema::player::PlayerState;
use encounter_engine::schema::world::{ActionType, LocationArchetype, LocationType, SkillType, TimeSlot};

const MAX_STAGES: u32 = 12;

fn main() -> Result<(), PipelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encounter_engine=warn".into()),
        )
        .init();

    let engine = EncounterEngine::builder()
        .seed(2024)
        .templates_dir("content")
        .build()?;

    let mut player = PlayerState::default().with_skill(SkillType::Charisma, 2);
    player.coins = 12;
    let mut session = GameSession::new(engine, player);

    let site = EncounterSite::new(ActionType::Discuss, LocationType::Social, LocationArchetype::Tavern)
        .at(TimeSlot::Night)
        .with_difficulty(1);

    let mut outcome = session.start_encounter(site)?;
    while let AdvanceOutcome::Advanced(number) = outcome {
        let Some(encounter) = session.encounter() else { break };
        let time = encounter.site.time_slot;
        let Some(stage) = encounter.current_stage() else { break };
        println!("\n{}", stage.situation);

        let best = stage
            .choices
            .iter()
            .filter(|c| c.unmet_requirements(session.player(), time).is_empty())
            .max_by_key(|c| c.consequences.as_ref().map(|q| q.projected.outcome).unwrap_or(0));
        let Some(choice) = best else {
            println!("  Nothing the player can afford.");
            break;
        };
        println!("  > {} ({})", choice.name, choice.description);

        let index = choice.index;
        if let Some(summary) = session.choose(index)?.summary() {
            for message in summary.messages() {
                println!("    {}", message);
            }
        }

        if number >= MAX_STAGES {
            break;
        }
        outcome = match session.advance() {
            Ok(next) => next,
            Err(PipelineError::NoActiveEncounter) => break,
            Err(e) => return Err(e),
        };
    }

    if let AdvanceOutcome::Refused(reason) = outcome {
        println!("\nThe night ends: {:?}", reason);
    }
    let p = session.player();
    println!(
        "Player: health {} | social energy {} | reputation {} | coins {}",
        p.health, p.social_energy, p.reputation, p.coins
    );
    Ok(())
}
