//! WASM bindings for encounter-engine, powering the browser playtest page.

use wasm_bindgen::prelude::*;

use encounter_engine::core::context::EncounterSite;
use encounter_engine::core::encounter::{Encounter, EncounterStatus};
use encounter_engine::core::library::TemplateLibrary;
use encounter_engine::core::pipeline::{AdvanceOutcome, EncounterEngine, GameSession};
use encounter_engine::core::processor::ExecutionOutcome;
use encounter_engine::schema::player::PlayerState;
use encounter_engine::schema::values::EncounterStateValues;
use encounter_engine::schema::world::{ActionType, LocationArchetype, LocationType, SkillType, TimeSlot};

// ---------------------------------------------------------------------------
// Embedded content, compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const CHOICE_SETS: &str = include_str!("../../content/choice_sets.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
struct SiteInput {
    action: ActionType,
    archetype: LocationArchetype,
    location_type: LocationType,
    #[serde(default)]
    time: Option<TimeSlot>,
    #[serde(default)]
    difficulty: i32,
}

#[derive(serde::Serialize)]
struct ChoiceInfo {
    index: usize,
    name: String,
    description: String,
    available: bool,
    preview: Vec<String>,
}

#[derive(serde::Serialize)]
struct StageInfo {
    number: u32,
    situation: String,
    resolved: Option<usize>,
    choices: Vec<ChoiceInfo>,
}

#[derive(serde::Serialize)]
struct AdvanceInfo {
    advanced: bool,
    reason: Option<String>,
    status: String,
}

#[derive(serde::Serialize)]
struct PickInfo {
    applied: bool,
    messages: Vec<String>,
    unmet: Vec<String>,
    status: String,
}

#[derive(serde::Serialize)]
struct PlayerInfo {
    health: i32,
    physical_energy: i32,
    focus_energy: i32,
    social_energy: i32,
    reputation: i32,
    coins: i32,
    stress: i32,
}

#[derive(serde::Serialize)]
struct StateInfo {
    player: PlayerInfo,
    values: Option<EncounterStateValues>,
    stage: u32,
    status: String,
}

fn status_label(status: EncounterStatus) -> String {
    match status {
        EncounterStatus::Active => "active".to_string(),
        EncounterStatus::Succeeded => "succeeded".to_string(),
        EncounterStatus::Failed(termination) => termination.message().to_string(),
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

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// Main WASM interface
// ---------------------------------------------------------------------------

#[wasm_bindgen]
pub struct EncounterDemo {
    session: GameSession,
}

#[wasm_bindgen]
impl EncounterDemo {
    /// Create a demo session over the shipped content.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<EncounterDemo, JsError> {
        let session = build_session(seed)?;
        Ok(EncounterDemo { session })
    }

    /// Open an encounter described by a JSON string.
    ///
    /// Expected JSON shape:
    /// ```json
    /// {
    ///   "action": "Discuss",
    ///   "archetype": "Tavern",
    ///   "location_type": "Social",
    ///   "time": "Night",
    ///   "difficulty": 1
    /// }
    /// ```
    pub fn start(&mut self, site_json: &str) -> Result<String, JsError> {
        let input: SiteInput = serde_json::from_str(site_json)
            .map_err(|e| JsError::new(&format!("Invalid site JSON: {e}")))?;
        let site = EncounterSite::new(input.action, input.location_type, input.archetype)
            .at(input.time.unwrap_or(TimeSlot::Morning))
            .with_difficulty(input.difficulty);
        let outcome = self
            .session
            .start_encounter(site)
            .map_err(|e| JsError::new(&format!("Start error: {e}")))?;
        to_json(&self.advance_info(outcome))
    }

    /// The current stage as JSON, or `null` when there is none.
    pub fn stage(&self) -> Result<String, JsError> {
        let Some(encounter) = self.session.encounter() else {
            return Ok("null".to_string());
        };
        let Some(stage) = encounter.current_stage() else {
            return Ok("null".to_string());
        };
        let time = encounter.site.time_slot;
        let choices = stage
            .choices
            .iter()
            .map(|choice| ChoiceInfo {
                index: choice.index,
                name: choice.name.clone(),
                description: choice.description.clone(),
                available: choice.unmet_requirements(self.session.player(), time).is_empty(),
                preview: choice
                    .consequences
                    .as_ref()
                    .map(|c| c.preview_lines())
                    .unwrap_or_default(),
            })
            .collect();
        to_json(&StageInfo {
            number: stage.number,
            situation: stage.situation.clone(),
            resolved: stage.resolved,
            choices,
        })
    }

    /// Resolve a choice from the current stage. Returns a JSON result.
    pub fn pick(&mut self, index: usize) -> Result<String, JsError> {
        let outcome = self
            .session
            .choose(index)
            .map_err(|e| JsError::new(&format!("Choice error: {e}")))?;
        let info = match outcome {
            ExecutionOutcome::Applied(summary) => PickInfo {
                applied: true,
                messages: summary.messages(),
                unmet: Vec::new(),
                status: self.status(),
            },
            ExecutionOutcome::RequirementsUnmet(unmet) => PickInfo {
                applied: false,
                messages: Vec::new(),
                unmet: unmet.iter().map(|r| r.description()).collect(),
                status: self.status(),
            },
            ExecutionOutcome::Uncalculated => PickInfo {
                applied: false,
                messages: vec!["Choice has no calculated consequences.".to_string()],
                unmet: Vec::new(),
                status: self.status(),
            },
        };
        to_json(&info)
    }

    /// Generate the next stage. Returns a JSON result.
    pub fn advance(&mut self) -> Result<String, JsError> {
        let outcome = self
            .session
            .advance()
            .map_err(|e| JsError::new(&format!("Advance error: {e}")))?;
        to_json(&self.advance_info(outcome))
    }

    /// Player pools and encounter meters as JSON.
    pub fn state(&self) -> Result<String, JsError> {
        let p = self.session.player();
        let encounter = self.session.encounter();
        to_json(&StateInfo {
            player: PlayerInfo {
                health: p.health,
                physical_energy: p.physical_energy,
                focus_energy: p.focus_energy,
                social_energy: p.social_energy,
                reputation: p.reputation,
                coins: p.coins,
                stress: p.stress,
            },
            values: encounter.map(|e| e.values),
            stage: encounter.map(Encounter::stage_count).unwrap_or(0),
            status: self.status(),
        })
    }

    /// Set one of the player's skill levels, e.g. `set_skill("Charisma", 3)`.
    pub fn set_skill(&mut self, skill: &str, level: i32) -> Result<(), JsError> {
        let skill = parse_skill(skill).ok_or_else(|| JsError::new(&format!("Unknown skill: {skill}")))?;
        self.session.player_mut().skills.insert(skill, level);
        Ok(())
    }

    /// Names of the shipped templates as a JSON array.
    pub fn templates(&self) -> Result<String, JsError> {
        let names: Vec<&str> = self
            .session
            .engine()
            .library()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        to_json(&names)
    }

    /// Start over with a fresh player and a new seed.
    pub fn reset(&mut self, seed: u64) -> Result<(), JsError> {
        self.session = build_session(seed)?;
        Ok(())
    }
}

impl EncounterDemo {
    fn status(&self) -> String {
        match self.session.encounter() {
            Some(encounter) => status_label(encounter.status()),
            None => self
                .session
                .concluded()
                .last()
                .map(|e| status_label(e.status()))
                .unwrap_or_else(|| "idle".to_string()),
        }
    }

    fn advance_info(&self, outcome: AdvanceOutcome) -> AdvanceInfo {
        let (advanced, reason) = match outcome {
            AdvanceOutcome::Advanced(_) => (true, None),
            AdvanceOutcome::NoChoices => (false, Some("No template fits the current situation.".to_string())),
            AdvanceOutcome::Refused(refusal) => (false, Some(format!("{refusal:?}"))),
        };
        AdvanceInfo {
            advanced,
            reason,
            status: self.status(),
        }
    }
}

fn build_session(seed: u64) -> Result<GameSession, JsError> {
    let library = TemplateLibrary::parse_ron(data::CHOICE_SETS)
        .map_err(|e| JsError::new(&format!("Template parse error: {e}")))?;
    let engine = EncounterEngine::builder()
        .seed(seed)
        .with_templates(library)
        .build()
        .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
    Ok(GameSession::new(engine, PlayerState::default()))
}
