/// The encounter pipeline: Context → Selector → Factory → Calculator per
/// stage, and Processor when a choice is resolved.
///
/// `EncounterEngine` owns content and the seeded RNG; `GameSession` owns one
/// player and at most one active encounter.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use thiserror::Error;

use crate::core::analysis::EncounterStateAnalysis;
use crate::core::calculator::ConsequenceCalculator;
use crate::core::choice::EncounterChoice;
use crate::core::context::{EncounterContext, EncounterSite};
use crate::core::encounter::{AdvanceRefusal, Encounter, EncounterStatus, Stage};
use crate::core::factory::ChoiceFactory;
use crate::core::library::{ContentError, TemplateLibrary};
use crate::core::processor::{ConsequenceProcessor, ConsequenceSink, ExecutionOutcome, LogSink, Termination};
use crate::core::selector::{TemplateScorer, TemplateSelector, UniformScorer, DEFAULT_CANDIDATE_POOL};
use crate::schema::player::{PlayerPools, PlayerState};
use crate::schema::values::EncounterStateValues;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no active encounter")]
    NoActiveEncounter,
    #[error("an encounter is already in progress")]
    EncounterInProgress,
    #[error("the encounter has concluded")]
    EncounterConcluded,
    #[error("no choice with index {0} in the current stage")]
    ChoiceNotFound(usize),
    #[error("stage {stage} was already resolved by choice {choice}")]
    StageResolved { stage: u32, choice: usize },
}

/// Result of asking for the next stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// A stage with this number was appended.
    Advanced(u32),
    /// No template fits the current state. The encounter stays as it was.
    NoChoices,
    Refused(AdvanceRefusal),
}

/// The top-level choice engine. Built via `EncounterEngine::builder()`.
pub struct EncounterEngine {
    library: TemplateLibrary,
    selector: TemplateSelector,
    factory: ChoiceFactory,
    calculator: ConsequenceCalculator,
    processor: ConsequenceProcessor,
    rng: StdRng,
    seed: u64,
}

/// Builder for constructing an `EncounterEngine`.
pub struct EncounterEngineBuilder {
    seed: u64,
    templates_dirs: Vec<String>,
    templates_files: Vec<String>,
    /// Directly provided templates (for testing without files).
    templates: Option<TemplateLibrary>,
    scorer: Option<Box<dyn TemplateScorer>>,
    candidate_pool: usize,
}

impl EncounterEngine {
    pub fn builder() -> EncounterEngineBuilder {
        EncounterEngineBuilder {
            seed: 0,
            templates_dirs: Vec::new(),
            templates_files: Vec::new(),
            templates: None,
            scorer: None,
            candidate_pool: DEFAULT_CANDIDATE_POOL,
        }
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Open an encounter with fresh meters. No stage is generated yet.
    pub fn start_encounter(&self, site: EncounterSite) -> Encounter {
        tracing::info!(site = %site.label(), "encounter started");
        Encounter::new(site, EncounterStateValues::default())
    }

    /// Build the next stage for an encounter without attaching it.
    pub fn generate_stage(&mut self, encounter: &Encounter, player: &dyn PlayerPools) -> Option<Stage> {
        let number = encounter.stage_count() + 1;
        let context = EncounterContext::new(&encounter.site, player, encounter.values, number);

        let template = self
            .selector
            .select(self.library.iter(), &context, &mut self.rng)?;
        let mut set = self.factory.create_choice_set(template, &context)?;

        for choice in &mut set.choices {
            self.calculator.apply(choice, &context);
        }

        let time = context.time_slot();
        if context.analysis().must_provide_safe_choice
            && !set.choices.iter().any(|c| c.is_safe(player, time))
        {
            let mut fallback = self.factory.create_fallback(set.choices.len(), &context);
            self.calculator.apply(&mut fallback, &context);
            tracing::debug!(template = %set.template_name, "added fallback choice");
            set.choices.push(fallback);
        }

        let situation = format!("{}, stage {}: {}", encounter.site.label(), number, set.template_name);
        Some(Stage::new(number, situation, Some(set.template_name), set.choices))
    }

    /// Append the next stage, unless the encounter is over.
    pub fn advance(&mut self, encounter: &mut Encounter, player: &dyn PlayerPools) -> AdvanceOutcome {
        if let Some(refusal) = encounter.advance_refusal(player) {
            match refusal {
                AdvanceRefusal::Succeeded => {
                    encounter.conclude(EncounterStatus::Succeeded);
                    tracing::info!(site = %encounter.site.label(), "encounter succeeded");
                }
                AdvanceRefusal::HealthDepleted => {
                    encounter.conclude(EncounterStatus::Failed(Termination::HealthDepleted))
                }
                AdvanceRefusal::ReputationDepleted => {
                    encounter.conclude(EncounterStatus::Failed(Termination::ReputationDepleted))
                }
                AdvanceRefusal::Concluded => {}
            }
            return AdvanceOutcome::Refused(refusal);
        }

        match self.generate_stage(encounter, player) {
            Some(stage) => {
                let number = stage.number;
                tracing::info!(
                    stage = number,
                    template = stage.template_name.as_deref().unwrap_or(""),
                    choices = stage.choices.len(),
                    "stage created"
                );
                encounter.push_stage(stage);
                AdvanceOutcome::Advanced(number)
            }
            None => {
                tracing::warn!(site = %encounter.site.label(), "no choices available");
                AdvanceOutcome::NoChoices
            }
        }
    }

    /// Execute a choice from the encounter's current stage. The first applied
    /// choice resolves the stage; further choices wait for `advance`.
    pub fn resolve<P: PlayerPools + ?Sized>(
        &self,
        encounter: &mut Encounter,
        index: usize,
        player: &mut P,
    ) -> Result<ExecutionOutcome, PipelineError> {
        if !encounter.is_active() {
            return Err(PipelineError::EncounterConcluded);
        }
        let stage = encounter.current_stage().ok_or(PipelineError::ChoiceNotFound(index))?;
        if let Some(choice) = stage.resolved {
            return Err(PipelineError::StageResolved {
                stage: stage.number,
                choice,
            });
        }
        let choice: EncounterChoice = stage
            .choice(index)
            .cloned()
            .ok_or(PipelineError::ChoiceNotFound(index))?;

        let outcome = self
            .processor
            .execute(&choice, &encounter.site, &mut encounter.values, player);

        if let ExecutionOutcome::Applied(summary) = &outcome {
            encounter.mark_resolved(index);
            if let Some(consequences) = &choice.consequences {
                encounter.record_modifiers(&consequences.modifiers.named);
            }
            if let Some(termination) = summary.termination {
                encounter.conclude(EncounterStatus::Failed(termination));
            }
        }
        Ok(outcome)
    }
}

impl EncounterEngineBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Load every `.ron` file in a directory. Missing directories are skipped.
    pub fn templates_dir(mut self, path: &str) -> Self {
        self.templates_dirs.push(path.to_string());
        self
    }

    pub fn templates_file(mut self, path: &str) -> Self {
        self.templates_files.push(path.to_string());
        self
    }

    /// Provide templates directly (for testing without files).
    pub fn with_templates(mut self, templates: TemplateLibrary) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn scorer(mut self, scorer: Box<dyn TemplateScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn candidate_pool(mut self, size: usize) -> Self {
        self.candidate_pool = size;
        self
    }

    pub fn build(self) -> Result<EncounterEngine, PipelineError> {
        let mut library = self.templates.unwrap_or_default();

        // Files and directories override directly provided templates by name.
        for dir in &self.templates_dirs {
            let dir = Path::new(dir);
            if dir.exists() {
                library.merge(TemplateLibrary::load_dir(dir)?);
            }
        }
        for file in &self.templates_files {
            library.merge(TemplateLibrary::load_from_ron(Path::new(file))?);
        }

        if library.is_empty() {
            tracing::warn!("encounter engine built with no templates");
        }

        let scorer = self.scorer.unwrap_or_else(|| Box::new(UniformScorer));
        Ok(EncounterEngine {
            library,
            selector: TemplateSelector::new(scorer, self.candidate_pool),
            factory: ChoiceFactory,
            calculator: ConsequenceCalculator,
            processor: ConsequenceProcessor,
            rng: StdRng::seed_from_u64(self.seed),
            seed: self.seed,
        })
    }
}

/// One player, one engine, at most one active encounter.
pub struct GameSession {
    engine: EncounterEngine,
    player: PlayerState,
    encounter: Option<Encounter>,
    concluded: Vec<Encounter>,
    sink: Box<dyn ConsequenceSink>,
}

impl GameSession {
    pub fn new(engine: EncounterEngine, player: PlayerState) -> Self {
        Self {
            engine,
            player,
            encounter: None,
            concluded: Vec::new(),
            sink: Box::new(LogSink),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ConsequenceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn engine(&self) -> &EncounterEngine {
        &self.engine
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn encounter(&self) -> Option<&Encounter> {
        self.encounter.as_ref()
    }

    /// Encounters that ended, oldest first.
    pub fn concluded(&self) -> &[Encounter] {
        &self.concluded
    }

    /// Start an encounter and generate its first stage.
    pub fn start_encounter(&mut self, site: EncounterSite) -> Result<AdvanceOutcome, PipelineError> {
        if self.encounter.is_some() {
            return Err(PipelineError::EncounterInProgress);
        }
        let mut encounter = self.engine.start_encounter(site);
        let outcome = self.engine.advance(&mut encounter, &self.player);
        self.encounter = Some(encounter);
        self.retire_if_concluded();
        Ok(outcome)
    }

    /// Drop the active encounter without concluding it.
    pub fn abandon_encounter(&mut self) -> Option<Encounter> {
        self.encounter.take()
    }

    /// Choices offered by the current stage; empty before the first stage.
    pub fn choices(&self) -> Result<&[EncounterChoice], PipelineError> {
        let encounter = self.encounter.as_ref().ok_or(PipelineError::NoActiveEncounter)?;
        Ok(encounter
            .current_stage()
            .map(|stage| stage.choices.as_slice())
            .unwrap_or(&[]))
    }

    pub fn choose(&mut self, index: usize) -> Result<ExecutionOutcome, PipelineError> {
        let encounter = self.encounter.as_mut().ok_or(PipelineError::NoActiveEncounter)?;
        let outcome = self.engine.resolve(encounter, index, &mut self.player)?;
        if let Some(summary) = outcome.summary() {
            self.sink.deliver(summary);
        }
        self.retire_if_concluded();
        Ok(outcome)
    }

    pub fn advance(&mut self) -> Result<AdvanceOutcome, PipelineError> {
        let encounter = self.encounter.as_mut().ok_or(PipelineError::NoActiveEncounter)?;
        let outcome = self.engine.advance(encounter, &self.player);
        self.retire_if_concluded();
        Ok(outcome)
    }

    pub fn analysis(&self) -> Result<EncounterStateAnalysis, PipelineError> {
        let encounter = self.encounter.as_ref().ok_or(PipelineError::NoActiveEncounter)?;
        Ok(EncounterStateAnalysis::analyze(
            &encounter.values,
            encounter.stage_count(),
            &self.player,
        ))
    }

    fn retire_if_concluded(&mut self) {
        if self.encounter.as_ref().is_some_and(|e| !e.is_active()) {
            if let Some(encounter) = self.encounter.take() {
                tracing::info!(status = ?encounter.status(), stages = encounter.stage_count(), "encounter concluded");
                self.concluded.push(encounter);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::values::ValueType;
    use crate::schema::world::{ActionType, LocationArchetype, LocationType};
    use std::cell::RefCell;
    use std::rc::Rc;

    const TAVERN_RON: &str = r#"[
        ChoiceSet(
            name: "Tavern Gossip",
            action: Discuss,
            archetype: Tavern,
            choices: [
                (archetype: Social, approach: Direct, energy_cost: 1, changes: [(Outcome, 2), (Resonance, 1)]),
                (archetype: Focus, approach: Tactical, energy_cost: 1, changes: [(Insight, 2), (Outcome, 1)]),
                (archetype: Social, approach: Pragmatic, changes: [(Outcome, 1)], requirements: [Coins(3)]),
            ],
        ),
        ChoiceSet(
            name: "Old Songs",
            action: Discuss,
            archetype: Tavern,
            choices: [
                (archetype: Social, approach: Improvised, changes: [(Resonance, 2)]),
            ],
        ),
        ChoiceSet(
            name: "Closing Time",
            action: Discuss,
            archetype: Tavern,
            choices: [
                (archetype: Physical, approach: Direct, changes: [(Outcome, 1), (Pressure, 1)]),
            ],
        ),
    ]"#;

    fn tavern() -> EncounterSite {
        EncounterSite::new(ActionType::Discuss, LocationType::Social, LocationArchetype::Tavern)
    }

    fn engine(seed: u64) -> EncounterEngine {
        EncounterEngine::builder()
            .seed(seed)
            .with_templates(TemplateLibrary::parse_ron(TAVERN_RON).unwrap())
            .build()
            .unwrap()
    }

    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<String>>>);

    impl ConsequenceSink for SharedSink {
        fn deliver(&mut self, summary: &crate::core::processor::ConsequenceSummary) {
            self.0.borrow_mut().extend(summary.messages());
        }
    }

    #[test]
    fn builder_with_seed() {
        let engine = EncounterEngine::builder().seed(12345).build().unwrap();
        assert_eq!(engine.seed(), 12345);
        assert!(engine.library().is_empty());
    }

    #[test]
    fn same_seed_same_selection_sequence() {
        let player = PlayerState::default();
        let mut a = engine(42);
        let mut b = engine(42);
        let encounter = a.start_encounter(tavern());

        let run = |engine: &mut EncounterEngine| -> Vec<Option<String>> {
            (0..10)
                .map(|_| engine.generate_stage(&encounter, &player).and_then(|s| s.template_name))
                .collect()
        };
        assert_eq!(run(&mut a), run(&mut b));
    }

    #[test]
    fn stage_choices_are_calculated() {
        let player = PlayerState::default();
        let mut engine = engine(1);
        let mut encounter = engine.start_encounter(tavern());
        assert_eq!(engine.advance(&mut encounter, &player), AdvanceOutcome::Advanced(1));
        let stage = encounter.current_stage().unwrap();
        assert_eq!(stage.number, 1);
        assert!(stage.choices.iter().all(EncounterChoice::is_calculated));
    }

    #[test]
    fn unknown_site_yields_no_choices() {
        let player = PlayerState::default();
        let mut engine = engine(1);
        let site = EncounterSite::new(ActionType::Gather, LocationType::Nature, LocationArchetype::Forest);
        let mut encounter = engine.start_encounter(site);
        assert_eq!(engine.advance(&mut encounter, &player), AdvanceOutcome::NoChoices);
        assert_eq!(encounter.stage_count(), 0);
    }

    #[test]
    fn session_round_trip() {
        let messages = SharedSink::default();
        let mut session = GameSession::new(
            EncounterEngine::builder()
                .with_templates(
                    TemplateLibrary::parse_ron(TAVERN_RON)
                        .map(|mut lib| {
                            lib.templates.truncate(1);
                            lib
                        })
                        .unwrap(),
                )
                .build()
                .unwrap(),
            PlayerState::default(),
        )
        .with_sink(Box::new(messages.clone()));

        assert!(matches!(session.choices(), Err(PipelineError::NoActiveEncounter)));
        assert_eq!(session.start_encounter(tavern()).unwrap(), AdvanceOutcome::Advanced(1));
        assert!(matches!(
            session.start_encounter(tavern()),
            Err(PipelineError::EncounterInProgress)
        ));
        assert_eq!(session.choices().unwrap().len(), 3);

        let outcome = session.choose(0).unwrap();
        assert!(outcome.is_applied());
        let encounter = session.encounter().unwrap();
        assert_eq!(encounter.values.outcome, 2);
        // Social location adds one resonance.
        assert_eq!(encounter.values.resonance, 2);
        assert_eq!(session.player().social_energy, 9);
        assert!(!encounter.modifier_history().is_empty());
        assert!(messages.0.borrow().iter().any(|m| m == "Choice: +2 Outcome"));

        assert!(matches!(
            session.choose(1),
            Err(PipelineError::StageResolved { stage: 1, choice: 0 })
        ));
        assert_eq!(session.advance().unwrap(), AdvanceOutcome::Advanced(2));
        assert_eq!(session.encounter().unwrap().stage_count(), 2);

        // Coins requirement unmet: a normal outcome that leaves the stage open.
        let outcome = session.choose(2).unwrap();
        assert!(matches!(outcome, ExecutionOutcome::RequirementsUnmet(_)));
        assert!(!session.encounter().unwrap().current_stage().unwrap().is_resolved());
        assert!(matches!(session.choose(9), Err(PipelineError::ChoiceNotFound(9))));
        assert!(session.choose(1).unwrap().is_applied());
    }

    #[test]
    fn a_stage_resolves_only_once() {
        let ron = r#"[
            ChoiceSet(name: "Card Game", action: Discuss, archetype: Tavern,
                choices: [(archetype: Social, approach: Direct, changes: [(Outcome, 2)], rewards: [Coins(5)])]),
        ]"#;
        let engine = EncounterEngine::builder()
            .with_templates(TemplateLibrary::parse_ron(ron).unwrap())
            .build()
            .unwrap();
        let mut session = GameSession::new(engine, PlayerState::default());
        session.start_encounter(tavern()).unwrap();

        assert!(session.choose(0).unwrap().is_applied());
        let values = session.encounter().unwrap().values;
        let coins = session.player().coins;
        let history = session.encounter().unwrap().modifier_history().len();

        for _ in 0..3 {
            assert!(matches!(
                session.choose(0),
                Err(PipelineError::StageResolved { stage: 1, choice: 0 })
            ));
        }
        let encounter = session.encounter().unwrap();
        assert_eq!(encounter.values, values);
        assert_eq!(encounter.stage_count(), 1);
        assert_eq!(encounter.modifier_history().len(), history);
        assert_eq!(session.player().coins, coins);

        assert_eq!(session.advance().unwrap(), AdvanceOutcome::Advanced(2));
        assert!(session.choose(0).unwrap().is_applied());
    }

    #[test]
    fn success_ends_the_encounter() {
        let mut session = GameSession::new(engine(3), PlayerState::default());
        session.start_encounter(tavern()).unwrap();
        session.encounter.as_mut().unwrap().values.outcome = 10;

        assert_eq!(
            session.advance().unwrap(),
            AdvanceOutcome::Refused(AdvanceRefusal::Succeeded)
        );
        assert!(session.encounter().is_none());
        assert_eq!(session.concluded()[0].status(), EncounterStatus::Succeeded);
        assert!(matches!(session.advance(), Err(PipelineError::NoActiveEncounter)));
    }

    #[test]
    fn lethal_cost_terminates() {
        let ron = r#"[
            ChoiceSet(name: "Brawl", action: Discuss, archetype: Tavern,
                choices: [(archetype: Physical, approach: Direct, changes: [(Outcome, 1)], costs: [Health(2)])]),
        ]"#;
        let engine = EncounterEngine::builder()
            .with_templates(TemplateLibrary::parse_ron(ron).unwrap())
            .build()
            .unwrap();
        let mut player = PlayerState::default();
        player.health = 4;
        let mut session = GameSession::new(engine, player);
        session.start_encounter(tavern()).unwrap();
        session.player_mut().health = 1;

        let outcome = session.choose(0).unwrap();
        assert_eq!(
            outcome.summary().unwrap().termination,
            Some(Termination::HealthDepleted)
        );
        assert!(session.encounter().is_none());
        assert_eq!(
            session.concluded()[0].status(),
            EncounterStatus::Failed(Termination::HealthDepleted)
        );
    }

    #[test]
    fn fallback_added_when_no_safe_choice() {
        let ron = r#"[
            ChoiceSet(name: "Cornered", action: Discuss, archetype: Tavern,
                choices: [
                    (archetype: Social, approach: Direct, changes: [(Outcome, 2), (Pressure, -1)]),
                    (archetype: Social, approach: Pragmatic, changes: [(Outcome, 1)], requirements: [Coins(50)]),
                ]),
        ]"#;
        let mut engine = EncounterEngine::builder()
            .with_templates(TemplateLibrary::parse_ron(ron).unwrap())
            .build()
            .unwrap();
        let mut player = PlayerState::default();
        player.health = 3;
        let mut encounter = engine.start_encounter(tavern());
        engine.advance(&mut encounter, &player);

        let stage = encounter.current_stage().unwrap();
        assert_eq!(stage.choices.len(), 3);
        let fallback = stage.choices.last().unwrap();
        assert_eq!(fallback.name, "Regroup");
        assert_eq!(fallback.index, 2);
        assert!(fallback.is_safe(&player, encounter.site.time_slot));
        assert_eq!(
            fallback.consequences.as_ref().unwrap().modified_change(ValueType::Insight),
            1
        );
    }

    #[test]
    fn no_fallback_when_healthy() {
        let ron = r#"[
            ChoiceSet(name: "Cornered", action: Discuss, archetype: Tavern,
                choices: [(archetype: Social, approach: Direct, changes: [(Outcome, 2), (Pressure, -1)])]),
        ]"#;
        let mut engine = EncounterEngine::builder()
            .with_templates(TemplateLibrary::parse_ron(ron).unwrap())
            .build()
            .unwrap();
        let player = PlayerState::default();
        let mut encounter = engine.start_encounter(tavern());
        engine.advance(&mut encounter, &player);
        assert_eq!(encounter.current_stage().unwrap().choices.len(), 1);
    }

    #[test]
    fn builder_loads_shipped_content() {
        let engine = EncounterEngine::builder()
            .templates_dir("content")
            .templates_dir("does/not/exist")
            .build()
            .unwrap();
        assert!(engine.library().get("Tavern Gossip").is_some());
        let direct = TemplateLibrary::load_dir(Path::new("content")).unwrap();
        assert_eq!(engine.library().len(), direct.len());
    }

    #[test]
    fn directory_templates_override_provided_ones() {
        let provided = r#"[
            ChoiceSet(name: "Tavern Gossip", action: Discuss, archetype: Tavern,
                choices: [(archetype: Social, approach: Direct, changes: [(Outcome, 1)])]),
            ChoiceSet(name: "Card Game", action: Discuss, archetype: Tavern,
                choices: [(archetype: Social, approach: Direct, changes: [(Outcome, 1)])]),
        ]"#;
        let engine = EncounterEngine::builder()
            .with_templates(TemplateLibrary::parse_ron(provided).unwrap())
            .templates_dir("content")
            .build()
            .unwrap();
        assert_eq!(engine.library().templates[0].name, "Tavern Gossip");
        assert!(engine.library().templates[0].patterns.len() > 1);
        assert_eq!(engine.library().templates[1].name, "Card Game");
    }

    #[test]
    fn missing_templates_file_is_an_error() {
        let result = EncounterEngine::builder()
            .templates_file("does/not/exist.ron")
            .build();
        assert!(matches!(result, Err(PipelineError::Content(ContentError::Io(_)))));
    }
}
