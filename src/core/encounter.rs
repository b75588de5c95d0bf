use serde::{Deserialize, Serialize};

use crate::core::choice::EncounterChoice;
use crate::core::context::EncounterSite;
use crate::core::processor::Termination;
use crate::schema::player::{PlayerPools, Pool};
use crate::schema::values::{EncounterStateValues, METER_MAX};

/// One turn of an encounter: a situation and the choices offered for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub number: u32,
    pub situation: String,
    pub template_name: Option<String>,
    pub choices: Vec<EncounterChoice>,
    /// Index of the choice that was applied. A stage is resolved at most once.
    #[serde(default)]
    pub resolved: Option<usize>,
}

impl Stage {
    pub fn new(number: u32, situation: String, template_name: Option<String>, choices: Vec<EncounterChoice>) -> Self {
        Self {
            number,
            situation,
            template_name,
            choices,
            resolved: None,
        }
    }

    pub fn choice(&self, index: usize) -> Option<&EncounterChoice> {
        self.choices.iter().find(|c| c.index == index)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterStatus {
    Active,
    Succeeded,
    Failed(Termination),
}

/// Why an encounter cannot take another stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceRefusal {
    Succeeded,
    HealthDepleted,
    ReputationDepleted,
    Concluded,
}

/// An ordered, append-only sequence of stages plus the meters they act on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub site: EncounterSite,
    pub values: EncounterStateValues,
    stages: Vec<Stage>,
    status: EncounterStatus,
    modifier_history: Vec<(String, i32)>,
}

impl Encounter {
    pub fn new(site: EncounterSite, values: EncounterStateValues) -> Self {
        Self {
            site,
            values,
            stages: Vec::new(),
            status: EncounterStatus::Active,
            modifier_history: Vec::new(),
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.last()
    }

    /// Number of stages generated so far.
    pub fn stage_count(&self) -> u32 {
        self.stages.len() as u32
    }

    pub fn status(&self) -> EncounterStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == EncounterStatus::Active
    }

    pub fn modifier_history(&self) -> &[(String, i32)] {
        &self.modifier_history
    }

    pub(crate) fn push_stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    /// Mark the current stage as resolved by `index`.
    pub(crate) fn mark_resolved(&mut self, index: usize) {
        if let Some(stage) = self.stages.last_mut() {
            stage.resolved = Some(index);
        }
    }

    pub(crate) fn record_modifiers(&mut self, named: &[(String, i32)]) {
        self.modifier_history.extend(named.iter().cloned());
    }

    pub(crate) fn conclude(&mut self, status: EncounterStatus) {
        self.status = status;
    }

    /// Why another stage may not be generated, if anything.
    pub fn advance_refusal<P: PlayerPools + ?Sized>(&self, player: &P) -> Option<AdvanceRefusal> {
        match self.status {
            EncounterStatus::Succeeded | EncounterStatus::Failed(_) => Some(AdvanceRefusal::Concluded),
            EncounterStatus::Active if self.values.outcome >= METER_MAX => Some(AdvanceRefusal::Succeeded),
            EncounterStatus::Active if player.pool(Pool::Health) <= 0 => Some(AdvanceRefusal::HealthDepleted),
            EncounterStatus::Active if player.pool(Pool::Reputation) <= 0 => {
                Some(AdvanceRefusal::ReputationDepleted)
            }
            EncounterStatus::Active => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::player::PlayerState;
    use crate::schema::world::{ActionType, LocationArchetype, LocationType};

    fn encounter() -> Encounter {
        let site = EncounterSite::new(ActionType::Rest, LocationType::Residential, LocationArchetype::Road);
        Encounter::new(site, EncounterStateValues::default())
    }

    #[test]
    fn stages_append_in_order() {
        let mut e = encounter();
        for number in 1..=3 {
            e.push_stage(Stage::new(number, format!("Stage {}", number), None, vec![]));
        }
        assert_eq!(e.stage_count(), 3);
        assert_eq!(e.current_stage().unwrap().number, 3);
        let numbers: Vec<u32> = e.stages().iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn only_the_current_stage_is_marked_resolved() {
        let mut e = encounter();
        e.mark_resolved(0);
        assert_eq!(e.stage_count(), 0);

        e.push_stage(Stage::new(1, "First".to_string(), None, vec![]));
        e.push_stage(Stage::new(2, "Second".to_string(), None, vec![]));
        e.mark_resolved(1);
        assert!(!e.stages()[0].is_resolved());
        assert_eq!(e.current_stage().unwrap().resolved, Some(1));
    }

    #[test]
    fn stages_saved_before_resolution_tracking_still_load() {
        let ron = r#"(number: 1, situation: "Old", template_name: None, choices: [])"#;
        let stage: Stage = ron::from_str(ron).unwrap();
        assert!(!stage.is_resolved());
    }

    #[test]
    fn refusal_reasons() {
        let mut e = encounter();
        let mut player = PlayerState::default();
        assert_eq!(e.advance_refusal(&player), None);

        player.reputation = 0;
        assert_eq!(e.advance_refusal(&player), Some(AdvanceRefusal::ReputationDepleted));
        player.health = 0;
        assert_eq!(e.advance_refusal(&player), Some(AdvanceRefusal::HealthDepleted));

        e.values.outcome = 10;
        assert_eq!(e.advance_refusal(&player), Some(AdvanceRefusal::Succeeded));

        e.conclude(EncounterStatus::Succeeded);
        assert_eq!(e.advance_refusal(&player), Some(AdvanceRefusal::Concluded));
    }

    #[test]
    fn modifier_history_accumulates() {
        let mut e = encounter();
        e.record_modifiers(&[("Skill Level".to_string(), 2)]);
        e.record_modifiers(&[("Insight Reduction".to_string(), -1)]);
        assert_eq!(e.modifier_history().len(), 2);
        assert_eq!(e.modifier_history()[1].0, "Insight Reduction");
    }
}
