/// Runtime choice instances and their calculated consequences.

use serde::{Deserialize, Serialize};

use crate::schema::outcome::Outcome;
use crate::schema::player::PlayerPools;
use crate::schema::requirement::Requirement;
use crate::schema::template::{ChoiceApproach, ChoiceArchetype};
use crate::schema::values::{EncounterStateValues, ValueChange, ValueType};
use crate::schema::world::{SkillType, TimeSlot};

/// Aggregated scalar modifiers for one choice, plus the named ledger in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceValueModifiers {
    pub outcome: i32,
    pub pressure_gain: i32,
    pub insight_gain: i32,
    pub resonance_gain: i32,
    pub energy_cost: i32,
    pub named: Vec<(String, i32)>,
}

impl ChoiceValueModifiers {
    /// The scalar that applies to value changes of the given meter.
    pub fn for_value(&self, value_type: ValueType) -> i32 {
        match value_type {
            ValueType::Outcome => self.outcome,
            ValueType::Pressure => self.pressure_gain,
            ValueType::Insight => self.insight_gain,
            ValueType::Resonance => self.resonance_gain,
        }
    }

    pub(crate) fn add(&mut self, target: ModifierTarget, label: &str, amount: i32) {
        match target {
            ModifierTarget::Value(ValueType::Outcome) => self.outcome += amount,
            ModifierTarget::Value(ValueType::Pressure) => self.pressure_gain += amount,
            ModifierTarget::Value(ValueType::Insight) => self.insight_gain += amount,
            ModifierTarget::Value(ValueType::Resonance) => self.resonance_gain += amount,
            ModifierTarget::EnergyCost => self.energy_cost += amount,
        }
        self.named.push((label.to_string(), amount));
    }
}

/// What a named modifier feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModifierTarget {
    Value(ValueType),
    EnergyCost,
}

/// The preview ledger for one meter: "Base" first, then each modifier
/// source that touched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChangeDetail {
    pub value_type: ValueType,
    pub entries: Vec<(String, i32)>,
}

impl ValueChangeDetail {
    pub fn total(&self) -> i32 {
        self.entries.iter().map(|(_, amount)| amount).sum()
    }
}

/// One recalculated requirement, cost or reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub source: String,
    pub original: String,
    pub modified: String,
    pub amount: i32,
}

/// The computed projection of one choice.
///
/// Execution works from the `modified_*` lists; nothing here is re-derived
/// after calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceConsequences {
    pub base_value_changes: Vec<ValueChange>,
    pub modified_value_changes: Vec<ValueChange>,
    pub base_requirements: Vec<Requirement>,
    pub modified_requirements: Vec<Requirement>,
    pub base_costs: Vec<Outcome>,
    pub modified_costs: Vec<Outcome>,
    pub base_rewards: Vec<Outcome>,
    pub modified_rewards: Vec<Outcome>,
    pub modifiers: ChoiceValueModifiers,
    pub value_change_details: Vec<ValueChangeDetail>,
    pub requirement_adjustments: Vec<Adjustment>,
    pub cost_adjustments: Vec<Adjustment>,
    pub reward_adjustments: Vec<Adjustment>,
    /// Meters after the modified value changes are applied and clamped.
    pub projected: EncounterStateValues,
}

impl ChoiceConsequences {
    pub fn modified_change(&self, value_type: ValueType) -> i32 {
        self.modified_value_changes
            .iter()
            .filter(|c| c.value_type == value_type)
            .map(|c| c.amount)
            .sum()
    }

    pub fn detail(&self, value_type: ValueType) -> Option<&ValueChangeDetail> {
        self.value_change_details
            .iter()
            .find(|d| d.value_type == value_type)
    }

    /// Human-readable preview lines for the narrative and UI layers.
    pub fn preview_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .modified_value_changes
            .iter()
            .map(ValueChange::preview)
            .collect();
        lines.extend(self.modified_requirements.iter().map(Requirement::description));
        lines.extend(self.modified_costs.iter().map(|c| c.preview(true)));
        lines.extend(self.modified_rewards.iter().map(|r| r.preview(false)));
        lines
    }
}

/// A selectable action offered in one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterChoice {
    pub index: usize,
    pub name: String,
    pub description: String,
    pub archetype: ChoiceArchetype,
    pub approach: ChoiceApproach,
    pub skill: Option<SkillType>,
    pub value_changes: Vec<ValueChange>,
    pub requirements: Vec<Requirement>,
    pub costs: Vec<Outcome>,
    pub rewards: Vec<Outcome>,
    pub consequences: Option<ChoiceConsequences>,
}

impl EncounterChoice {
    pub fn is_calculated(&self) -> bool {
        self.consequences.is_some()
    }

    /// Requirements the player currently fails, read from the modified list
    /// when calculated and the base list otherwise.
    pub fn unmet_requirements<P: PlayerPools + ?Sized>(&self, player: &P, time: TimeSlot) -> Vec<Requirement> {
        let requirements = match &self.consequences {
            Some(c) => &c.modified_requirements,
            None => &self.requirements,
        };
        requirements
            .iter()
            .filter(|r| !r.is_satisfied(player, time))
            .cloned()
            .collect()
    }

    /// A safe choice can be taken right now and lowers no meter.
    pub fn is_safe<P: PlayerPools + ?Sized>(&self, player: &P, time: TimeSlot) -> bool {
        let changes = match &self.consequences {
            Some(c) => &c.modified_value_changes,
            None => &self.value_changes,
        };
        self.unmet_requirements(player, time).is_empty() && changes.iter().all(|c| c.amount >= 0)
    }
}

/// The choices generated for one stage from one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSet {
    pub template_name: String,
    pub choices: Vec<EncounterChoice>,
}

impl ChoiceSet {
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::player::PlayerState;
    use crate::schema::world::EnergyType;

    fn choice(changes: Vec<ValueChange>, requirements: Vec<Requirement>) -> EncounterChoice {
        EncounterChoice {
            index: 0,
            name: "Physical - Direct".to_string(),
            description: String::new(),
            archetype: ChoiceArchetype::Physical,
            approach: ChoiceApproach::Direct,
            skill: None,
            value_changes: changes,
            requirements,
            costs: vec![],
            rewards: vec![],
            consequences: None,
        }
    }

    #[test]
    fn modifier_ledger_keeps_insertion_order() {
        let mut m = ChoiceValueModifiers::default();
        m.add(ModifierTarget::Value(ValueType::Outcome), "Skill Level", 3);
        m.add(ModifierTarget::Value(ValueType::Pressure), "Insight Reduction", 0);
        m.add(ModifierTarget::EnergyCost, "Pressure Strain", 2);
        assert_eq!(m.outcome, 3);
        assert_eq!(m.energy_cost, 2);
        let labels: Vec<&str> = m.named.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Skill Level", "Insight Reduction", "Pressure Strain"]);
    }

    #[test]
    fn safety_needs_met_requirements_and_no_losses() {
        let player = PlayerState::default().with_energy(EnergyType::Physical, 1);
        let gaining = choice(vec![ValueChange::new(ValueType::Outcome, 2)], vec![]);
        assert!(gaining.is_safe(&player, TimeSlot::Morning));

        let losing = choice(vec![ValueChange::new(ValueType::Insight, -1)], vec![]);
        assert!(!losing.is_safe(&player, TimeSlot::Morning));

        let gated = choice(
            vec![ValueChange::new(ValueType::Outcome, 1)],
            vec![Requirement::Energy {
                energy_type: EnergyType::Physical,
                amount: 2,
            }],
        );
        assert!(!gated.is_safe(&player, TimeSlot::Morning));
        assert_eq!(gated.unmet_requirements(&player, TimeSlot::Morning).len(), 1);
    }

    #[test]
    fn detail_total() {
        let d = ValueChangeDetail {
            value_type: ValueType::Outcome,
            entries: vec![("Base".to_string(), 2), ("Skill Level".to_string(), 3)],
        };
        assert_eq!(d.total(), 5);
    }
}
