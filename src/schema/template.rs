use serde::{Deserialize, Serialize};

use super::outcome::Outcome;
use super::requirement::Requirement;
use super::values::{EncounterStateValues, ValueChange, ValueType};
use super::world::{
    ActionType, ActivityLevel, Atmosphere, DangerLevel, EnergyType, Exposure, LocationArchetype,
    LocationProperties, ResourceType, SkillType, Supervision,
};

/// Which kind of effort a choice represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceArchetype {
    Physical,
    Focus,
    Social,
}

impl ChoiceArchetype {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Focus => "Focus",
            Self::Social => "Social",
        }
    }

    /// The energy pool this archetype draws from unless content says otherwise.
    pub fn energy_type(&self) -> EnergyType {
        match self {
            Self::Physical => EnergyType::Physical,
            Self::Focus => EnergyType::Focus,
            Self::Social => EnergyType::Social,
        }
    }
}

/// How a choice goes about its archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceApproach {
    Direct,
    Pragmatic,
    Tactical,
    Improvised,
}

impl ChoiceApproach {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::Pragmatic => "Pragmatic",
            Self::Tactical => "Tactical",
            Self::Improvised => "Improvised",
        }
    }
}

/// A predicate over location properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationCondition {
    Atmosphere(Atmosphere),
    Activity(ActivityLevel),
    Exposure(Exposure),
    Supervision(Supervision),
    Danger(DangerLevel),
    Resource(ResourceType),
    AnyResource,
}

impl LocationCondition {
    pub fn holds(&self, props: &LocationProperties) -> bool {
        match self {
            Self::Atmosphere(a) => props.atmosphere == Some(*a),
            Self::Activity(a) => props.activity == Some(*a),
            Self::Exposure(e) => props.exposure == Some(*e),
            Self::Supervision(s) => props.supervision == Some(*s),
            Self::Danger(d) => props.danger == *d,
            Self::Resource(r) => props.resource == Some(*r),
            Self::AnyResource => props.resource.is_some(),
        }
    }
}

/// A bound on one narrative meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateCondition {
    Min(ValueType, i32),
    Max(ValueType, i32),
}

impl StateCondition {
    pub fn holds(&self, values: &EncounterStateValues) -> bool {
        match self {
            Self::Min(t, bound) => values.get(*t) >= *bound,
            Self::Max(t, bound) => values.get(*t) <= *bound,
        }
    }
}

/// One archetype/approach pair inside a template, with its nominal effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoicePattern {
    pub name: Option<String>,
    pub archetype: ChoiceArchetype,
    pub approach: ChoiceApproach,
    pub value_changes: Vec<ValueChange>,
    pub energy_type: EnergyType,
    pub base_energy_cost: i32,
    pub skill: Option<SkillType>,
    pub requirements: Vec<Requirement>,
    pub costs: Vec<Outcome>,
    pub rewards: Vec<Outcome>,
}

impl ChoicePattern {
    pub fn new(archetype: ChoiceArchetype, approach: ChoiceApproach) -> Self {
        Self {
            name: None,
            archetype,
            approach,
            value_changes: Vec::new(),
            energy_type: archetype.energy_type(),
            base_energy_cost: 0,
            skill: None,
            requirements: Vec::new(),
            costs: Vec::new(),
            rewards: Vec::new(),
        }
    }

    pub fn with_change(mut self, value_type: ValueType, amount: i32) -> Self {
        self.value_changes.push(ValueChange::new(value_type, amount));
        self
    }

    pub fn with_energy_cost(mut self, amount: i32) -> Self {
        self.base_energy_cost = amount;
        self
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn with_cost(mut self, cost: Outcome) -> Self {
        self.costs.push(cost);
        self
    }

    pub fn with_reward(mut self, reward: Outcome) -> Self {
        self.rewards.push(reward);
        self
    }

    pub fn with_skill(mut self, skill: SkillType) -> Self {
        self.skill = Some(skill);
        self
    }

    /// Sum of this pattern's base changes for one meter.
    pub fn base_change(&self, value_type: ValueType) -> i32 {
        self.value_changes
            .iter()
            .filter(|c| c.value_type == value_type)
            .map(|c| c.amount)
            .sum()
    }

    /// The fallback offered when a stage must contain a safe choice.
    pub fn regroup() -> Self {
        let mut pattern =
            Self::new(ChoiceArchetype::Focus, ChoiceApproach::Improvised).with_change(ValueType::Insight, 1);
        pattern.name = Some("Regroup".to_string());
        pattern
    }
}

/// Author-defined content describing one family of choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSetTemplate {
    pub name: String,
    pub action_type: ActionType,
    pub archetype: LocationArchetype,
    pub availability: Vec<LocationCondition>,
    pub state_conditions: Vec<StateCondition>,
    pub patterns: Vec<ChoicePattern>,
}

impl ChoiceSetTemplate {
    pub fn matches_site(&self, action_type: ActionType, archetype: LocationArchetype) -> bool {
        self.action_type == action_type && self.archetype == archetype
    }

    /// An empty condition list is satisfied.
    pub fn availability_holds(&self, props: &LocationProperties) -> bool {
        self.availability.iter().all(|c| c.holds(props))
    }

    /// An empty condition list is satisfied.
    pub fn state_holds(&self, values: &EncounterStateValues) -> bool {
        self.state_conditions.iter().all(|c| c.holds(values))
    }

    pub fn conditions_hold(&self, props: &LocationProperties, values: &EncounterStateValues) -> bool {
        self.availability_holds(props) && self.state_holds(values)
    }
}
