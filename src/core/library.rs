/// Template library: loading, merging and validating authored choice content.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::outcome::Outcome;
use crate::schema::requirement::Requirement;
use crate::schema::template::{
    ChoiceApproach, ChoiceArchetype, ChoicePattern, ChoiceSetTemplate, LocationCondition, StateCondition,
};
use crate::schema::values::{ValueChange, ValueType, METER_MAX};
use crate::schema::world::{ActionType, EnergyType, LocationArchetype, SkillType};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("template '{0}' has no choice patterns")]
    EmptyTemplate(String),
    #[error("template '{0}' is defined more than once")]
    DuplicateTemplate(String),
    #[error("template '{template}' requires {value_type:?} at least {min} and at most {max}")]
    ContradictoryBounds {
        template: String,
        value_type: ValueType,
        min: i32,
        max: i32,
    },
    #[error("template '{template}' changes {value_type:?} by {amount}, beyond the meter range")]
    ValueChangeOutOfRange {
        template: String,
        value_type: ValueType,
        amount: i32,
    },
    #[error("template '{0}' has a negative energy cost")]
    NegativeEnergyCost(String),
    #[error("template '{template}' uses an amount of {amount}, beyond the limit of {limit}", limit = MAX_OUTCOME_AMOUNT)]
    AmountOutOfRange { template: String, amount: i32 },
}

/// Largest magnitude an authored cost, reward or energy cost may carry.
pub const MAX_OUTCOME_AMOUNT: i32 = 1000;

/// An ordered collection of choice-set templates. Order is load order and
/// decides tie-breaking among equally scored templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateLibrary {
    pub templates: Vec<ChoiceSetTemplate>,
}

// RON files use a compact authoring shape; these mirror it and are converted
// into the schema types on load.

#[derive(Debug, Deserialize)]
struct RonPattern {
    #[serde(default)]
    name: Option<String>,
    archetype: ChoiceArchetype,
    approach: ChoiceApproach,
    #[serde(default)]
    changes: Vec<(ValueType, i32)>,
    #[serde(default)]
    energy: Option<EnergyType>,
    #[serde(default)]
    energy_cost: i32,
    #[serde(default)]
    skill: Option<SkillType>,
    #[serde(default)]
    requirements: Vec<Requirement>,
    #[serde(default)]
    costs: Vec<Outcome>,
    #[serde(default)]
    rewards: Vec<Outcome>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "ChoiceSet")]
struct RonTemplate {
    name: String,
    action: ActionType,
    archetype: LocationArchetype,
    #[serde(default)]
    availability: Vec<LocationCondition>,
    #[serde(default)]
    state: Vec<StateCondition>,
    choices: Vec<RonPattern>,
}

impl From<RonPattern> for ChoicePattern {
    fn from(raw: RonPattern) -> Self {
        ChoicePattern {
            name: raw.name,
            archetype: raw.archetype,
            approach: raw.approach,
            value_changes: raw
                .changes
                .into_iter()
                .map(|(value_type, amount)| ValueChange::new(value_type, amount))
                .collect(),
            energy_type: raw.energy.unwrap_or_else(|| raw.archetype.energy_type()),
            base_energy_cost: raw.energy_cost,
            skill: raw.skill,
            requirements: raw.requirements,
            costs: raw.costs,
            rewards: raw.rewards,
        }
    }
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a library from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<TemplateLibrary, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a library from a RON string containing a list of `ChoiceSet(..)`
    /// entries. Every template is validated before the library is returned.
    pub fn parse_ron(input: &str) -> Result<TemplateLibrary, ContentError> {
        let raw: Vec<RonTemplate> = ron::from_str(input)?;
        let mut library = TemplateLibrary::new();

        for ron_template in raw {
            let template = ChoiceSetTemplate {
                name: ron_template.name,
                action_type: ron_template.action,
                archetype: ron_template.archetype,
                availability: ron_template.availability,
                state_conditions: ron_template.state,
                patterns: ron_template.choices.into_iter().map(ChoicePattern::from).collect(),
            };
            library.push(template)?;
        }

        Ok(library)
    }

    /// Load every `.ron` file in a directory, in file-name order.
    pub fn load_dir(dir: &Path) -> Result<TemplateLibrary, ContentError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut library = TemplateLibrary::new();
        for path in paths {
            tracing::debug!(path = %path.display(), "loading choice templates");
            library.merge(Self::load_from_ron(&path)?);
        }
        Ok(library)
    }

    /// Add a template after validating it. Names are unique within a library.
    pub fn push(&mut self, template: ChoiceSetTemplate) -> Result<(), ContentError> {
        validate_template(&template)?;
        if self.get(&template.name).is_some() {
            return Err(ContentError::DuplicateTemplate(template.name));
        }
        self.templates.push(template);
        Ok(())
    }

    /// Merge another library into this one. Templates from `other` replace
    /// templates in `self` with the same name, in place; new names append.
    pub fn merge(&mut self, other: TemplateLibrary) {
        for template in other.templates {
            match self.templates.iter_mut().find(|t| t.name == template.name) {
                Some(existing) => *existing = template,
                None => self.templates.push(template),
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ChoiceSetTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChoiceSetTemplate> {
        self.templates.iter()
    }
}

/// Reject content that the engine cannot run: malformed templates fail here,
/// at load time, instead of mid-turn.
pub fn validate_template(template: &ChoiceSetTemplate) -> Result<(), ContentError> {
    if template.patterns.is_empty() {
        return Err(ContentError::EmptyTemplate(template.name.clone()));
    }

    for value_type in ValueType::all() {
        let min = template
            .state_conditions
            .iter()
            .filter_map(|c| match c {
                StateCondition::Min(t, bound) if *t == value_type => Some(*bound),
                _ => None,
            })
            .max();
        let max = template
            .state_conditions
            .iter()
            .filter_map(|c| match c {
                StateCondition::Max(t, bound) if *t == value_type => Some(*bound),
                _ => None,
            })
            .min();
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ContentError::ContradictoryBounds {
                    template: template.name.clone(),
                    value_type,
                    min,
                    max,
                });
            }
        }
    }

    for pattern in &template.patterns {
        if pattern.base_energy_cost < 0 {
            return Err(ContentError::NegativeEnergyCost(template.name.clone()));
        }
        for change in &pattern.value_changes {
            if change.amount.unsigned_abs() > METER_MAX.unsigned_abs() {
                return Err(ContentError::ValueChangeOutOfRange {
                    template: template.name.clone(),
                    value_type: change.value_type,
                    amount: change.amount,
                });
            }
        }
        let amounts = std::iter::once(pattern.base_energy_cost)
            .chain(pattern.costs.iter().map(Outcome::amount))
            .chain(pattern.rewards.iter().map(Outcome::amount));
        for amount in amounts {
            if amount.unsigned_abs() > MAX_OUTCOME_AMOUNT.unsigned_abs() {
                return Err(ContentError::AmountOutOfRange {
                    template: template.name.clone(),
                    amount,
                });
            }
        }
    }

    Ok(())
}
