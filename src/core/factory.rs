/// Choice factory: instantiates a template's patterns as unmodified choices.

use crate::core::choice::{ChoiceSet, EncounterChoice};
use crate::core::context::EncounterContext;
use crate::schema::outcome::Outcome;
use crate::schema::requirement::Requirement;
use crate::schema::template::{ChoicePattern, ChoiceSetTemplate};
use crate::schema::values::{ValueChange, ValueType};

#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceFactory;

impl ChoiceFactory {
    /// Build the base choices for a template. Conditions are re-checked
    /// against the context; `None` if they no longer hold.
    pub fn create_choice_set(
        &self,
        template: &ChoiceSetTemplate,
        context: &EncounterContext<'_>,
    ) -> Option<ChoiceSet> {
        if !template.matches_site(context.action_type(), context.archetype())
            || !template.conditions_hold(context.properties(), &context.values)
        {
            tracing::warn!(template = %template.name, "template no longer applies to context");
            return None;
        }

        let choices = template
            .patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| self.create_choice(index, pattern, context))
            .collect();

        Some(ChoiceSet {
            template_name: template.name.clone(),
            choices,
        })
    }

    pub fn create_choice(
        &self,
        index: usize,
        pattern: &ChoicePattern,
        context: &EncounterContext<'_>,
    ) -> EncounterChoice {
        let name = pattern
            .name
            .clone()
            .unwrap_or_else(|| format!("{} - {}", pattern.archetype.label(), pattern.approach.label()));

        let mut costs = Vec::with_capacity(pattern.costs.len() + 1);
        if pattern.base_energy_cost > 0 {
            costs.push(Outcome::Energy {
                energy_type: pattern.energy_type,
                amount: pattern.base_energy_cost,
            });
        }
        costs.extend(pattern.costs.iter().cloned());

        EncounterChoice {
            index,
            name,
            description: describe(context, &pattern.value_changes, &pattern.requirements),
            archetype: pattern.archetype,
            approach: pattern.approach,
            skill: pattern.skill,
            value_changes: pattern.value_changes.clone(),
            requirements: pattern.requirements.clone(),
            costs,
            rewards: pattern.rewards.clone(),
            consequences: None,
        }
    }

    /// The low-risk choice offered when a stage must contain a safe option.
    pub fn create_fallback(&self, index: usize, context: &EncounterContext<'_>) -> EncounterChoice {
        self.create_choice(index, &ChoicePattern::regroup(), context)
    }
}

/// Tag describing how a choice goes about things, first match wins.
pub fn choice_type_tag(changes: &[ValueChange]) -> Option<&'static str> {
    let sum = |t: ValueType| -> i32 {
        changes
            .iter()
            .filter(|c| c.value_type == t)
            .map(|c| c.amount)
            .sum()
    };
    let outcome = sum(ValueType::Outcome);
    let pressure = sum(ValueType::Pressure);
    let insight = sum(ValueType::Insight);

    if outcome >= 2 && (pressure < 0 || insight > 0) {
        Some("Carefully")
    } else if pressure >= 3 {
        Some("Aggressively")
    } else if outcome >= 1 && insight >= 2 {
        Some("Tactically")
    } else if pressure < 0 {
        Some("Carefully")
    } else {
        None
    }
}

fn describe(context: &EncounterContext<'_>, changes: &[ValueChange], requirements: &[Requirement]) -> String {
    let mut description = context.site.label();
    if let Some(tag) = choice_type_tag(changes) {
        description.push_str(&format!(" ({})", tag));
    }
    if !requirements.is_empty() {
        let listed: Vec<String> = requirements.iter().map(Requirement::description).collect();
        description.push_str(&format!(" ({})", listed.join(", ")));
    }
    description
}
