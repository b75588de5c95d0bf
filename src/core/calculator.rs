/// Consequence calculator: stacks context modifiers onto a choice's base
/// effects and records where every adjustment came from.

use crate::core::choice::{
    Adjustment, ChoiceConsequences, ChoiceValueModifiers, EncounterChoice, ModifierTarget, ValueChangeDetail,
};
use crate::core::context::EncounterContext;
use crate::schema::outcome::Outcome;
use crate::schema::requirement::Requirement;
use crate::schema::values::{ValueChange, ValueType};
use crate::schema::world::LocationType;

pub const SKILL_LEVEL: &str = "Skill Level";
pub const INDUSTRIAL_LOCATION: &str = "Industrial Location";
pub const SOCIAL_LOCATION: &str = "Social Location";
pub const NATURAL_LOCATION: &str = "Natural Location";
pub const INSIGHT_REDUCTION: &str = "Insight Reduction";
pub const PRESSURE_STRAIN: &str = "Pressure Strain";
pub const HIGH_PRESSURE: &str = "High Pressure";
pub const HIGH_INSIGHT: &str = "High Insight";
pub const HIGH_RESONANCE: &str = "High Resonance";

struct NamedModifier {
    target: ModifierTarget,
    label: &'static str,
    amount: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsequenceCalculator;

impl ConsequenceCalculator {
    /// Calculate and attach consequences to a choice.
    pub fn apply(&self, choice: &mut EncounterChoice, context: &EncounterContext<'_>) {
        choice.consequences = Some(self.calculate(choice, context));
    }

    /// The aggregated modifiers the context imposes on every choice.
    pub fn modifiers(&self, context: &EncounterContext<'_>) -> ChoiceValueModifiers {
        let mut modifiers = ChoiceValueModifiers::default();
        for m in derive_modifiers(context) {
            modifiers.add(m.target, m.label, m.amount);
        }
        modifiers
    }

    /// Deterministic and side-effect free.
    pub fn calculate(&self, choice: &EncounterChoice, context: &EncounterContext<'_>) -> ChoiceConsequences {
        let named = derive_modifiers(context);
        let mut modifiers = ChoiceValueModifiers::default();
        for m in &named {
            modifiers.add(m.target, m.label, m.amount);
        }

        // One modified change per meter, in first-appearance order.
        let mut order: Vec<ValueType> = Vec::new();
        for change in &choice.value_changes {
            if !order.contains(&change.value_type) {
                order.push(change.value_type);
            }
        }

        let mut modified_value_changes = Vec::with_capacity(order.len());
        let mut value_change_details = Vec::with_capacity(order.len());
        for value_type in order {
            let base: i32 = choice
                .value_changes
                .iter()
                .filter(|c| c.value_type == value_type)
                .map(|c| c.amount)
                .sum();
            let delta = modifiers.for_value(value_type);
            modified_value_changes.push(ValueChange::new(value_type, base + delta));

            let mut entries = vec![("Base".to_string(), base)];
            entries.extend(
                named
                    .iter()
                    .filter(|m| m.target == ModifierTarget::Value(value_type))
                    .map(|m| (m.label.to_string(), m.amount)),
            );
            value_change_details.push(ValueChangeDetail { value_type, entries });
        }

        let strain = modifiers.energy_cost;

        let mut requirement_adjustments = Vec::new();
        let modified_requirements = choice
            .requirements
            .iter()
            .map(|req| match req {
                Requirement::Energy { energy_type, amount } if strain > 0 => {
                    let adjusted = Requirement::Energy {
                        energy_type: *energy_type,
                        amount: amount.saturating_add(strain),
                    };
                    requirement_adjustments.push(Adjustment {
                        source: HIGH_PRESSURE.to_string(),
                        original: req.description(),
                        modified: adjusted.description(),
                        amount: strain,
                    });
                    adjusted
                }
                other => other.clone(),
            })
            .collect();

        let mut cost_adjustments = Vec::new();
        let modified_costs = choice
            .costs
            .iter()
            .map(|cost| match cost {
                Outcome::Energy { amount, .. } if strain > 0 => {
                    let adjusted = cost.with_amount(amount.saturating_add(strain));
                    cost_adjustments.push(Adjustment {
                        source: HIGH_PRESSURE.to_string(),
                        original: cost.description(),
                        modified: adjusted.description(),
                        amount: strain,
                    });
                    adjusted
                }
                other => other.clone(),
            })
            .collect();

        let insight = context.values.insight;
        let resonance = context.values.resonance;
        let mut reward_adjustments = Vec::new();
        let modified_rewards = choice
            .rewards
            .iter()
            .map(|reward| {
                let (bonus, source) = match reward {
                    Outcome::Resource { amount, .. } => (amount.saturating_mul(insight) / 10, HIGH_INSIGHT),
                    Outcome::Reputation { amount, .. } => (amount.saturating_mul(resonance) / 5, HIGH_RESONANCE),
                    _ => (0, ""),
                };
                if bonus > 0 {
                    let adjusted = reward.with_amount(reward.amount().saturating_add(bonus));
                    reward_adjustments.push(Adjustment {
                        source: source.to_string(),
                        original: reward.description(),
                        modified: adjusted.description(),
                        amount: bonus,
                    });
                    adjusted
                } else {
                    reward.clone()
                }
            })
            .collect();

        let mut projected = context.values;
        projected.apply(&modified_value_changes);

        tracing::debug!(
            choice = %choice.name,
            outcome = modifiers.outcome,
            pressure = modifiers.pressure_gain,
            strain,
            "calculated consequences"
        );

        ChoiceConsequences {
            base_value_changes: choice.value_changes.clone(),
            modified_value_changes,
            base_requirements: choice.requirements.clone(),
            modified_requirements,
            base_costs: choice.costs.clone(),
            modified_costs,
            base_rewards: choice.rewards.clone(),
            modified_rewards,
            modifiers,
            value_change_details,
            requirement_adjustments,
            cost_adjustments,
            reward_adjustments,
            projected,
        }
    }
}

fn derive_modifiers(context: &EncounterContext<'_>) -> Vec<NamedModifier> {
    let mut named = Vec::with_capacity(4);

    named.push(NamedModifier {
        target: ModifierTarget::Value(ValueType::Outcome),
        label: SKILL_LEVEL,
        amount: context.skill_level() - context.location_difficulty(),
    });

    match context.location_type() {
        LocationType::Industrial => named.push(NamedModifier {
            target: ModifierTarget::Value(ValueType::Pressure),
            label: INDUSTRIAL_LOCATION,
            amount: 2,
        }),
        LocationType::Social => named.push(NamedModifier {
            target: ModifierTarget::Value(ValueType::Resonance),
            label: SOCIAL_LOCATION,
            amount: 1,
        }),
        LocationType::Nature => named.push(NamedModifier {
            target: ModifierTarget::Value(ValueType::Insight),
            label: NATURAL_LOCATION,
            amount: 1,
        }),
        _ => {}
    }

    // Recorded even when zero.
    named.push(NamedModifier {
        target: ModifierTarget::Value(ValueType::Pressure),
        label: INSIGHT_REDUCTION,
        amount: -(context.values.insight / 2),
    });

    let strain = context.values.pressure / 3;
    if strain > 0 {
        named.push(NamedModifier {
            target: ModifierTarget::EnergyCost,
            label: PRESSURE_STRAIN,
            amount: strain,
        });
    }

    named
}
