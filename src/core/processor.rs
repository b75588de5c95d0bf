/// Consequence processor: applies a calculated choice to the encounter
/// meters and the player, then resolves the cascading effects.
///
/// Order of a single execution:
///   gate → value changes → energy costs → other costs → rewards →
///   resonance bonus → thresholds → combinations → context → termination

use serde::{Deserialize, Serialize};

use crate::core::choice::EncounterChoice;
use crate::core::context::EncounterSite;
use crate::schema::outcome::Outcome;
use crate::schema::player::{PlayerPools, Pool};
use crate::schema::requirement::Requirement;
use crate::schema::values::{EncounterStateValues, ValueChange, ValueType};
use crate::schema::world::{
    CharacterType, EnergyType, ItemType, KnowledgeType, LocationType, ReputationType, ResourceType, SkillType,
    TimeSlot,
};

pub const CHOICE: &str = "Choice";
pub const ENERGY_COST: &str = "Energy Cost";
pub const OVEREXERTION: &str = "Overexertion";
pub const LOST_FOCUS: &str = "Lost Focus";
pub const SOCIAL_FATIGUE: &str = "Social Fatigue";
pub const COST: &str = "Cost";
pub const REWARD: &str = "Reward";
pub const RESONANCE_BONUS: &str = "Resonance Bonus";
pub const OUTCOME_THRESHOLD: &str = "Outcome Threshold";
pub const PRESSURE_THRESHOLD: &str = "Pressure Threshold";
pub const INSIGHT_THRESHOLD: &str = "Insight Threshold";
pub const RESONANCE_THRESHOLD: &str = "Resonance Threshold";
pub const MASTERY: &str = "Mastery";
pub const CATASTROPHIC_FAILURE: &str = "Catastrophic Failure";
pub const SOCIAL_TRIUMPH: &str = "Social Triumph";
pub const INDUSTRIAL_HAZARD: &str = "Industrial Hazard";
pub const SOCIAL_SCRUTINY: &str = "Social Scrutiny";
pub const NATURAL_BOUNTY: &str = "Natural Bounty";
pub const NIGHTFALL: &str = "Nightfall";

/// Health at or below this halves scalable grants for the rest of an execution.
pub const LOW_HEALTH: i32 = 3;
/// Stress at or above this amplifies pressure-driven health loss.
pub const HIGH_STRESS: i32 = 7;

/// Something an effect can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Meter(ValueType),
    Pool(Pool),
    Skill(SkillType),
    Knowledge(KnowledgeType),
    Resource(ResourceType),
    Standing(ReputationType),
    Item(ItemType),
    Relationship(CharacterType),
}

impl Target {
    pub fn label(&self) -> String {
        match self {
            Self::Meter(t) => t.label().to_string(),
            Self::Pool(p) => p.label(),
            Self::Skill(s) => format!("{} Level", s.label()),
            Self::Knowledge(k) => format!("{} Knowledge", k.label()),
            Self::Resource(r) => r.label().to_string(),
            Self::Standing(f) => format!("{} Reputation", f.label()),
            Self::Item(i) => i.label().to_string(),
            Self::Relationship(c) => format!("{} Relationship", c.label()),
        }
    }

    fn of(outcome: &Outcome) -> Target {
        match outcome {
            Outcome::Energy { energy_type, .. } => Self::Pool(Pool::Energy(*energy_type)),
            Outcome::Health(_) => Self::Pool(Pool::Health),
            Outcome::Coins(_) => Self::Pool(Pool::Coins),
            Outcome::Resource { resource, .. } => Self::Resource(*resource),
            Outcome::Reputation { faction, .. } => Self::Standing(*faction),
            Outcome::Item { item, .. } => Self::Item(*item),
            Outcome::Relationship { character, .. } => Self::Relationship(*character),
            Outcome::Skill { skill, .. } => Self::Skill(*skill),
            Outcome::Knowledge { kind, .. } => Self::Knowledge(*kind),
        }
    }
}

/// One change actually made during an execution, with the rule that made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEffect {
    pub source: String,
    pub target: Target,
    pub delta: i32,
}

impl AppliedEffect {
    pub fn describe(&self) -> String {
        format!("{}: {:+} {}", self.source, self.delta, self.target.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    HealthDepleted,
    ReputationDepleted,
}

impl Termination {
    pub fn message(&self) -> &'static str {
        match self {
            Self::HealthDepleted => "You collapse from your injuries. The encounter is over.",
            Self::ReputationDepleted => "Your name is worthless here now. The encounter is over.",
        }
    }
}

/// The final applied deltas of one execution, handed to the messaging layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceSummary {
    pub choice_name: String,
    pub values_before: EncounterStateValues,
    pub values_after: EncounterStateValues,
    pub effects: Vec<AppliedEffect>,
    pub termination: Option<Termination>,
}

impl ConsequenceSummary {
    pub fn messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = self.effects.iter().map(AppliedEffect::describe).collect();
        if let Some(termination) = self.termination {
            messages.push(termination.message().to_string());
        }
        messages
    }

    /// Net change to a target across every effect.
    pub fn net(&self, target: Target) -> i32 {
        self.effects
            .iter()
            .filter(|e| e.target == target)
            .map(|e| e.delta)
            .sum()
    }

    pub fn from_source<'s>(&'s self, source: &'s str) -> impl Iterator<Item = &'s AppliedEffect> + 's {
        self.effects.iter().filter(move |e| e.source == source)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The choice was never run through the calculator; nothing applied.
    Uncalculated,
    /// At least one modified requirement failed; nothing applied.
    RequirementsUnmet(Vec<Requirement>),
    Applied(ConsequenceSummary),
}

impl ExecutionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn summary(&self) -> Option<&ConsequenceSummary> {
        match self {
            Self::Applied(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Receives consequence summaries for player-facing display.
pub trait ConsequenceSink {
    fn deliver(&mut self, summary: &ConsequenceSummary);
}

impl ConsequenceSink for Vec<ConsequenceSummary> {
    fn deliver(&mut self, summary: &ConsequenceSummary) {
        self.push(summary.clone());
    }
}

/// Writes every applied effect to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ConsequenceSink for LogSink {
    fn deliver(&mut self, summary: &ConsequenceSummary) {
        for message in summary.messages() {
            tracing::info!(choice = %summary.choice_name, "{}", message);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsequenceProcessor;

impl ConsequenceProcessor {
    /// Execute a calculated choice. Works only from the modified lists.
    pub fn execute<P: PlayerPools + ?Sized>(
        &self,
        choice: &EncounterChoice,
        site: &EncounterSite,
        values: &mut EncounterStateValues,
        player: &mut P,
    ) -> ExecutionOutcome {
        let Some(consequences) = &choice.consequences else {
            tracing::warn!(choice = %choice.name, "refusing to execute an uncalculated choice");
            return ExecutionOutcome::Uncalculated;
        };

        let unmet: Vec<Requirement> = consequences
            .modified_requirements
            .iter()
            .filter(|r| !r.is_satisfied(&*player, site.time_slot))
            .cloned()
            .collect();
        if !unmet.is_empty() {
            tracing::debug!(choice = %choice.name, unmet = unmet.len(), "requirements not met");
            return ExecutionOutcome::RequirementsUnmet(unmet);
        }

        let values_before = *values;
        let stressed = player.pool(Pool::Stress) >= HIGH_STRESS;
        let mut run = Run {
            player,
            values,
            site,
            effects: Vec::new(),
            low_health: false,
            stressed,
        };

        run.apply_value_changes(&consequences.modified_value_changes);

        for cost in &consequences.modified_costs {
            if let Outcome::Energy { energy_type, amount } = cost {
                run.spend_energy(*energy_type, *amount);
            }
        }
        for cost in &consequences.modified_costs {
            if !matches!(cost, Outcome::Energy { .. }) {
                run.pay(cost);
            }
        }

        run.low_health = run.player.pool(Pool::Health) <= LOW_HEALTH;
        for reward in &consequences.modified_rewards {
            run.receive(reward);
        }

        run.resonance_bonus();
        let skill = choice.skill.unwrap_or_else(|| site.primary_skill());
        run.thresholds(skill);
        run.combinations();
        run.context_modifiers();

        let termination = if run.player.pool(Pool::Health) <= 0 {
            Some(Termination::HealthDepleted)
        } else if run.player.pool(Pool::Reputation) <= 0 {
            Some(Termination::ReputationDepleted)
        } else {
            None
        };

        let summary = ConsequenceSummary {
            choice_name: choice.name.clone(),
            values_before,
            values_after: *run.values,
            effects: run.effects,
            termination,
        };

        tracing::info!(
            choice = %choice.name,
            effects = summary.effects.len(),
            outcome = summary.values_after.outcome,
            pressure = summary.values_after.pressure,
            "choice executed"
        );
        if let Some(t) = termination {
            tracing::info!(termination = ?t, "encounter terminated");
        }

        ExecutionOutcome::Applied(summary)
    }
}

struct Run<'r, P: PlayerPools + ?Sized> {
    player: &'r mut P,
    values: &'r mut EncounterStateValues,
    site: &'r EncounterSite,
    effects: Vec<AppliedEffect>,
    low_health: bool,
    stressed: bool,
}

impl<P: PlayerPools + ?Sized> Run<'_, P> {
    fn read(&self, target: Target) -> i32 {
        match target {
            Target::Meter(t) => self.values.get(t),
            Target::Pool(p) => self.player.pool(p),
            Target::Skill(s) => self.player.skill_level(s),
            Target::Knowledge(k) => self.player.knowledge(k),
            Target::Resource(r) => self.player.resource(r),
            Target::Standing(f) => self.player.standing(f),
            Target::Item(i) => self.player.item_count(i),
            Target::Relationship(c) => self.player.relationship(c),
        }
    }

    fn record(&mut self, source: &str, target: Target, before: i32) {
        let applied = self.read(target) - before;
        if applied != 0 {
            self.effects.push(AppliedEffect {
                source: source.to_string(),
                target,
                delta: applied,
            });
        }
    }

    /// Apply a delta and record what actually changed.
    fn change(&mut self, source: &str, target: Target, delta: i32) {
        let before = self.read(target);
        match target {
            Target::Meter(t) => {
                self.values.add(t, delta);
                self.values.clamp();
            }
            Target::Pool(p) => self.player.modify_pool(p, delta),
            Target::Skill(s) => self.player.modify_skill(s, delta),
            Target::Knowledge(k) => self.player.modify_knowledge(k, delta),
            Target::Resource(r) => self.player.modify_resource(r, delta),
            Target::Standing(f) => self.player.modify_reputation(f, delta),
            Target::Item(i) => self.player.modify_items(i, delta),
            Target::Relationship(c) => self.player.modify_relationship(c, delta),
        }
        self.record(source, target, before);
    }

    /// Take an authored non-energy cost from the player.
    fn pay(&mut self, cost: &Outcome) {
        let target = Target::of(cost);
        let before = self.read(target);
        cost.apply_cost(&mut *self.player);
        self.record(COST, target, before);
    }

    /// Give an authored reward, halved while health is low when it scales.
    fn receive(&mut self, reward: &Outcome) {
        let target = Target::of(reward);
        let before = self.read(target);
        if self.low_health && reward.is_scalable() {
            reward.with_amount(reward.amount() / 2).apply_reward(&mut *self.player);
        } else {
            reward.apply_reward(&mut *self.player);
        }
        self.record(REWARD, target, before);
    }

    /// A positive grant, halved while health is low when the grant scales.
    fn grant(&mut self, source: &str, target: Target, amount: i32, scalable: bool) {
        let amount = if self.low_health && scalable { amount / 2 } else { amount };
        self.change(source, target, amount);
    }

    /// Pressure-driven health loss, amplified under high stress.
    fn pressure_damage(&mut self, source: &str, loss: i32) {
        let loss = if self.stressed { loss * 3 / 2 } else { loss };
        self.change(source, Target::Pool(Pool::Health), -loss);
    }

    fn apply_value_changes(&mut self, changes: &[ValueChange]) {
        let before = *self.values;
        self.values.apply(changes);
        for value_type in ValueType::all() {
            let delta = self.values.get(value_type) - before.get(value_type);
            if delta != 0 {
                self.effects.push(AppliedEffect {
                    source: CHOICE.to_string(),
                    target: Target::Meter(value_type),
                    delta,
                });
            }
        }
    }

    /// Spend energy; an overspend zeroes the pool and converts the rest.
    fn spend_energy(&mut self, energy_type: EnergyType, amount: i32) {
        let pool = Pool::Energy(energy_type);
        let available = self.player.pool(pool).max(0);
        if amount <= available {
            self.change(ENERGY_COST, Target::Pool(pool), -amount);
            return;
        }

        self.change(ENERGY_COST, Target::Pool(pool), -available);
        let deficit = amount - available;
        match energy_type {
            EnergyType::Physical => self.change(OVEREXERTION, Target::Pool(Pool::Health), -deficit),
            EnergyType::Focus => self.change(LOST_FOCUS, Target::Meter(ValueType::Pressure), 2),
            EnergyType::Social => self.change(SOCIAL_FATIGUE, Target::Pool(Pool::Reputation), -deficit),
        }
    }

    fn resonance_bonus(&mut self) {
        let resonance = self.values.resonance;
        if resonance >= 8 {
            self.change(RESONANCE_BONUS, Target::Meter(ValueType::Outcome), 2);
        } else if resonance >= 5 {
            self.change(RESONANCE_BONUS, Target::Meter(ValueType::Outcome), 1);
        }
    }

    fn thresholds(&mut self, skill: SkillType) {
        let v = *self.values;
        let props = &self.site.properties;
        let resource = props.resource;
        let danger = props.danger;
        let faction = props.reputation_type;

        if v.outcome >= 5 {
            self.change(OUTCOME_THRESHOLD, Target::Skill(skill), 1);
            if let Some(resource) = resource {
                self.grant(OUTCOME_THRESHOLD, Target::Resource(resource), v.outcome * resource.abundance(), true);
            }
        }
        if v.pressure >= 7 {
            self.pressure_damage(PRESSURE_THRESHOLD, (v.pressure - 6) * danger.multiplier());
        }
        if v.insight >= 7 {
            let kind = self.site.location_type.relevant_knowledge();
            self.change(INSIGHT_THRESHOLD, Target::Knowledge(kind), 1);
        }
        if v.resonance >= 7 {
            self.grant(RESONANCE_THRESHOLD, Target::Standing(faction), 1, true);
        }
    }

    fn combinations(&mut self) {
        let v = *self.values;
        let faction = self.site.properties.reputation_type;

        if v.outcome >= 7 && v.insight >= 7 {
            if let Some(resource) = self.site.properties.resource {
                self.grant(MASTERY, Target::Resource(resource), v.outcome, true);
            }
        }
        if v.outcome <= 3 && v.pressure >= 7 {
            let location_type = self.site.location_type;
            match location_type {
                LocationType::Industrial => {
                    self.change(CATASTROPHIC_FAILURE, Target::Pool(Pool::Health), -10)
                }
                LocationType::Social => self.change(CATASTROPHIC_FAILURE, Target::Standing(faction), -5),
                LocationType::Nature => {
                    self.change(CATASTROPHIC_FAILURE, Target::Resource(ResourceType::Food), -5)
                }
                _ => {}
            }
        }
        if v.outcome >= 7 && v.resonance >= 7 {
            self.grant(SOCIAL_TRIUMPH, Target::Standing(faction), 5, true);
        }
    }

    fn context_modifiers(&mut self) {
        let v = *self.values;
        let location_type = self.site.location_type;
        match location_type {
            LocationType::Industrial if v.pressure >= 5 => {
                self.pressure_damage(INDUSTRIAL_HAZARD, v.pressure / 2);
            }
            LocationType::Social if v.pressure >= 5 => {
                let faction = self.site.properties.reputation_type;
                self.change(SOCIAL_SCRUTINY, Target::Standing(faction), -(v.pressure / 3));
            }
            LocationType::Nature if v.insight >= 5 => {
                if let Some(resource) = self.site.properties.resource {
                    self.grant(NATURAL_BOUNTY, Target::Resource(resource), v.insight / 2, true);
                }
            }
            _ => {}
        }

        if self.site.time_slot == TimeSlot::Night {
            self.change(NIGHTFALL, Target::Meter(ValueType::Pressure), 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculator::ConsequenceCalculator;
    use crate::core::context::EncounterContext;
    use crate::core::factory::ChoiceFactory;
    use crate::schema::player::PlayerState;
    use crate::schema::template::{ChoiceApproach, ChoiceArchetype, ChoicePattern};
    use crate::schema::world::{ActionType, DangerLevel, LocationArchetype, LocationProperties};

    fn calculated(
        pattern: ChoicePattern,
        site: &EncounterSite,
        player: &PlayerState,
        values: EncounterStateValues,
    ) -> EncounterChoice {
        let ctx = EncounterContext::new(site, player, values, 1);
        let mut choice = ChoiceFactory.create_choice(0, &pattern, &ctx);
        ConsequenceCalculator.apply(&mut choice, &ctx);
        choice
    }

    fn workshop() -> EncounterSite {
        EncounterSite::new(ActionType::Labor, LocationType::Industrial, LocationArchetype::Workshop)
    }

    fn market() -> EncounterSite {
        EncounterSite::new(ActionType::Trade, LocationType::Commercial, LocationArchetype::Market)
    }

    #[test]
    fn uncalculated_choice_is_refused() {
        let site = market();
        let player = PlayerState::default();
        let ctx = EncounterContext::new(&site, &player, EncounterStateValues::default(), 1);
        let choice = ChoiceFactory.create_choice(
            0,
            &ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Direct).with_change(ValueType::Outcome, 2),
            &ctx,
        );
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::default();
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(outcome, ExecutionOutcome::Uncalculated);
        assert_eq!(values, EncounterStateValues::default());
    }

    #[test]
    fn gate_failure_changes_nothing() {
        let site = market();
        let mut player = PlayerState::default().with_energy(EnergyType::Social, 1);
        let mut values = EncounterStateValues::new(2, 3, 1, 0);
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Direct)
                .with_change(ValueType::Outcome, 3)
                .with_energy_cost(2)
                .with_requirement(Requirement::Energy {
                    energy_type: EnergyType::Social,
                    amount: 2,
                })
                .with_reward(Outcome::Coins(5)),
            &site,
            &player,
            values,
        );

        let player_before = player.clone();
        let values_before = values;
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert!(matches!(outcome, ExecutionOutcome::RequirementsUnmet(ref unmet) if unmet.len() == 1));
        assert_eq!(player, player_before);
        assert_eq!(values, values_before);
    }

    #[test]
    fn physical_overspend_costs_health() {
        let site = market();
        let mut player = PlayerState::default().with_energy(EnergyType::Physical, 2);
        let mut values = EncounterStateValues::default();
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Physical, ChoiceApproach::Direct).with_energy_cost(5),
            &site,
            &player,
            values,
        );

        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert!(outcome.is_applied());
        assert_eq!(player.physical_energy, 0);
        assert_eq!(player.health, 7);
        let summary = outcome.summary().unwrap();
        assert_eq!(summary.net(Target::Pool(Pool::Health)), -3);
        assert_eq!(summary.from_source(OVEREXERTION).count(), 1);
    }

    #[test]
    fn focus_overspend_adds_flat_pressure() {
        let site = market();
        let mut player = PlayerState::default().with_energy(EnergyType::Focus, 1);
        let mut values = EncounterStateValues::default();
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Focus, ChoiceApproach::Tactical).with_energy_cost(6),
            &site,
            &player,
            values,
        );
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(player.focus_energy, 0);
        assert_eq!(values.pressure, 2);
        assert_eq!(player.health, 10);
    }

    #[test]
    fn social_overspend_costs_reputation() {
        let site = market();
        let mut player = PlayerState::default().with_energy(EnergyType::Social, 1);
        let mut values = EncounterStateValues::default();
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Direct).with_energy_cost(4),
            &site,
            &player,
            values,
        );
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(player.social_energy, 0);
        assert_eq!(player.reputation, 7);
    }

    #[test]
    fn rewards_apply_even_when_costs_overdraw() {
        let site = market();
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::default();
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Pragmatic)
                .with_cost(Outcome::Coins(5))
                .with_reward(Outcome::Item {
                    item: ItemType::Map,
                    count: 1,
                }),
            &site,
            &player,
            values,
        );
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(player.coins, -5);
        assert_eq!(player.item_count(ItemType::Map), 1);
    }

    #[test]
    fn catastrophic_failure_at_industrial_site() {
        let site = workshop();
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(2, 8, 0, 0);
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Physical, ChoiceApproach::Improvised),
            &site,
            &player,
            values,
        );

        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        let summary = outcome.summary().unwrap();
        let catastrophe: Vec<&AppliedEffect> = summary.from_source(CATASTROPHIC_FAILURE).collect();
        assert_eq!(catastrophe.len(), 1);
        assert_eq!(catastrophe[0].delta, -10);
        let threshold: Vec<&AppliedEffect> = summary.from_source(PRESSURE_THRESHOLD).collect();
        assert_eq!(threshold[0].delta, -2);
        // Industrial hazard: 8 / 2.
        assert_eq!(summary.from_source(INDUSTRIAL_HAZARD).next().unwrap().delta, -4);
        assert_eq!(player.health, -6);
        assert_eq!(summary.termination, Some(Termination::HealthDepleted));
    }

    #[test]
    fn outcome_threshold_grants_skill_and_scaled_resource() {
        let site = EncounterSite::new(ActionType::Gather, LocationType::Commercial, LocationArchetype::Farm)
            .with_properties(LocationProperties {
                resource: Some(ResourceType::Food),
                ..LocationProperties::default()
            });
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(6, 0, 0, 0);
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Physical, ChoiceApproach::Pragmatic),
            &site,
            &player,
            values,
        );
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(player.skill_level(SkillType::Strength), 1);
        assert_eq!(player.resource(ResourceType::Food), 12);
    }

    #[test]
    fn choice_skill_overrides_primary_skill() {
        let site = market();
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(5, 0, 0, 0);
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Direct).with_skill(SkillType::Service),
            &site,
            &player,
            values,
        );
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(player.skill_level(SkillType::Service), 1);
        assert_eq!(player.skill_level(SkillType::Haggling), 0);
        // No resource at this location.
        assert!(player.resources.values().all(|n| *n == 0));
    }

    #[test]
    fn resonance_feeds_outcome() {
        let site = market();
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(1, 0, 0, 8);
        let choice = calculated(ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Direct), &site, &player, values);
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(values.outcome, 3);

        let mut values = EncounterStateValues::new(1, 0, 0, 5);
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(values.outcome, 2);
    }

    #[test]
    fn low_health_halves_scalable_grants() {
        let site = market();
        let mut player = PlayerState::default();
        player.health = 5;
        let mut values = EncounterStateValues::default();
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Direct)
                .with_cost(Outcome::Health(2))
                .with_reward(Outcome::Coins(9))
                .with_reward(Outcome::Knowledge {
                    kind: KnowledgeType::Trade,
                    amount: 1,
                }),
            &site,
            &player,
            values,
        );
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(player.health, 3);
        assert_eq!(player.coins, 4);
        assert_eq!(player.knowledge(KnowledgeType::Trade), 1);
    }

    #[test]
    fn stress_amplifies_pressure_damage() {
        let site = market().with_properties(LocationProperties {
            danger: DangerLevel::Alert,
            ..LocationProperties::default()
        });
        let mut player = PlayerState::default();
        player.stress = 7;
        let mut values = EncounterStateValues::new(5, 9, 0, 0);
        let choice = calculated(ChoicePattern::new(ChoiceArchetype::Focus, ChoiceApproach::Direct), &site, &player, values);
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        // (9 - 6) * 2 = 6, amplified to 9.
        assert_eq!(player.health, 1);
    }

    #[test]
    fn night_adds_pressure_and_clamps() {
        let site = market().at(TimeSlot::Night);
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(5, 9, 0, 0);
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Focus, ChoiceApproach::Direct).with_change(ValueType::Pressure, 3),
            &site,
            &player,
            values,
        );
        ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(values.pressure, 10);
        assert!(values.is_within_range());
    }

    #[test]
    fn social_triumph_and_threshold_move_faction_standing() {
        let site = EncounterSite::new(ActionType::Discuss, LocationType::Social, LocationArchetype::Tavern);
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(7, 0, 0, 7);
        let choice = calculated(ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Direct), &site, &player, values);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        // Resonance 7 lifts outcome to 8 first; threshold +1 and triumph +5.
        assert_eq!(values.outcome, 8);
        assert_eq!(player.standing(ReputationType::Commoners), 6);
        assert_eq!(player.reputation, 16);
        assert!(outcome.summary().unwrap().termination.is_none());
    }

    fn tavern_of(faction: ReputationType) -> EncounterSite {
        EncounterSite::new(ActionType::Discuss, LocationType::Social, LocationArchetype::Tavern).with_properties(
            LocationProperties {
                reputation_type: faction,
                ..LocationProperties::default()
            },
        )
    }

    fn forest(resource: Option<ResourceType>) -> EncounterSite {
        EncounterSite::new(ActionType::Gather, LocationType::Nature, LocationArchetype::Forest).with_properties(
            LocationProperties {
                resource,
                ..LocationProperties::default()
            },
        )
    }

    fn idle() -> ChoicePattern {
        ChoicePattern::new(ChoiceArchetype::Focus, ChoiceApproach::Direct)
    }

    #[test]
    fn mastery_needs_outcome_insight_and_a_resource() {
        let site = market().with_properties(LocationProperties {
            resource: Some(ResourceType::Cloth),
            ..LocationProperties::default()
        });
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(7, 0, 7, 0);
        let choice = calculated(idle(), &site, &player, values);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        let summary = outcome.summary().unwrap();

        let mastery: Vec<&AppliedEffect> = summary.from_source(MASTERY).collect();
        assert_eq!(mastery.len(), 1);
        assert_eq!(mastery[0].target, Target::Resource(ResourceType::Cloth));
        assert_eq!(mastery[0].delta, 7);
        // Outcome threshold grants 7 * 1 first.
        assert_eq!(player.resource(ResourceType::Cloth), 14);

        // Without a local resource there is nothing to master.
        let site = market();
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(7, 0, 7, 0);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(outcome.summary().unwrap().from_source(MASTERY).count(), 0);
    }

    #[test]
    fn insight_threshold_teaches_location_knowledge() {
        let site = EncounterSite::new(ActionType::Study, LocationType::Sacred, LocationArchetype::Library);
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(0, 0, 7, 0);
        let choice = calculated(idle(), &site, &player, values);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);

        let learned: Vec<&AppliedEffect> = outcome.summary().unwrap().from_source(INSIGHT_THRESHOLD).collect();
        assert_eq!(learned.len(), 1);
        assert_eq!(learned[0].target, Target::Knowledge(KnowledgeType::Lore));
        assert_eq!(learned[0].delta, 1);
        assert_eq!(player.knowledge(KnowledgeType::Lore), 1);

        let mut values = EncounterStateValues::new(0, 0, 6, 0);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(outcome.summary().unwrap().from_source(INSIGHT_THRESHOLD).count(), 0);
    }

    #[test]
    fn catastrophic_failure_at_social_site_costs_standing() {
        let site = tavern_of(ReputationType::Merchants);
        let mut player = PlayerState::default();
        player.reputation = 5;
        let mut values = EncounterStateValues::new(2, 8, 0, 0);
        let choice = calculated(idle(), &site, &player, values);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        let summary = outcome.summary().unwrap();

        let catastrophe: Vec<&AppliedEffect> = summary.from_source(CATASTROPHIC_FAILURE).collect();
        assert_eq!(catastrophe.len(), 1);
        assert_eq!(catastrophe[0].target, Target::Standing(ReputationType::Merchants));
        assert_eq!(catastrophe[0].delta, -5);
        // Scrutiny: 8 / 3.
        assert_eq!(summary.from_source(SOCIAL_SCRUTINY).next().unwrap().delta, -2);
        assert_eq!(player.standing(ReputationType::Merchants), -7);
        assert_eq!(player.reputation, -2);
        // Pressure threshold: (8 - 6) * 1.
        assert_eq!(player.health, 8);
        assert_eq!(summary.termination, Some(Termination::ReputationDepleted));
    }

    #[test]
    fn catastrophic_failure_in_nature_spoils_food() {
        let site = forest(None);
        let mut player = PlayerState::default();
        player.resources.insert(ResourceType::Food, 8);
        let mut values = EncounterStateValues::new(1, 7, 0, 0);
        let choice = calculated(idle(), &site, &player, values);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        let summary = outcome.summary().unwrap();

        let catastrophe: Vec<&AppliedEffect> = summary.from_source(CATASTROPHIC_FAILURE).collect();
        assert_eq!(catastrophe.len(), 1);
        assert_eq!(catastrophe[0].target, Target::Resource(ResourceType::Food));
        assert_eq!(catastrophe[0].delta, -5);
        assert_eq!(player.resource(ResourceType::Food), 3);
        assert_eq!(player.health, 9);
        assert!(summary.termination.is_none());

        // Stores cannot go below empty; only what was there is lost.
        let mut values = EncounterStateValues::new(1, 7, 0, 0);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        let summary = outcome.summary().unwrap();
        assert_eq!(summary.from_source(CATASTROPHIC_FAILURE).next().unwrap().delta, -3);
        assert_eq!(player.resource(ResourceType::Food), 0);
    }

    #[test]
    fn social_scrutiny_scales_with_pressure() {
        let site = tavern_of(ReputationType::Guards);
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(0, 6, 0, 0);
        let choice = calculated(idle(), &site, &player, values);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);

        let scrutiny: Vec<&AppliedEffect> = outcome.summary().unwrap().from_source(SOCIAL_SCRUTINY).collect();
        assert_eq!(scrutiny.len(), 1);
        assert_eq!(scrutiny[0].target, Target::Standing(ReputationType::Guards));
        assert_eq!(scrutiny[0].delta, -2);
        assert_eq!(player.standing(ReputationType::Guards), -2);
        assert_eq!(player.reputation, 8);

        let mut values = EncounterStateValues::new(0, 4, 0, 0);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(outcome.summary().unwrap().from_source(SOCIAL_SCRUTINY).count(), 0);
    }

    #[test]
    fn natural_bounty_grants_half_the_insight() {
        let site = forest(Some(ResourceType::Herbs));
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(0, 0, 6, 0);
        let choice = calculated(idle(), &site, &player, values);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);

        let bounty: Vec<&AppliedEffect> = outcome.summary().unwrap().from_source(NATURAL_BOUNTY).collect();
        assert_eq!(bounty.len(), 1);
        assert_eq!(bounty[0].target, Target::Resource(ResourceType::Herbs));
        assert_eq!(bounty[0].delta, 3);
        assert_eq!(player.resource(ResourceType::Herbs), 3);

        // No local resource, no bounty.
        let site = forest(None);
        let mut values = EncounterStateValues::new(0, 0, 6, 0);
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        assert_eq!(outcome.summary().unwrap().from_source(NATURAL_BOUNTY).count(), 0);
    }

    #[test]
    fn authored_costs_and_rewards_record_what_changed() {
        let site = market();
        let mut player = PlayerState::default();
        player.inventory.insert(ItemType::Rope, 1);
        let mut values = EncounterStateValues::default();
        let choice = calculated(
            idle()
                .with_cost(Outcome::Reputation {
                    faction: ReputationType::Merchants,
                    amount: 3,
                })
                .with_cost(Outcome::Item {
                    item: ItemType::Rope,
                    count: 2,
                })
                .with_reward(Outcome::Relationship {
                    character: CharacterType::Innkeeper,
                    amount: 2,
                }),
            &site,
            &player,
            values,
        );
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        let summary = outcome.summary().unwrap();

        let costs: Vec<(Target, i32)> = summary.from_source(COST).map(|e| (e.target, e.delta)).collect();
        assert_eq!(
            costs,
            vec![
                (Target::Standing(ReputationType::Merchants), -3),
                (Target::Item(ItemType::Rope), -1),
            ]
        );
        assert_eq!(player.reputation, 7);
        assert_eq!(player.item_count(ItemType::Rope), 0);
        assert_eq!(summary.net(Target::Relationship(CharacterType::Innkeeper)), 2);
        assert_eq!(player.relationship(CharacterType::Innkeeper), 2);
    }

    #[test]
    fn summary_reports_applied_value_changes() {
        let site = market();
        let mut player = PlayerState::default();
        let mut values = EncounterStateValues::new(9, 0, 0, 0);
        let choice = calculated(
            ChoicePattern::new(ChoiceArchetype::Social, ChoiceApproach::Direct).with_change(ValueType::Outcome, 3),
            &site,
            &player,
            values,
        );
        let outcome = ConsequenceProcessor.execute(&choice, &site, &mut values, &mut player);
        let summary = outcome.summary().unwrap();
        // Clamped at the top of the range: only +1 actually applied.
        assert_eq!(summary.net(Target::Meter(ValueType::Outcome)), 1);
        assert_eq!(summary.values_after.outcome, 10);
        assert!(summary.messages().iter().any(|m| m == "Choice: +1 Outcome"));
    }
}
