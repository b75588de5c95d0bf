use serde::{Deserialize, Serialize};

use super::player::{PlayerPools, Pool};
use super::world::{CharacterType, EnergyType, ItemType, KnowledgeType, ReputationType, ResourceType, SkillType};

/// A typed effect on player state.
///
/// Amounts are magnitudes. Whether an outcome takes or gives is decided by
/// the list it sits in: costs go through [`apply_cost`](Self::apply_cost),
/// rewards through [`apply_reward`](Self::apply_reward).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Energy { energy_type: EnergyType, amount: i32 },
    Health(i32),
    Coins(i32),
    Resource { resource: ResourceType, amount: i32 },
    Reputation { faction: ReputationType, amount: i32 },
    Item { item: ItemType, count: i32 },
    Relationship { character: CharacterType, amount: i32 },
    Skill { skill: SkillType, levels: i32 },
    Knowledge { kind: KnowledgeType, amount: i32 },
}

impl Outcome {
    pub fn amount(&self) -> i32 {
        match self {
            Self::Energy { amount, .. } => *amount,
            Self::Health(n) | Self::Coins(n) => *n,
            Self::Resource { amount, .. } => *amount,
            Self::Reputation { amount, .. } => *amount,
            Self::Item { count, .. } => *count,
            Self::Relationship { amount, .. } => *amount,
            Self::Skill { levels, .. } => *levels,
            Self::Knowledge { amount, .. } => *amount,
        }
    }

    /// A copy of this outcome carrying a different amount.
    pub fn with_amount(&self, amount: i32) -> Outcome {
        match self {
            Self::Energy { energy_type, .. } => Self::Energy {
                energy_type: *energy_type,
                amount,
            },
            Self::Health(_) => Self::Health(amount),
            Self::Coins(_) => Self::Coins(amount),
            Self::Resource { resource, .. } => Self::Resource {
                resource: *resource,
                amount,
            },
            Self::Reputation { faction, .. } => Self::Reputation {
                faction: *faction,
                amount,
            },
            Self::Item { item, .. } => Self::Item {
                item: *item,
                count: amount,
            },
            Self::Relationship { character, .. } => Self::Relationship {
                character: *character,
                amount,
            },
            Self::Skill { skill, .. } => Self::Skill {
                skill: *skill,
                levels: amount,
            },
            Self::Knowledge { kind, .. } => Self::Knowledge { kind: *kind, amount },
        }
    }

    /// Whether a reward multiplier scales this outcome. Discrete grants
    /// (items, skill levels, knowledge) and pool restores are never scaled.
    pub fn is_scalable(&self) -> bool {
        matches!(
            self,
            Self::Coins(_) | Self::Resource { .. } | Self::Reputation { .. } | Self::Relationship { .. }
        )
    }

    /// Take this outcome from the player. Energy is subtracted as-is; the
    /// consequence processor owns overspend conversion and never routes
    /// energy costs through here.
    pub fn apply_cost<P: PlayerPools + ?Sized>(&self, player: &mut P) {
        self.apply_signed(player, -self.amount());
    }

    /// Give this outcome to the player.
    pub fn apply_reward<P: PlayerPools + ?Sized>(&self, player: &mut P) {
        self.apply_signed(player, self.amount());
    }

    fn apply_signed<P: PlayerPools + ?Sized>(&self, player: &mut P, delta: i32) {
        match self {
            Self::Energy { energy_type, .. } => player.modify_pool(Pool::Energy(*energy_type), delta),
            Self::Health(_) => player.modify_pool(Pool::Health, delta),
            Self::Coins(_) => player.modify_pool(Pool::Coins, delta),
            Self::Resource { resource, .. } => player.modify_resource(*resource, delta),
            Self::Reputation { faction, .. } => player.modify_reputation(*faction, delta),
            Self::Item { item, .. } => player.modify_items(*item, delta),
            Self::Relationship { character, .. } => player.modify_relationship(*character, delta),
            Self::Skill { skill, .. } => player.modify_skill(*skill, delta),
            Self::Knowledge { kind, .. } => player.modify_knowledge(*kind, delta),
        }
    }

    fn subject(&self) -> String {
        match self {
            Self::Energy { energy_type, .. } => format!("{} Energy", energy_type.label()),
            Self::Health(_) => "Health".to_string(),
            Self::Coins(_) => "Coins".to_string(),
            Self::Resource { resource, .. } => resource.label().to_string(),
            Self::Reputation { faction, .. } => format!("{} Reputation", faction.label()),
            Self::Item { item, .. } => item.label().to_string(),
            Self::Relationship { character, .. } => format!("{} Relationship", character.label()),
            Self::Skill { skill, .. } => format!("{} Level", skill.label()),
            Self::Knowledge { kind, .. } => format!("{} Knowledge", kind.label()),
        }
    }

    pub fn description(&self) -> String {
        format!("{}: {}", self.subject(), self.amount())
    }

    /// Preview text such as "-2 Physical Energy" for a cost or "+10 Coins"
    /// for a reward.
    pub fn preview(&self, as_cost: bool) -> String {
        let sign = if as_cost { '-' } else { '+' };
        format!("{}{} {}", sign, self.amount(), self.subject())
    }
}
