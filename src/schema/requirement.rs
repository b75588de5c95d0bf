use serde::{Deserialize, Serialize};

use super::player::{PlayerPools, Pool};
use super::world::{CharacterType, EnergyType, ItemType, KnowledgeType, ResourceType, SkillType, TimeSlot};

/// A gating predicate a choice demands before its effects may be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    Energy { energy_type: EnergyType, amount: i32 },
    Skill { skill: SkillType, level: i32 },
    Health(i32),
    Coins(i32),
    Reputation(i32),
    Relationship { character: CharacterType, level: i32 },
    TimeWindow(TimeSlot),
    Item(ItemType),
    Resource { resource: ResourceType, count: i32 },
    Knowledge(KnowledgeType),
}

impl Requirement {
    pub fn is_satisfied<P: PlayerPools + ?Sized>(&self, player: &P, time: TimeSlot) -> bool {
        match self {
            Self::Energy { energy_type, amount } => {
                player.pool(Pool::Energy(*energy_type)) >= *amount
            }
            Self::Skill { skill, level } => player.skill_level(*skill) >= *level,
            Self::Health(n) => player.pool(Pool::Health) >= *n,
            Self::Coins(n) => player.pool(Pool::Coins) >= *n,
            Self::Reputation(n) => player.pool(Pool::Reputation) >= *n,
            Self::Relationship { character, level } => player.relationship(*character) >= *level,
            Self::TimeWindow(slot) => *slot == time,
            Self::Item(item) => player.item_count(*item) > 0,
            Self::Resource { resource, count } => player.resource(*resource) >= *count,
            Self::Knowledge(kind) => player.knowledge(*kind) > 0,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Energy { energy_type, amount } => {
                format!("{} Energy Required: {}", energy_type.label(), amount)
            }
            Self::Skill { skill, level } => format!("{} Level Required: {}", skill.label(), level),
            Self::Health(n) => format!("Health Required: {}", n),
            Self::Coins(n) => format!("Coins Required: {}", n),
            Self::Reputation(n) => format!("Reputation Required: {}", n),
            Self::Relationship { character, level } => {
                format!("Relationship with {} Required: {}", character.label(), level)
            }
            Self::TimeWindow(slot) => format!("Time Required: {}", slot.label()),
            Self::Item(item) => format!("{} Required", item.label()),
            Self::Resource { resource, count } => {
                format!("{} Required: {}", resource.label(), count)
            }
            Self::Knowledge(kind) => format!("{} Knowledge Required", kind.label()),
        }
    }
}
