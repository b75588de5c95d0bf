use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::world::{CharacterType, EnergyType, ItemType, KnowledgeType, ReputationType, ResourceType, SkillType};

/// A named scalar pool on the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pool {
    Health,
    Energy(EnergyType),
    Reputation,
    Coins,
    Stress,
}

impl Pool {
    pub fn label(&self) -> String {
        match self {
            Self::Health => "Health".to_string(),
            Self::Energy(e) => format!("{} Energy", e.label()),
            Self::Reputation => "Reputation".to_string(),
            Self::Coins => "Coins".to_string(),
            Self::Stress => "Stress".to_string(),
        }
    }
}

/// The narrow view of player state the engine reads and writes.
///
/// Pools are signed and unbounded here: overflow rules (an energy pool going
/// negative, health dropping to zero) are decided by the consequence
/// processor, not by the implementor. Stocks of resources, items and
/// knowledge never drop below zero.
pub trait PlayerPools {
    fn pool(&self, pool: Pool) -> i32;
    fn set_pool(&mut self, pool: Pool, value: i32);

    fn skill_level(&self, skill: SkillType) -> i32;
    fn set_skill_level(&mut self, skill: SkillType, level: i32);

    fn knowledge(&self, kind: KnowledgeType) -> i32;
    fn set_knowledge(&mut self, kind: KnowledgeType, amount: i32);

    fn resource(&self, resource: ResourceType) -> i32;
    fn set_resource(&mut self, resource: ResourceType, amount: i32);

    fn item_count(&self, item: ItemType) -> i32;
    fn set_item_count(&mut self, item: ItemType, count: i32);

    fn relationship(&self, character: CharacterType) -> i32;
    fn set_relationship(&mut self, character: CharacterType, level: i32);

    fn standing(&self, faction: ReputationType) -> i32;
    fn set_standing(&mut self, faction: ReputationType, value: i32);

    fn modify_pool(&mut self, pool: Pool, delta: i32) {
        let current = self.pool(pool);
        self.set_pool(pool, current.saturating_add(delta));
    }

    fn modify_skill(&mut self, skill: SkillType, delta: i32) {
        let current = self.skill_level(skill);
        self.set_skill_level(skill, (current + delta).max(0));
    }

    fn modify_knowledge(&mut self, kind: KnowledgeType, delta: i32) {
        let current = self.knowledge(kind);
        self.set_knowledge(kind, (current + delta).max(0));
    }

    fn modify_resource(&mut self, resource: ResourceType, delta: i32) {
        let current = self.resource(resource);
        self.set_resource(resource, (current + delta).max(0));
    }

    fn modify_items(&mut self, item: ItemType, delta: i32) {
        let current = self.item_count(item);
        self.set_item_count(item, (current + delta).max(0));
    }

    fn modify_relationship(&mut self, character: CharacterType, delta: i32) {
        let current = self.relationship(character);
        self.set_relationship(character, current + delta);
    }

    /// Faction reputation moves both the standing with that faction and the
    /// aggregate reputation pool.
    fn modify_reputation(&mut self, faction: ReputationType, delta: i32) {
        let standing = self.standing(faction);
        self.set_standing(faction, standing + delta);
        self.modify_pool(Pool::Reputation, delta);
    }
}

/// The default in-memory player record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub health: i32,
    pub physical_energy: i32,
    pub focus_energy: i32,
    pub social_energy: i32,
    pub reputation: i32,
    pub coins: i32,
    #[serde(default)]
    pub stress: i32,
    #[serde(default)]
    pub skills: FxHashMap<SkillType, i32>,
    #[serde(default)]
    pub knowledge: FxHashMap<KnowledgeType, i32>,
    #[serde(default)]
    pub resources: FxHashMap<ResourceType, i32>,
    #[serde(default)]
    pub inventory: FxHashMap<ItemType, i32>,
    #[serde(default)]
    pub relationships: FxHashMap<CharacterType, i32>,
    #[serde(default)]
    pub standings: FxHashMap<ReputationType, i32>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            health: 10,
            physical_energy: 10,
            focus_energy: 10,
            social_energy: 10,
            reputation: 10,
            coins: 0,
            stress: 0,
            skills: FxHashMap::default(),
            knowledge: FxHashMap::default(),
            resources: FxHashMap::default(),
            inventory: FxHashMap::default(),
            relationships: FxHashMap::default(),
            standings: FxHashMap::default(),
        }
    }
}

impl PlayerState {
    pub fn with_skill(mut self, skill: SkillType, level: i32) -> Self {
        self.skills.insert(skill, level);
        self
    }

    pub fn with_energy(mut self, energy: EnergyType, amount: i32) -> Self {
        self.set_pool(Pool::Energy(energy), amount);
        self
    }
}

impl PlayerPools for PlayerState {
    fn pool(&self, pool: Pool) -> i32 {
        match pool {
            Pool::Health => self.health,
            Pool::Energy(EnergyType::Physical) => self.physical_energy,
            Pool::Energy(EnergyType::Focus) => self.focus_energy,
            Pool::Energy(EnergyType::Social) => self.social_energy,
            Pool::Reputation => self.reputation,
            Pool::Coins => self.coins,
            Pool::Stress => self.stress,
        }
    }

    fn set_pool(&mut self, pool: Pool, value: i32) {
        let slot = match pool {
            Pool::Health => &mut self.health,
            Pool::Energy(EnergyType::Physical) => &mut self.physical_energy,
            Pool::Energy(EnergyType::Focus) => &mut self.focus_energy,
            Pool::Energy(EnergyType::Social) => &mut self.social_energy,
            Pool::Reputation => &mut self.reputation,
            Pool::Coins => &mut self.coins,
            Pool::Stress => &mut self.stress,
        };
        *slot = value;
    }

    fn skill_level(&self, skill: SkillType) -> i32 {
        self.skills.get(&skill).copied().unwrap_or(0)
    }

    fn set_skill_level(&mut self, skill: SkillType, level: i32) {
        self.skills.insert(skill, level);
    }

    fn knowledge(&self, kind: KnowledgeType) -> i32 {
        self.knowledge.get(&kind).copied().unwrap_or(0)
    }

    fn set_knowledge(&mut self, kind: KnowledgeType, amount: i32) {
        self.knowledge.insert(kind, amount);
    }

    fn resource(&self, resource: ResourceType) -> i32 {
        self.resources.get(&resource).copied().unwrap_or(0)
    }

    fn set_resource(&mut self, resource: ResourceType, amount: i32) {
        self.resources.insert(resource, amount);
    }

    fn item_count(&self, item: ItemType) -> i32 {
        self.inventory.get(&item).copied().unwrap_or(0)
    }

    fn set_item_count(&mut self, item: ItemType, count: i32) {
        self.inventory.insert(item, count);
    }

    fn relationship(&self, character: CharacterType) -> i32 {
        self.relationships.get(&character).copied().unwrap_or(0)
    }

    fn set_relationship(&mut self, character: CharacterType, level: i32) {
        self.relationships.insert(character, level);
    }

    fn standing(&self, faction: ReputationType) -> i32 {
        self.standings.get(&faction).copied().unwrap_or(0)
    }

    fn set_standing(&mut self, faction: ReputationType, value: i32) {
        self.standings.insert(faction, value);
    }
}
