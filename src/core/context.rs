/// Encounter context: where an encounter happens and the snapshot a
/// generation pass reads.

use serde::{Deserialize, Serialize};

use crate::core::analysis::EncounterStateAnalysis;
use crate::schema::player::PlayerPools;
use crate::schema::values::EncounterStateValues;
use crate::schema::world::{
    ActionType, LocationArchetype, LocationProperties, LocationType, SkillType, TimeSlot,
};

/// The owned description of an encounter's setting. Lives on the
/// encounter for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSite {
    pub action_type: ActionType,
    pub location_type: LocationType,
    pub archetype: LocationArchetype,
    pub time_slot: TimeSlot,
    #[serde(default)]
    pub properties: LocationProperties,
    #[serde(default)]
    pub difficulty: i32,
    /// Overrides the action's relevant skill when set.
    #[serde(default)]
    pub primary_skill: Option<SkillType>,
}

impl EncounterSite {
    pub fn new(action_type: ActionType, location_type: LocationType, archetype: LocationArchetype) -> Self {
        Self {
            action_type,
            location_type,
            archetype,
            time_slot: TimeSlot::Morning,
            properties: LocationProperties::default(),
            difficulty: 0,
            primary_skill: None,
        }
    }

    pub fn at(mut self, time_slot: TimeSlot) -> Self {
        self.time_slot = time_slot;
        self
    }

    pub fn with_properties(mut self, properties: LocationProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_difficulty(mut self, difficulty: i32) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_primary_skill(mut self, skill: SkillType) -> Self {
        self.primary_skill = Some(skill);
        self
    }

    pub fn primary_skill(&self) -> SkillType {
        self.primary_skill
            .unwrap_or_else(|| self.action_type.relevant_skill())
    }

    /// e.g. "Discuss at the Tavern".
    pub fn label(&self) -> String {
        format!("{} at the {}", self.action_type.label(), self.archetype.label())
    }
}

/// Immutable snapshot for one generation pass.
///
/// Borrows the site and the player; the meters are copied so the snapshot
/// never observes mutations made after it was taken.
#[derive(Clone, Copy)]
pub struct EncounterContext<'a> {
    pub site: &'a EncounterSite,
    pub player: &'a dyn PlayerPools,
    pub values: EncounterStateValues,
    pub stage_number: u32,
}

impl<'a> EncounterContext<'a> {
    pub fn new(
        site: &'a EncounterSite,
        player: &'a dyn PlayerPools,
        values: EncounterStateValues,
        stage_number: u32,
    ) -> Self {
        Self {
            site,
            player,
            values,
            stage_number,
        }
    }

    pub fn action_type(&self) -> ActionType {
        self.site.action_type
    }

    pub fn location_type(&self) -> LocationType {
        self.site.location_type
    }

    pub fn archetype(&self) -> LocationArchetype {
        self.site.archetype
    }

    pub fn time_slot(&self) -> TimeSlot {
        self.site.time_slot
    }

    pub fn properties(&self) -> &LocationProperties {
        &self.site.properties
    }

    pub fn location_difficulty(&self) -> i32 {
        self.site.difficulty
    }

    pub fn primary_skill(&self) -> SkillType {
        self.site.primary_skill()
    }

    /// The player's level in the context's primary skill.
    pub fn skill_level(&self) -> i32 {
        self.player.skill_level(self.primary_skill())
    }

    pub fn analysis(&self) -> EncounterStateAnalysis {
        EncounterStateAnalysis::analyze(&self.values, self.stage_number, self.player)
    }
}

impl std::fmt::Debug for EncounterContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncounterContext")
            .field("site", self.site)
            .field("values", &self.values)
            .field("stage_number", &self.stage_number)
            .finish_non_exhaustive()
    }
}
