use serde::{Deserialize, Serialize};

/// The broad kind of action the player is taking in an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Labor,
    Gather,
    Trade,
    Investigate,
    Study,
    Mingle,
    Discuss,
    Persuade,
    Perform,
    Travel,
    Rest,
}

impl ActionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Labor => "Labor",
            Self::Gather => "Gather",
            Self::Trade => "Trade",
            Self::Investigate => "Investigate",
            Self::Study => "Study",
            Self::Mingle => "Mingle",
            Self::Discuss => "Discuss",
            Self::Persuade => "Persuade",
            Self::Perform => "Perform",
            Self::Travel => "Travel",
            Self::Rest => "Rest",
        }
    }

    /// The skill an encounter of this action type leans on.
    pub fn relevant_skill(&self) -> SkillType {
        match self {
            Self::Labor | Self::Gather => SkillType::Strength,
            Self::Investigate => SkillType::Perception,
            Self::Study => SkillType::Scholarship,
            Self::Mingle | Self::Discuss | Self::Perform => SkillType::Charisma,
            Self::Trade | Self::Persuade => SkillType::Haggling,
            Self::Travel | Self::Rest => SkillType::Endurance,
        }
    }

    pub fn all() -> [ActionType; 11] {
        [
            Self::Labor,
            Self::Gather,
            Self::Trade,
            Self::Investigate,
            Self::Study,
            Self::Mingle,
            Self::Discuss,
            Self::Persuade,
            Self::Perform,
            Self::Travel,
            Self::Rest,
        ]
    }
}

/// The social character of a location. Drives location-type bonuses and
/// catastrophe penalties; types without a dedicated rule take the neutral
/// branch everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    Industrial,
    Social,
    Nature,
    Commercial,
    Residential,
    Sacred,
}

impl LocationType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Industrial => "Industrial",
            Self::Social => "Social",
            Self::Nature => "Nature",
            Self::Commercial => "Commercial",
            Self::Residential => "Residential",
            Self::Sacred => "Sacred",
        }
    }

    /// The kind of knowledge insight yields at this type of location.
    pub fn relevant_knowledge(&self) -> KnowledgeType {
        match self {
            Self::Industrial => KnowledgeType::Craft,
            Self::Social | Self::Residential => KnowledgeType::Local,
            Self::Nature => KnowledgeType::Nature,
            Self::Commercial => KnowledgeType::Trade,
            Self::Sacred => KnowledgeType::Lore,
        }
    }
}

/// The concrete kind of place an encounter happens at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationArchetype {
    Tavern,
    Market,
    Workshop,
    Docks,
    Forest,
    Farm,
    Library,
    Temple,
    Road,
}

impl LocationArchetype {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tavern => "Tavern",
            Self::Market => "Market",
            Self::Workshop => "Workshop",
            Self::Docks => "Docks",
            Self::Forest => "Forest",
            Self::Farm => "Farm",
            Self::Library => "Library",
            Self::Temple => "Temple",
            Self::Road => "Road",
        }
    }

    pub fn all() -> [LocationArchetype; 9] {
        [
            Self::Tavern,
            Self::Market,
            Self::Workshop,
            Self::Docks,
            Self::Forest,
            Self::Farm,
            Self::Library,
            Self::Temple,
            Self::Road,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

/// The three energy pools a choice can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnergyType {
    Physical,
    Focus,
    Social,
}

impl EnergyType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Focus => "Focus",
            Self::Social => "Social",
        }
    }

    pub fn all() -> [EnergyType; 3] {
        [Self::Physical, Self::Focus, Self::Social]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillType {
    Strength,
    Endurance,
    Perception,
    Scholarship,
    Charisma,
    Haggling,
    Service,
}

impl SkillType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Strength => "Strength",
            Self::Endurance => "Endurance",
            Self::Perception => "Perception",
            Self::Scholarship => "Scholarship",
            Self::Charisma => "Charisma",
            Self::Haggling => "Haggling",
            Self::Service => "Service",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Food,
    Wood,
    Herbs,
    Fish,
    Cloth,
    Metal,
}

impl ResourceType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Wood => "Wood",
            Self::Herbs => "Herbs",
            Self::Fish => "Fish",
            Self::Cloth => "Cloth",
            Self::Metal => "Metal",
        }
    }

    /// Multiplier applied to outcome-driven resource gains.
    pub fn abundance(&self) -> i32 {
        match self {
            Self::Food => 2,
            Self::Wood => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KnowledgeType {
    Local,
    Secret,
    Lore,
    Trade,
    Craft,
    Nature,
}

impl KnowledgeType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Secret => "Secret",
            Self::Lore => "Lore",
            Self::Trade => "Trade",
            Self::Craft => "Craft",
            Self::Nature => "Nature",
        }
    }
}

/// A faction or community the player holds standing with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReputationType {
    Commoners,
    Merchants,
    Guards,
    Scholars,
    Clergy,
    Underworld,
}

impl ReputationType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Commoners => "Commoners",
            Self::Merchants => "Merchants",
            Self::Guards => "Guards",
            Self::Scholars => "Scholars",
            Self::Clergy => "Clergy",
            Self::Underworld => "Underworld",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemType {
    Tools,
    Rope,
    Lantern,
    Map,
    Letter,
    Medicine,
}

impl ItemType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tools => "Tools",
            Self::Rope => "Rope",
            Self::Lantern => "Lantern",
            Self::Map => "Map",
            Self::Letter => "Letter",
            Self::Medicine => "Medicine",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharacterType {
    Innkeeper,
    Merchant,
    Guard,
    Scholar,
    Priest,
    Farmer,
}

impl CharacterType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Innkeeper => "Innkeeper",
            Self::Merchant => "Merchant",
            Self::Guard => "Guard",
            Self::Scholar => "Scholar",
            Self::Priest => "Priest",
            Self::Farmer => "Farmer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Atmosphere {
    Casual,
    Tense,
    Formal,
    Chaotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityLevel {
    Deserted,
    Quiet,
    Bustling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exposure {
    Indoor,
    Outdoor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Supervision {
    Unsupervised,
    Patrolled,
    Guarded,
}

/// How dangerous the location currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DangerLevel {
    #[default]
    Calm,
    Alert,
    Hostile,
}

impl DangerLevel {
    /// Multiplier applied to pressure-driven health loss.
    pub fn multiplier(&self) -> i32 {
        match self {
            Self::Calm => 1,
            Self::Alert => 2,
            Self::Hostile => 3,
        }
    }
}

/// Observable properties of the current location. Unset properties never
/// satisfy a condition that asks for a specific value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationProperties {
    #[serde(default)]
    pub atmosphere: Option<Atmosphere>,
    #[serde(default)]
    pub activity: Option<ActivityLevel>,
    #[serde(default)]
    pub exposure: Option<Exposure>,
    #[serde(default)]
    pub supervision: Option<Supervision>,
    #[serde(default)]
    pub resource: Option<ResourceType>,
    #[serde(default)]
    pub danger: DangerLevel,
    pub reputation_type: ReputationType,
}

impl Default for LocationProperties {
    fn default() -> Self {
        Self {
            atmosphere: None,
            activity: None,
            exposure: None,
            supervision: None,
            resource: None,
            danger: DangerLevel::Calm,
            reputation_type: ReputationType::Commoners,
        }
    }
}

impl LocationProperties {
    /// Multiplier for outcome-driven resource gains; 0 when the location
    /// has no resource to gather.
    pub fn resource_multiplier(&self) -> i32 {
        self.resource.map(|r| r.abundance()).unwrap_or(0)
    }
}
