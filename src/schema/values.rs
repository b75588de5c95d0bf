use serde::{Deserialize, Serialize};

/// Lowest value any narrative meter can hold.
pub const METER_MIN: i32 = 0;
/// Highest value any narrative meter can hold.
pub const METER_MAX: i32 = 10;

/// The four narrative meters tracked per encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueType {
    Outcome,
    Pressure,
    Insight,
    Resonance,
}

impl ValueType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Outcome => "Outcome",
            Self::Pressure => "Pressure",
            Self::Insight => "Insight",
            Self::Resonance => "Resonance",
        }
    }

    pub fn all() -> [ValueType; 4] {
        [Self::Outcome, Self::Pressure, Self::Insight, Self::Resonance]
    }
}

/// A signed change to one narrative meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChange {
    pub value_type: ValueType,
    pub amount: i32,
}

impl ValueChange {
    pub fn new(value_type: ValueType, amount: i32) -> Self {
        Self { value_type, amount }
    }

    /// Preview text such as "+2 Outcome" or "-1 Pressure".
    pub fn preview(&self) -> String {
        format!("{:+} {}", self.amount, self.value_type.label())
    }
}

/// The bounded narrative meters of one encounter.
///
/// Every mutation goes through [`apply`](Self::apply) or
/// [`add`](Self::add) followed by [`clamp`](Self::clamp), so the meters stay
/// within `[METER_MIN, METER_MAX]` between batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EncounterStateValues {
    pub outcome: i32,
    pub pressure: i32,
    pub insight: i32,
    pub resonance: i32,
}

impl EncounterStateValues {
    /// Build a clamped set of meters.
    pub fn new(outcome: i32, pressure: i32, insight: i32, resonance: i32) -> Self {
        let mut values = Self {
            outcome,
            pressure,
            insight,
            resonance,
        };
        values.clamp();
        values
    }

    pub fn get(&self, value_type: ValueType) -> i32 {
        match value_type {
            ValueType::Outcome => self.outcome,
            ValueType::Pressure => self.pressure,
            ValueType::Insight => self.insight,
            ValueType::Resonance => self.resonance,
        }
    }

    /// Add to one meter without clamping. Callers clamp after the batch.
    pub fn add(&mut self, value_type: ValueType, amount: i32) {
        let slot = match value_type {
            ValueType::Outcome => &mut self.outcome,
            ValueType::Pressure => &mut self.pressure,
            ValueType::Insight => &mut self.insight,
            ValueType::Resonance => &mut self.resonance,
        };
        *slot = slot.saturating_add(amount);
    }

    /// Apply a batch of changes, then clamp.
    pub fn apply(&mut self, changes: &[ValueChange]) {
        for change in changes {
            self.add(change.value_type, change.amount);
        }
        self.clamp();
    }

    pub fn clamp(&mut self) {
        self.outcome = self.outcome.clamp(METER_MIN, METER_MAX);
        self.pressure = self.pressure.clamp(METER_MIN, METER_MAX);
        self.insight = self.insight.clamp(METER_MIN, METER_MAX);
        self.resonance = self.resonance.clamp(METER_MIN, METER_MAX);
    }

    pub fn is_within_range(&self) -> bool {
        ValueType::all()
            .iter()
            .all(|t| (METER_MIN..=METER_MAX).contains(&self.get(*t)))
    }
}
