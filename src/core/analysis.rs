use serde::{Deserialize, Serialize};

use crate::schema::player::{PlayerPools, Pool};
use crate::schema::values::EncounterStateValues;
use crate::schema::world::EnergyType;

/// Pacing flags derived from the meters, the stage number and the player.
/// Recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterStateAnalysis {
    pub is_critical: bool,
    pub has_escape_route: bool,
    pub is_winnable: bool,
    pub requires_escalation: bool,
    pub safe_choices_remaining: u32,
    pub must_provide_safe_choice: bool,
}

impl EncounterStateAnalysis {
    pub fn analyze<P: PlayerPools + ?Sized>(
        values: &EncounterStateValues,
        stage_number: u32,
        player: &P,
    ) -> Self {
        let exhausted = EnergyType::all()
            .iter()
            .all(|e| player.pool(Pool::Energy(*e)) <= 2);

        Self {
            is_critical: values.pressure >= 7 || values.outcome <= 3 || exhausted,
            has_escape_route: values.insight >= 6 || values.resonance >= 7,
            is_winnable: values.outcome >= 7
                || (values.resonance >= 8 && values.outcome >= 5)
                || (values.insight >= 6 && values.pressure <= 4),
            requires_escalation: stage_number >= 3 && values.outcome < 7,
            safe_choices_remaining: 4u32.saturating_sub(stage_number),
            must_provide_safe_choice: player.pool(Pool::Health) <= 3 || values.pressure >= 8,
        }
    }
}
