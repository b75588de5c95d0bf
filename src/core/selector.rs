/// Template selection: filter by site and conditions, score, pick among the
/// best few at random.

use rand::Rng;

use crate::core::context::EncounterContext;
use crate::schema::template::ChoiceSetTemplate;
use crate::schema::values::ValueType;

/// Default number of top-scored templates the selector draws from.
pub const DEFAULT_CANDIDATE_POOL: usize = 3;

/// Scores a template that already passed filtering. Higher is better.
pub trait TemplateScorer {
    fn score(&self, template: &ChoiceSetTemplate, context: &EncounterContext<'_>) -> i32;
}

/// Scores every template the same, so selection is uniform among the first
/// candidates in load order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformScorer;

impl TemplateScorer for UniformScorer {
    fn score(&self, _template: &ChoiceSetTemplate, _context: &EncounterContext<'_>) -> i32 {
        0
    }
}

/// Favours templates that answer the encounter's pacing needs: progress when
/// escalation is due, relief when the situation is critical.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacingScorer;

impl TemplateScorer for PacingScorer {
    fn score(&self, template: &ChoiceSetTemplate, context: &EncounterContext<'_>) -> i32 {
        let analysis = context.analysis();
        if analysis.requires_escalation {
            template
                .patterns
                .iter()
                .map(|p| p.base_change(ValueType::Outcome))
                .max()
                .unwrap_or(0)
        } else if analysis.is_critical {
            template
                .patterns
                .iter()
                .map(|p| -p.base_change(ValueType::Pressure))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }
}

pub struct TemplateSelector {
    scorer: Box<dyn TemplateScorer>,
    candidate_pool: usize,
}

impl Default for TemplateSelector {
    fn default() -> Self {
        Self::new(Box::new(UniformScorer), DEFAULT_CANDIDATE_POOL)
    }
}

impl TemplateSelector {
    pub fn new(scorer: Box<dyn TemplateScorer>, candidate_pool: usize) -> Self {
        Self {
            scorer,
            candidate_pool: candidate_pool.max(1),
        }
    }

    /// Pick a template for the context, or `None` when nothing survives
    /// filtering. The only side effect is one draw from `rng`.
    pub fn select<'t, I, R>(
        &self,
        templates: I,
        context: &EncounterContext<'_>,
        rng: &mut R,
    ) -> Option<&'t ChoiceSetTemplate>
    where
        I: IntoIterator<Item = &'t ChoiceSetTemplate>,
        R: Rng + ?Sized,
    {
        let mut scored: Vec<(i32, &'t ChoiceSetTemplate)> = templates
            .into_iter()
            .filter(|t| t.matches_site(context.action_type(), context.archetype()))
            .filter(|t| t.conditions_hold(context.properties(), &context.values))
            .map(|t| (self.scorer.score(t, context), t))
            .collect();

        if scored.is_empty() {
            tracing::debug!(site = %context.site.label(), "no template survived filtering");
            return None;
        }

        // Stable: equal scores keep load order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(self.candidate_pool);

        let pick = rng.gen_range(0..scored.len());
        let (score, template) = scored[pick];
        tracing::debug!(
            template = %template.name,
            score,
            candidates = scored.len(),
            "selected template"
        );
        Some(template)
    }
}
