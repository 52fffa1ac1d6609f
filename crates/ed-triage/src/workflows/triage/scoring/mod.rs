mod classifier;
mod rules;
mod settings;

pub use classifier::{classify, CareCircuit, TierBoundaries};
pub use rules::{compute_score, finalize, NUMERIC_ANSWER_SCALE};
pub use settings::TriageSettings;

use serde::Serialize;

use super::domain::{Score, UrgencyTier};
use super::error::ValidationError;
use super::questionnaire::TriageAnswerSet;

/// Evaluates questionnaires against the current [`TriageSettings`].
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    settings: TriageSettings,
}

impl ScoringEngine {
    pub fn new(settings: TriageSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TriageSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut TriageSettings {
        &mut self.settings
    }

    pub fn classify(&self, score: Score) -> UrgencyTier {
        self.settings.boundaries().classify(score)
    }

    pub fn assess(&self, answers: &TriageAnswerSet) -> ScoreAssessment {
        let questions = self.settings.questions();
        let raw = compute_score(answers, questions);
        let computed = finalize(raw);

        ScoreAssessment {
            raw,
            computed,
            adjusted: None,
            tier: self.classify(computed),
            circuit: CareCircuit::for_score(computed, self.settings.boundaries()),
            contributions: rules::breakdown(answers, questions),
        }
    }

    /// Replaces the effective score and derives the tier again from it.
    pub fn override_score(
        &self,
        assessment: ScoreAssessment,
        value: i64,
    ) -> Result<ScoreAssessment, ValidationError> {
        let score = u8::try_from(value)
            .map_err(|_| ValidationError::ScoreOutOfRange(value))
            .and_then(Score::new)
            .map_err(|_| ValidationError::ScoreOutOfRange(value))?;

        Ok(assessment.with_override(score, self.settings.boundaries()))
    }
}

/// Per-question share of the raw score, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreContribution {
    pub question_id: String,
    pub prompt: String,
    pub points: f64,
}

/// Result of scoring a questionnaire, with the optional manual adjustment.
///
/// `tier` and `circuit` are always derived from [`ScoreAssessment::effective`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreAssessment {
    pub raw: f64,
    pub computed: Score,
    pub adjusted: Option<Score>,
    pub tier: UrgencyTier,
    pub circuit: CareCircuit,
    pub contributions: Vec<ScoreContribution>,
}

impl ScoreAssessment {
    pub fn effective(&self) -> Score {
        self.adjusted.unwrap_or(self.computed)
    }

    pub fn is_adjusted(&self) -> bool {
        self.adjusted
            .map(|adjusted| adjusted != self.computed)
            .unwrap_or(false)
    }

    pub fn with_override(self, score: Score, boundaries: &TierBoundaries) -> Self {
        Self {
            adjusted: Some(score),
            tier: boundaries.classify(score),
            circuit: CareCircuit::for_score(score, boundaries),
            ..self
        }
    }

    pub fn summary(&self) -> String {
        let effective = self.effective();
        if self.is_adjusted() {
            format!(
                "{} ({}, adjusted from {})",
                effective,
                self.tier.label(),
                self.computed.value()
            )
        } else {
            format!("{} ({})", effective, self.tier.label())
        }
    }
}
