use serde::Serialize;

use super::super::error::ValidationError;
use super::super::questionnaire::{standard_questions, TriageQuestion};
use super::classifier::TierBoundaries;

/// Admin-tunable scoring configuration: questionnaire weights and tier cutoffs.
///
/// The same settings must be used wherever a score is computed; records admitted under older
/// settings keep their tier until an explicit reclassification pass runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageSettings {
    questions: Vec<TriageQuestion>,
    boundaries: TierBoundaries,
}

impl TriageSettings {
    pub fn new(
        questions: Vec<TriageQuestion>,
        boundaries: TierBoundaries,
    ) -> Result<Self, ValidationError> {
        for question in &questions {
            validate_weight(&question.id, question.weight)?;
        }
        Ok(Self {
            questions,
            boundaries,
        })
    }

    pub fn questions(&self) -> &[TriageQuestion] {
        &self.questions
    }

    pub fn boundaries(&self) -> &TierBoundaries {
        &self.boundaries
    }

    pub fn set_boundaries(&mut self, boundaries: TierBoundaries) {
        self.boundaries = boundaries;
    }

    pub fn set_weight(&mut self, question_id: &str, weight: f64) -> Result<(), ValidationError> {
        validate_weight(question_id, weight)?;
        let question = self
            .questions
            .iter_mut()
            .find(|question| question.id == question_id)
            .ok_or_else(|| ValidationError::UnknownQuestion(question_id.to_string()))?;
        question.weight = weight;
        Ok(())
    }
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            questions: standard_questions(),
            boundaries: TierBoundaries::STANDARD,
        }
    }
}

fn validate_weight(question_id: &str, weight: f64) -> Result<(), ValidationError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidWeight {
            question_id: question_id.to_string(),
            weight,
        })
    }
}
