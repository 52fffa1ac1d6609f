use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// How a question is answered at the triage desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Rating on a 0-10 scale (pain level).
    Number,
    /// Red-flag sign, present or absent.
    Boolean,
}

/// One entry of the fixed triage questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageQuestion {
    pub id: String,
    pub prompt: String,
    pub kind: AnswerKind,
    pub weight: f64,
}

impl TriageQuestion {
    pub fn number(id: &str, prompt: &str, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            kind: AnswerKind::Number,
            weight,
        }
    }

    pub fn boolean(id: &str, prompt: &str, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            kind: AnswerKind::Boolean,
            weight,
        }
    }
}

/// The questionnaire used by the emergency department.
pub fn standard_questions() -> Vec<TriageQuestion> {
    vec![
        TriageQuestion::number("q1", "Niveau de douleur (1-10)", 1.0),
        TriageQuestion::boolean("q2", "Difficulté respiratoire", 2.0),
        TriageQuestion::boolean("q3", "Saignement actif", 1.5),
        TriageQuestion::boolean("q4", "Perte de conscience", 3.0),
        TriageQuestion::boolean("q5", "Fièvre élevée (>39°C)", 1.0),
        TriageQuestion::boolean("q6", "Traumatisme grave", 2.0),
    ]
}

/// A single answer. Serialized untagged so payloads read `{"q1": 7, "q4": true}`.
///
/// Any JSON number is accepted, whatever its magnitude or precision; the scoring rules bound
/// it. Values that are neither a number nor a boolean are kept as `Unanswered`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TriageAnswer {
    Flag(bool),
    Number(f64),
    Unanswered,
}

impl<'de> Deserialize<'de> for TriageAnswer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let answer = match Value::deserialize(deserializer)? {
            Value::Bool(flag) => TriageAnswer::Flag(flag),
            Value::Number(number) => number
                .as_f64()
                .map(TriageAnswer::Number)
                .unwrap_or(TriageAnswer::Unanswered),
            _ => TriageAnswer::Unanswered,
        };
        Ok(answer)
    }
}

/// Answers keyed by question id. Questions without an answer contribute nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriageAnswerSet(BTreeMap<String, TriageAnswer>);

impl TriageAnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number(mut self, question_id: &str, value: impl Into<f64>) -> Self {
        self.0
            .insert(question_id.to_string(), TriageAnswer::Number(value.into()));
        self
    }

    pub fn with_flag(mut self, question_id: &str, value: bool) -> Self {
        self.0.insert(question_id.to_string(), TriageAnswer::Flag(value));
        self
    }

    pub fn insert(&mut self, question_id: impl Into<String>, answer: TriageAnswer) {
        self.0.insert(question_id.into(), answer);
    }

    pub fn get(&self, question_id: &str) -> Option<TriageAnswer> {
        self.0.get(question_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
