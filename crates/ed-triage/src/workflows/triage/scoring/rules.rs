use super::super::domain::Score;
use super::super::questionnaire::{AnswerKind, TriageAnswer, TriageAnswerSet, TriageQuestion};
use super::ScoreContribution;

/// Damping applied to numeric ratings so a subjective pain level cannot dominate red flags.
pub const NUMERIC_ANSWER_SCALE: f64 = 0.3;

const NUMERIC_ANSWER_MAX: f64 = 10.0;

pub(crate) fn contribution(question: &TriageQuestion, answer: Option<TriageAnswer>) -> f64 {
    match (question.kind, answer) {
        (AnswerKind::Number, Some(TriageAnswer::Number(value))) if value.is_finite() => {
            let bounded = value.clamp(0.0, NUMERIC_ANSWER_MAX);
            bounded * question.weight * NUMERIC_ANSWER_SCALE
        }
        (AnswerKind::Boolean, Some(TriageAnswer::Flag(true))) => question.weight,
        _ => 0.0,
    }
}

/// Raw (unrounded) score of an answer set. Answers for unknown ids are ignored.
pub fn compute_score(answers: &TriageAnswerSet, questions: &[TriageQuestion]) -> f64 {
    questions
        .iter()
        .map(|question| contribution(question, answers.get(&question.id)))
        .sum()
}

/// Rounds a raw score into the admissible range. Never yields 0.
pub fn finalize(raw: f64) -> Score {
    // f64::max ignores NaN, so a NaN raw score lands on the floor.
    let floored = raw.max(f64::from(Score::MIN));
    let rounded = floored.round().min(f64::from(Score::MAX));
    Score::clamped(rounded as u8)
}

pub(crate) fn breakdown(
    answers: &TriageAnswerSet,
    questions: &[TriageQuestion],
) -> Vec<ScoreContribution> {
    questions
        .iter()
        .filter_map(|question| {
            let answer = answers.get(&question.id);
            let points = contribution(question, answer);
            if points == 0.0 {
                return None;
            }
            Some(ScoreContribution {
                question_id: question.id.clone(),
                prompt: question.prompt.clone(),
                points,
            })
        })
        .collect()
}
