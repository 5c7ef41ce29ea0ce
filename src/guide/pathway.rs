use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::conversation_state::ConversationState;
use super::error::GuideError;
use super::knowledge;

/// Where follow-up questions come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuestionStrategy {
    /// Walk the scripted pathways in declared order.
    #[default]
    Pathway,
    /// Ask the text generation service, falling back to the opening pool.
    Dynamic,
}

impl FromStr for QuestionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pathway" => Ok(Self::Pathway),
            "dynamic" => Ok(Self::Dynamic),
            other => Err(format!(
                "unknown question strategy '{}', expected 'pathway' or 'dynamic'",
                other
            )),
        }
    }
}

impl fmt::Display for QuestionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pathway => write!(f, "pathway"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Picks an opening question the sender has not seen yet.
///
/// Once every opening question has been asked the whole pool is eligible
/// again. The pathway cursor is left alone.
pub fn cold_start_question<R: Rng + ?Sized>(state: &mut ConversationState, rng: &mut R) -> String {
    let unasked: Vec<&str> = knowledge::UNIVERSAL_QUESTIONS
        .iter()
        .copied()
        .filter(|q| !state.asked_questions.contains(*q))
        .collect();
    let pool: &[&str] = if unasked.is_empty() {
        &knowledge::UNIVERSAL_QUESTIONS
    } else {
        &unasked
    };

    let question = pool
        .choose(rng)
        .copied()
        .unwrap_or(knowledge::UNIVERSAL_QUESTIONS[0])
        .to_string();
    state.record_question(&question);
    debug!(sender = %state.sender_id, question = %question, "Selected opening question");
    question
}

/// Selects the next question for a sender and advances their cursor.
pub fn next_question<R: Rng + ?Sized>(
    state: &mut ConversationState,
    rng: &mut R,
) -> Result<String, GuideError> {
    if state.needs_cold_start() {
        return Ok(cold_start_question(state, rng));
    }

    state.validate()?;
    let mut pathway = knowledge::pathway(state.current_pathway);
    if state.pathway_question_index == pathway.questions.len() {
        state.current_pathway = pathway.next;
        state.pathway_question_index = 0;
        pathway = knowledge::pathway(state.current_pathway);
        debug!(sender = %state.sender_id, pathway = pathway.name, "Advanced to next pathway");
    }

    let question = pathway.questions[state.pathway_question_index].to_string();
    state.record_question(&question);
    state.pathway_question_index += 1;
    Ok(question)
}
