use tracing::debug;

use super::conversation_state::{CompletedAction, ConversationState};

const AFFIRMATIVE_KEYWORDS: &[&str] = &[
    "yes", "yeah", "done", "okay", "ok", "sure", "ready", "moved", "away", "safe", "clear",
];

const NEGATIVE_KEYWORDS: &[&str] = &["no", "not", "haven't", "can't", "cannot", "didn't", "unable"];

const HELP_KEYWORDS: &[&str] = &[
    "help",
    "how",
    "what",
    "unclear",
    "explain",
    "don't understand",
    "confused",
];

/// Topic keywords of a question, paired with the action an affirmative answer
/// to it confirms.
const ACTION_TOPICS: &[(&[&str], CompletedAction)] = &[
    (&["snake", "moved", "away"], CompletedAction::MovedFromHazard),
    (&["tight", "ring", "bracelet"], CompletedAction::RemovedTightItems),
    (&["breath"], CompletedAction::CheckedBreathing),
    (&["left side"], CompletedAction::InRecoveryPosition),
];

/// What a reply says, independent of the question it answers.
///
/// The flags are not exclusive. Callers rank them affirmative, then negative,
/// then needs-help.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub affirmative: bool,
    pub negative: bool,
    pub needs_help: bool,
}

impl Signals {
    pub fn tone(&self) -> Tone {
        if self.affirmative {
            Tone::Positive
        } else if self.negative {
            Tone::Negative
        } else if self.needs_help {
            Tone::NeedsHelp
        } else {
            Tone::Neutral
        }
    }
}

/// The single signal that wins after precedence is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    NeedsHelp,
    Neutral,
}

pub fn classify(utterance: &str) -> Signals {
    let text = utterance.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    Signals {
        affirmative: contains_any(AFFIRMATIVE_KEYWORDS),
        negative: contains_any(NEGATIVE_KEYWORDS),
        needs_help: contains_any(HELP_KEYWORDS),
    }
}

/// Records care the sender confirmed in answer to the last question.
///
/// Only `completed_actions` is touched, and only when the reply is affirmative
/// and the last question was about the matching topic.
pub fn apply_context(utterance: &str, state: &mut ConversationState) {
    let Some(last_question) = state.last_question.as_deref() else {
        return;
    };
    if !classify(utterance).affirmative {
        return;
    }

    let question = last_question.to_lowercase();
    for (topics, action) in ACTION_TOPICS {
        if topics.iter().any(|topic| question.contains(topic))
            && state.completed_actions.insert(*action)
        {
            debug!(sender = %state.sender_id, ?action, "Recorded completed action");
        }
    }
}
