use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::GuideError;
use super::knowledge;

/// Care already given, inferred from the sender's replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CompletedAction {
    MovedFromHazard,
    RemovedTightItems,
    CheckedBreathing,
    InRecoveryPosition,
}

/// Stage of care a pathway covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PathwayKind {
    InitialAssessment,
    ImmediateCare,
    TransportPrep,
    Monitoring,
}

impl PathwayKind {
    /// Successor in the pathway cycle.
    pub fn next(self) -> Self {
        knowledge::pathway(self).next
    }
}

/// Where a sender is in the conversation, derived from their state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialoguePhase {
    Uninitialized,
    AwaitingFirstReply,
    InDialogue,
}

/// Everything the guide remembers about one sender.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationState {
    pub sender_id: String,
    pub is_initial: bool,
    pub asked_questions: BTreeSet<String>,
    pub completed_actions: BTreeSet<CompletedAction>,
    pub current_pathway: PathwayKind,
    pub pathway_question_index: usize,
    pub last_question: Option<String>,
    pub has_shown_initial_message: bool,
    pub replies_received: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(sender_id: &str) -> Self {
        let now = Utc::now();
        Self {
            sender_id: sender_id.to_string(),
            is_initial: true,
            asked_questions: BTreeSet::new(),
            completed_actions: BTreeSet::new(),
            current_pathway: PathwayKind::InitialAssessment,
            pathway_question_index: 0,
            last_question: None,
            has_shown_initial_message: false,
            replies_received: 0,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn phase(&self) -> DialoguePhase {
        if !self.has_shown_initial_message {
            DialoguePhase::Uninitialized
        } else if self.replies_received == 0 {
            DialoguePhase::AwaitingFirstReply
        } else {
            DialoguePhase::InDialogue
        }
    }

    /// True while no question has been asked yet, so the next one comes from
    /// the universal opening pool.
    pub fn needs_cold_start(&self) -> bool {
        self.asked_questions.is_empty()
    }

    pub fn record_question(&mut self, question: &str) {
        self.asked_questions.insert(question.to_string());
        self.last_question = Some(question.to_string());
    }

    pub fn mark_initial_shown(&mut self) {
        self.is_initial = false;
        self.has_shown_initial_message = true;
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Checks the question cursor against the current pathway.
    pub fn validate(&self) -> Result<(), GuideError> {
        let len = knowledge::pathway(self.current_pathway).questions.len();
        if self.pathway_question_index > len {
            return Err(GuideError::StateCorruption {
                pathway: self.current_pathway,
                index: self.pathway_question_index,
                len,
            });
        }
        Ok(())
    }

    /// Drops everything learned about the sender, keeping only the identifier.
    pub fn reset(&mut self) {
        *self = Self::new(&self.sender_id);
    }
}
