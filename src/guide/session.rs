use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::info;

use super::conversation_state::ConversationState;
use super::error::SessionError;

/// Shared handle to one sender's state. Holding its lock serializes turns for
/// that sender.
pub type SessionHandle = Arc<tokio::sync::Mutex<ConversationState>>;

/// Owns the conversation state of every active sender.
///
/// The map lock is only held to look up, insert or remove a handle, never
/// across an await.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

/// A row for operator listings.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub sender_id: String,
    pub replies_received: u32,
    pub last_activity: DateTime<Utc>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the sender's handle, creating a fresh state on first sight.
    pub fn get_or_create(&self, sender_id: &str) -> SessionHandle {
        let mut sessions = self.map();
        if let Some(handle) = sessions.get(sender_id) {
            return Arc::clone(handle);
        }

        info!("Starting session for {}", sender_id);
        let handle = Arc::new(tokio::sync::Mutex::new(ConversationState::new(sender_id)));
        sessions.insert(sender_id.to_string(), Arc::clone(&handle));
        handle
    }

    pub fn contains(&self, sender_id: &str) -> bool {
        self.map().contains_key(sender_id)
    }

    /// Deletes the sender's state. Their next message starts from scratch.
    pub fn reset(&self, sender_id: &str) -> Result<(), SessionError> {
        match self.map().remove(sender_id) {
            Some(_) => {
                info!("Reset session for {}", sender_id);
                Ok(())
            }
            None => Err(SessionError::NotFound(sender_id.to_string())),
        }
    }

    /// A copy of the sender's state, waiting for any turn in progress.
    pub async fn snapshot(&self, sender_id: &str) -> Option<ConversationState> {
        let handle = self.map().get(sender_id).cloned()?;
        let state = handle.lock().await;
        Some(state.clone())
    }

    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = self.map().values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let state = handle.lock().await;
            summaries.push(SessionSummary {
                sender_id: state.sender_id.clone(),
                replies_received: state.replies_received,
                last_activity: state.last_activity,
            });
        }
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_sender_gets_same_state() {
        let store = SessionStore::new();
        let first = store.get_or_create("a");
        let second = store.get_or_create("a");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);

        store.get_or_create("b");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reset_unknown_sender_is_not_found() {
        let store = SessionStore::new();
        assert_eq!(store.reset("ghost"), Err(SessionError::NotFound("ghost".to_string())));
    }

    #[tokio::test]
    async fn reset_discards_state() {
        let store = SessionStore::new();
        {
            let handle = store.get_or_create("a");
            let mut state = handle.lock().await;
            state.record_question("Is the person calm and still?");
        }
        store.reset("a").unwrap();
        assert!(!store.contains("a"));
        assert!(store.snapshot("a").await.is_none());

        let fresh = store.get_or_create("a");
        assert!(fresh.lock().await.asked_questions.is_empty());
    }

    #[tokio::test]
    async fn summaries_list_every_sender() {
        let store = SessionStore::new();
        store.get_or_create("a");
        store.get_or_create("b");
        let mut senders: Vec<String> = store
            .summaries()
            .await
            .into_iter()
            .map(|s| s.sender_id)
            .collect();
        senders.sort();
        assert_eq!(senders, vec!["a".to_string(), "b".to_string()]);
    }
}
