use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::message::{ChatMessage, MessagePatch};

/// Ordered conversation transcript shared between the orchestrator and the renderer.
///
/// Cloning yields another handle to the same transcript. Locks are only held
/// for the duration of a single call.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the welcome message
    pub fn with_welcome() -> Self {
        let store = Self::new();
        store.append(ChatMessage::welcome());
        store
    }

    // A panic while holding the lock cannot leave the Vec half-written,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Vec<ChatMessage>> {
        self.messages.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ChatMessage>> {
        self.messages.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, message: ChatMessage) {
        debug!(id = %message.id, role = ?message.role, "Appending message");
        self.write().push(message);
    }

    /// Merges `patch` into the message with `id`. Returns false when no message matches.
    pub fn update_by_id(&self, id: &str, patch: MessagePatch) -> bool {
        let mut messages = self.write();
        match messages.iter_mut().find(|message| message.id == id) {
            Some(message) => {
                message.apply(patch);
                true
            }
            None => {
                debug!(id, "Ignoring update for unknown message");
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<ChatMessage> {
        self.read().iter().find(|message| message.id == id).cloned()
    }

    /// Snapshot of the full transcript in insertion order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;

    #[test]
    fn test_append_preserves_order() {
        let store = MessageStore::new();
        let first = ChatMessage::user("first");
        let second = ChatMessage::placeholder();
        let ids = [first.id.clone(), second.id.clone()];

        store.append(first);
        store.append(second);

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, ids[0]);
        assert_eq!(messages[1].id, ids[1]);
        assert_eq!(messages[1].role, MessageRole::Model);
    }

    #[test]
    fn test_update_by_id_merges_fields() {
        let store = MessageStore::new();
        let placeholder = ChatMessage::placeholder();
        let id = placeholder.id.clone();
        store.append(ChatMessage::user("q"));
        store.append(placeholder);

        assert!(store.update_by_id(&id, MessagePatch::finished("answer")));
        assert!(store.update_by_id(&id, MessagePatch::assets(None, Some(vec![7]))));

        let message = store.get(&id).unwrap();
        assert_eq!(message.text, "answer");
        assert!(!message.is_loading);
        assert_eq!(message.related_audio, Some(vec![7]));
        assert!(message.related_image.is_none());
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let store = MessageStore::with_welcome();
        let before = store.messages();

        assert!(!store.update_by_id("missing", MessagePatch::finished("x")));

        assert_eq!(store.messages(), before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clones_share_transcript() {
        let store = MessageStore::new();
        let handle = store.clone();
        handle.append(ChatMessage::user("shared"));
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}
