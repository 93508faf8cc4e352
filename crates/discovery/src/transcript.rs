//! Append-only chat transcript with optimistic user entries.
//!
//! A provisional entry carries an id in the `temp-` namespace. Once the
//! backend answers, every provisional entry is dropped and the confirmed
//! suffix (user message, then assistant reply) is appended. Nothing else
//! is ever reordered or removed.

use chrono::{DateTime, Utc};
use persona_protocol::{ConversationMessage, TrackId, TEMP_ID_PREFIX};
use uuid::Uuid;

pub fn provisional_id() -> String {
    format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4())
}

/// Append unless a message with the same id is already present
pub fn append(history: &mut Vec<ConversationMessage>, message: ConversationMessage) -> bool {
    if history.iter().any(|m| m.id == message.id) {
        log::debug!("Skipping duplicate message {}", message.id);
        return false;
    }
    history.push(message);
    true
}

/// Append an optimistic user message and return its temporary id
pub fn push_provisional(
    history: &mut Vec<ConversationMessage>,
    content: &str,
    track: Option<TrackId>,
    now: DateTime<Utc>,
) -> String {
    let mut message = ConversationMessage::user(provisional_id(), content, now);
    message.track_id = track;
    let id = message.id.clone();
    history.push(message);
    id
}

/// Drop every provisional entry, returning how many were removed
pub fn rollback_provisional(history: &mut Vec<ConversationMessage>) -> usize {
    let before = history.len();
    history.retain(|m| !m.is_provisional());
    before - history.len()
}

/// Replace provisional entries with the backend's authoritative suffix.
///
/// When the backend does not echo the user message, the latest provisional
/// entry is promoted to a permanent id instead.
pub fn reconcile(
    history: &mut Vec<ConversationMessage>,
    confirmed_user: Option<ConversationMessage>,
    reply: ConversationMessage,
) {
    let promoted = history.iter().rev().find(|m| m.is_provisional()).cloned();
    rollback_provisional(history);

    match (confirmed_user, promoted) {
        (Some(user), _) => {
            append(history, user);
        }
        (None, Some(mut user)) => {
            user.id = Uuid::new_v4().to_string();
            history.push(user);
        }
        (None, None) => {}
    }

    append(history, reply);
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_protocol::{MessageKind, MessageRole};
    use pretty_assertions::assert_eq;

    fn reply(id: &str) -> ConversationMessage {
        ConversationMessage::assistant(id, MessageKind::Question, "Go on", Utc::now())
    }

    #[test]
    fn test_reconcile_uses_confirmed_user_message() {
        let now = Utc::now();
        let mut history = vec![reply("a0")];
        push_provisional(&mut history, "hello", Some(TrackId::Academic), now);

        let confirmed = ConversationMessage::user("u1", "hello", now);
        reconcile(&mut history, Some(confirmed), reply("a1"));

        let ids: Vec<_> = history.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a0", "u1", "a1"]);
    }

    #[test]
    fn test_reconcile_promotes_unechoed_message() {
        let mut history = Vec::new();
        push_provisional(&mut history, "hello", None, Utc::now());
        reconcile(&mut history, None, reply("a1"));

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[0].content, "hello");
        assert!(!history[0].is_provisional());
    }

    #[test]
    fn test_rollback_only_touches_provisional() {
        let mut history = vec![reply("a0")];
        push_provisional(&mut history, "one", None, Utc::now());
        push_provisional(&mut history, "two", None, Utc::now());
        assert_eq!(rollback_provisional(&mut history), 2);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "a0");
    }

    #[test]
    fn test_append_skips_known_ids() {
        let mut history = vec![reply("a0")];
        assert!(!append(&mut history, reply("a0")));
        assert_eq!(history.len(), 1);
    }
}
