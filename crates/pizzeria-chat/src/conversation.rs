//! Caller-owned chat history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pizzeria_core::types::{ChatMessage, Role};

use crate::prompt;

/// The messages of one ordering session, oldest first.
///
/// A conversation is a plain value. The orchestrator takes it by value and
/// hands back the extended history, so nothing about a session lives
/// anywhere but with the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a session seeded with the menu-bearing system message and the
    /// welcome line.
    pub fn new(restaurant: &str, menu_text: &str) -> Self {
        Self::seeded(
            prompt::system_message(restaurant, menu_text),
            prompt::welcome(restaurant),
        )
    }

    /// Start a session after a finished order.
    pub fn next_order(restaurant: &str, menu_text: &str) -> Self {
        Self::seeded(
            prompt::system_message(restaurant, menu_text),
            prompt::welcome_back(restaurant),
        )
    }

    fn seeded(system: ChatMessage, greeting: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            messages: vec![system, ChatMessage::assistant(greeting)],
        }
    }

    /// True when the first message is a system instruction.
    pub fn has_system_message(&self) -> bool {
        self.messages
            .first()
            .is_some_and(|m| m.role == Role::System)
    }

    /// Messages to send to the model: the history with `system` put in
    /// front when the history does not already start with one.
    pub fn for_model(&self, system: &ChatMessage) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if !self.has_system_message() {
            messages.push(system.clone());
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }

    /// Messages a user should see, i.e. everything but system instructions.
    pub fn visible(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }

    /// Number of user messages so far.
    pub fn user_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_seeded() {
        let conv = Conversation::new("Sajid's Pizzeria", "🍕 PIZZAS:");
        assert_eq!(conv.messages.len(), 2);
        assert!(conv.has_system_message());
        assert!(conv.messages[0].content.contains("🍕 PIZZAS:"));
        assert_eq!(conv.messages[1].role, Role::Assistant);
        assert!(conv.messages[1].content.starts_with("🍕 Welcome to Sajid's Pizzeria!"));
        assert_eq!(conv.user_turns(), 0);
    }

    #[test]
    fn test_next_order_has_fresh_id() {
        let first = Conversation::new("Sajid's Pizzeria", "menu");
        let second = Conversation::next_order("Sajid's Pizzeria", "menu");
        assert_ne!(first.id, second.id);
        assert!(second.messages[1].content.contains("ready to take your next order"));
    }

    #[test]
    fn test_for_model_keeps_existing_system_message() {
        let conv = Conversation::new("Sajid's Pizzeria", "menu");
        let system = ChatMessage::system("other");
        let messages = conv.for_model(&system);
        assert_eq!(messages, conv.messages);
    }

    #[test]
    fn test_for_model_restores_missing_system_message() {
        let mut conv = Conversation::new("Sajid's Pizzeria", "menu");
        conv.messages.remove(0);
        conv.push(ChatMessage::user("hi"));

        let system = ChatMessage::system("You are OrderBot");
        let messages = conv.for_model(&system);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], system);
        assert_eq!(messages[2], ChatMessage::user("hi"));
        // the history itself is left alone
        assert!(!conv.has_system_message());
    }

    #[test]
    fn test_visible_skips_system() {
        let mut conv = Conversation::new("Sajid's Pizzeria", "menu");
        conv.push(ChatMessage::user("one margherita"));
        let roles: Vec<Role> = conv.visible().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User]);
        assert_eq!(conv.user_turns(), 1);
    }

    #[test]
    fn test_empty_history_has_no_system_message() {
        let conv = Conversation {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            messages: Vec::new(),
        };
        assert!(!conv.has_system_message());
        assert_eq!(conv.for_model(&ChatMessage::system("s")).len(), 1);
    }
}
