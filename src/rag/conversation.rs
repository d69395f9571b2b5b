//! Caller-owned conversation history for multi-turn chat.

use crate::config::ContextStrategy;
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Ordered history of a chat session.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    turns: Vec<Turn>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn {
            role,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Every turn's text joined with single spaces, oldest first.
    pub fn render(&self) -> String {
        join_turns(&self.turns)
    }

    /// Render the history as a retrieval question using `strategy`.
    ///
    /// `window` is only consulted by [`ContextStrategy::Window`].
    pub fn render_with(&self, strategy: ContextStrategy, window: usize) -> String {
        match strategy {
            ContextStrategy::Concatenate => self.render(),
            ContextStrategy::Latest => self
                .turns
                .iter()
                .rev()
                .find(|t| t.role == Role::User)
                .map(|t| t.text.clone())
                .unwrap_or_default(),
            ContextStrategy::Window => {
                let start = self.turns.len().saturating_sub(window);
                join_turns(&self.turns[start..])
            }
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

fn join_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConversationContext {
        let mut context = ConversationContext::new();
        context.append(Role::User, "What helps nausea?");
        context.append(Role::Assistant, "Ginger tea.");
        context.append(Role::User, "How much per day?");
        context
    }

    #[test]
    fn test_render_concatenates_without_roles() {
        let context = sample();
        assert_eq!(context.len(), 3);
        assert_eq!(
            context.render(),
            "What helps nausea? Ginger tea. How much per day?"
        );
        assert_eq!(
            context.render_with(ContextStrategy::Concatenate, 1),
            context.render()
        );
    }

    #[test]
    fn test_latest_user_turn() {
        let mut context = sample();
        assert_eq!(
            context.render_with(ContextStrategy::Latest, 6),
            "How much per day?"
        );

        context.append(Role::Assistant, "1g.");
        assert_eq!(
            context.render_with(ContextStrategy::Latest, 6),
            "How much per day?"
        );
    }

    #[test]
    fn test_window_keeps_last_turns() {
        let context = sample();
        assert_eq!(
            context.render_with(ContextStrategy::Window, 2),
            "Ginger tea. How much per day?"
        );
        assert_eq!(
            context.render_with(ContextStrategy::Window, 10),
            context.render()
        );
    }

    #[test]
    fn test_clear() {
        let mut context = sample();
        context.clear();
        assert!(context.is_empty());
        assert_eq!(context.render(), "");
        assert_eq!(context.render_with(ContextStrategy::Latest, 6), "");
    }
}
