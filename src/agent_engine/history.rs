use crate::llm::prompt::leading_pair;
use crate::llm::types::ChatMessage;

/// Smallest usable window: the leading pair plus the newest message.
pub const MIN_MESSAGES: usize = 3;

/// Bounded conversation sent to the model.
///
/// The first two messages (system instruction and acknowledgement) are pinned;
/// everything after them is a sliding window of the most recent turns.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    max_messages: usize,
}

impl ConversationHistory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: leading_pair().to_vec(),
            max_messages: max_messages.max(MIN_MESSAGES),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Drop the oldest non-pinned messages until the window fits.
    pub fn prune(&mut self) {
        if self.messages.len() <= self.max_messages {
            return;
        }
        let excess = self.messages.len() - self.max_messages;
        let dropped: Vec<ChatMessage> = self.messages.drain(2..2 + excess).collect();
        tracing::debug!(dropped = dropped.len(), kept = self.messages.len(), "context pruned");
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Leading pair plus the newest user turn, for a retry after a timeout.
    pub fn minimized(&self) -> Vec<ChatMessage> {
        let mut out: Vec<ChatMessage> = self.messages.iter().take(2).cloned().collect();
        if let Some(last_user) = self.messages.iter().skip(2).rev().find(|m| m.is_user()) {
            out.push(last_user.clone());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompt::{ACKNOWLEDGEMENT, SYSTEM_PROMPT};

    fn filled(max: usize, turns: usize) -> ConversationHistory {
        let mut h = ConversationHistory::new(max);
        for i in 0..turns {
            h.push(ChatMessage::user(format!("u{i}")));
            h.push(ChatMessage::assistant(format!("a{i}")));
            h.prune();
        }
        h
    }

    #[test]
    fn window_never_exceeds_bound_and_keeps_leading_pair() {
        for max in [3usize, 4, 6, 10] {
            for turns in 0..8 {
                let h = filled(max, turns);
                assert!(h.len() <= max, "max {max} turns {turns}");
                assert_eq!(h.messages()[0].text(), SYSTEM_PROMPT);
                assert_eq!(h.messages()[1].text(), ACKNOWLEDGEMENT);
            }
        }
    }

    #[test]
    fn newest_messages_survive() {
        let h = filled(6, 5);
        let texts: Vec<String> = h.messages()[2..].iter().map(ChatMessage::text).collect();
        assert_eq!(texts, vec!["u3", "a3", "u4", "a4"]);
    }

    #[test]
    fn bound_below_three_is_raised() {
        let mut h = ConversationHistory::new(0);
        h.push(ChatMessage::user("a"));
        h.push(ChatMessage::user("b"));
        h.prune();
        assert_eq!(h.len(), 3);
        assert_eq!(h.messages()[2].text(), "b");
    }

    #[test]
    fn minimized_keeps_last_user_turn() {
        let mut h = filled(10, 2);
        h.push(ChatMessage::user_with_image("look", "data:image/jpeg;base64,AA"));
        h.push(ChatMessage::assistant("ACTION: DONE"));
        let min = h.minimized();
        assert_eq!(min.len(), 3);
        assert_eq!(min[2].text(), "look");

        let fresh = ConversationHistory::new(6).minimized();
        assert_eq!(fresh.len(), 2);
    }
}
