//! In-memory chat log.
//!
//! One ordered log per process, shared by every handler; not persisted
//! across restarts. Appends go through a lock so concurrent requests cannot
//! lose turns.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Clone, Default)]
pub struct ChatHistory {
    turns: Arc<RwLock<Vec<ChatTurn>>>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, role: ChatRole, content: impl Into<String>) {
        let mut turns = self.turns.write().await;
        turns.push(ChatTurn {
            role,
            content: content.into(),
        });
    }

    /// Append a user question and the assistant's answer as one unit, so a
    /// concurrent query cannot interleave between them.
    pub async fn append_exchange(&self, question: impl Into<String>, answer: impl Into<String>) {
        let mut turns = self.turns.write().await;
        turns.push(ChatTurn {
            role: ChatRole::User,
            content: question.into(),
        });
        turns.push(ChatTurn {
            role: ChatRole::Assistant,
            content: answer.into(),
        });
    }

    pub async fn snapshot(&self) -> Vec<ChatTurn> {
        self.turns.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.turns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.turns.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.turns.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_preserve_order() {
        let history = ChatHistory::new();
        history.append(ChatRole::User, "question").await;
        history.append(ChatRole::Assistant, "answer").await;
        history.append(ChatRole::System, "note").await;

        let turns = history.snapshot().await;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, ChatRole::User);
        assert_eq!(turns[1].content, "answer");
        assert_eq!(turns[2].role, ChatRole::System);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let history = ChatHistory::new();
        history.clear().await;
        assert!(history.is_empty().await);

        history.append(ChatRole::User, "q").await;
        history.clear().await;
        history.clear().await;
        assert!(history.is_empty().await);
    }

    #[tokio::test]
    async fn exchange_keeps_question_and_answer_adjacent() {
        let history = ChatHistory::new();
        let mut tasks = Vec::new();
        for i in 0..8 {
            let history = history.clone();
            tasks.push(tokio::spawn(async move {
                history
                    .append_exchange(format!("q{}", i), format!("a{}", i))
                    .await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let turns = history.snapshot().await;
        assert_eq!(turns.len(), 16);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, ChatRole::User);
            assert_eq!(pair[1].role, ChatRole::Assistant);
            assert_eq!(&pair[0].content[1..], &pair[1].content[1..]);
        }
    }

    #[test]
    fn roles_serialize_lowercase() {
        let turn = ChatTurn {
            role: ChatRole::Assistant,
            content: "hi".into(),
        };
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["role"], "assistant");
    }
}
