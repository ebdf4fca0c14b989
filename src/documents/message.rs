use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Human,
    Bot,
}

/// Entry of the conversation log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<QuickReply>,
}

impl ConversationMessage {
    pub fn new(author: Author, text: impl Into<String>) -> Self {
        ConversationMessage {
            id: Uuid::new_v4(),
            author,
            text: text.into(),
            created_at: Utc::now(),
            image: None,
            quick_replies: vec![],
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Author::Human, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Author::Bot, text)
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn with_quick_replies(mut self, quick_replies: Vec<QuickReply>) -> Self {
        self.quick_replies = quick_replies;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuickReply {
    pub title: String,
    pub value: String,
}

impl QuickReply {
    pub fn yes() -> Self {
        QuickReply {
            title: "Yes".to_owned(),
            value: "yes".to_owned(),
        }
    }

    pub fn no() -> Self {
        QuickReply {
            title: "No".to_owned(),
            value: "no".to_owned(),
        }
    }

    /// The fixed option pair offered by the confirmation sub-flow.
    pub fn confirmation() -> Vec<Self> {
        vec![Self::yes(), Self::no()]
    }

    /// Maps a typed answer onto one of the confirmation replies, if it
    /// matches one.
    pub fn from_answer(answer: &str) -> Option<Self> {
        let answer = answer.trim();
        Self::confirmation().into_iter().find(|reply| {
            reply.value.eq_ignore_ascii_case(answer) || reply.title.eq_ignore_ascii_case(answer)
        })
    }

    pub fn is_affirmative(&self) -> bool {
        self.value == "yes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique() {
        let a = ConversationMessage::human("hello");
        let b = ConversationMessage::human("hello");
        assert_ne!(a.id, b.id);
        assert_eq!(a.author, Author::Human);
    }

    #[test]
    fn answers_map_to_replies() {
        assert_eq!(QuickReply::from_answer(" YES "), Some(QuickReply::yes()));
        assert_eq!(QuickReply::from_answer("no"), Some(QuickReply::no()));
        assert_eq!(QuickReply::from_answer("maybe"), None);
        assert!(QuickReply::yes().is_affirmative());
        assert!(!QuickReply::no().is_affirmative());
    }
}
