//! AI product search.
//!
//! The backend `searchAi` endpoint takes a keyword and/or a room photo and
//! answers with free text plus a list of suggested products. This module
//! turns that answer into a chat transcript entry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lenient;

/// Opening line of every transcript.
pub const GREETING: &str = "Hi! I'm the Hearth shopping assistant. What are you looking for today?";

/// Shown above suggestions when the backend sent no text of its own.
pub const DEFAULT_SUGGESTION_TEXT: &str = "Here are some products picked for you:";

/// Shown when the answer had neither text nor suggestions.
pub const MALFORMED_REPLY_TEXT: &str =
    "The assistant replied in an unexpected format or found no suggestions.";

/// User-side text when only a photo was sent.
pub const IMAGE_ONLY_TEXT: &str = "Sent a photo";

/// A suggested product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub slug: String,
    #[serde(rename = "thumbNail", alias = "thumbnail", default, deserialize_with = "lenient::opt_string")]
    pub thumbnail: Option<String>,
}

/// Raw `searchAi` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchReply {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub reply: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub suggestions: Vec<Suggestion>,
    #[serde(rename = "additionalReply", default, deserialize_with = "lenient::opt_string")]
    pub additional_reply: Option<String>,
}

/// Who wrote a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: Sender,
    pub text: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    /// Name of the uploaded photo, for user entries.
    #[serde(default)]
    pub image_name: Option<String>,
}

impl ChatMessage {
    #[must_use]
    pub fn greeting() -> Self {
        Self::assistant(GREETING)
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            from: Sender::Assistant,
            text: text.into(),
            suggestions: Vec::new(),
            image_name: None,
        }
    }

    /// The user's side of a query. `None` when there is nothing to send.
    #[must_use]
    pub fn user(keyword: &str, image_name: Option<&str>) -> Option<Self> {
        let keyword = keyword.trim();
        let text = match (keyword.is_empty(), image_name) {
            (false, _) => keyword.to_owned(),
            (true, Some(_)) => IMAGE_ONLY_TEXT.to_owned(),
            (true, None) => return None,
        };
        Some(Self {
            from: Sender::User,
            text,
            suggestions: Vec::new(),
            image_name: image_name.map(str::to_owned),
        })
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self.from, Sender::User)
    }
}

impl SearchReply {
    /// Compose the assistant entry.
    ///
    /// - with suggestions: `reply`, then `additionalReply` after a blank line;
    ///   without `reply`, `additionalReply` or a default line leads;
    /// - without suggestions: `reply` alone, or a malformed-reply notice.
    #[must_use]
    pub fn into_message(self) -> ChatMessage {
        let Self {
            reply,
            suggestions,
            additional_reply,
        } = self;

        let text = if suggestions.is_empty() {
            reply.unwrap_or_else(|| MALFORMED_REPLY_TEXT.to_owned())
        } else {
            match (reply, additional_reply) {
                (Some(reply), Some(more)) => format!("{reply}\n\n{more}"),
                (Some(reply), None) => reply,
                (None, Some(more)) => more,
                (None, None) => DEFAULT_SUGGESTION_TEXT.to_owned(),
            }
        };

        ChatMessage {
            from: Sender::Assistant,
            text,
            suggestions,
            image_name: None,
        }
    }
}

/// Keep only the newest `max` entries, always retaining the greeting.
pub fn trim_transcript(transcript: &mut Vec<ChatMessage>, max: usize) {
    if transcript.len() <= max || max < 2 {
        return;
    }
    let excess = transcript.len() - max;
    transcript.drain(1..=excess);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reply(value: serde_json::Value) -> ChatMessage {
        serde_json::from_value::<SearchReply>(value)
            .unwrap_or_default()
            .into_message()
    }

    #[test]
    fn test_reply_and_additional_with_suggestions() {
        let msg = reply(json!({
            "reply": "Try these sofas.",
            "additionalReply": "All in stock.",
            "suggestions": [{"title": "Sofa", "price": 5000000, "slug": "sofa", "thumbNail": "s.jpg"}]
        }));
        assert_eq!(msg.text, "Try these sofas.\n\nAll in stock.");
        assert_eq!(msg.suggestions.len(), 1);
        assert_eq!(msg.suggestions.first().and_then(|s| s.thumbnail.as_deref()), Some("s.jpg"));
    }

    #[test]
    fn test_suggestions_without_reply() {
        let msg = reply(json!({"suggestions": [{"title": "Lamp"}], "additionalReply": "Warm light."}));
        assert_eq!(msg.text, "Warm light.");
        let msg = reply(json!({"suggestions": [{"title": "Lamp"}]}));
        assert_eq!(msg.text, DEFAULT_SUGGESTION_TEXT);
    }

    #[test]
    fn test_reply_only_ignores_additional() {
        let msg = reply(json!({"reply": "No match.", "additionalReply": "ignored", "suggestions": []}));
        assert_eq!(msg.text, "No match.");
    }

    #[test]
    fn test_malformed_reply() {
        assert_eq!(reply(json!({})).text, MALFORMED_REPLY_TEXT);
        assert_eq!(reply(json!({"reply": "", "suggestions": "none"})).text, MALFORMED_REPLY_TEXT);
    }

    #[test]
    fn test_user_message() {
        assert_eq!(ChatMessage::user("  ", None), None);
        assert_eq!(ChatMessage::user("", Some("room.jpg")).map(|m| m.text), Some(IMAGE_ONLY_TEXT.to_owned()));
        assert_eq!(ChatMessage::user(" oak table ", None).map(|m| m.text), Some("oak table".to_owned()));
    }

    #[test]
    fn test_trim_keeps_greeting() {
        let mut transcript: Vec<ChatMessage> = std::iter::once(ChatMessage::greeting())
            .chain((0..5).map(|i| ChatMessage::assistant(i.to_string())))
            .collect();
        trim_transcript(&mut transcript, 3);
        let texts: Vec<&str> = transcript.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![GREETING, "3", "4"]);
    }
}
