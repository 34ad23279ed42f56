//! AI search route handlers.
//!
//! The conversation is kept in the session as a transcript that always opens
//! with the assistant's greeting. Each question posts a keyword and/or a room
//! photo, appends both sides of the exchange and redirects back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use hearth_core::Money;
use hearth_core::search::{ChatMessage, Suggestion, trim_transcript};

use crate::backend::RoomImage;
use crate::error::AppError;
use crate::filters;
use crate::filters::image_url;
use crate::middleware::{push_flash, session_credentials};
use crate::models::{Flash, session_keys};
use crate::state::AppState;
use crate::views::Chrome;

/// Longest transcript kept in the session, greeting included.
pub const MAX_TRANSCRIPT_LEN: usize = 40;

/// Suggested product display data for templates.
#[derive(Clone)]
pub struct SuggestionView {
    pub title: String,
    pub price: String,
    pub color: String,
    pub href: String,
    pub image: String,
}

impl From<&Suggestion> for SuggestionView {
    fn from(suggestion: &Suggestion) -> Self {
        Self {
            title: suggestion.title.clone(),
            price: Money::display_or(suggestion.price, "Contact us"),
            color: suggestion.color.clone(),
            href: format!("/products/{}", urlencoding::encode(&suggestion.slug)),
            image: image_url(suggestion.thumbnail.as_deref().unwrap_or_default()),
        }
    }
}

/// Transcript entry display data for templates.
#[derive(Clone)]
pub struct MessageView {
    pub from_user: bool,
    pub paragraphs: Vec<String>,
    pub image_name: Option<String>,
    pub suggestions: Vec<SuggestionView>,
}

impl From<&ChatMessage> for MessageView {
    fn from(message: &ChatMessage) -> Self {
        Self {
            from_user: message.is_user(),
            paragraphs: message
                .text
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect(),
            image_name: message.image_name.clone(),
            suggestions: message.suggestions.iter().map(SuggestionView::from).collect(),
        }
    }
}

/// Search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/show.html")]
pub struct SearchTemplate {
    pub chrome: Chrome,
    pub messages: Vec<MessageView>,
}

async fn load_transcript(session: &Session) -> Vec<ChatMessage> {
    session
        .get::<Vec<ChatMessage>>(session_keys::SEARCH_TRANSCRIPT)
        .await
        .ok()
        .flatten()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| vec![ChatMessage::greeting()])
}

/// Display the transcript.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let transcript = load_transcript(&session).await;
    SearchTemplate {
        chrome: Chrome::load(&state, &session).await,
        messages: transcript.iter().map(MessageView::from).collect(),
    }
}

/// Fields of the search form.
#[derive(Default)]
struct Question {
    keyword: String,
    image: Option<RoomImage>,
}

async fn read_question(mut multipart: Multipart) -> Result<Question, AppError> {
    let mut question = Question::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("keyword") => {
                question.keyword = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
            }
            Some("roomImage") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    question.image = Some(RoomImage {
                        file_name: if file_name.is_empty() {
                            "room.jpg".to_owned()
                        } else {
                            file_name
                        },
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(question)
}

/// Ask the assistant.
#[instrument(skip(state, session, multipart))]
pub async fn ask(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let Question { keyword, image } = read_question(multipart).await?;

    let image_name = image.as_ref().map(|i| i.file_name.clone());
    let Some(question) = ChatMessage::user(&keyword, image_name.as_deref()) else {
        push_flash(
            &session,
            Flash::error("Type a question or attach a photo of your room."),
        )
        .await;
        return Ok(Redirect::to("/search").into_response());
    };

    let mut transcript = load_transcript(&session).await;
    transcript.push(question);

    let credentials = session_credentials(&session).await;
    let answer = match state
        .backend()
        .search(&credentials, keyword.trim(), image)
        .await
    {
        Ok(reply) => reply.into_message(),
        Err(e) => {
            tracing::warn!("AI search failed: {e}");
            ChatMessage::assistant(format!("Sorry, something went wrong. {}", e.user_message()))
        }
    };
    transcript.push(answer);
    trim_transcript(&mut transcript, MAX_TRANSCRIPT_LEN);

    session
        .insert(session_keys::SEARCH_TRANSCRIPT, &transcript)
        .await?;

    Ok(Redirect::to("/search").into_response())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_message_view_paragraphs() {
        let message = ChatMessage {
            suggestions: vec![Suggestion {
                title: "Walnut bookshelf".into(),
                price: Some(Decimal::from(4_500_000)),
                slug: "walnut bookshelf".into(),
                ..Suggestion::default()
            }],
            ..ChatMessage::assistant("Warm tones suit your room.\n\nThese match the floor:")
        };
        let view = MessageView::from(&message);
        assert!(!view.from_user);
        assert_eq!(view.paragraphs.len(), 2);
        assert_eq!(view.suggestions[0].price, "4.500.000 ₫");
        assert_eq!(view.suggestions[0].href, "/products/walnut%20bookshelf");
    }

    #[test]
    fn test_user_message_view_keeps_photo_name() {
        let message = ChatMessage::user("", Some("living.jpg"));
        let view = message.as_ref().map(MessageView::from);
        assert_eq!(
            view.and_then(|v| v.image_name),
            Some("living.jpg".to_string())
        );
    }
}
