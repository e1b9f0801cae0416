//! Plain chat mode: one streamed call per turn, no specialist roles.
//!
//! State is updated from keywords in the user's message before the call,
//! and the transcript window gives the model short-term memory.

use crate::approval::ApprovalGate;
use crate::chef::Chef;
use crate::roles::chat_system_prompt;
use chef_core::{
    extract_keywords, extract_pantry_items, ChatMessage, CompletionRequest, LlmProvider, Session,
    StreamChunk,
};
use chef_error::{Error, Result};
use tracing::{debug, instrument};

/// Full single-message prompt for one chat turn
pub fn build_chat_prompt(session: &Session, input: &str, window: usize) -> String {
    let mut prompt = chat_system_prompt(&session.preferences, &session.pantry);
    prompt.push_str("\n\nConversation:\n");
    for line in session.recent_conversation(window) {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push_str(&format!("User: {}\nAssistant:", input));
    prompt
}

/// Apply keyword-detected preferences and pantry additions.
pub fn apply_keywords(session: &mut Session, input: &str) {
    let updated = session.preferences.merge(&extract_keywords(input));
    if !updated.is_empty() {
        debug!(fields = ?updated, "preferences updated from keywords");
    }

    let items = extract_pantry_items(input);
    if !items.is_empty() {
        session.pantry.add_items(items.as_slice(), None);
    }
}

impl<P: LlmProvider, G: ApprovalGate> Chef<P, G> {
    /// One plain chat turn. Text is handed to `on_text` as it streams in;
    /// the transcript only grows when the reply completes.
    #[instrument(skip(self, session, on_text), fields(session_id = %session.id))]
    pub async fn chat(
        &mut self,
        session: &mut Session,
        input: &str,
        mut on_text: impl FnMut(&str),
    ) -> Result<String> {
        apply_keywords(session, input);

        let prompt = build_chat_prompt(session, input, self.config.history_window);
        let mut request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(self.config.temperature)
            .with_top_p(self.config.top_p);
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string());

        let mut stream = self
            .provider
            .stream(request)
            .await
            .map_err(|e| e.into_error().with_operation("chef::chat"))?;

        let mut reply = String::new();
        while let Some(chunk) = stream.next_chunk().await {
            match chunk {
                StreamChunk::Text(text) => {
                    on_text(&text);
                    reply.push_str(&text);
                }
                StreamChunk::Done { usage, .. } => {
                    if let Some(usage) = usage {
                        self.usage.track(&model, &usage);
                    }
                    break;
                }
                StreamChunk::Error(message) => {
                    return Err(Error::inference_failed(message).with_operation("chef::chat"));
                }
            }
        }

        let reply = reply.trim().to_string();
        if reply.is_empty() {
            return Err(Error::empty_response("chat").with_operation("chef::chat"));
        }

        session.record_exchange(input, &reply);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use chef_core::ProviderError;
    use chef_error::ErrorKind;

    #[test]
    fn test_prompt_layout() {
        let mut session = Session::new("s");
        session.record_exchange("hi", "hello!");

        let prompt = build_chat_prompt(&session, "what's for dinner?", 6);
        assert!(prompt.starts_with("You are The Adaptive Chef"));
        assert!(prompt.ends_with(
            "Conversation:\nUser: hi\nAssistant: hello!\nUser: what's for dinner?\nAssistant:"
        ));
    }

    #[test]
    fn test_prompt_window() {
        let mut session = Session::new("s");
        for i in 0..4 {
            session.record_exchange(&format!("q{}", i), &format!("a{}", i));
        }

        let prompt = build_chat_prompt(&session, "next", 6);
        assert!(!prompt.contains("User: q0"));
        assert!(!prompt.contains("Assistant: a0"));
        assert!(prompt.contains("User: q1\nAssistant: a1\nUser: q2"));
    }

    #[test]
    fn test_apply_keywords() {
        let mut session = Session::new("s");
        apply_keywords(&mut session, "I'm vegan! Please add rice, lentils to my pantry");

        assert_eq!(session.preferences.dietary_restrictions, vec!["vegan"]);
        assert!(session.pantry.contains("rice"));
        assert!(session.pantry.contains("lentils"));
        assert!(!session.pantry.contains("please"));
    }

    #[tokio::test]
    async fn test_chat_streams_and_records() {
        let provider = ScriptedProvider::new().text("Try a chickpea curry tonight.");
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");
        let mut streamed = String::new();

        let reply = chef
            .chat(&mut session, "I'm vegetarian, ideas?", |t| streamed.push_str(t))
            .await
            .unwrap();

        assert_eq!(reply, "Try a chickpea curry tonight.");
        assert_eq!(streamed, reply);
        assert_eq!(session.preferences.dietary_restrictions, vec!["vegetarian"]);
        assert_eq!(
            session.conversation,
            vec![
                "User: I'm vegetarian, ideas?".to_string(),
                "Assistant: Try a chickpea curry tonight.".to_string()
            ]
        );
        assert_eq!(chef.usage().total_calls, 1);

        let requests = chef.provider().requests();
        let request = &requests[0];
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.top_p, Some(0.95));
        let prompt = request.messages[0].content.as_deref().unwrap();
        assert!(prompt.contains("- Dietary restrictions: vegetarian"));
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_transcript_alone() {
        let provider = ScriptedProvider::new().error(ProviderError::Network("reset".into()));
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let err = chef.chat(&mut session, "hello", |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert!(session.conversation.is_empty());
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let provider = ScriptedProvider::new().empty();
        let mut chef = Chef::new(provider);
        let mut session = Session::new("s");

        let err = chef.chat(&mut session, "hello", |_| {}).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
        assert!(session.conversation.is_empty());
    }
}
