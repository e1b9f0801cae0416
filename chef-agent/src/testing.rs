//! Scripted in-process provider for pipeline tests

use chef_core::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ProviderError,
    StreamChunk, StreamReceiver, ToolCall, Usage,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued replies in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<CompletionResponse, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, text: &str) -> Self {
        self.push(Ok(response(Some(text), Vec::new())))
    }

    pub fn tool_call(self, name: &str, arguments: serde_json::Value) -> Self {
        let call = ToolCall {
            id: name.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        };
        self.push(Ok(response(None, vec![call])))
    }

    pub fn empty(self) -> Self {
        self.push(Ok(response(None, Vec::new())))
    }

    pub fn error(self, error: ProviderError) -> Self {
        self.push(Err(error))
    }

    fn push(self, reply: Result<CompletionResponse, ProviderError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn next_reply(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Other("script exhausted".into())))
    }
}

fn response(text: Option<&str>, tool_calls: Vec<ToolCall>) -> CompletionResponse {
    let finish_reason = if tool_calls.is_empty() {
        FinishReason::Stop
    } else {
        FinishReason::ToolCalls
    };
    CompletionResponse {
        id: String::new(),
        model: "scripted".into(),
        content: text.map(str::to_string),
        tool_calls,
        finish_reason,
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.next_reply(request)
    }

    async fn stream(&self, request: CompletionRequest) -> Result<StreamReceiver, ProviderError> {
        let reply = self.next_reply(request)?;
        let text = reply.content.unwrap_or_default();

        let mut chunks: Vec<StreamChunk> = text
            .split_inclusive(' ')
            .map(|word| StreamChunk::Text(word.to_string()))
            .collect();
        chunks.push(StreamChunk::Done {
            finish_reason: FinishReason::Stop,
            usage: Some(reply.usage),
        });
        Ok(StreamReceiver::new(futures_util::stream::iter(chunks)))
    }
}
