//! Chat-backed [`Generator`].

use std::sync::Arc;

use async_trait::async_trait;
use copyloop_core::{GenerationRequest, Generator, Result};
use tracing::debug;

use crate::client::{ChatClient, ChatMessage};
use crate::config::ModelSettings;

/// Prompt for a first draft or, when the request carries both a previous
/// text and a fix, for a revision.
pub fn generation_prompt(request: &GenerationRequest) -> String {
    match (&request.previous, &request.fix) {
        (Some(previous), Some(fix)) => format!(
            "You are a technical writer using {style} style.\n\
             Improve the following text by applying these fixes: {fix}\n\n\
             Previous text:\n{previous}\n\n\
             Improved text:",
            style = request.style,
        ),
        _ => format!(
            "You are a technical writer using {style} style.\n\
             Write text for this scenario: {scenario}\n\n\
             Text:",
            style = request.style,
            scenario = request.scenario,
        ),
    }
}

pub struct ChatGenerator {
    client: Arc<ChatClient>,
    settings: ModelSettings,
}

impl ChatGenerator {
    pub fn new(client: Arc<ChatClient>, settings: ModelSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(revision = request.is_revision(), model = %self.settings.model, "generating");
        let prompt = generation_prompt(request);
        let text = self
            .client
            .complete(&self.settings, &[ChatMessage::system(prompt)])
            .await?;
        Ok(text)
    }
}
