//! LLM-backed content agents.
//!
//! [`LlmContentService`] implements both service seams of the pipeline over a
//! [`ModelProviderClient`]: content generation (one prompt per category) and
//! judging (one prompt listing every candidate).

use crate::content::ContentGenerator;
use crate::error::{GenerationError, ProviderError};
use crate::judge::ContentJudge;
use crate::provider::{
    ChatMessage, CompletionOptions, ModelProviderClient, ProviderConfig, ProviderFactory,
};
use crate::types::{ContentCategory, ContentResult, Location};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

mod prompts;
mod reply;

pub struct LlmContentService {
    client: Arc<dyn ModelProviderClient>,
    options: CompletionOptions,
}

impl LlmContentService {
    pub fn new(client: Arc<dyn ModelProviderClient>, options: CompletionOptions) -> Self {
        Self { client, options }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = ProviderFactory::create_client(config)?;
        Ok(Self::new(client, config.default_options.clone()))
    }

    async fn ask(&self, system: &str, user: String) -> Result<String, GenerationError> {
        let response = self
            .client
            .complete(
                vec![ChatMessage::system(system), ChatMessage::user(user)],
                self.options.clone(),
            )
            .await?;
        debug!(
            provider = self.client.provider_name(),
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "Completion received"
        );
        Ok(response.content)
    }
}

#[async_trait]
impl ContentGenerator for LlmContentService {
    async fn generate(
        &self,
        category: ContentCategory,
        location: &Location,
    ) -> Result<ContentResult, GenerationError> {
        let spec = prompts::spec_for(category);
        let reply = self
            .ask(spec.system_prompt, prompts::content_prompt(category, location))
            .await?;
        reply::parse_content(category, location.name(), &reply)
    }
}

#[async_trait]
impl ContentJudge for LlmContentService {
    async fn evaluate(
        &self,
        location_name: &str,
        results: &[ContentResult],
    ) -> Result<String, GenerationError> {
        self.ask(
            prompts::JUDGE_SYSTEM_PROMPT,
            prompts::judge_prompt(location_name, results),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::Selector;
    use crate::provider::{MessageRole, MockProvider};
    use crate::types::{LocationKind, RelevanceScore, SelectionMethod};
    use std::time::Duration;

    fn location() -> Location {
        Location::new("Akko", 32.92, 35.07, "Crusader port", LocationKind::Historical, 25.0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_system_and_user_messages() {
        let provider = Arc::new(MockProvider::new(vec![Ok(
            r#"{"story": {"title": "Knights of Akko", "narrative": "In 1104...", "relevance_score": 93}}"#.to_string(),
        )]));
        let service = LlmContentService::new(provider.clone(), CompletionOptions::default());

        let result = service
            .generate(ContentCategory::History, &location())
            .await
            .unwrap();
        assert_eq!(result.title, "Knights of Akko");
        assert_eq!(result.relevance_score.get(), 93);

        let prompts = provider.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0][0].role, MessageRole::System);
        assert!(prompts[0][1].content.contains("Akko"));
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_as_generation_error() {
        let provider = Arc::new(MockProvider::new(vec![Err("503".to_string())]));
        let service = LlmContentService::new(provider, CompletionOptions::default());
        let err = service
            .generate(ContentCategory::Video, &location())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "provider");
    }

    #[tokio::test]
    async fn test_judge_reply_drives_selection() {
        let provider = Arc::new(MockProvider::new(vec![Ok(
            r#"{"selected": "spotify", "reasoning": "Port songs fit the sea breeze.", "scores": {"spotify": 91}}"#.to_string(),
        )]));
        let service: Arc<dyn ContentJudge> =
            Arc::new(LlmContentService::new(provider, CompletionOptions::default()));
        let results = vec![
            ContentResult::new(
                ContentCategory::Video,
                "Akko",
                "Walls",
                "",
                RelevanceScore::new(80).unwrap(),
            ),
            ContentResult::new(
                ContentCategory::Music,
                "Akko",
                "Sea shanty",
                "",
                RelevanceScore::new(70).unwrap(),
            ),
        ];

        let judgment = Selector::new(Some(service), Duration::from_secs(1))
            .select(results)
            .await
            .unwrap();
        assert_eq!(judgment.method(), SelectionMethod::Judge);
        assert_eq!(judgment.selected_category(), ContentCategory::Music);
        assert_eq!(judgment.scores()[&ContentCategory::Music], 91);
        assert_eq!(judgment.scores()[&ContentCategory::Video], 80);
    }
}
