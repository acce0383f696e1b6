//! GeminiGenerator implementation.

use std::sync::Arc;

use horoscope_core::{
    async_trait, hash_prompt, Clock, ContentGenerator, GenerationError, GenerationRequest,
    HoroscopeDetail, HoroscopePeriod, HoroscopeSet, SystemClock,
};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat,
};
use crate::config::GeminiConfig;
use crate::prompt::{PromptContext, SYSTEM_PROMPT};
use crate::response::parse_detail;

/// A content generator backed by Gemini's OpenAI-compatible API.
///
/// Each request issues three chat completions (daily, weekly, monthly)
/// concurrently and fails as a whole if any of them fails.
pub struct GeminiGenerator {
    client: Client,
    config: GeminiConfig,
    clock: Arc<dyn Clock>,
    system_prompt_hash: String,
}

impl GeminiGenerator {
    /// Create a new GeminiGenerator with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Configuration(
                "Gemini API key is empty".to_string(),
            ));
        }

        let client = Client::builder().build().map_err(|e| {
            GenerationError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        let system_prompt_hash = hash_prompt(SYSTEM_PROMPT);
        info!("GeminiGenerator system prompt fingerprint: {}", system_prompt_hash);
        info!("GeminiGenerator initialized with model: {}", config.model);

        Ok(Self {
            client,
            config,
            clock: Arc::new(SystemClock),
            system_prompt_hash,
        })
    }

    /// Create a GeminiGenerator from environment variables.
    ///
    /// See [`GeminiConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Use `clock` to resolve "today" for requests without a target date.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Get the system prompt fingerprint.
    pub fn system_prompt_hash(&self) -> &str {
        &self.system_prompt_hash
    }

    fn build_request(&self, user_prompt: String) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(user_prompt),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    /// Make a chat completion request.
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GenerationError> {
        let url = self.config.completions_url();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = ApiError::parse(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);
            let detail = format!("API error ({}): {}", status.as_u16(), message);

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                    GenerationError::Unavailable(detail)
                }
                _ => GenerationError::ProcessingFailed(detail),
            });
        }

        response.json().await.map_err(|e| {
            GenerationError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }

    /// Generate one period's detail.
    async fn generate_period(
        &self,
        context: &PromptContext<'_>,
        period: HoroscopePeriod,
    ) -> Result<HoroscopeDetail, GenerationError> {
        let request = self.build_request(context.build(period));
        let completion = self.chat_completion(&request).await?;

        if let Some(usage) = &completion.usage {
            debug!(
                sign = %context.sign,
                %period,
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("No content in response".to_string()))?;

        parse_detail(&content)
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<HoroscopeSet, GenerationError> {
        let today = self.clock.today();
        let context = PromptContext {
            sign: request.sign,
            locale: request.locale,
            target_date: request.target_date.unwrap_or(today),
            today,
            profile: request.active_profile(),
        };

        debug!(
            sign = %context.sign,
            locale = %context.locale,
            date = %context.target_date,
            personalized = context.profile.is_some(),
            "Generating horoscope set"
        );

        let (daily, weekly, monthly) = tokio::try_join!(
            self.generate_period(&context, HoroscopePeriod::Daily),
            self.generate_period(&context, HoroscopePeriod::Weekly),
            self.generate_period(&context, HoroscopePeriod::Monthly),
        )?;

        Ok(HoroscopeSet {
            daily,
            weekly,
            monthly,
        })
    }

    fn name(&self) -> &str {
        "GeminiGenerator"
    }

    async fn is_ready(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }
}
