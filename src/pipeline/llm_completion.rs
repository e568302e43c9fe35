use crate::config::Settings;
use crate::error::CompletionError;
use crate::pipeline::traits::{CompletionRequest, CompletionService};
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;

pub struct LlmCompletion {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    default_max_tokens: u32,
}

impl LlmCompletion {
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            temperature: None,
            default_max_tokens: crate::config::DEFAULT_MAX_TOKENS,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(&settings.openai_api_key);
        if let Some(base_url) = &settings.openai_api_base {
            config = config.with_api_base(base_url);
        }
        Self {
            client: Client::with_config(config),
            model: settings.openai_model.clone(),
            temperature: settings.openai_temperature,
            default_max_tokens: settings.openai_max_tokens,
        }
    }
}

#[async_trait]
impl CompletionService for LlmCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<serde_json::Value, CompletionError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(request.system.as_str())
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(request.user.as_str())
                    .build()?
                    .into(),
            ])
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: request.schema_name.clone(),
                    schema: Some(request.schema.clone()),
                    strict: Some(false),
                },
            })
            .max_completion_tokens(request.max_tokens.unwrap_or(self.default_max_tokens));
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        let chat_request = args.build()?;

        let response = self.client.chat().create(chat_request).await?;
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        tracing::trace!(schema = %request.schema_name, bytes = content.len(), "completion received");
        serde_json::from_str(&content).map_err(CompletionError::MalformedJson)
    }
}
