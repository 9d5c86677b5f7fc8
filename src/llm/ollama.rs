use crate::llm::client::{LLMClient, LLMResponse};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    Ollama,
};

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = split_host_port(&base_url);
        let client = Ollama::new(host, port);

        Ok(Self { client, model })
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

/// Split `http://host:port` into the pieces `Ollama::new` wants.
///
/// The scheme is kept on the host since ollama-rs expects a full URL there.
fn split_host_port(base_url: &str) -> (String, u16) {
    let (scheme, rest) = match base_url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => return ("http://localhost".to_string(), 11434),
    };
    let rest = rest.trim_end_matches('/');
    match rest.rsplit_once(':') {
        Some((host, port)) => (
            format!("{}://{}", scheme, host),
            port.parse().unwrap_or(11434),
        ),
        None => (format!("{}://{}", scheme, rest), 11434),
    }
}

/// Instructions appended to the prompt in place of native tool calling.
fn tool_instructions(tools: &[ToolDefinition]) -> String {
    let mut out = String::from(
        "\n\nRespond ONLY with a JSON object of the form \
         {\"tool\": \"<name>\", \"arguments\": {...}} using one of these tools:\n",
    );
    for tool in tools {
        out.push_str(&format!(
            "- {}: {}\n  parameters schema: {}\n",
            tool.name, tool.description, tool.parameters
        ));
    }
    out
}

/// Pull the outermost `{...}` object out of a free-text reply.
fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Lift a `{"tool": .., "arguments": ..}` reply into a tool call.
fn tool_call_from_reply(text: &str, tools: &[ToolDefinition]) -> Option<ToolCall> {
    let value = extract_json_object(text)?;
    let name = value.get("tool").and_then(|v| v.as_str())?.to_string();
    if !tools.iter().any(|t| t.name == name) {
        return None;
    }
    let arguments = value
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    Some(ToolCall {
        id: format!("ollama-{}", uuid::Uuid::new_v4()),
        name,
        arguments,
    })
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt.to_string())]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    async fn generate_with_tools(
        &self,
        system: &str,
        prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let prompt = format!("{}{}", prompt, tool_instructions(tools));
        let content = self.generate_with_system(system, &prompt).await?;

        let tool_calls: Vec<ToolCall> = tool_call_from_reply(&content, tools).into_iter().collect();
        let finish_reason = if tool_calls.is_empty() {
            "stop"
        } else {
            "tool_calls"
        };

        Ok(LLMResponse {
            content,
            tool_calls,
            finish_reason: finish_reason.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
