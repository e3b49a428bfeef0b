//! Upstream chat-completion client adapter.
//!
//! Holds one `reqwest::Client` lazily keyed by the `{api_key, base_url}` pair
//! it was built for. Configuration is compared on every call and the client
//! is rebuilt when either value changed, so credential or endpoint rotation
//! takes effect without a restart. Duplicate rebuilds under concurrency are
//! harmless: both produce functionally equivalent clients.

use crate::config::ProviderConfig;
use crate::types::{ChatTurn, Persona};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

/// System instruction when no persona is active.
const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "Eres un asistente de IA útil y amigable. Responde de manera clara y concisa.";

/// Returned when the provider answers 2xx with no completion content.
const EMPTY_COMPLETION_FALLBACK: &str = "Lo siento, no pude generar una respuesta.";

/// At most this many trailing history turns are sent upstream, keeping the
/// request inside the model's token budget.
const HISTORY_WINDOW: usize = 10;

// Fixed, conservative generation settings. Tuning parameters, not part of
// the correctness contract, but never varied per request.
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f64 = 0.7;

/// One `{role, content}` turn on the provider wire.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The `{api_key, base_url}` pair a client handle was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClientKey {
    api_key: String,
    base_url: String,
}

impl ClientKey {
    fn of(config: &ProviderConfig) -> Self {
        Self {
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.clone(),
        }
    }
}

struct ClientSlot {
    key: ClientKey,
    client: reqwest::Client,
}

/// Cached-factory adapter over the upstream chat-completion endpoint.
pub struct ProviderClient {
    slot: Mutex<Option<ClientSlot>>,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new() -> Self {
        // Env-overridable request timeout, 30s default.
        let timeout_secs = env::var("AI_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);
        Self::with_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            timeout,
        }
    }

    /// Compile the ordered message sequence for one request: system
    /// instruction first (persona content when active), then at most the
    /// last [`HISTORY_WINDOW`] history turns, then the new user message.
    pub fn build_messages(
        persona: Option<&Persona>,
        history: &[ChatTurn],
        user_message: &str,
    ) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(history.len().min(HISTORY_WINDOW) + 2);

        messages.push(WireMessage {
            role: "system",
            content: persona
                .map(|p| p.content.clone())
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()),
        });

        let tail = history.len().saturating_sub(HISTORY_WINDOW);
        for turn in &history[tail..] {
            messages.push(WireMessage {
                role: turn.role.as_provider_str(),
                content: turn.content.clone(),
            });
        }

        messages.push(WireMessage {
            role: "user",
            content: user_message.to_string(),
        });

        messages
    }

    /// Issue one chat-completion call and return the first completion's text,
    /// or the empty-completion sentinel when the provider returns no content.
    ///
    /// Single attempt: the retry loop lives in the caller.
    pub async fn chat_complete(
        &self,
        config: &ProviderConfig,
        messages: &[WireMessage],
    ) -> Result<String> {
        let client = self.client_for(config)?;
        let url = format!("{}/chat/completions", config.base_url);
        let request_id = Uuid::new_v4().to_string();

        let body = ChatCompletionRequest {
            model: &config.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let mut req = client
            .post(&url)
            .json(&body)
            .header("x-request-id", &request_id);
        if let Some(key) = &config.api_key {
            req = req.bearer_auth(key);
        }

        let start = Instant::now();
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            info!(
                http_status = status.as_u16(),
                request_id = request_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "chat completion request failed"
            );
            return Err(Error::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = resp.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_COMPLETION_FALLBACK.to_string());

        info!(
            request_id = request_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "chat completion succeeded"
        );
        Ok(content)
    }

    /// Reuse the cached client when `{api_key, base_url}` is unchanged,
    /// rebuild otherwise. The lock is released before any network I/O.
    fn client_for(&self, config: &ProviderConfig) -> Result<reqwest::Client> {
        let key = ClientKey::of(config);
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(existing) = slot.as_ref() {
            if existing.key == key {
                return Ok(existing.client.clone());
            }
            info!("provider configuration changed, rebuilding client");
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(Error::Transport)?;
        *slot = Some(ClientSlot {
            key,
            client: client.clone(),
        });
        Ok(client)
    }
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatTurn;

    fn persona() -> Persona {
        Persona {
            id: "p1".into(),
            name: "Tradicional".into(),
            content: "Responde con formalidad.".into(),
            is_active: true,
        }
    }

    #[test]
    fn system_message_comes_first() {
        let messages = ProviderClient::build_messages(Some(&persona()), &[], "hola");
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "Responde con formalidad.");
        assert_eq!(messages.last().unwrap().role, "user");
        assert_eq!(messages.last().unwrap().content, "hola");
    }

    #[test]
    fn missing_persona_uses_default_instruction() {
        let messages = ProviderClient::build_messages(None, &[], "hola");
        assert_eq!(messages[0].content, DEFAULT_SYSTEM_INSTRUCTION);
    }

    #[test]
    fn history_is_windowed_to_ten_turns() {
        let history: Vec<ChatTurn> = (0..15)
            .map(|i| ChatTurn::user(format!("turn {}", i)))
            .collect();
        let messages = ProviderClient::build_messages(None, &history, "hola");
        // system + 10 history + user
        assert_eq!(messages.len(), 12);
        assert_eq!(messages[1].content, "turn 5");
        assert_eq!(messages[11].content, "hola");
    }

    #[test]
    fn client_is_reused_until_config_changes() {
        let provider = ProviderClient::with_timeout(Duration::from_secs(5));
        let cfg_a = ProviderConfig::new(Some("key-a".into()), "https://a.example", "m");
        let cfg_b = ProviderConfig::new(Some("key-b".into()), "https://a.example", "m");

        provider.client_for(&cfg_a).unwrap();
        let key_before = provider.slot.lock().unwrap().as_ref().unwrap().key.clone();

        provider.client_for(&cfg_a).unwrap();
        assert_eq!(
            provider.slot.lock().unwrap().as_ref().unwrap().key,
            key_before
        );

        provider.client_for(&cfg_b).unwrap();
        assert_ne!(
            provider.slot.lock().unwrap().as_ref().unwrap().key,
            key_before
        );
    }
}
