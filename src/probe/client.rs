//! Chat completion client for connectivity checks

use crate::config::LlmConfig;
use crate::probe::{ProbeError, ProbeResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Raw HTTP reply, kept even for non-success statuses
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: String,
}

pub struct ChatClient {
    client: Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> ProbeResult<Self> {
        if config.provider.requires_api_key() && config.api_key.is_none() {
            return Err(ProbeError::Config(format!(
                "{:?} requires an API key (set llm.api_key or GRAPHRAG_API_KEY)",
                config.provider
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// POST `{base_url}/chat/completions` with a single user message
    pub async fn post_chat(&self, base_url: &str, prompt: &str, max_tokens: u32) -> ProbeResult<HttpReply> {
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&Request {
            model: &self.config.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        });
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let resp = request.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify)?;
        Ok(HttpReply { status, body })
    }

    /// Send a prompt to the configured endpoint and return the reply text
    pub async fn chat(&self, prompt: &str, max_tokens: u32) -> ProbeResult<String> {
        let reply = self.post_chat(&self.config.base_url(), prompt, max_tokens).await?;
        if !reply.is_success() {
            return Err(ProbeError::Api {
                status: reply.status,
                body: reply.body,
            });
        }
        parse_reply(&reply.body)
    }

    /// Plain GET; any HTTP status means the host answered
    pub async fn get(&self, url: &str) -> ProbeResult<u16> {
        let resp = self.client.get(url).send().await.map_err(classify)?;
        Ok(resp.status().as_u16())
    }
}

/// Extract the first choice's message content
pub fn parse_reply(body: &str) -> ProbeResult<String> {
    let result: Response =
        serde_json::from_str(body).map_err(|e| ProbeError::Serialization(e.to_string()))?;
    result
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ProbeError::Serialization("response has no choices".to_string()))
}

fn classify(e: reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout(e.to_string())
    } else if e.is_connect() {
        ProbeError::Connection(e.to_string())
    } else {
        ProbeError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LLMProvider;

    #[test]
    fn test_parse_reply() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"你好！"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "你好！");
    }

    #[test]
    fn test_parse_reply_without_choices() {
        assert!(matches!(
            parse_reply(r#"{"choices":[]}"#),
            Err(ProbeError::Serialization(_))
        ));
        assert!(matches!(parse_reply("not json"), Err(ProbeError::Serialization(_))));
    }

    #[test]
    fn test_missing_key_rejected() {
        let config = LlmConfig::default();
        assert!(matches!(ChatClient::new(&config), Err(ProbeError::Config(_))));

        let local = LlmConfig {
            provider: LLMProvider::Ollama,
            ..LlmConfig::default()
        };
        assert!(ChatClient::new(&local).is_ok());
    }
}
