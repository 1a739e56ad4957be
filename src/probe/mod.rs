//! LLM connectivity diagnostics
//!
//! Runs a fixed sequence of independent checks against the hosted chat
//! completion API and reports each outcome. A failing check never stops the
//! checks after it.

pub mod client;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::graph::truncate_chars;
use client::{ChatClient, HttpReply};

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Characters of response body kept in a check's detail
const BODY_EXCERPT: usize = 500;
const VARIANT_EXCERPT: usize = 200;

/// Result of one check
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    /// URL that was contacted
    pub target: String,
    pub passed: bool,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    pub detail: String,
    pub elapsed_ms: u64,
}

/// All check outcomes for one probe run
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub checked_at: DateTime<Utc>,
    pub base_url: String,
    pub model: String,
    /// Masked API key, for telling keys apart
    pub api_key: Option<String>,
    pub checks: Vec<CheckOutcome>,
}

impl ProbeReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }
}

/// Show the first and last four characters of a key
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

pub struct ConnectivityProbe {
    client: ChatClient,
}

impl ConnectivityProbe {
    pub fn new(config: &LlmConfig) -> ProbeResult<Self> {
        Ok(Self {
            client: ChatClient::new(config)?,
        })
    }

    fn config(&self) -> &LlmConfig {
        self.client.config()
    }

    /// Run every check in order
    pub async fn run(&self) -> ProbeReport {
        let base_url = self.config().base_url();
        info!("Probing {} with model {}", base_url, self.config().model);

        let mut checks = vec![
            self.check_chat_completion().await,
            self.check_reachability().await,
        ];
        checks.extend(self.check_endpoint_variants().await);

        for check in checks.iter().filter(|c| !c.passed) {
            warn!("Check '{}' failed against {}: {}", check.name, check.target, check.detail);
        }

        ProbeReport {
            checked_at: Utc::now(),
            base_url,
            model: self.config().model.clone(),
            api_key: self.config().api_key.as_deref().map(mask_key),
            checks,
        }
    }

    /// Full completion request with the configured prompt, sent to the
    /// versioned `/v1` endpoint
    pub async fn check_chat_completion(&self) -> CheckOutcome {
        let base = versioned_base(&self.config().base_url());
        let target = format!("{}/chat/completions", base);
        let started = Instant::now();
        let reply = self
            .client
            .post_chat(&base, &self.config().probe_prompt, 10)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match reply {
            Ok(reply) if reply.is_success() => {
                let (passed, detail) = match client::parse_reply(&reply.body) {
                    Ok(text) => (true, format!("reply: {}", text)),
                    Err(e) => (false, e.to_string()),
                };
                CheckOutcome {
                    name: "chat_completion",
                    target,
                    passed,
                    status: Some(reply.status),
                    detail,
                    elapsed_ms,
                }
            }
            Ok(reply) => failed_reply("chat_completion", target, reply, BODY_EXCERPT, elapsed_ms),
            Err(e) => errored("chat_completion", target, e, elapsed_ms),
        }
    }

    /// GET the base URL; any status counts as reachable
    pub async fn check_reachability(&self) -> CheckOutcome {
        let target = self.config().base_url();
        let started = Instant::now();
        let result = self.client.get(&target).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(status) => CheckOutcome {
                name: "reachability",
                target,
                passed: true,
                status: Some(status),
                detail: format!("host answered with {}", status),
                elapsed_ms,
            },
            Err(e) => errored("reachability", target, e, elapsed_ms),
        }
    }

    /// Tiny completion against the base URL with and without `/v1`
    pub async fn check_endpoint_variants(&self) -> Vec<CheckOutcome> {
        let mut outcomes = Vec::new();
        for base in endpoint_variants(&self.config().base_url()) {
            let target = format!("{}/chat/completions", base);
            let started = Instant::now();
            let reply = self.client.post_chat(&base, "测试", 5).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            outcomes.push(match reply {
                Ok(reply) if reply.is_success() => CheckOutcome {
                    name: "endpoint_variant",
                    target,
                    passed: true,
                    status: Some(reply.status),
                    detail: "ok".to_string(),
                    elapsed_ms,
                },
                Ok(reply) => failed_reply("endpoint_variant", target, reply, VARIANT_EXCERPT, elapsed_ms),
                Err(e) => errored("endpoint_variant", target, e, elapsed_ms),
            });
        }
        outcomes
    }
}

fn api_root(base: &str) -> &str {
    base.trim_end_matches('/').trim_end_matches("/v1")
}

/// `base` with exactly one `/v1` suffix
pub fn versioned_base(base: &str) -> String {
    format!("{}/v1", api_root(base))
}

/// `base` without and with a `/v1` suffix
pub fn endpoint_variants(base: &str) -> Vec<String> {
    vec![api_root(base).to_string(), versioned_base(base)]
}

fn failed_reply(
    name: &'static str,
    target: String,
    reply: HttpReply,
    excerpt: usize,
    elapsed_ms: u64,
) -> CheckOutcome {
    CheckOutcome {
        name,
        target,
        passed: false,
        status: Some(reply.status),
        detail: truncate_chars(&reply.body, excerpt),
        elapsed_ms,
    }
}

fn errored(name: &'static str, target: String, error: ProbeError, elapsed_ms: u64) -> CheckOutcome {
    CheckOutcome {
        name,
        target,
        passed: false,
        status: None,
        detail: error.to_string(),
        elapsed_ms,
    }
}
