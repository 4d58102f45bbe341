//! Agent runtime: runs one role-bound task and returns its text.
//!
//! [`GeminiRuntime`] talks to the Gemini `generateContent` endpoint. Tests
//! substitute their own [`AgentRuntime`].

use std::time::Duration;

use async_trait::async_trait;
use postcrew_shared::{
    Capability, ModelConfig, PostcrewError, Result, TaskDescriptor, require_model_key,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Output of a capability shim, handed to the task that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub capability: Capability,
    pub query: String,
    pub text: String,
}

/// Everything one task needs to run.
#[derive(Debug, Clone)]
pub struct TaskInvocation {
    pub descriptor: TaskDescriptor,
    /// Outputs of `descriptor.context_refs`, in the same order.
    pub context: Vec<String>,
    pub tool_output: Option<ToolOutput>,
    pub temperature: f32,
}

impl TaskInvocation {
    /// The role persona, used as the system instruction.
    pub fn system_prompt(&self) -> String {
        let role = self.descriptor.role;
        format!(
            "You are a {}.\nGoal: {}\nBackstory: {}",
            role.title(),
            role.goal(),
            role.backstory()
        )
    }

    /// Task description, expected output, prior outputs and tool output.
    pub fn user_prompt(&self) -> String {
        let mut prompt = format!(
            "## Task\n{}\n\n## Expected output\n{}\n",
            self.descriptor.description, self.descriptor.expected_output
        );

        if !self.context.is_empty() {
            prompt.push_str("\n## Context from previous tasks\n");
            for (task_id, text) in self.descriptor.context_refs.iter().zip(&self.context) {
                prompt.push_str(&format!("\n### Output of {task_id}\n{text}\n"));
            }
        }

        if let Some(tool) = &self.tool_output {
            let label = match tool.capability {
                Capability::WebSearch => format!("Web search results for '{}'", tool.query),
                Capability::ImageLookup => format!("Image found for '{}'", tool.query),
                Capability::None => format!("Tool output for '{}'", tool.query),
            };
            prompt.push_str(&format!("\n## {label}\n{}\n", tool.text));
        }

        prompt
    }
}

/// Runs one task invocation against a language model.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run_task(&self, invocation: &TaskInvocation) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiSystemInstruction,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Gemini `generateContent` client.
pub struct GeminiRuntime {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiRuntime {
    pub fn new(config: &ModelConfig, model: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PostcrewError::Llm(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Build from config; fails when the model key variable is unset.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = require_model_key(config)?;
        Self::new(config, config.resolved_model(), api_key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        )
    }
}

#[async_trait]
impl AgentRuntime for GeminiRuntime {
    #[instrument(skip_all, fields(task = %invocation.descriptor.id, model = %self.model))]
    async fn run_task(&self, invocation: &TaskInvocation) -> Result<String> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: invocation.user_prompt(),
                }],
            }],
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: invocation.system_prompt(),
                }],
            },
            generation_config: GeminiGenerationConfig {
                temperature: invocation.temperature,
            },
        };

        let response = self
            .client
            .post(self.build_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| PostcrewError::Llm(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PostcrewError::Llm(format!("failed to read response: {}", e.without_url())))?;

        let parsed: GeminiResponse = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                PostcrewError::Llm(format!("invalid response: {e}"))
            } else {
                PostcrewError::Llm(format!("HTTP {status}"))
            }
        })?;

        if let Some(error) = parsed.error {
            return Err(PostcrewError::Llm(format!(
                "Gemini API error: {}",
                error.message
            )));
        }
        if !status.is_success() {
            return Err(PostcrewError::Llm(format!("HTTP {status}")));
        }

        let output: String = parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if output.trim().is_empty() {
            return Err(PostcrewError::Llm("no text in response".into()));
        }

        debug!(chars = output.len(), "task completed");
        Ok(output)
    }
}
