//! Model-backed agent

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sa_core::event::USER_AUTHOR;
use sa_core::{Content, Event, GroundingMetadata, Role, UsageMetadata};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use super::{Agent, InvocationContext};
use crate::error::{Result, RunnerError};
use crate::llm::{GenerateConfig, LlmRequest, LlmResponse, Model};
use crate::tool::Tool;

/// Construction parameters for an [`LlmAgent`]
pub struct LlmAgentConfig {
    pub name: String,
    pub description: String,
    /// Sent to the model as the system instruction
    pub instruction: String,
    pub model: Arc<dyn Model>,
    /// Tools in declaration order
    pub tools: Vec<Arc<dyn Tool>>,
    pub generate_config: GenerateConfig,
}

impl LlmAgentConfig {
    pub fn new(name: impl Into<String>, model: Arc<dyn Model>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            model,
            tools: Vec::new(),
            generate_config: GenerateConfig::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_generate_config(mut self, config: GenerateConfig) -> Self {
        self.generate_config = config;
        self
    }
}

/// Agent that answers by calling a language model with its instruction and
/// tools
pub struct LlmAgent {
    name: String,
    description: String,
    instruction: String,
    model: Arc<dyn Model>,
    tools: Vec<Arc<dyn Tool>>,
    generate_config: GenerateConfig,
}

impl LlmAgent {
    /// Validate the configuration and build the agent
    pub fn new(config: LlmAgentConfig) -> Result<Self> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(RunnerError::invalid_config("agent name must not be empty"));
        }
        if name == USER_AUTHOR {
            return Err(RunnerError::invalid_config(format!(
                "agent name '{}' is reserved",
                USER_AUTHOR
            )));
        }

        let mut seen = HashSet::new();
        for tool in &config.tools {
            if !seen.insert(tool.name()) {
                return Err(RunnerError::invalid_config(format!(
                    "duplicate tool '{}' on agent '{}'",
                    tool.name(),
                    name
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            description: config.description,
            instruction: config.instruction,
            model: config.model,
            tools: config.tools,
            generate_config: config.generate_config,
        })
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn model(&self) -> &Arc<dyn Model> {
        &self.model
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// History of the session visible to this agent, followed by the new
    /// user message
    fn build_request(&self, ctx: &InvocationContext) -> Result<LlmRequest> {
        let mut contents: Vec<Content> = ctx
            .session
            .events
            .iter()
            .filter(|e| !e.partial && (e.is_user() || e.author == self.name))
            .filter_map(|e| e.content.clone())
            .filter(|c| !c.parts.is_empty())
            .collect();
        contents.push(ctx.user_content.clone());

        let mut request = LlmRequest::new(contents);
        request.model = self.model.name().to_string();
        if !self.instruction.is_empty() {
            request.system_instruction = Some(self.instruction.clone());
        }
        request.config = self.generate_config.clone();

        for tool in &self.tools {
            tool.process_request(&mut request)?;
        }
        Ok(request)
    }

    fn event(&self, ctx: &InvocationContext) -> Event {
        Event::new(ctx.invocation_id, self.name.as_str())
    }

    async fn run_whole(
        &self,
        ctx: &InvocationContext,
        request: LlmRequest,
        events: &mpsc::Sender<Result<Event>>,
    ) -> Result<()> {
        let response = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                debug!("Invocation {} cancelled before the model answered", ctx.invocation_id);
                return Ok(());
            }
            response = self.model.generate(request) => response?,
        };

        let LlmResponse {
            content,
            finish_reason,
            grounding,
            usage,
        } = response;

        let mut event = self
            .event(ctx)
            .with_content(content.unwrap_or_else(|| Content::new(Role::Model)))
            .with_turn_complete(true);
        event.finish_reason = finish_reason;
        event.grounding = grounding.filter(|g| !g.is_empty());
        event.usage = usage;

        events
            .send(Ok(event))
            .await
            .map_err(|_| RunnerError::ChannelClosed)
    }

    async fn run_streaming(
        &self,
        ctx: &InvocationContext,
        request: LlmRequest,
        events: &mpsc::Sender<Result<Event>>,
    ) -> Result<()> {
        let mut stream = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                debug!("Invocation {} cancelled before streaming started", ctx.invocation_id);
                return Ok(());
            }
            stream = self.model.generate_stream(request) => stream?,
        };

        let mut text = String::new();
        let mut finish_reason: Option<String> = None;
        let mut grounding: Option<GroundingMetadata> = None;
        let mut usage: Option<UsageMetadata> = None;
        let mut chunks = 0usize;

        loop {
            let item = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    debug!(
                        "Invocation {} cancelled after {} chunks",
                        ctx.invocation_id, chunks
                    );
                    return Ok(());
                }
                item = stream.next() => item,
            };

            let Some(item) = item else {
                break;
            };

            match item {
                Ok(response) => {
                    chunks += 1;
                    if response.finish_reason.is_some() {
                        finish_reason = response.finish_reason.clone();
                    }
                    if let Some(g) = response.grounding.filter(|g| !g.is_empty()) {
                        grounding = Some(g);
                    }
                    if response.usage.is_some() {
                        usage = response.usage;
                    }

                    let Some(content) = response.content else {
                        continue;
                    };
                    text.push_str(&content.text());

                    let mut event = self.event(ctx).with_content(content).with_partial(true);
                    event.finish_reason = response.finish_reason;
                    debug!("Chunk {} of invocation {}", chunks, ctx.invocation_id);

                    if events.send(Ok(event)).await.is_err() {
                        return Err(RunnerError::ChannelClosed);
                    }
                }
                Err(e) => {
                    warn!("Stream error in invocation {}: {}", ctx.invocation_id, e);
                    if events.send(Err(e)).await.is_err() {
                        return Err(RunnerError::ChannelClosed);
                    }
                }
            }
        }

        let mut event = self
            .event(ctx)
            .with_content(Content::model_text(text))
            .with_turn_complete(true);
        event.finish_reason = finish_reason;
        event.grounding = grounding;
        event.usage = usage;

        info!(
            "Invocation {} streamed {} chunks, {} grounding sources",
            ctx.invocation_id,
            chunks,
            event.grounding.as_ref().map_or(0, |g| g.sources.len())
        );

        events
            .send(Ok(event))
            .await
            .map_err(|_| RunnerError::ChannelClosed)
    }
}

impl fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("tools", &self.tool_names())
            .finish()
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(
        &self,
        ctx: InvocationContext,
        events: mpsc::Sender<Result<Event>>,
    ) -> Result<()> {
        let request = self.build_request(&ctx)?;
        debug!(
            "Agent {} sending {} contents to {}",
            self.name,
            request.contents.len(),
            self.model.name()
        );

        if ctx.run_config.is_streaming() {
            self.run_streaming(&ctx, request, &events).await
        } else {
            self.run_whole(&ctx, request, &events).await
        }
    }
}
