//! Agents
//!
//! An [`Agent`] answers one user message by sending events into a channel.
//! The [`Runner`](crate::Runner) owns the channel's other end.

use async_trait::async_trait;
use sa_core::{Content, Event, RunConfig, Session};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::Result;

mod llm_agent;

pub use llm_agent::{LlmAgent, LlmAgentConfig};

/// Everything an agent needs for one turn
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// ID shared by every event of the turn
    pub invocation_id: Uuid,
    /// Session as it was before this turn's user message
    pub session: Session,
    /// The user message being answered
    pub user_content: Content,
    pub run_config: RunConfig,
    pub cancel: CancellationToken,
}

impl InvocationContext {
    pub fn new(session: Session, user_content: Content, run_config: RunConfig) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            session,
            user_content,
            run_config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Something that can take a turn in a conversation
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name, used as the author of its events
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Answer `ctx.user_content`, sending events in order
    ///
    /// Recoverable problems are sent as `Err` items; a returned error ends the
    /// turn.
    async fn run(&self, ctx: InvocationContext, events: mpsc::Sender<Result<Event>>)
        -> Result<()>;
}
