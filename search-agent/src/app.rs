//! Agent assembly and the single search turn

use std::io::Write;
use std::sync::Arc;

use agent_runner::{
    print_turn, Agent, GeminiModel, GoogleSearch, LlmAgent, LlmAgentConfig, Result, Runner,
    RunnerConfig, TurnSummary,
};
use sa_core::{Content, CreateSessionRequest, InMemorySessionService, RunConfig, SessionService, Settings};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const APP_NAME: &str = "Google Search_agent";
pub const USER_ID: &str = "user1234";
pub const AGENT_NAME: &str = "basic_search_agent";
pub const DESCRIPTION: &str = "Agent to answer questions using Google Search";
pub const INSTRUCTION: &str = "I can answer your question by searching the web. Just ask me anything";
pub const PROMPT: &str = "what's the latest ai news?";

/// Build the Gemini-backed agent with Google Search
pub fn create_search_agent(settings: &Settings) -> Result<LlmAgent> {
    let model = GeminiModel::new(settings.api_key()?, settings.model.as_str())
        .inspect_err(|e| error!("Failed to create model: {}", e))?
        .with_base_url(settings.base_url.as_str());

    LlmAgent::new(
        LlmAgentConfig::new(AGENT_NAME, Arc::new(model))
            .with_description(DESCRIPTION)
            .with_instruction(INSTRUCTION)
            .with_tool(Arc::new(GoogleSearch::new())),
    )
    .inspect_err(|e| error!("Failed to create agent: {}", e))
}

/// Ask `agent` one question in a fresh session, streaming the answer to `out`
pub async fn call_agent<W: Write>(
    cancel: CancellationToken,
    agent: Arc<dyn Agent>,
    prompt: &str,
    out: &mut W,
) -> Result<TurnSummary> {
    let sessions = Arc::new(InMemorySessionService::new());
    let session = sessions
        .create(CreateSessionRequest::new(APP_NAME, USER_ID))
        .await
        .inspect_err(|e| error!("Failed to create session: {}", e))?;
    info!("Created session {}", session.id);

    let runner = Runner::new(RunnerConfig {
        app_name: APP_NAME.to_string(),
        agent,
        session_service: sessions,
    })
    .inspect_err(|e| error!("Failed to create runner: {}", e))?;

    write!(out, "\nPrompt: {}\nResponse: ", prompt)?;
    out.flush()?;

    let mut stream = runner.run(
        cancel,
        USER_ID,
        &session.id,
        Content::user_text(prompt),
        RunConfig::sse(),
    );
    let summary = print_turn(&mut stream, out).await?;

    writeln!(out, "\n---")?;
    out.flush()?;
    Ok(summary)
}

/// Create the agent and run the fixed prompt
pub async fn run<W: Write>(
    settings: &Settings,
    cancel: CancellationToken,
    out: &mut W,
) -> Result<TurnSummary> {
    let agent = create_search_agent(settings)?;
    writeln!(out, "Agent created: {}", agent.name())?;

    call_agent(cancel, Arc::new(agent), PROMPT, out).await
}
