//! Turn runner
//!
//! Binds an agent to a session store. Each call to [`Runner::run`] records
//! the user message, lets the agent answer and persists the agent's final
//! events while forwarding everything to the caller.

use std::sync::Arc;

use sa_core::session::SessionKey;
use sa_core::{Content, Event, RunConfig, SessionService};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::{Agent, InvocationContext};
use crate::error::{Result, RunnerError};
use crate::stream::EventStream;

/// Capacity of the per-turn event channels
const EVENT_BUFFER: usize = 64;

/// Construction parameters for a [`Runner`]
pub struct RunnerConfig {
    pub app_name: String,
    pub agent: Arc<dyn Agent>,
    pub session_service: Arc<dyn SessionService>,
}

/// Runs turns of one agent against one session store
pub struct Runner {
    app_name: String,
    agent: Arc<dyn Agent>,
    sessions: Arc<dyn SessionService>,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Result<Self> {
        if config.app_name.trim().is_empty() {
            return Err(RunnerError::invalid_config("app name must not be empty"));
        }

        Ok(Self {
            app_name: config.app_name,
            agent: config.agent,
            sessions: config.session_service,
        })
    }

    /// Start a turn and return its events
    ///
    /// The turn runs on a spawned task. Setup failures such as an unknown
    /// session arrive as the only element of the stream.
    pub fn run(
        &self,
        cancel: CancellationToken,
        user_id: &str,
        session_id: &str,
        message: Content,
        run_config: RunConfig,
    ) -> EventStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let turn = Turn {
            key: SessionKey::new(&self.app_name, user_id, session_id),
            agent: self.agent.clone(),
            sessions: self.sessions.clone(),
            message,
            run_config,
            cancel: cancel.clone(),
        };

        tokio::spawn(turn.drive(tx));
        EventStream::new(rx, cancel)
    }
}

/// State owned by the producer task of one turn
struct Turn {
    key: SessionKey,
    agent: Arc<dyn Agent>,
    sessions: Arc<dyn SessionService>,
    message: Content,
    run_config: RunConfig,
    cancel: CancellationToken,
}

impl Turn {
    async fn drive(self, tx: mpsc::Sender<Result<Event>>) {
        if let Err(e) = self.execute(&tx).await {
            warn!("Turn in session {} failed: {}", self.key, e);
            let _ = tx.send(Err(e)).await;
        }
    }

    async fn execute(&self, tx: &mpsc::Sender<Result<Event>>) -> Result<()> {
        let key = &self.key;
        let session = self
            .sessions
            .get(&key.app_name, &key.user_id, &key.session_id)
            .await?
            .ok_or_else(|| sa_core::Error::SessionNotFound(key.to_string()))?;

        let ctx = InvocationContext::new(session, self.message.clone(), self.run_config)
            .with_cancel(self.cancel.clone());
        let invocation_id = ctx.invocation_id;

        let user_event = Event::user_message(invocation_id, self.message.clone());
        self.sessions
            .append_event(&key.app_name, &key.user_id, &key.session_id, user_event)
            .await?;

        info!(
            "Invocation {} of agent {} started in session {}",
            invocation_id,
            self.agent.name(),
            key
        );

        let (agent_tx, mut agent_rx) = mpsc::channel(EVENT_BUFFER);
        let run = self.agent.run(ctx, agent_tx);
        let forward = async move {
            while let Some(item) = agent_rx.recv().await {
                if let Ok(event) = &item {
                    if !event.partial {
                        self.persist(event.clone()).await;
                    }
                }
                if tx.send(item).await.is_err() {
                    debug!("Consumer of invocation {} went away", invocation_id);
                    break;
                }
            }
        };

        let (outcome, ()) = tokio::join!(run, forward);
        match outcome {
            Ok(()) => {
                info!("Invocation {} finished", invocation_id);
                Ok(())
            }
            Err(RunnerError::ChannelClosed) => {
                debug!("Invocation {} stopped early", invocation_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn persist(&self, event: Event) {
        let key = &self.key;
        let id = event.id;
        if let Err(e) = self
            .sessions
            .append_event(&key.app_name, &key.user_id, &key.session_id, event)
            .await
        {
            warn!("Failed to store event {} in session {}: {}", id, key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{LlmAgent, LlmAgentConfig};
    use crate::llm::mock::MockModel;
    use crate::llm::LlmResponse;
    use crate::tool::GoogleSearch;
    use sa_core::{CreateSessionRequest, InMemorySessionService};

    const APP: &str = "Google Search_agent";
    const USER: &str = "user1234";

    fn runner_with(model: Arc<MockModel>) -> (Runner, Arc<InMemorySessionService>) {
        let agent = LlmAgent::new(
            LlmAgentConfig::new("basic_search_agent", model).with_tool(Arc::new(GoogleSearch)),
        )
        .unwrap();
        let sessions = Arc::new(InMemorySessionService::new());
        let runner = Runner::new(RunnerConfig {
            app_name: APP.to_string(),
            agent: Arc::new(agent),
            session_service: sessions.clone(),
        })
        .unwrap();
        (runner, sessions)
    }

    async fn new_session(sessions: &InMemorySessionService) -> String {
        sessions
            .create(CreateSessionRequest::new(APP, USER))
            .await
            .unwrap()
            .id
    }

    async fn drain(mut stream: EventStream) -> Vec<Result<Event>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    fn streaming_model() -> Arc<MockModel> {
        Arc::new(MockModel::streaming(vec![
            Ok(LlmResponse::text("Here")),
            Ok(LlmResponse::text(" are")),
        ]))
    }

    #[test]
    fn test_new_rejects_empty_app_name() {
        let agent = LlmAgent::new(LlmAgentConfig::new(
            "agent",
            Arc::new(MockModel::streaming(vec![])),
        ))
        .unwrap();
        let result = Runner::new(RunnerConfig {
            app_name: " ".to_string(),
            agent: Arc::new(agent),
            session_service: Arc::new(InMemorySessionService::new()),
        });
        assert!(matches!(result, Err(RunnerError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_run_forwards_events_and_persists_final() {
        let (runner, sessions) = runner_with(streaming_model());
        let session_id = new_session(&sessions).await;

        let stream = runner.run(
            CancellationToken::new(),
            USER,
            &session_id,
            Content::user_text("what's the latest ai news?"),
            RunConfig::sse(),
        );
        let events: Vec<Event> = drain(stream).await.into_iter().map(|i| i.unwrap()).collect();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].text(), "Here");
        assert_eq!(events[1].text(), " are");
        assert!(!events[2].partial);

        let session = sessions.get(APP, USER, &session_id).await.unwrap().unwrap();
        assert_eq!(session.events.len(), 2);
        assert!(session.events[0].is_user());
        assert_eq!(session.events[0].text(), "what's the latest ai news?");
        assert_eq!(session.events[1].author, "basic_search_agent");
        assert_eq!(session.events[1].text(), "Here are");
        assert_eq!(session.events[0].invocation_id, session.events[1].invocation_id);
    }

    #[tokio::test]
    async fn test_second_turn_sees_history() {
        let model = streaming_model();
        let (runner, sessions) = runner_with(model.clone());
        let session_id = new_session(&sessions).await;

        for prompt in ["first", "second"] {
            let stream = runner.run(
                CancellationToken::new(),
                USER,
                &session_id,
                Content::user_text(prompt),
                RunConfig::sse(),
            );
            drain(stream).await;
        }

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].contents.len(), 1);
        assert_eq!(
            requests[1].contents,
            vec![
                Content::user_text("first"),
                Content::model_text("Here are"),
                Content::user_text("second"),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_session_yields_single_error() {
        let (runner, _sessions) = runner_with(streaming_model());

        let stream = runner.run(
            CancellationToken::new(),
            USER,
            "missing",
            Content::user_text("hello"),
            RunConfig::sse(),
        );
        let items = drain(stream).await;

        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(RunnerError::Core(sa_core::Error::SessionNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_agent_failure_is_last_element() {
        let (runner, sessions) = runner_with(Arc::new(MockModel::failing("quota exhausted")));
        let session_id = new_session(&sessions).await;

        let stream = runner.run(
            CancellationToken::new(),
            USER,
            &session_id,
            Content::user_text("hello"),
            RunConfig::sse(),
        );
        let items = drain(stream).await;

        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(RunnerError::Api { status, message }) => {
                assert_eq!(*status, 500);
                assert_eq!(message, "quota exhausted");
            }
            other => panic!("expected Api error, got {:?}", other),
        }

        let session = sessions.get(APP, USER, &session_id).await.unwrap().unwrap();
        assert_eq!(session.events.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_ends_stream() {
        let (model, chunks) = MockModel::live();
        let (runner, sessions) = runner_with(Arc::new(model));
        let session_id = new_session(&sessions).await;
        let cancel = CancellationToken::new();

        let mut stream = runner.run(
            cancel.clone(),
            USER,
            &session_id,
            Content::user_text("hello"),
            RunConfig::sse(),
        );

        chunks.send(Ok(LlmResponse::text("Here"))).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().text(), "Here");

        cancel.cancel();
        assert!(stream.next().await.is_none());
        assert!(stream.is_cancelled());
    }
}
