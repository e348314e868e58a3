//! Scripted model for tests

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{LlmRequest, LlmResponse, Model, ModelStream};
use crate::error::{Result, RunnerError};

/// Model replaying a fixed script; `Err` entries become decode errors
pub(crate) struct MockModel {
    script: Vec<std::result::Result<LlmResponse, String>>,
    whole: Option<LlmResponse>,
    start_error: Option<String>,
    live: Mutex<Option<mpsc::Receiver<Result<LlmResponse>>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockModel {
    fn empty() -> Self {
        Self {
            script: Vec::new(),
            whole: None,
            start_error: None,
            live: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Stream the given items, then end
    pub fn streaming(script: Vec<std::result::Result<LlmResponse, String>>) -> Self {
        Self {
            script,
            ..Self::empty()
        }
    }

    /// Answer `generate` with one response
    pub fn whole(response: LlmResponse) -> Self {
        Self {
            whole: Some(response),
            ..Self::empty()
        }
    }

    /// Fail every request before any chunk
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            start_error: Some(message.into()),
            ..Self::empty()
        }
    }

    /// Stream whatever the returned sender pushes; ends when it is dropped
    pub fn live() -> (Self, mpsc::Sender<Result<LlmResponse>>) {
        let (tx, rx) = mpsc::channel(16);
        let model = Self {
            live: Mutex::new(Some(rx)),
            ..Self::empty()
        };
        (model, tx)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: LlmRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request);
        match &self.start_error {
            Some(message) => Err(RunnerError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Model for MockModel {
    fn name(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.record(request)?;
        self.whole
            .clone()
            .ok_or_else(|| RunnerError::decode("no whole response scripted"))
    }

    async fn generate_stream(&self, request: LlmRequest) -> Result<ModelStream> {
        self.record(request)?;

        let live = self.live.lock().unwrap().take();
        if let Some(rx) = live {
            return Ok(ReceiverStream::new(rx));
        }

        let (tx, rx) = mpsc::channel(self.script.len().max(1));
        for item in &self.script {
            let item = item.clone().map_err(RunnerError::decode);
            tx.try_send(item).map_err(|_| RunnerError::ChannelClosed)?;
        }
        Ok(ReceiverStream::new(rx))
    }
}
