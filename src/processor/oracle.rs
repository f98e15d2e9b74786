//! Interpretation requests against a chat-completions API
//!
//! The prompt names the three picked cards in pick order and quotes the
//! question verbatim. Requests run on a worker thread with its own tokio
//! runtime; results come back tagged with the request id they answer.

use crate::config::OracleConfig;
use crate::deck::CardDescriptor;
use crate::state::InterpretationRequest;
use crate::{Result, TarotError};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// System persona sent ahead of every prompt
pub const SYSTEM_PERSONA: &str = "당신은 신비로운 타로 마스터입니다.";

/// Build the user prompt for the picked cards and question
pub fn build_prompt(cards: &[CardDescriptor], question: &str) -> String {
    let names = cards.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");
    format!(
        "다음은 사용자가 뽑은 타로 카드입니다: {}. 이 사람의 질문은: \"{}\". \
         이 카드들의 의미를 종합해서 직관적이고 영적인 타로 해석을 해 주세요. 한국어로 답해주세요.",
        names, question
    )
}

/// Role of a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for the chat-completions endpoint
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl ChatRequest {
    /// Persona plus prompt for one reading
    pub fn for_reading(config: &OracleConfig, cards: &[CardDescriptor], question: &str) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PERSONA),
                ChatMessage::user(build_prompt(cards, question)),
            ],
            temperature: config.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a response body
fn extract_content(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| TarotError::MalformedResponse(format!("invalid JSON: {}", e)))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TarotError::MalformedResponse("response has no choices".to_string()))?;
    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(TarotError::MalformedResponse(
            "response content is empty".to_string(),
        )),
    }
}

/// HTTP client for one configured endpoint
pub struct ChatClient {
    http: reqwest::Client,
    config: OracleConfig,
}

impl ChatClient {
    /// Build a client with the configured timeout
    pub fn new(config: OracleConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TarotError::HttpError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Ask for an interpretation of the cards and question
    ///
    /// Every failure, from a missing key to an empty answer, comes back as an
    /// error; nothing escapes as a panic.
    pub async fn interpret(&self, cards: &[CardDescriptor], question: &str) -> Result<String> {
        let api_key = self.config.resolve_api_key().ok_or_else(|| {
            TarotError::ConfigError(format!(
                "no API key configured (set oracle.api_key or {})",
                crate::config::API_KEY_ENV
            ))
        })?;

        let body = ChatRequest::for_reading(&self.config, cards, question);
        debug!(
            "[ORACLE] POST {} model={} messages={}",
            self.config.endpoint,
            body.model,
            body.messages.len()
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!("[ORACLE] API returned {}", status);
            return Err(TarotError::ApiStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_content(&text)
    }
}

/// Commands sent to the oracle worker
#[derive(Clone, Debug)]
pub enum OracleCommand {
    /// Produce an interpretation
    Interpret(InterpretationRequest),
    /// Shutdown the worker
    Shutdown,
}

/// Events emitted by the oracle worker
#[derive(Clone, Debug)]
pub enum OracleEvent {
    /// Interpretation text for `request_id`
    Complete { request_id: Uuid, text: String },
    /// The request for `request_id` failed
    Failed {
        request_id: Uuid,
        error: TarotError,
    },
    /// Worker shut down
    Shutdown,
}

/// Handle for interacting with a running oracle worker
pub struct OracleHandle {
    command_tx: Sender<OracleCommand>,
    event_rx: Receiver<OracleEvent>,
    worker_handle: Option<JoinHandle<()>>,
}

impl OracleHandle {
    /// Queue an interpretation request
    pub fn interpret(&self, request: InterpretationRequest) -> Result<()> {
        self.command_tx
            .send(OracleCommand::Interpret(request))
            .map_err(|e| {
                TarotError::ChannelError(format!("Failed to send interpret command: {}", e))
            })
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<OracleEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Shutdown the worker and wait for it
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.command_tx.send(OracleCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| TarotError::ChannelError("Oracle worker panicked".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for OracleHandle {
    fn drop(&mut self) {
        // Detach rather than join; an in-flight request may take a full timeout
        if self.worker_handle.is_some() {
            let _ = self.command_tx.send(OracleCommand::Shutdown);
        }
    }
}

/// Spawns the worker thread that performs interpretation requests
pub struct OracleRunner {
    config: OracleConfig,
}

impl OracleRunner {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }

    /// Start the oracle worker thread
    ///
    /// The worker runs in a separate thread with its own tokio runtime, so the
    /// UI thread never blocks on the network.
    pub fn start_worker(self) -> Result<OracleHandle> {
        let client = ChatClient::new(self.config)?;
        let (command_tx, command_rx) = bounded::<OracleCommand>(16);
        // Unbounded so a finishing task never blocks the runtime thread
        let (event_tx, event_rx) = unbounded::<OracleEvent>();

        let worker_handle = std::thread::Builder::new()
            .name("oracle".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("[ORACLE] Failed to create tokio runtime: {}", e);
                        fail_all(command_rx, event_tx, e.to_string());
                        return;
                    }
                };
                runtime.block_on(worker_loop(client, command_rx, event_tx));
            })?;

        Ok(OracleHandle {
            command_tx,
            event_rx,
            worker_handle: Some(worker_handle),
        })
    }
}

async fn worker_loop(
    client: ChatClient,
    command_rx: Receiver<OracleCommand>,
    event_tx: Sender<OracleEvent>,
) {
    info!(
        "[ORACLE] Worker started ({} via {})",
        client.config().model,
        client.config().endpoint
    );
    let client = Arc::new(client);

    // Requests run as their own tasks so an abandoned one never holds up the next
    loop {
        let rx = command_rx.clone();
        let command = match tokio::task::spawn_blocking(move || rx.recv()).await {
            Ok(Ok(command)) => command,
            Ok(Err(_)) => {
                debug!("[ORACLE] Command channel closed");
                break;
            }
            Err(e) => {
                error!("[ORACLE] Command reader failed: {}", e);
                break;
            }
        };

        match command {
            OracleCommand::Interpret(request) => {
                let client = Arc::clone(&client);
                let event_tx = event_tx.clone();
                tokio::spawn(async move {
                    let request_id = request.request_id;
                    let event = match client.interpret(&request.cards, &request.question).await {
                        Ok(text) => {
                            info!("[ORACLE] {} answered ({} chars)", request_id, text.chars().count());
                            OracleEvent::Complete { request_id, text }
                        }
                        Err(error) => {
                            warn!("[ORACLE] {} failed: {}", request_id, error);
                            OracleEvent::Failed { request_id, error }
                        }
                    };
                    if event_tx.send(event).is_err() {
                        debug!("[ORACLE] Event channel closed, dropping {}", request_id);
                    }
                });
            }
            OracleCommand::Shutdown => {
                info!("[ORACLE] Received shutdown command");
                break;
            }
        }
    }

    let _ = event_tx.send(OracleEvent::Shutdown);
    info!("[ORACLE] Worker shutdown complete");
}

/// Answer every queued request with a failure when the runtime cannot start
fn fail_all(command_rx: Receiver<OracleCommand>, event_tx: Sender<OracleEvent>, reason: String) {
    while let Ok(command) = command_rx.recv() {
        let OracleCommand::Interpret(request) = command else {
            break;
        };
        let error = TarotError::HttpError(format!("runtime unavailable: {}", reason));
        let failed = OracleEvent::Failed {
            request_id: request.request_id,
            error,
        };
        if event_tx.send(failed).is_err() {
            break;
        }
    }
}
