//! Chat session manager: owns the message log and the conversational session,
//! and assembles streamed replies into the last bot message.

use std::sync::Arc;

use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wardrobe_provider::{ChatBackend, ChatSession, ChatTurn};
use wardrobe_schema::ChatMessage;

use crate::context::WardrobeContext;
use crate::error::{ChatError, ValidationError, CHAT_ERROR_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Idle,
    /// User message and empty placeholder committed, no chunk yet.
    Sending,
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    Completed,
    /// Stopped by the cancellation token; the partial reply is kept.
    Cancelled,
}

pub struct ChatSessionManager {
    backend: Arc<dyn ChatBackend>,
    session: Option<Box<dyn ChatSession>>,
    messages: Vec<ChatMessage>,
    state: ChatState,
}

/// Holds the manager busy for one exchange. Returns it to Idle when dropped,
/// including when the send future itself is dropped mid-stream.
struct InFlight<'a> {
    state: &'a mut ChatState,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a mut ChatState) -> Self {
        *state = ChatState::Sending;
        Self { state }
    }

    fn set(&mut self, next: ChatState) {
        *self.state = next;
    }

    fn get(&self) -> ChatState {
        *self.state
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.state = ChatState::Idle;
    }
}

impl ChatSessionManager {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            session: None,
            messages: Vec::new(),
            state: ChatState::Idle,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    /// Input is enabled only while no exchange is in flight.
    pub fn can_send(&self) -> bool {
        self.state == ChatState::Idle
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the conversational session and clear the log. The next send opens
    /// a fresh session.
    pub fn reset(&mut self) {
        self.session = None;
        self.messages.clear();
        self.state = ChatState::Idle;
        info!("chat session reset");
    }

    /// Send `text` with a snapshot of the wardrobe and stream the reply into
    /// the log. `observer` sees the state and the whole log after the pair is
    /// appended, after every chunk, and once more when back to Idle. Messages
    /// are never removed: a reply cancelled before its first chunk stays in
    /// the log as an empty bot message.
    pub async fn send<F>(
        &mut self,
        text: &str,
        context: &WardrobeContext,
        cancel: &CancellationToken,
        mut observer: F,
    ) -> Result<ChatOutcome, ChatError>
    where
        F: FnMut(ChatState, &[ChatMessage]),
    {
        let message = text.trim();
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let Self {
            backend,
            session,
            messages,
            state,
        } = self;

        let mut flight = InFlight::begin(state);
        messages.push(ChatMessage::user(message));
        messages.push(ChatMessage::bot(""));
        observer(flight.get(), messages);

        let session = session.get_or_insert_with(|| {
            info!("opening chat session");
            backend.open_session()
        });
        let turn = ChatTurn {
            message: message.to_string(),
            system_instruction: context.system_instruction(),
        };

        let result = stream_reply(
            session,
            turn,
            cancel,
            &mut flight,
            messages,
            &mut observer,
        )
        .await;

        let outcome = match result {
            Ok(outcome) => {
                let reply = messages
                    .last()
                    .map(|m| m.text.as_str())
                    .unwrap_or_default();
                match outcome {
                    ChatOutcome::Completed => {
                        session.record_exchange(message, reply);
                        debug!(reply_len = reply.len(), "chat reply complete");
                    }
                    ChatOutcome::Cancelled => {
                        info!(reply_len = reply.len(), "chat reply cancelled");
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "chat stream failed");
                if let Some(reply) = messages.last_mut() {
                    reply.text = CHAT_ERROR_MESSAGE.to_string();
                }
                Err(ChatError::Transport(e))
            }
        };

        drop(flight);
        observer(*state, messages);
        outcome
    }
}

/// Read the reply stream into the last message until it ends, fails or is
/// cancelled.
async fn stream_reply<F>(
    session: &mut Box<dyn ChatSession>,
    turn: ChatTurn,
    cancel: &CancellationToken,
    flight: &mut InFlight<'_>,
    messages: &mut [ChatMessage],
    observer: &mut F,
) -> anyhow::Result<ChatOutcome>
where
    F: FnMut(ChatState, &[ChatMessage]),
{
    let mut stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(ChatOutcome::Cancelled),
        opened = session.send_stream(turn) => opened?,
    };
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(ChatOutcome::Cancelled),
            next = stream.next() => next,
        };
        match next {
            Some(Ok(chunk)) => {
                flight.set(ChatState::Streaming);
                if let Some(reply) = messages.last_mut() {
                    reply.text.push_str(&chunk);
                }
                debug!(chunk_len = chunk.len(), "chat chunk received");
                observer(flight.get(), messages);
            }
            Some(Err(e)) => return Err(e),
            None => return Ok(ChatOutcome::Completed),
        }
    }
}
