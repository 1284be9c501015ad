//! Confirmation prompts for destructive operations.
//!
//! Deletions ask a [`Confirm`] implementation before touching anything. The UI
//! answers through a [`ConfirmationRegistry`]; headless callers use
//! [`AutoConfirm`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPrompt {
    DeleteLocation { id: String, name: String },
    DeleteItem { id: String, name: String },
}

impl ConfirmPrompt {
    pub fn message(&self) -> &'static str {
        match self {
            ConfirmPrompt::DeleteLocation { .. } => {
                "Are you sure you want to delete this location and all items in it?"
            }
            ConfirmPrompt::DeleteItem { .. } => "Are you sure you want to delete this item?",
        }
    }
}

#[async_trait]
pub trait Confirm: Send + Sync {
    /// Returns `true` only on an explicit positive answer.
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.0
    }
}

#[derive(Debug)]
struct PendingConfirmation {
    prompt: ConfirmPrompt,
    sender: oneshot::Sender<bool>,
}

/// Pending prompts waiting for the UI to answer.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationRegistry {
    pending: Arc<Mutex<HashMap<Uuid, PendingConfirmation>>>,
}

impl ConfirmationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prompt. The receiver yields the answer once resolved.
    pub async fn request(&self, prompt: ConfirmPrompt) -> (Uuid, oneshot::Receiver<bool>) {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        self.pending
            .lock()
            .await
            .insert(id, PendingConfirmation { prompt, sender: tx });
        (id, rx)
    }

    pub async fn resolve(&self, id: Uuid, accepted: bool) -> Result<(), String> {
        match self.pending.lock().await.remove(&id) {
            Some(pending) => {
                let _ = pending.sender.send(accepted);
                Ok(())
            }
            None => Err(format!("No pending confirmation for id {id}")),
        }
    }

    /// Snapshot of prompts awaiting an answer, for display.
    pub async fn pending_list(&self) -> Vec<(Uuid, ConfirmPrompt)> {
        self.pending
            .lock()
            .await
            .iter()
            .map(|(id, pending)| (*id, pending.prompt.clone()))
            .collect()
    }

    pub async fn has_pending(&self) -> bool {
        !self.pending.lock().await.is_empty()
    }
}

#[async_trait]
impl Confirm for ConfirmationRegistry {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let (id, rx) = self.request(prompt.clone()).await;
        match rx.await {
            Ok(accepted) => accepted,
            Err(_) => {
                // Responder went away without answering.
                self.pending.lock().await.remove(&id);
                tracing::debug!(%id, "confirmation dropped, treating as declined");
                false
            }
        }
    }
}
