use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::clipboard::Clipboard;
use crate::config::{MAX_INPUT_CHARS, Settings};
use crate::debounce::Debouncer;
use crate::error::ReplyError;
use crate::llm::{ChatMessage, Completer, CompletionRequest};
use crate::prefix::parse_contact_tag;
use crate::store::SessionStore;
use crate::turn::Role;

/// Result of a reply request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Dropped because it arrived within the cooldown of the previous one.
    Debounced,
    /// A reply was generated, recorded and copied to the clipboard.
    Replied { contact: String, reply: String },
}

/// Turns clipboard text into a model reply for the right contact.
///
/// Owns the [`SessionStore`] along with the clipboard and completion
/// collaborators. A single instance is built per process and driven by the
/// dispatch loop.
pub struct ReplyHelper {
    store: SessionStore,
    completer: Arc<dyn Completer>,
    clipboard: Arc<dyn Clipboard>,
    debounce: Debouncer,
    model: String,
    system_prompt: String,
}

impl ReplyHelper {
    pub fn new(
        store: SessionStore,
        completer: Arc<dyn Completer>,
        clipboard: Arc<dyn Clipboard>,
        settings: &Settings,
    ) -> Self {
        Self {
            store,
            completer,
            clipboard,
            debounce: Debouncer::new(settings.cooldown),
            model: settings.model.clone(),
            system_prompt: settings.system_prompt.clone(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// System prompt, then the contact's retained history, then `text`.
    pub fn build_request(&self, contact: &str, text: &str) -> CompletionRequest {
        let history = self.store.history(contact);
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(&self.system_prompt));
        messages.extend(history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(text));
        CompletionRequest {
            model: self.model.clone(),
            messages,
        }
    }

    /// Generate a reply for the current clipboard text.
    pub async fn generate_reply(&mut self) -> Result<ReplyOutcome, ReplyError> {
        self.generate_reply_at(Instant::now()).await
    }

    /// Generate a reply for a trigger received at `requested_at`.
    ///
    /// Input problems are reported before any state changes or remote calls.
    /// A contact prefix switches the active contact. On a remote failure
    /// nothing is recorded. Failing to write the state file never costs the
    /// reply; the exchange stays in memory and is logged.
    pub async fn generate_reply_at(
        &mut self,
        requested_at: Instant,
    ) -> Result<ReplyOutcome, ReplyError> {
        if !self.debounce.try_enter(requested_at) {
            debug!("reply request debounced");
            return Ok(ReplyOutcome::Debounced);
        }

        let raw = self.clipboard.get_text()?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ReplyError::EmptyClipboard);
        }

        let tagged = parse_contact_tag(raw);
        let text = tagged.text.trim();
        if text.is_empty() {
            return Err(ReplyError::EmptyMessage);
        }
        let len = text.chars().count();
        if len > MAX_INPUT_CHARS {
            return Err(ReplyError::TextTooLong {
                len,
                limit: MAX_INPUT_CHARS,
            });
        }

        let contact = match tagged.contact {
            Some(tag) => {
                if tag != self.store.active() && self.store.select(&tag) {
                    if let Err(e) = self.store.save() {
                        warn!(contact = %tag, error = %e, "contact switch not persisted");
                    }
                }
                tag
            }
            None => self.store.active().to_string(),
        };
        self.store.ensure(&contact);

        info!(contact = %contact, len, "generating reply");
        let request = self.build_request(&contact, text);
        let response = self.completer.complete(&request).await?;
        let reply = response.text();

        self.store.push(&contact, Role::User, text);
        self.store.push(&contact, Role::Assistant, reply.clone());
        if let Err(e) = self.store.save() {
            warn!(error = %e, "reply recorded in memory only");
        }
        self.clipboard.set_text(&reply)?;
        info!(contact = %contact, len = reply.chars().count(), "reply copied to clipboard");

        Ok(ReplyOutcome::Replied { contact, reply })
    }
}
