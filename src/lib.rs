//! Clipboard reply helper with per-contact conversation memory.
//!
//! Copied text is sent to a chat-completion API together with the recent
//! history of the contact it belongs to, and the reply is copied back. A
//! `[Name]` or `@name` prefix picks the contact.

pub mod clipboard;
pub mod codec;
pub mod config;
pub mod debounce;
pub mod error;
pub mod history;
pub mod hotkeys;
pub mod llm;
pub mod logging;
pub mod openai;
pub mod prefix;
pub mod reply;
pub mod runtime;
pub mod store;
pub mod turn;

pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard, SystemClipboard};
pub use config::Settings;
pub use debounce::Debouncer;
pub use error::ReplyError;
pub use history::HistoryPolicy;
pub use hotkeys::{Action, ContactSlots};
pub use llm::{Completer, CompletionError, CompletionRequest, CompletionResponse, StaticCompleter};
pub use openai::OpenAiResponses;
pub use reply::{ReplyHelper, ReplyOutcome};
pub use runtime::{Dispatcher, Request};
pub use store::SessionStore;
pub use turn::{Role, Turn};
