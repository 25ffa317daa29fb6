use std::path::PathBuf;
use std::time::Duration;

use crate::debounce::DEFAULT_COOLDOWN;
use crate::history::DEFAULT_MAX_TURNS;
use crate::openai::DEFAULT_BASE_URL;

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a concise, professional chat reply assistant. Reply naturally and politely without rambling.";

pub const DEFAULT_SESSIONS_PATH: &str = "sessions.json";

/// Longest message accepted for a reply, in characters.
pub const MAX_INPUT_CHARS: usize = 4000;

/// Runtime settings for the reply helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Model identifier passed to the completion API.
    pub model: String,
    /// Instruction placed before every conversation.
    pub system_prompt: String,
    /// Exchanges retained per contact.
    pub max_turns: usize,
    /// Minimum spacing between accepted reply requests.
    pub cooldown: Duration,
    /// Where sessions are persisted.
    pub sessions_path: PathBuf,
    /// Completion API base URL.
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_turns: DEFAULT_MAX_TURNS,
            cooldown: DEFAULT_COOLDOWN,
            sessions_path: PathBuf::from(DEFAULT_SESSIONS_PATH),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }
}
