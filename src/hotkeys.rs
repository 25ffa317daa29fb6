//! Hotkey actions and their default key combinations.
//!
//! Global key capture belongs to the desktop environment: each combo is bound
//! to `reply-helper send <command>`, and the command text is parsed back into
//! an [`Action`] here.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::prefix::{MAX_CONTACT_CHARS, contact_name};
use crate::store::SessionStore;

/// Number of contact quick-switch slots.
pub const SLOT_COUNT: usize = 10;

/// Something a hotkey can trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Reply to the clipboard text.
    GenerateReply,
    /// Print the known contacts.
    ListContacts,
    /// Move to the next contact.
    CycleActive,
    /// Clear the active contact's history.
    ResetActive,
    /// Switch to the contact bound to a slot, `1`..`9` then `0` for the tenth.
    Slot(u8),
    /// Switch to a contact by name.
    Use(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseActionError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("slot must be a single digit, got `{0}`")]
    BadSlot(String),
    #[error("`use` needs a contact name")]
    MissingName,
    #[error("contact names are 1 to {MAX_CONTACT_CHARS} characters")]
    BadName,
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = match s.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (s, ""),
        };
        match verb.to_ascii_lowercase().as_str() {
            "" => Err(ParseActionError::Empty),
            "generate" | "g" => Ok(Action::GenerateReply),
            "list" | "l" => Ok(Action::ListContacts),
            "cycle" | "p" => Ok(Action::CycleActive),
            "reset" | "r" => Ok(Action::ResetActive),
            "slot" => parse_slot(rest),
            "use" if rest.is_empty() => Err(ParseActionError::MissingName),
            "use" => contact_name(rest)
                .map(|name| Action::Use(name.to_string()))
                .ok_or(ParseActionError::BadName),
            digit if rest.is_empty() && digit.len() == 1 && digit.as_bytes()[0].is_ascii_digit() => {
                parse_slot(digit)
            }
            other => Err(ParseActionError::Unknown(other.to_string())),
        }
    }
}

fn parse_slot(s: &str) -> Result<Action, ParseActionError> {
    match s.parse::<u8>() {
        Ok(n) if n <= 9 && s.len() == 1 => Ok(Action::Slot(n)),
        _ => Err(ParseActionError::BadSlot(s.to_string())),
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::GenerateReply => f.write_str("generate"),
            Action::ListContacts => f.write_str("list"),
            Action::CycleActive => f.write_str("cycle"),
            Action::ResetActive => f.write_str("reset"),
            Action::Slot(n) => write!(f, "slot {n}"),
            Action::Use(name) => write!(f, "use {name}"),
        }
    }
}

/// Contacts bound to the quick-switch slots, captured once.
///
/// Contacts created after the snapshot get no slot until the next start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSlots {
    names: Vec<String>,
}

impl ContactSlots {
    /// First [`SLOT_COUNT`] contacts of `store` in lexicographic order.
    pub fn snapshot(store: &SessionStore) -> Self {
        Self {
            names: store.contacts().take(SLOT_COUNT).map(str::to_string).collect(),
        }
    }

    /// Contact bound to the slot for `digit`.
    pub fn resolve(&self, digit: u8) -> Option<&str> {
        let idx = match digit {
            0 => 9,
            1..=9 => usize::from(digit) - 1,
            _ => return None,
        };
        self.names.get(idx).map(String::as_str)
    }

    /// `(digit, contact)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (((i + 1) % 10) as u8, name.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A key combination and the action it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub combo: String,
    pub action: Action,
}

/// Standard key map: fixed actions plus one combo per bound slot.
pub fn default_bindings(slots: &ContactSlots) -> Vec<KeyBinding> {
    let mut bindings = vec![
        KeyBinding {
            combo: "ctrl+alt+g".into(),
            action: Action::GenerateReply,
        },
        KeyBinding {
            combo: "ctrl+alt+p".into(),
            action: Action::CycleActive,
        },
        KeyBinding {
            combo: "ctrl+alt+l".into(),
            action: Action::ListContacts,
        },
        KeyBinding {
            combo: "ctrl+alt+r".into(),
            action: Action::ResetActive,
        },
    ];
    bindings.extend(slots.iter().map(|(digit, _)| KeyBinding {
        combo: format!("ctrl+alt+{digit}"),
        action: Action::Slot(digit),
    }));
    bindings
}
