use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::prefix::contact_name;
use crate::turn::Turn;

/// Everything recovered from a state file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodedState {
    /// Active contact recorded in `_meta`, if it is a usable contact name.
    pub active: Option<String>,
    /// Well-formed sessions keyed by contact.
    pub sessions: BTreeMap<String, Vec<Turn>>,
    /// Number of records discarded while decoding.
    pub dropped: usize,
}

#[derive(Serialize)]
struct Meta<'a> {
    active_person: &'a str,
}

#[derive(Serialize)]
struct StateFile<'a> {
    #[serde(rename = "_meta")]
    meta: Meta<'a>,
    sessions: &'a BTreeMap<String, Vec<Turn>>,
}

/// Render the full store as the pretty-printed JSON state file.
pub fn encode_state(active: &str, sessions: &BTreeMap<String, Vec<Turn>>) -> serde_json::Result<String> {
    let file = StateFile {
        meta: Meta {
            active_person: active,
        },
        sessions,
    };
    serde_json::to_string_pretty(&file)
}

/// Decode a state file, keeping only well-formed records.
///
/// Fails only when the document is not a JSON object. Individual turns that
/// are not `[role, text]` pairs with a `user`/`assistant` role and string text
/// are skipped, as are contacts whose history is not a list.
pub fn decode_state(text: &str) -> anyhow::Result<DecodedState> {
    let root: Value = serde_json::from_str(text)?;
    let Value::Object(mut root) = root else {
        anyhow::bail!("state file is not a JSON object");
    };

    let mut state = DecodedState {
        active: root
            .get("_meta")
            .and_then(|m| m.get("active_person"))
            .and_then(Value::as_str)
            .and_then(contact_name)
            .map(str::to_string),
        ..Default::default()
    };

    let Some(Value::Object(raw)) = root.remove("sessions") else {
        return Ok(state);
    };

    for (contact, entries) in raw {
        let Value::Array(entries) = entries else {
            debug!(%contact, "dropping contact with non-list history");
            state.dropped += 1;
            continue;
        };
        let mut turns = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Turn>(entry) {
                Ok(turn) => turns.push(turn),
                Err(e) => {
                    debug!(%contact, error = %e, "dropping malformed turn");
                    state.dropped += 1;
                }
            }
        }
        state.sessions.insert(contact, turns);
    }
    Ok(state)
}
