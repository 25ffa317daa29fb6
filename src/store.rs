use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec::{decode_state, encode_state};
use crate::history::HistoryPolicy;
use crate::prefix::contact_name;
use crate::turn::{Role, Turn};

/// Contact selected before anything else has been chosen.
pub const DEFAULT_CONTACT: &str = "default";

/// One row of [`SessionStore::list_contacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEntry {
    pub name: String,
    pub active: bool,
}

/// Per-contact conversation histories plus the active contact, persisted to
/// a JSON file after every mutation.
///
/// The active contact always has a session, possibly empty.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    policy: HistoryPolicy,
    active: String,
    sessions: BTreeMap<String, Vec<Turn>>,
}

impl SessionStore {
    /// Empty store persisting to `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>, policy: HistoryPolicy) -> Self {
        let mut store = Self {
            path: path.into(),
            policy,
            active: DEFAULT_CONTACT.to_string(),
            sessions: BTreeMap::new(),
        };
        store.ensure(DEFAULT_CONTACT);
        store
    }

    /// Load the store from `path`.
    ///
    /// A missing or unreadable file yields an empty store. Malformed records
    /// are skipped; histories longer than the policy allows are trimmed.
    pub fn load(path: impl Into<PathBuf>, policy: HistoryPolicy) -> Self {
        let mut store = Self::new(path, policy);
        store.reload();
        store
    }

    /// Replace in-memory state with the contents of the state file.
    pub fn reload(&mut self) {
        self.sessions.clear();
        self.active = DEFAULT_CONTACT.to_string();

        match fs::read_to_string(&self.path) {
            Ok(text) => match decode_state(&text) {
                Ok(state) => {
                    if state.dropped > 0 {
                        debug!(dropped = state.dropped, "skipped malformed session records");
                    }
                    if let Some(active) = state.active {
                        self.active = active;
                    }
                    self.sessions = state.sessions;
                    for turns in self.sessions.values_mut() {
                        self.policy.trim(turns);
                    }
                    info!(path = ?self.path, contacts = self.sessions.len(), "sessions loaded");
                }
                Err(e) => {
                    warn!(path = ?self.path, error = %e, "ignoring unreadable session file");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "no session file yet");
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "failed to read session file");
            }
        }
        let active = self.active.clone();
        self.ensure(&active);
    }

    /// Write the whole store to disk.
    ///
    /// The JSON is written to a sibling temporary file which then replaces the
    /// target, so readers never observe a half-written file.
    pub fn save(&self) -> std::io::Result<()> {
        let text = encode_state(&self.active, &self.sessions)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = tmp_path(&self.path);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            fs::remove_file(&tmp).ok();
            return Err(e);
        }
        debug!(path = ?self.path, "sessions saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn contains(&self, contact: &str) -> bool {
        self.sessions.contains_key(contact)
    }

    /// Create an empty session for `contact` if it has none.
    pub fn ensure(&mut self, contact: &str) {
        if !self.sessions.contains_key(contact) {
            self.sessions.insert(contact.to_string(), Vec::new());
        }
    }

    /// Retained turns for `contact`, oldest first.
    pub fn history(&self, contact: &str) -> &[Turn] {
        self.sessions.get(contact).map_or(&[], Vec::as_slice)
    }

    /// Append a turn to `contact` and apply the retention policy.
    ///
    /// Does not persist; callers save once the whole exchange is recorded.
    pub fn push(&mut self, contact: &str, role: Role, text: impl Into<String>) {
        let policy = self.policy;
        let turns = self.sessions.entry(contact.to_string()).or_default();
        policy.push(turns, Turn::new(role, text));
    }

    /// Make `contact` active in memory without persisting.
    ///
    /// Names that are empty or longer than [`MAX_CONTACT_CHARS`](crate::prefix::MAX_CONTACT_CHARS) are
    /// ignored; returns `true` when the active contact was set.
    pub fn select(&mut self, contact: &str) -> bool {
        let Some(contact) = contact_name(contact) else {
            return false;
        };
        if self.active != contact {
            self.active = contact.to_string();
            info!(contact, "active contact set");
        }
        self.ensure(contact);
        true
    }

    /// Switch the active contact and persist.
    ///
    /// Invalid names are ignored and nothing is written.
    pub fn set_active(&mut self, contact: &str) -> std::io::Result<bool> {
        if !self.select(contact) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Advance to the next contact in lexicographic order, wrapping around.
    ///
    /// An active contact that is missing from the store jumps to the first.
    pub fn cycle_active(&mut self) -> std::io::Result<&str> {
        let next = if self.sessions.is_empty() {
            None
        } else if self.sessions.contains_key(&self.active) {
            self.sessions
                .range::<str, _>((
                    std::ops::Bound::Excluded(self.active.as_str()),
                    std::ops::Bound::Unbounded,
                ))
                .next()
                .or_else(|| self.sessions.iter().next())
                .map(|(k, _)| k.clone())
        } else {
            self.sessions.keys().next().cloned()
        };
        match next {
            Some(next) => self.active = next,
            None => {
                let active = self.active.clone();
                self.ensure(&active);
            }
        }
        self.save()?;
        info!(contact = %self.active, "cycled active contact");
        Ok(&self.active)
    }

    /// Forget the active contact's history.
    pub fn reset_active(&mut self) -> std::io::Result<()> {
        self.sessions.insert(self.active.clone(), Vec::new());
        self.save()?;
        info!(contact = %self.active, "session cleared");
        Ok(())
    }

    /// Contacts in lexicographic order with the active one flagged.
    pub fn list_contacts(&self) -> Vec<ContactEntry> {
        self.sessions
            .keys()
            .map(|name| ContactEntry {
                name: name.clone(),
                active: *name == self.active,
            })
            .collect()
    }

    /// Contact names in lexicographic order.
    pub fn contacts(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
