//! Clipboard access.
//!
//! [`SystemClipboard`] talks to the desktop clipboard through `arboard`;
//! [`MemoryClipboard`] keeps text in process and is used by tests.

use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Text-only clipboard.
pub trait Clipboard: Send + Sync {
    /// Current clipboard text. Non-text content reads as an empty string.
    fn get_text(&self) -> Result<String, ClipboardError>;

    /// Replace the clipboard contents with `text`.
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Desktop clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn get_text(&self) -> Result<String, ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?;
        match clipboard.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(ClipboardError(e.to_string())),
        }
    }

    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        #[cfg(target_os = "linux")]
        {
            // X11 and Wayland need the owner alive until a clipboard manager
            // or another application takes the selection. The owner thread
            // reports whether it could open the clipboard before blocking.
            let text = text.to_string();
            let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);
            std::thread::spawn(move || {
                let mut clipboard = match arboard::Clipboard::new() {
                    Ok(clipboard) => {
                        let _ = ready_tx.send(Ok(()));
                        clipboard
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(ClipboardError(e.to_string())));
                        return;
                    }
                };
                use arboard::SetExtLinux;
                if let Err(e) = clipboard.set().wait().text(text) {
                    tracing::warn!(error = %e, "clipboard write failed");
                }
            });
            ready_rx
                .recv()
                .map_err(|_| ClipboardError("clipboard owner thread exited".into()))??;
            debug!("clipboard owner thread started");
            Ok(())
        }
        #[cfg(not(target_os = "linux"))]
        {
            let mut clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?;
            clipboard
                .set_text(text)
                .map_err(|e| ClipboardError(e.to_string()))?;
            debug!("clipboard updated");
            Ok(())
        }
    }
}

/// In-process clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<String>,
}

impl MemoryClipboard {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
        }
    }

    /// Current contents.
    pub fn contents(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&self) -> Result<String, ClipboardError> {
        self.text
            .lock()
            .map(|t| t.clone())
            .map_err(|e| ClipboardError(e.to_string()))
    }

    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self.text.lock().map_err(|e| ClipboardError(e.to_string()))?;
        *guard = text.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn system_clipboard_reports_missing_display() {
        if arboard::Clipboard::new().is_ok() {
            return;
        }
        assert!(SystemClipboard.set_text("hello").is_err());
    }

    #[test]
    fn memory_clipboard_round_trips() {
        let clip = MemoryClipboard::new("before");
        assert_eq!(clip.get_text().unwrap(), "before");
        clip.set_text("after").unwrap();
        assert_eq!(clip.contents(), "after");
    }
}
