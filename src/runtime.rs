use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::ReplyError;
use crate::hotkeys::{Action, ContactSlots, default_bindings};
use crate::prefix::MAX_CONTACT_CHARS;
use crate::reply::{ReplyHelper, ReplyOutcome};
use crate::store::SessionStore;

const ACCEPT_RETRY: Duration = Duration::from_millis(100);

/// An action waiting in the dispatch queue.
#[derive(Debug)]
pub struct Request {
    pub action: Action,
    /// When the trigger reached the process.
    pub received_at: Instant,
    /// Receives the status text once the action has been handled.
    pub respond_to: Option<oneshot::Sender<String>>,
}

impl Request {
    /// Request whose status text is delivered on the returned receiver.
    pub fn with_reply(action: Action, received_at: Instant) -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                action,
                received_at,
                respond_to: Some(tx),
            },
            rx,
        )
    }
}

/// Single consumer of the action queue.
///
/// Every action runs to completion before the next one is taken, so the
/// store is only ever touched from this loop.
pub struct Dispatcher {
    helper: ReplyHelper,
    slots: ContactSlots,
    input_rx: mpsc::Receiver<Request>,
}

impl Dispatcher {
    /// Create a dispatcher. Slot bindings are captured from the store now.
    pub fn new(helper: ReplyHelper, input_rx: mpsc::Receiver<Request>) -> Self {
        let slots = ContactSlots::snapshot(helper.store());
        Self {
            helper,
            slots,
            input_rx,
        }
    }

    pub fn helper(&self) -> &ReplyHelper {
        &self.helper
    }

    pub fn slots(&self) -> &ContactSlots {
        &self.slots
    }

    /// Carry out `action` and describe the result for the user.
    pub async fn handle(&mut self, action: Action, received_at: Instant) -> String {
        debug!(%action, "handling action");
        match action {
            Action::GenerateReply => match self.helper.generate_reply_at(received_at).await {
                Ok(ReplyOutcome::Replied { contact, reply }) => {
                    format!("[{contact}] reply copied to clipboard:\n{reply}")
                }
                Ok(ReplyOutcome::Debounced) => "ignored: triggered again within the cooldown".into(),
                Err(e) => report(&e),
            },
            Action::ListContacts => render_contacts(self.helper.store()),
            Action::CycleActive => match self.helper.store_mut().cycle_active() {
                Ok(contact) => format!("active contact: {contact}"),
                Err(e) => report(&e.into()),
            },
            Action::ResetActive => match self.helper.store_mut().reset_active() {
                Ok(()) => format!("cleared session: {}", self.helper.store().active()),
                Err(e) => report(&e.into()),
            },
            Action::Slot(digit) => match self.slots.resolve(digit).map(str::to_string) {
                Some(contact) => self.switch_to(&contact),
                None => format!("no contact bound to slot {digit}"),
            },
            Action::Use(contact) => self.switch_to(&contact),
        }
    }

    fn switch_to(&mut self, contact: &str) -> String {
        match self.helper.store_mut().set_active(contact) {
            Ok(true) => format!("active contact: {}", self.helper.store().active()),
            Ok(false) => format!("contact name must be 1 to {MAX_CONTACT_CHARS} characters"),
            Err(e) => report(&e.into()),
        }
    }

    /// Handle requests until every sender is gone, then hand back the helper.
    pub async fn run(mut self) -> ReplyHelper {
        while let Some(request) = self.input_rx.recv().await {
            let status = self.handle(request.action, request.received_at).await;
            println!("{status}\n");
            if let Some(tx) = request.respond_to {
                let _ = tx.send(status);
            }
        }
        info!("action queue closed");
        self.helper
    }
}

/// Log `err` and turn it into a one-line user message.
fn report(err: &ReplyError) -> String {
    match err {
        e if e.is_input() => {
            info!(error = %e, "reply request refused");
            format!("notice: {e}")
        }
        ReplyError::QuotaExceeded(raw) => {
            error!(error = %raw, "completion quota exhausted");
            format!("error: {err}")
        }
        e => {
            error!(error = %e, "action failed");
            format!("error: {e}")
        }
    }
}

/// Contact list with the active contact marked.
pub fn render_contacts(store: &SessionStore) -> String {
    let contacts = store.list_contacts();
    if contacts.is_empty() {
        return "contacts: (none)".into();
    }
    let mut out = String::from("contacts:");
    for entry in contacts {
        let mark = if entry.active { " <=" } else { "" };
        let _ = write!(out, "\n  - {}{mark}", entry.name);
    }
    out
}

/// Startup help: key map, slot assignments and how to wire the shortcuts.
pub fn render_banner(slots: &ContactSlots) -> String {
    let mut out = String::from("reply-helper is running, one conversation per contact\n");
    for binding in default_bindings(slots) {
        let _ = write!(out, "\n  {:<12} {}", binding.combo, binding.action);
        if let Action::Slot(digit) = binding.action {
            if let Some(contact) = slots.resolve(digit) {
                let _ = write!(out, " ({contact})");
            }
        }
    }
    if slots.is_empty() {
        out.push_str("\n  no contacts yet, prefix copied text with [Name] to create one");
    }
    out.push_str("\n\nBind each combo to `reply-helper send <command>`. Ctrl+C exits.");
    out
}

/// Bind the control socket, replacing a stale socket file.
pub fn bind(socket: &Path) -> anyhow::Result<UnixListener> {
    if socket.exists() {
        std::fs::remove_file(socket).ok();
    }
    let listener = UnixListener::bind(socket)
        .with_context(|| format!("binding control socket {}", socket.display()))?;
    info!(?socket, "control socket listening");
    Ok(listener)
}

/// Accept control connections forever, forwarding each command to `tx`.
///
/// Accept failures such as descriptor exhaustion are logged and retried.
pub async fn serve(listener: UnixListener, tx: mpsc::Sender<Request>) {
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                warn!(error = %e, "control socket accept failed");
                tokio::time::sleep(ACCEPT_RETRY).await;
                continue;
            }
        };
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, tx).await {
                warn!(?e, "control connection error");
            }
        });
    }
}

async fn handle_connection(stream: UnixStream, tx: mpsc::Sender<Request>) -> anyhow::Result<()> {
    let received_at = Instant::now();
    let (read_half, mut write_half) = stream.into_split();
    let mut line = String::new();
    BufReader::new(read_half).read_line(&mut line).await?;
    let status = match line.parse::<Action>() {
        Ok(action) => {
            let (request, rx) = Request::with_reply(action, received_at);
            tx.send(request)
                .await
                .map_err(|_| anyhow::anyhow!("dispatcher stopped"))?;
            rx.await.unwrap_or_else(|_| "error: dispatcher stopped".into())
        }
        Err(e) => format!("error: {e}"),
    };
    write_half.write_all(status.as_bytes()).await?;
    write_half.write_all(b"\n").await?;
    write_half.shutdown().await?;
    Ok(())
}

/// Send one command to a running helper and return its status text.
pub async fn send_command(socket: &Path, command: &str) -> anyhow::Result<String> {
    let mut stream = UnixStream::connect(socket)
        .await
        .with_context(|| format!("is reply-helper running? cannot reach {}", socket.display()))?;
    stream.write_all(command.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.shutdown().await?;
    let mut status = String::new();
    stream.read_to_string(&mut status).await?;
    Ok(status.trim_end().to_string())
}

/// Run the helper until Ctrl+C.
pub async fn run(helper: ReplyHelper, socket: PathBuf) -> anyhow::Result<()> {
    run_until(helper, socket, tokio::signal::ctrl_c()).await
}

/// Run the helper until `shutdown` completes.
///
/// Returns an error if the control server or the dispatch loop stops on its
/// own, since neither is expected to end before shutdown.
pub async fn run_until(
    helper: ReplyHelper,
    socket: PathBuf,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> anyhow::Result<()> {
    let listener = bind(&socket)?;
    let (tx, rx) = mpsc::channel(32);
    let dispatcher = Dispatcher::new(helper, rx);
    println!("{}\n", render_banner(dispatcher.slots()));
    println!("{}\n", render_contacts(dispatcher.helper().store()));

    let mut server = tokio::spawn(serve(listener, tx));
    let outcome = tokio::select! {
        _ = dispatcher.run() => Err(anyhow::anyhow!("dispatch loop stopped")),
        res = &mut server => match res {
            Ok(()) => Err(anyhow::anyhow!("control server stopped")),
            Err(e) => Err(anyhow::Error::new(e).context("control server failed")),
        },
        res = shutdown => {
            info!("exiting");
            res.context("waiting for shutdown signal")
        }
    };
    server.abort();
    std::fs::remove_file(&socket).ok();
    if let Err(e) = &outcome {
        error!(error = %e, "helper stopped");
    }
    outcome
}
