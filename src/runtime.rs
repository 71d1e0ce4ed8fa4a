//! Session runtime: one task that owns the [`Session`].
//!
//! DESIGN
//! ======
//! A single `select!` loop multiplexes three sources:
//!
//! - UI commands from [`SessionHandle`], each answered on a oneshot.
//! - Inbound events from the transport.
//! - The session's next timer deadline.
//!
//! After every step the current [`SessionView`] is published on a `watch`
//! channel if it changed. All session mutation happens on this task, so
//! nothing in the session needs a lock.
//!
//! The loop ends on [`SessionHandle::shutdown`] or when every handle is
//! dropped. Dropping the session on the way out sends `leaveRoom` if still
//! joined.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::events::InboundEvent;
use crate::language::Language;
use crate::outbox;
use crate::session::{Session, SessionError, SessionView};
use crate::transport::spawn_transport;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("session runtime stopped")]
    Stopped,
}

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Request from the UI to the runtime task.
#[derive(Debug)]
enum Command {
    Join { room_id: String, username: String, reply: Reply<()> },
    Leave { reply: Reply<()> },
    Edit { content: String, reply: Reply<()> },
    SetLanguage { raw: String, reply: Reply<Language> },
    ImportFile { file_name: String, content: String, reply: Reply<Language> },
    Run { reply: Reply<Uuid> },
    ClearOutput,
    Shutdown,
}

/// Cloneable UI-side handle to a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SessionView>,
}

/// Spawn the runtime task around an already-built session.
pub fn spawn(session: Session, inbound: mpsc::UnboundedReceiver<InboundEvent>) -> (SessionHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(session.view());
    let task = tokio::spawn(run_loop(session, commands_rx, inbound, view_tx));
    (SessionHandle { commands: commands_tx, view: view_rx }, task)
}

/// Wire a session, its transport and the runtime from `config`.
///
/// Must be called inside a tokio runtime.
#[must_use]
pub fn connect(config: Config) -> SessionHandle {
    let (outbox, outbound) = outbox::channel();
    let (inbound, _transport) = spawn_transport(config.transport, outbound, None);
    let session = Session::new(config.session, outbox);
    let (handle, _task) = spawn(session, inbound);
    handle
}

impl SessionHandle {
    pub async fn join(&self, room_id: impl Into<String>, username: impl Into<String>) -> Result<(), RuntimeError> {
        let (room_id, username) = (room_id.into(), username.into());
        self.request(|reply| Command::Join { room_id, username, reply }).await
    }

    pub async fn leave(&self) -> Result<(), RuntimeError> {
        self.request(|reply| Command::Leave { reply }).await
    }

    pub async fn edit(&self, content: impl Into<String>) -> Result<(), RuntimeError> {
        let content = content.into();
        self.request(|reply| Command::Edit { content, reply }).await
    }

    pub async fn set_language(&self, raw: impl Into<String>) -> Result<Language, RuntimeError> {
        let raw = raw.into();
        self.request(|reply| Command::SetLanguage { raw, reply }).await
    }

    pub async fn import_file(
        &self,
        file_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Language, RuntimeError> {
        let (file_name, content) = (file_name.into(), content.into());
        self.request(|reply| Command::ImportFile { file_name, content, reply }).await
    }

    pub async fn run(&self) -> Result<Uuid, RuntimeError> {
        self.request(|reply| Command::Run { reply }).await
    }

    pub fn clear_output(&self) -> Result<(), RuntimeError> {
        self.commands.send(Command::ClearOutput).map_err(|_| RuntimeError::Stopped)
    }

    /// Stop the runtime. The session leaves its room on the way out.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Latest published view.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver for view updates, for UIs that redraw on change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.commands.send(build(reply)).map_err(|_| RuntimeError::Stopped)?;
        let result = rx.await.map_err(|_| RuntimeError::Stopped)?;
        Ok(result?)
    }
}

async fn run_loop(
    mut session: Session,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut inbound: mpsc::UnboundedReceiver<InboundEvent>,
    view: watch::Sender<SessionView>,
) {
    let mut inbound_open = true;

    loop {
        let deadline = session.next_deadline();
        let wake = deadline.map_or_else(Instant::now, Instant::from_std);

        tokio::select! {
            command = commands.recv() => {
                match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => apply(&mut session, command),
                }
            }
            event = inbound.recv(), if inbound_open => {
                match event {
                    Some(event) => {
                        session.handle_inbound(event, Instant::now().into_std());
                    }
                    None => {
                        debug!("inbound channel closed");
                        inbound_open = false;
                    }
                }
            }
            () = tokio::time::sleep_until(wake), if deadline.is_some() => {
                session.tick(Instant::now().into_std());
            }
        }

        publish(&view, &session);
    }

    session.teardown();
    publish(&view, &session);
    info!("session runtime stopped");
}

fn apply(session: &mut Session, command: Command) {
    // A dropped reply receiver only means the caller stopped waiting.
    match command {
        Command::Join { room_id, username, reply } => {
            let _ = reply.send(session.join(&room_id, &username));
        }
        Command::Leave { reply } => {
            let _ = reply.send(session.leave());
        }
        Command::Edit { content, reply } => {
            let _ = reply.send(session.edit(content));
        }
        Command::SetLanguage { raw, reply } => {
            let _ = reply.send(session.set_language(&raw));
        }
        Command::ImportFile { file_name, content, reply } => {
            let _ = reply.send(session.import_file(&file_name, content));
        }
        Command::Run { reply } => {
            let _ = reply.send(session.run());
        }
        Command::ClearOutput => session.clear_output(),
        Command::Shutdown => {}
    }
}

fn publish(view: &watch::Sender<SessionView>, session: &Session) {
    view.send_if_modified(|current| {
        let next = session.view();
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

#[cfg(test)]
#[path = "runtime_test.rs"]
mod tests;
