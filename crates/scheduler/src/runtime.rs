use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{after, never, select, unbounded, Receiver, Sender};
use provider::ResourceProvider;
use spriteconfig::SessionSettings;
use tracing::{debug, info};

use crate::executor::{Executor, WorkerPool};
use crate::sequencer::{Completion, TaskSequencer};
use crate::session::Session;
use crate::view::SlotView;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to spawn thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("session thread is no longer running")]
    Disconnected,
    #[error("session thread panicked")]
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Visible,
    Hidden,
    Request(String),
    Shutdown,
}

/// A session running on its own apply thread, fed by a worker pool.
///
/// Lifecycle triggers are forwarded as commands; the apply thread is the only
/// place the session (and so the view) is touched.
pub struct SessionRuntime {
    commands: Sender<Command>,
    join_handle: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    pub fn spawn<V>(
        settings: SessionSettings,
        provider: Arc<dyn ResourceProvider>,
        view: V,
    ) -> Result<Self, RuntimeError>
    where
        V: SlotView + Send + 'static,
    {
        let pool = WorkerPool::spawn(settings.workers)?;
        Self::spawn_with_executor(settings, provider, Arc::new(pool), view)
    }

    pub fn spawn_with_executor<V>(
        settings: SessionSettings,
        provider: Arc<dyn ResourceProvider>,
        executor: Arc<dyn Executor>,
        view: V,
    ) -> Result<Self, RuntimeError>
    where
        V: SlotView + Send + 'static,
    {
        let (command_tx, command_rx) = unbounded();
        let (completion_tx, completion_rx) = unbounded();
        let sequencer = TaskSequencer::new(provider, executor, completion_tx, settings.name_case);
        let session = Session::new(&settings, sequencer, view);

        let name = "spritecycle-apply".to_string();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || apply_loop(session, command_rx, completion_rx))
            .map_err(|source| RuntimeError::Spawn { name, source })?;

        Ok(Self {
            commands: command_tx,
            join_handle: Some(handle),
        })
    }

    pub fn become_visible(&self) -> Result<(), RuntimeError> {
        self.send(Command::Visible)
    }

    pub fn become_hidden(&self) -> Result<(), RuntimeError> {
        self.send(Command::Hidden)
    }

    pub fn request(&self, name: impl Into<String>) -> Result<(), RuntimeError> {
        self.send(Command::Request(name.into()))
    }

    pub fn shutdown(mut self) -> Result<(), RuntimeError> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.commands.send(Command::Shutdown);
            handle.join().map_err(|_| RuntimeError::Panicked)?;
        }
        Ok(())
    }

    fn send(&self, command: Command) -> Result<(), RuntimeError> {
        self.commands
            .send(command)
            .map_err(|_| RuntimeError::Disconnected)
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.commands.send(Command::Shutdown);
            let _ = handle.join();
        }
    }
}

fn apply_loop<V: SlotView>(
    mut session: Session<V>,
    commands: Receiver<Command>,
    completions: Receiver<Completion>,
) {
    debug!("apply loop started");
    loop {
        let timer = match session.next_deadline() {
            Some(deadline) => after(deadline.saturating_duration_since(Instant::now())),
            None => never(),
        };
        select! {
            recv(commands) -> command => match command {
                Ok(Command::Visible) => session.on_become_visible(Instant::now()),
                Ok(Command::Hidden) => session.on_become_hidden(),
                Ok(Command::Request(name)) => {
                    session.on_request_changed(&name);
                }
                Ok(Command::Shutdown) | Err(_) => break,
            },
            recv(completions) -> completion => {
                if let Ok(completion) = completion {
                    session.apply_completion(completion, Instant::now());
                }
            }
            recv(timer) -> _ => session.poll_timers(Instant::now()),
        }
    }
    session.shutdown();
    info!("session stopped");
}
