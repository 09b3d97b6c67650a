//! Scheduler control surface
//!
//! External callers (a settings UI, a CLI, tests) drive the scheduler
//! through a closed command type delivered over a channel and handled by
//! exhaustive matching inside the engine; there is no shared mutable state
//! between callers and the rotation loop.

use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};

/// Requests understood by the scheduler engine.
#[derive(Debug)]
pub(crate) enum Command {
    /// Begin (or restart) rotation
    Start {
        reply: oneshot::Sender<Result<()>>,
    },

    /// Stop rotation and release every resource
    Stop {
        reply: oneshot::Sender<Result<()>>,
    },

    /// Report whether rotation is currently active
    QueryState { reply: oneshot::Sender<bool> },

    /// The persisted rotation configuration changed
    ConfigChanged,

    /// The persisted remote settings changed
    SettingsChanged,
}

/// Cloneable handle to a running scheduler engine.
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>) -> Self {
        Self { commands }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::scheduler("scheduler is shut down"))
    }

    /// Start rotation. A running rotation is stopped first; the restart is
    /// always "stop then start", never a partial update.
    pub async fn start(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { reply }).await?;
        rx.await
            .map_err(|_| Error::scheduler("scheduler dropped the start request"))?
    }

    /// Stop rotation, cancel every timer and release every resource.
    pub async fn stop(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop { reply }).await?;
        rx.await
            .map_err(|_| Error::scheduler("scheduler dropped the stop request"))?
    }

    /// Whether rotation is currently active.
    pub async fn is_rotating(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::QueryState { reply }).await?;
        rx.await
            .map_err(|_| Error::scheduler("scheduler dropped the state query"))
    }

    /// Notify the scheduler that the rotation configuration changed.
    /// Triggers reconciliation; an unchanged configuration is a no-op.
    pub async fn notify_config_changed(&self) -> Result<()> {
        self.send(Command::ConfigChanged).await
    }

    /// Notify the scheduler that the remote settings changed.
    pub async fn notify_settings_changed(&self) -> Result<()> {
        self.send(Command::SettingsChanged).await
    }
}
