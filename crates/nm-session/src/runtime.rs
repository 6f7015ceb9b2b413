use crate::controller::{MintOutcome, SessionController, SwitchOutcome, UpdateOutcome};
use crate::error::SessionError;
use nm_api_types::{SessionSnapshot, TxHash, WalletAddress};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum Command {
    Connect(Reply<WalletAddress>),
    SwitchNetwork(Reply<SwitchOutcome>),
    SetForm {
        name: String,
        hint: String,
        reply: Reply<()>,
    },
    Mint {
        name: String,
        hint: String,
        reply: Reply<MintOutcome>,
    },
    Update {
        name: String,
        hint: String,
        reply: Reply<UpdateOutcome>,
    },
    Edit {
        name: String,
        reply: Reply<()>,
    },
    CancelEdit(Reply<()>),
    Refresh(Reply<usize>),
    RetryHint(Reply<TxHash>),
    Reload(Reply<()>),
}

/// Cloneable front door to a running session. Commands are queued and run
/// one at a time by the task that owns the controller.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Latest published snapshot. Never waits on in-flight transactions.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub async fn connect_wallet(&self) -> Result<WalletAddress, SessionError> {
        self.request(Command::Connect).await
    }

    pub async fn switch_network(&self) -> Result<SwitchOutcome, SessionError> {
        self.request(Command::SwitchNetwork).await
    }

    pub async fn set_form(&self, name: String, hint: String) -> Result<(), SessionError> {
        self.request(|reply| Command::SetForm { name, hint, reply })
            .await
    }

    pub async fn mint_domain(&self, name: String, hint: String) -> Result<MintOutcome, SessionError> {
        self.request(|reply| Command::Mint { name, hint, reply }).await
    }

    pub async fn update_domain(
        &self,
        name: String,
        hint: String,
    ) -> Result<UpdateOutcome, SessionError> {
        self.request(|reply| Command::Update { name, hint, reply })
            .await
    }

    pub async fn edit_record(&self, name: String) -> Result<(), SessionError> {
        self.request(|reply| Command::Edit { name, reply }).await
    }

    pub async fn cancel_edit(&self) -> Result<(), SessionError> {
        self.request(Command::CancelEdit).await
    }

    pub async fn fetch_mints(&self) -> Result<usize, SessionError> {
        self.request(Command::Refresh).await
    }

    pub async fn retry_pending_hint(&self) -> Result<TxHash, SessionError> {
        self.request(Command::RetryHint).await
    }

    pub async fn reload(&self) -> Result<(), SessionError> {
        self.request(Command::Reload).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::RuntimeClosed)?;
        response.await.map_err(|_| SessionError::RuntimeClosed)?
    }
}

/// Moves `controller` into its own task and returns the handle used to
/// drive it. The task initializes the session, then serves commands, chain
/// changes and the scheduled refresh until every handle is dropped.
pub fn spawn_session(mut controller: SessionController) -> (SessionHandle, JoinHandle<()>) {
    let (commands, mut inbox) = mpsc::channel(COMMAND_BUFFER);
    let handle = SessionHandle {
        commands,
        snapshots: controller.subscribe(),
    };

    let task = tokio::spawn(async move {
        if let Err(err) = controller.initialize_session().await {
            warn!(error = %err, "session started without wallet state");
        }

        loop {
            tokio::select! {
                command = inbox.recv() => match command {
                    Some(command) => dispatch(&mut controller, command).await,
                    None => break,
                },
                trigger = controller.next_trigger() => controller.handle_trigger(trigger).await,
            }
        }
        info!("session runtime stopped");
    });

    (handle, task)
}

async fn dispatch(controller: &mut SessionController, command: Command) {
    // A dropped reply means the caller went away; the work is done anyway.
    match command {
        Command::Connect(reply) => {
            let _ = reply.send(controller.connect_wallet().await);
        }
        Command::SwitchNetwork(reply) => {
            let _ = reply.send(controller.switch_network().await);
        }
        Command::SetForm { name, hint, reply } => {
            controller.set_form(&name, &hint);
            let _ = reply.send(Ok(()));
        }
        Command::Mint { name, hint, reply } => {
            let _ = reply.send(controller.mint_domain(&name, &hint).await);
        }
        Command::Update { name, hint, reply } => {
            let _ = reply.send(controller.update_domain(&name, &hint).await);
        }
        Command::Edit { name, reply } => {
            controller.edit_record(&name);
            let _ = reply.send(Ok(()));
        }
        Command::CancelEdit(reply) => {
            controller.cancel_edit();
            let _ = reply.send(Ok(()));
        }
        Command::Refresh(reply) => {
            let _ = reply.send(controller.fetch_mints().await);
        }
        Command::RetryHint(reply) => {
            let _ = reply.send(controller.retry_pending_hint().await);
        }
        Command::Reload(reply) => {
            let _ = reply.send(controller.reload().await);
        }
    }
}
